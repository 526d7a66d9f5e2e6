
use std::cell::RefCell;
use std::rc::{Rc,Weak};

use super::{RouterBuilderArgument,RouterParameters,InputLink,OutputLink,FlitConsumer,FlitSource,InputPort,OutputPort,VirtualChannel,VcStatus,TransitionError,round_robin_scan};
use super::switch::select_flit;
use crate::allocator::{VcAllocator,VCARequest,SeparableRoundRobin};
use crate::event::{Eventful,Scheduler,Time};
use crate::measures::RouterStatistics;
use crate::packet::{Flit,FlitBuffer,NetDest};
use crate::routing::RoutingTable;

/**
A virtual channel router with a configurable number of pipeline stages.

Each time it is processed the router
1. consumes at most one ready flit from each input link, beginning with the port after a rotating pointer,
and moves it to the staging buffer of the output virtual channel granted to its input virtual channel;
2. sends from each output port the flit of a virtual channel selected by [select_flit];
3. runs the virtual channel allocation.

A consumed flit can leave the router `pipeline_stages` cycles later. A head flit asks the next hop for the output virtual channel
when consumed, or a cycle later with more than one stage. A tail flit frees its input virtual channel for the next cycle.

The router keeps processing itself while there are flits in its staging buffers, and keeps running the allocator while there are pending requests.
Violations of the virtual channel protocol make the router panic.
**/
pub struct PipelinedRouter
{
	///Weak pointer to itself, see <https://users.rust-lang.org/t/making-a-rc-refcell-trait2-from-rc-refcell-trait1/16086/3>
	self_rc: Weak<RefCell<PipelinedRouter>>,
	///Its index in the network.
	index: usize,
	parameters: RouterParameters,
	scheduler: Rc<dyn Scheduler>,
	in_links: Vec<Rc<RefCell<dyn InputLink>>>,
	out_links: Vec<Rc<RefCell<dyn OutputLink>>>,
	input_ports: Vec<InputPort>,
	output_ports: Vec<OutputPort>,
	///One row for each output port.
	routing_table: RoutingTable,
	allocator: Box<dyn VcAllocator>,
	///The input port before the first one checked for flits in the next processing.
	round_robin_start: usize,
	///Event to run the allocator in a cycle without processing the whole router.
	arbiter: Rc<RefCell<VcArbiter>>,
	///The cycle number of the last time PipelinedRouter::process was called. Only for debugging/assertion purposes.
	last_process_at_cycle: Option<Time>,
	statistics: RouterStatistics,
}

impl PipelinedRouter
{
	pub fn new(arg:RouterBuilderArgument) -> Rc<RefCell<PipelinedRouter>>
	{
		let arbiter = Rc::new(RefCell::new(VcArbiter{
			self_rc: Weak::new(),
			router: Weak::new(),
		}));
		arbiter.borrow_mut().self_rc = Rc::downgrade(&arbiter);
		let r = Rc::new(RefCell::new(PipelinedRouter{
			self_rc: Weak::new(),
			index: arg.index,
			parameters: arg.parameters.clone(),
			scheduler: arg.scheduler,
			in_links: vec![],
			out_links: vec![],
			input_ports: vec![],
			output_ports: vec![],
			routing_table: RoutingTable::new(),
			allocator: Box::new(SeparableRoundRobin::new()),
			round_robin_start: 0,
			arbiter: arbiter.clone(),
			last_process_at_cycle: None,
			statistics: RouterStatistics::default(),
		}));
		r.borrow_mut().self_rc = Rc::downgrade(&r);
		arbiter.borrow_mut().router = Rc::downgrade(&r);
		r
	}
	///Attach a new input port fed by `link`. Returns the index of the port.
	pub fn add_input_port(&mut self, link:Rc<RefCell<dyn InputLink>>) -> usize
	{
		self.in_links.push(link);
		self.input_ports.push(InputPort::new(self.parameters.num_vcs()));
		self.in_links.len()-1
	}
	///Attach a new output port sending through `link` and reaching the interfaces in `destination` with cost `weight`. Returns the index of the port.
	pub fn add_output_port(&mut self, link:Rc<RefCell<dyn OutputLink>>, destination:NetDest, weight:i32) -> usize
	{
		self.out_links.push(link);
		self.output_ports.push(OutputPort::new(self.parameters.num_vcs(),self.parameters.buffer_size));
		self.routing_table.add_entry(destination,weight)
	}
	pub fn get_index(&self) -> usize
	{
		self.index
	}
	pub fn parameters(&self) -> &RouterParameters
	{
		&self.parameters
	}
	pub fn num_input_ports(&self) -> usize
	{
		self.input_ports.len()
	}
	pub fn num_output_ports(&self) -> usize
	{
		self.output_ports.len()
	}
	pub fn routing_table(&self) -> &RoutingTable
	{
		&self.routing_table
	}
	pub fn input_vc(&self, port:usize, vc:usize) -> &VirtualChannel
	{
		&self.input_ports[port].virtual_channels[vc]
	}
	pub fn output_vc(&self, port:usize, vc:usize) -> &VirtualChannel
	{
		&self.output_ports[port].virtual_channels[vc]
	}
	pub fn staging_buffer(&self, port:usize, vc:usize) -> &FlitBuffer
	{
		&self.output_ports[port].buffers[vc]
	}
	pub fn statistics(&self) -> &RouterStatistics
	{
		&self.statistics
	}
	fn transition_failed(&self, side:&str, port:usize, vc:usize, error:TransitionError) -> !
	{
		panic!("Router {} has made an illegal transition in the virtual channel {} of {} port {} at cycle {}: {}.",self.index,vc,side,port,self.scheduler.now(),error);
	}
	///Move a flit consumed from the input port `entry_port` into the staging buffer of its output virtual channel.
	fn route_compute(&mut self, mut flit:Flit, entry_port:usize, now:Time)
	{
		let entry_vc = flit.vc;
		let input_vc = &self.input_ports[entry_port].virtual_channels[entry_vc];
		let (exit_port,exit_vc) = match (input_vc.route(),input_vc.output_vc())
		{
			(Some(exit_port),Some(exit_vc)) if input_vc.is_in_state(VcStatus::Active,now) => (exit_port,exit_vc),
			_ => panic!("Router {} consumed at cycle {} a flit in the virtual channel {} of input port {}, which has no route ({} since cycle {}).",self.index,now,entry_vc,entry_port,input_vc.state(),input_vc.time()),
		};
		let stages = self.parameters.pipeline_stages as Time;
		flit.time = now + stages - 1;
		flit.vc = exit_vc;
		let head_destination = flit.kind.destination().cloned();
		let is_tail = flit.kind.is_tail();
		log::debug!("Router {} routes flit {} of message {} from ({},{}) to ({},{}) at cycle {}.",self.index,flit.index,flit.message.id,entry_port,entry_vc,exit_port,exit_vc,now);
		let buffer = &mut self.output_ports[exit_port].buffers[exit_vc];
		if buffer.is_full()
		{
			panic!("Router {} overflowed the staging buffer of the virtual channel {} of output port {} at cycle {}.",self.index,exit_vc,exit_port,now);
		}
		buffer.insert(flit);
		self.statistics.routed_flits+=1;
		if stages>1
		{
			self.schedule(self.scheduler.as_ref(),stages-1);
		}
		if let Some(destination) = head_destination
		{
			if !self.output_ports[exit_port].virtual_channels[exit_vc].is_in_state(VcStatus::AllocPending,now)
			{
				let output_vc = &self.output_ports[exit_port].virtual_channels[exit_vc];
				panic!("Router {} received at cycle {} a head for the virtual channel {} of output port {}, which is {} since cycle {} instead of {}.",self.index,now,exit_vc,exit_port,output_vc.state(),output_vc.time(),VcStatus::AllocPending);
			}
			let request_time = if stages>1 { now+1 } else { now };
			self.out_links[exit_port].borrow_mut().request_vc(exit_vc,&destination,request_time);
		}
		if is_tail
		{
			let release_time = now+1;
			if let Err(error) = self.input_ports[entry_port].virtual_channels[entry_vc].release(release_time)
			{
				self.transition_failed("input",entry_port,entry_vc,error);
			}
			self.in_links[entry_port].borrow_mut().release_vc(entry_vc,release_time);
		}
	}
	///Send a flit through each output port that has one eligible.
	fn schedule_output_ports(&mut self, now:Time)
	{
		for exit_port in 0..self.output_ports.len()
		{
			let link = self.out_links[exit_port].clone();
			if let Some(flit) = select_flit(&mut self.output_ports[exit_port],now,|vc|link.borrow().has_buffer_space(vc))
			{
				log::trace!("Router {} sends flit {} of message {} through ({},{}) at cycle {}.",self.index,flit.index,flit.message.id,exit_port,flit.vc,now);
				self.statistics.transmitted_flits+=1;
				let mut link = link.borrow_mut();
				link.enqueue(flit);
				link.schedule(self.scheduler.as_ref(),1);
			}
		}
	}
	///Grant idle output virtual channels to pending input virtual channels.
	pub fn vc_arbitrate(&mut self)
	{
		let now = self.scheduler.now();
		let granted = self.allocator.allocate(&mut self.input_ports,&self.output_ports,&self.parameters,now);
		for VCARequest{entry_port,entry_vc,requested_port,requested_vc} in granted
		{
			if let Err(error) = self.input_ports[entry_port].virtual_channels[entry_vc].grant_output(requested_vc,now)
			{
				self.transition_failed("input",entry_port,entry_vc,error);
			}
			self.in_links[entry_port].borrow_mut().grant_vc(entry_vc,now);
			//It becomes active when the next hop grants its own channel.
			if let Err(error) = self.output_ports[requested_port].virtual_channels[requested_vc].request(None,now)
			{
				self.transition_failed("output",requested_port,requested_vc,error);
			}
			self.statistics.vc_grants+=1;
			log::debug!("Router {} grants ({},{}) to ({},{}) at cycle {}.",self.index,requested_port,requested_vc,entry_port,entry_vc,now);
		}
	}
	///Process again in the next cycle if some flit will be ready to leave.
	fn check_reschedule(&self, now:Time)
	{
		let pending = self.output_ports.iter().any(|port|port.buffers.iter().any(|buffer|buffer.is_ready_for_next(now)));
		if pending
		{
			self.schedule(self.scheduler.as_ref(),1);
		}
	}
	///Run the allocator in the next cycle if some request will be waiting.
	fn check_arbiter_reschedule(&self, now:Time)
	{
		let pending = self.input_ports.iter().any(|port|port.virtual_channels.iter().any(|vc|vc.is_in_state(VcStatus::AllocPending,now+1)));
		if pending
		{
			self.scheduler.schedule_relative(self.arbiter.clone(),1);
		}
	}
}

impl Eventful for PipelinedRouter
{
	///main routine of the router. Do all things that must be done in a cycle, if any.
	fn process(&mut self)
	{
		let now = self.scheduler.now();
		if let Some(last) = self.last_process_at_cycle
		{
			if last >= now
			{
				panic!("Trying to process at cycle {} a router::PipelinedRouter (index {}) already processed at {}",now,self.index,last);
			}
		}
		self.last_process_at_cycle = Some(now);
		log::trace!("Router {} wakes up at cycle {}.",self.index,now);
		for entry_port in round_robin_scan(&mut self.round_robin_start,self.in_links.len())
		{
			let flit = {
				let mut link = self.in_links[entry_port].borrow_mut();
				if link.is_ready(now) { link.consume() } else { None }
			};
			if let Some(flit) = flit
			{
				self.route_compute(flit,entry_port,now);
			}
		}
		self.schedule_output_ports(now);
		self.check_reschedule(now);
		self.vc_arbitrate();
		self.check_arbiter_reschedule(now);
	}
	fn as_eventful(&self) -> Weak<RefCell<dyn Eventful>>
	{
		self.self_rc.clone()
	}
}

impl FlitConsumer for PipelinedRouter
{
	fn request_vc(&mut self, in_port:usize, vc:usize, destination:&NetDest, time:Time)
	{
		let now = self.scheduler.now();
		if time < now
		{
			panic!("Router {} received at cycle {} a request for the virtual channel {} of input port {} at the past cycle {}.",self.index,now,vc,in_port,time);
		}
		let route = match self.routing_table.route(destination)
		{
			Some(route) => route,
			None => panic!("Router {} has no output port towards {:?}, requested for the virtual channel {} of input port {} at cycle {}.",self.index,destination,vc,in_port,now),
		};
		if let Err(error) = self.input_ports[in_port].virtual_channels[vc].request(Some(route),time)
		{
			self.transition_failed("input",in_port,vc,error);
		}
		log::debug!("Router {} routes the virtual channel {} of input port {} to output port {} for cycle {}.",self.index,vc,in_port,route,time);
		if time > now
		{
			self.scheduler.schedule_absolute(self.arbiter.clone(),time);
		}
		else
		{
			self.vc_arbitrate();
		}
	}
	fn free_space(&self, in_port:usize, vc:usize) -> usize
	{
		let input_vc = &self.input_ports[in_port].virtual_channels[vc];
		match (input_vc.route(),input_vc.output_vc())
		{
			(Some(exit_port),Some(exit_vc)) => self.output_ports[exit_port].buffers[exit_vc].free_space(),
			_ => 0,
		}
	}
}

impl FlitSource for PipelinedRouter
{
	fn grant_vc(&mut self, out_port:usize, vc:usize, time:Time)
	{
		if let Err(error) = self.output_ports[out_port].virtual_channels[vc].grant(time)
		{
			self.transition_failed("output",out_port,vc,error);
		}
		self.schedule(self.scheduler.as_ref(),1);
	}
	fn release_vc(&mut self, out_port:usize, vc:usize, time:Time)
	{
		if let Err(error) = self.output_ports[out_port].virtual_channels[vc].release(time)
		{
			self.transition_failed("output",out_port,vc,error);
		}
		self.schedule(self.scheduler.as_ref(),1);
	}
}

///Runs the allocator of a router on its own.
struct VcArbiter
{
	self_rc: Weak<RefCell<VcArbiter>>,
	router: Weak<RefCell<PipelinedRouter>>,
}

impl Eventful for VcArbiter
{
	fn process(&mut self)
	{
		if let Some(router) = self.router.upgrade()
		{
			router.borrow_mut().vc_arbitrate();
		}
	}
	fn as_eventful(&self) -> Weak<RefCell<dyn Eventful>>
	{
		self.self_rc.clone()
	}
}
