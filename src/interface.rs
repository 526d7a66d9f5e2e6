/*!

Network interfaces, the endpoints that inject messages into the network and eject them from it.

Each interface is attached to a router by a pair of links, using port 0 of the interface in both directions.

*/

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc,Weak};

use crate::event::{Eventful,Scheduler,Time};
use crate::measures::InterfaceStatistics;
use crate::packet::{Flit,FlitBuffer,Message,NetDest};
use crate::router::{RouterParameters,InputLink,OutputLink,FlitConsumer,FlitSource,VirtualChannel,VcStatus,round_robin_scan};

/**
A network interface.

Injection keeps a queue of messages for each virtual network. The message at the front of a queue takes the first idle
virtual channel among those its virtual network may use, requests it from the router and is cut into flits.
A flit per cycle is sent, selecting among the virtual channels in round robin those granted by the router with space in the link.

Ejection grants every request immediately and consumes a flit per cycle. When a tail arrives the message is delivered
and its virtual channel freed for the next cycle.
**/
pub struct NetworkInterface
{
	///Weak pointer to itself, see <https://users.rust-lang.org/t/making-a-rc-refcell-trait2-from-rc-refcell-trait1/16086/3>
	self_rc: Weak<RefCell<NetworkInterface>>,
	///Its index in the network. Messages towards this index are delivered here.
	index: usize,
	parameters: RouterParameters,
	scheduler: Rc<dyn Scheduler>,
	///The link towards the router.
	out_link: Option<Rc<RefCell<dyn OutputLink>>>,
	///The link from the router.
	in_link: Option<Rc<RefCell<dyn InputLink>>>,
	///`message_queues[vnet]` holds the messages of the virtual network `vnet` not yet cut into flits.
	message_queues: Vec<VecDeque<Rc<Message>>>,
	///The state of the virtual channels of the router's input port.
	injection_vcs: Vec<VirtualChannel>,
	///`injection_buffers[vc]` holds the flits waiting to be sent in the virtual channel `vc`.
	injection_buffers: Vec<FlitBuffer>,
	round_robin_vc: usize,
	///The state of the virtual channels of the router's output port.
	ejection_vcs: Vec<VirtualChannel>,
	///Messages delivered and not yet given to the traffic.
	consumed_messages: Vec<Rc<Message>>,
	statistics: InterfaceStatistics,
}

impl NetworkInterface
{
	pub fn new(index:usize, parameters:&RouterParameters, scheduler:Rc<dyn Scheduler>) -> Rc<RefCell<NetworkInterface>>
	{
		let num_vcs = parameters.num_vcs();
		let r = Rc::new(RefCell::new(NetworkInterface{
			self_rc: Weak::new(),
			index,
			parameters: parameters.clone(),
			scheduler,
			out_link: None,
			in_link: None,
			message_queues: vec![VecDeque::new();parameters.virtual_networks],
			injection_vcs: (0..num_vcs).map(VirtualChannel::new).collect(),
			injection_buffers: vec![FlitBuffer::new();num_vcs],
			round_robin_vc: 0,
			ejection_vcs: (0..num_vcs).map(VirtualChannel::new).collect(),
			consumed_messages: vec![],
			statistics: InterfaceStatistics::new(),
		}));
		r.borrow_mut().self_rc = Rc::downgrade(&r);
		r
	}
	pub fn get_index(&self) -> usize
	{
		self.index
	}
	pub fn set_out_link(&mut self, link:Rc<RefCell<dyn OutputLink>>)
	{
		self.out_link = Some(link);
	}
	pub fn set_in_link(&mut self, link:Rc<RefCell<dyn InputLink>>)
	{
		self.in_link = Some(link);
	}
	pub fn has_out_link(&self) -> bool
	{
		self.out_link.is_some()
	}
	pub fn has_in_link(&self) -> bool
	{
		self.in_link.is_some()
	}
	///Queue a message to be sent and process the interface in the current cycle.
	pub fn enqueue_message(&mut self, message:Rc<Message>)
	{
		let vnet = message.virtual_network;
		if vnet>=self.message_queues.len()
		{
			panic!("Interface {} received message {} for the virtual network {}, but there are only {}.",self.index,message.id,vnet,self.message_queues.len());
		}
		self.message_queues[vnet].push_back(message);
		self.statistics.track_created_message();
		self.schedule(self.scheduler.as_ref(),0);
	}
	///Remove the messages delivered since the last call.
	pub fn take_consumed_messages(&mut self) -> Vec<Rc<Message>>
	{
		std::mem::take(&mut self.consumed_messages)
	}
	///Whether the interface has nothing waiting to be sent.
	pub fn is_idle(&self) -> bool
	{
		self.message_queues.iter().all(|queue|queue.is_empty()) && self.injection_buffers.iter().all(|buffer|buffer.is_empty())
	}
	pub fn statistics(&self) -> &InterfaceStatistics
	{
		&self.statistics
	}
	pub fn injection_vc(&self, vc:usize) -> &VirtualChannel
	{
		&self.injection_vcs[vc]
	}
	pub fn ejection_vc(&self, vc:usize) -> &VirtualChannel
	{
		&self.ejection_vcs[vc]
	}
	fn out_link(&self) -> &Rc<RefCell<dyn OutputLink>>
	{
		match self.out_link
		{
			Some(ref link) => link,
			None => panic!("Interface {} is not attached to a router.",self.index),
		}
	}
	///Give a virtual channel to the message at the front of each queue.
	fn flitisize(&mut self, now:Time)
	{
		for vnet in 0..self.message_queues.len()
		{
			let message = match self.message_queues[vnet].front()
			{
				Some(message) => message.clone(),
				None => continue,
			};
			let base = self.parameters.partition(vnet).start;
			let injection_vcs = &self.injection_vcs;
			let injection_buffers = &self.injection_buffers;
			let vc = match self.parameters.valid_vcs(base).find(|&vc|injection_vcs[vc].is_in_state(VcStatus::Idle,now) && injection_buffers[vc].is_empty())
			{
				Some(vc) => vc,
				None => continue,
			};
			self.message_queues[vnet].pop_front();
			if let Err(error) = self.injection_vcs[vc].request(None,now)
			{
				panic!("Interface {} has made an illegal transition in the virtual channel {} at cycle {}: {}.",self.index,vc,now,error);
			}
			self.out_link().borrow_mut().request_vc(vc,&message.destination,now);
			log::debug!("Interface {} injects message {} in virtual channel {} at cycle {}.",self.index,message.id,vc,now);
			for flit in Flit::split(&message,vc,now)
			{
				self.injection_buffers[vc].insert(flit);
			}
		}
	}
	///Send a flit of some granted virtual channel.
	fn send_flit(&mut self, now:Time)
	{
		let link = self.out_link().clone();
		for vc in round_robin_scan(&mut self.round_robin_vc,self.injection_vcs.len())
		{
			if !self.injection_buffers[vc].is_ready(now) || !self.injection_vcs[vc].is_in_state(VcStatus::Active,now)
			{
				continue;
			}
			if !link.borrow().has_buffer_space(vc)
			{
				continue;
			}
			if let Some(mut flit) = self.injection_buffers[vc].pop()
			{
				flit.time = now+1;
				self.statistics.track_created_flit(now);
				let mut link = link.borrow_mut();
				link.enqueue(flit);
				link.schedule(self.scheduler.as_ref(),1);
			}
			break;
		}
	}
	///Consume a flit arrived from the router.
	fn receive_flit(&mut self, now:Time)
	{
		let flit = match self.in_link
		{
			Some(ref link) =>
			{
				let mut link = link.borrow_mut();
				if link.is_ready(now) { link.consume() } else { None }
			},
			None => None,
		};
		let flit = match flit
		{
			Some(flit) => flit,
			None => return,
		};
		if !self.ejection_vcs[flit.vc].is_in_state(VcStatus::Active,now)
		{
			panic!("Interface {} received at cycle {} a flit in the virtual channel {}, which has not been granted.",self.index,now,flit.vc);
		}
		self.statistics.track_consumed_flit();
		if flit.kind.is_tail()
		{
			let message = flit.message;
			if !message.destination.contains(self.index)
			{
				panic!("Interface {} received message {} towards {:?}.",self.index,message.id,message.destination);
			}
			if let Err(error) = self.ejection_vcs[flit.vc].release(now+1)
			{
				panic!("Interface {} has made an illegal transition in the virtual channel {} at cycle {}: {}.",self.index,flit.vc,now,error);
			}
			if let Some(ref link) = self.in_link
			{
				link.borrow_mut().release_vc(flit.vc,now+1);
			}
			let delay = now - message.creation_cycle;
			log::debug!("Interface {} consumes message {} with a delay of {} cycles at cycle {}.",self.index,message.id,delay,now);
			self.statistics.track_consumed_message(delay,now);
			self.consumed_messages.push(message);
		}
	}
}

impl Eventful for NetworkInterface
{
	fn process(&mut self)
	{
		let now = self.scheduler.now();
		log::trace!("Interface {} wakes up at cycle {}.",self.index,now);
		self.flitisize(now);
		self.send_flit(now);
		self.receive_flit(now);
		let waiting_messages = self.message_queues.iter().any(|queue|!queue.is_empty());
		let waiting_flits = self.injection_buffers.iter().any(|buffer|buffer.is_ready_for_next(now));
		let arriving_flits = match self.in_link
		{
			Some(ref link) => link.borrow().is_ready(now+1),
			None => false,
		};
		if waiting_messages || waiting_flits || arriving_flits
		{
			self.schedule(self.scheduler.as_ref(),1);
		}
	}
	fn as_eventful(&self) -> Weak<RefCell<dyn Eventful>>
	{
		self.self_rc.clone()
	}
}

impl FlitConsumer for NetworkInterface
{
	fn request_vc(&mut self, _in_port:usize, vc:usize, destination:&NetDest, time:Time)
	{
		if !destination.contains(self.index)
		{
			panic!("Interface {} has been asked for the virtual channel {} for a message towards {:?} at cycle {}.",self.index,vc,destination,time);
		}
		let ejection_vc = &mut self.ejection_vcs[vc];
		if let Err(error) = ejection_vc.request(None,time).and_then(|_|ejection_vc.grant(time))
		{
			panic!("Interface {} has made an illegal transition in the virtual channel {} at cycle {}: {}.",self.index,vc,time,error);
		}
		if let Some(ref link) = self.in_link
		{
			link.borrow_mut().grant_vc(vc,time);
		}
	}
	fn free_space(&self, _in_port:usize, _vc:usize) -> usize
	{
		usize::MAX
	}
}

impl FlitSource for NetworkInterface
{
	fn grant_vc(&mut self, _out_port:usize, vc:usize, time:Time)
	{
		if let Err(error) = self.injection_vcs[vc].grant(time)
		{
			panic!("Interface {} has made an illegal transition in the virtual channel {} at cycle {}: {}.",self.index,vc,time,error);
		}
		self.schedule(self.scheduler.as_ref(),1);
	}
	fn release_vc(&mut self, _out_port:usize, vc:usize, time:Time)
	{
		if let Err(error) = self.injection_vcs[vc].release(time)
		{
			panic!("Interface {} has made an illegal transition in the virtual channel {} at cycle {}: {}.",self.index,vc,time,error);
		}
		self.schedule(self.scheduler.as_ref(),1);
	}
}
