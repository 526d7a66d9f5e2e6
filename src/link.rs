/*!

Unidirectional links between routers and network interfaces.

A [NetworkLink] carries flits from a [FlitSource] to a [FlitConsumer] with a fixed latency, and the virtual channel handshake in both directions.
Handshake signals are not delivered by calling the other end directly, since it may be the component currently being processed.
Instead each signal becomes a one-shot event scheduled at the time it refers to.

*/

use std::cell::RefCell;
use std::rc::{Rc,Weak};

use crate::event::{Eventful,Scheduler,Time};
use crate::measures::LinkStatistics;
use crate::packet::{Flit,FlitBuffer,NetDest};
use crate::router::{InputLink,OutputLink,FlitConsumer,FlitSource};

pub struct LinkBuilderArgument
{
	///The index of the link in the network. Used to identify it in logs.
	pub index: usize,
	///Cycles to cross the link. At least 1.
	pub latency: Time,
	///Virtual channels in each port, to size the statistics.
	pub num_vcs: usize,
	pub scheduler: Rc<dyn Scheduler>,
	pub source: Weak<RefCell<dyn FlitSource>>,
	///The output port of the source attached to the link.
	pub source_port: usize,
	pub consumer: Weak<RefCell<dyn FlitConsumer>>,
	///The input port of the consumer attached to the link.
	pub consumer_port: usize,
}

pub struct NetworkLink
{
	///Weak pointer to itself, see <https://users.rust-lang.org/t/making-a-rc-refcell-trait2-from-rc-refcell-trait1/16086/3>
	self_rc: Weak<RefCell<NetworkLink>>,
	index: usize,
	latency: Time,
	scheduler: Rc<dyn Scheduler>,
	source: Weak<RefCell<dyn FlitSource>>,
	source_port: usize,
	consumer: Weak<RefCell<dyn FlitConsumer>>,
	consumer_port: usize,
	///Flits given by the source, waiting to enter the link.
	source_queue: FlitBuffer,
	///Flits crossing the link, stamped with their arrival.
	link_buffer: FlitBuffer,
	statistics: LinkStatistics,
}

impl NetworkLink
{
	pub fn new(arg:LinkBuilderArgument) -> Rc<RefCell<NetworkLink>>
	{
		assert!(arg.latency>=1,"The latency of a link must be at least 1.");
		let r = Rc::new(RefCell::new(NetworkLink{
			self_rc: Weak::new(),
			index: arg.index,
			latency: arg.latency,
			scheduler: arg.scheduler,
			source: arg.source,
			source_port: arg.source_port,
			consumer: arg.consumer,
			consumer_port: arg.consumer_port,
			source_queue: FlitBuffer::new(),
			link_buffer: FlitBuffer::new(),
			statistics: LinkStatistics::new(arg.num_vcs),
		}));
		r.borrow_mut().self_rc = Rc::downgrade(&r);
		r
	}
	pub fn get_index(&self) -> usize
	{
		self.index
	}
	pub fn latency(&self) -> Time
	{
		self.latency
	}
	pub fn statistics(&self) -> &LinkStatistics
	{
		&self.statistics
	}
	///Flits of the virtual channel `vc` given by the source and not yet consumed.
	pub fn flits_in_flight(&self, vc:usize) -> usize
	{
		self.source_queue.iter().chain(self.link_buffer.iter()).filter(|flit|flit.vc==vc).count()
	}
	///Whether no flit is inside the link.
	pub fn is_empty(&self) -> bool
	{
		self.source_queue.is_empty() && self.link_buffer.is_empty()
	}
}

impl Eventful for NetworkLink
{
	fn process(&mut self)
	{
		let now = self.scheduler.now();
		if self.source_queue.is_ready(now)
		{
			if let Some(mut flit) = self.source_queue.pop()
			{
				flit.time = now + self.latency;
				self.statistics.track_flit(flit.vc);
				log::trace!("Link {} carries flit {} of message {} in virtual channel {} at cycle {}.",self.index,flit.index,flit.message.id,flit.vc,now);
				self.link_buffer.insert(flit);
				if let Some(consumer) = self.consumer.upgrade()
				{
					consumer.borrow().schedule(self.scheduler.as_ref(),self.latency);
				}
			}
		}
		if self.source_queue.is_ready_for_next(now)
		{
			self.schedule(self.scheduler.as_ref(),1);
		}
	}
	fn as_eventful(&self) -> Weak<RefCell<dyn Eventful>>
	{
		self.self_rc.clone()
	}
}

impl InputLink for NetworkLink
{
	fn is_ready(&self, now:Time) -> bool
	{
		self.link_buffer.is_ready(now)
	}
	fn peek(&self) -> Option<&Flit>
	{
		self.link_buffer.peek()
	}
	fn consume(&mut self) -> Option<Flit>
	{
		self.link_buffer.pop()
	}
	fn grant_vc(&mut self, vc:usize, time:Time)
	{
		HandshakeEvent::send(self.scheduler.as_ref(),self.index,Handshake::Grant{ source:self.source.clone(), port:self.source_port, vc },time);
	}
	fn release_vc(&mut self, vc:usize, time:Time)
	{
		HandshakeEvent::send(self.scheduler.as_ref(),self.index,Handshake::Release{ source:self.source.clone(), port:self.source_port, vc },time);
	}
}

impl OutputLink for NetworkLink
{
	fn request_vc(&mut self, vc:usize, destination:&NetDest, time:Time)
	{
		let signal = Handshake::Request{
			consumer: self.consumer.clone(),
			port: self.consumer_port,
			vc,
			destination: destination.clone(),
		};
		HandshakeEvent::send(self.scheduler.as_ref(),self.index,signal,time);
	}
	fn has_buffer_space(&self, vc:usize) -> bool
	{
		match self.consumer.upgrade()
		{
			Some(consumer) => consumer.borrow().free_space(self.consumer_port,vc) > self.flits_in_flight(vc),
			None => false,
		}
	}
	fn enqueue(&mut self, flit:Flit)
	{
		self.source_queue.insert(flit);
	}
}

///A virtual channel handshake signal travelling through a link.
enum Handshake
{
	Request{
		consumer: Weak<RefCell<dyn FlitConsumer>>,
		port: usize,
		vc: usize,
		destination: NetDest,
	},
	Grant{
		source: Weak<RefCell<dyn FlitSource>>,
		port: usize,
		vc: usize,
	},
	Release{
		source: Weak<RefCell<dyn FlitSource>>,
		port: usize,
		vc: usize,
	},
}

///Delivers a single handshake signal when processed.
struct HandshakeEvent
{
	self_rc: Weak<RefCell<HandshakeEvent>>,
	///The link carrying the signal.
	link: usize,
	time: Time,
	signal: Option<Handshake>,
}

impl HandshakeEvent
{
	fn send(scheduler:&dyn Scheduler, link:usize, signal:Handshake, time:Time)
	{
		let event = Rc::new(RefCell::new(HandshakeEvent{
			self_rc: Weak::new(),
			link,
			time,
			signal: Some(signal),
		}));
		event.borrow_mut().self_rc = Rc::downgrade(&event);
		scheduler.schedule_absolute(event,time);
	}
}

impl Eventful for HandshakeEvent
{
	fn process(&mut self)
	{
		let time = self.time;
		match self.signal.take()
		{
			Some(Handshake::Request{consumer,port,vc,destination}) =>
			{
				log::debug!("Link {} delivers a request for virtual channel {} towards {:?} at cycle {}.",self.link,vc,destination,time);
				if let Some(consumer) = consumer.upgrade()
				{
					consumer.borrow_mut().request_vc(port,vc,&destination,time);
				}
			},
			Some(Handshake::Grant{source,port,vc}) =>
			{
				log::debug!("Link {} delivers the grant of virtual channel {} at cycle {}.",self.link,vc,time);
				if let Some(source) = source.upgrade()
				{
					source.borrow_mut().grant_vc(port,vc,time);
				}
			},
			Some(Handshake::Release{source,port,vc}) =>
			{
				log::debug!("Link {} delivers the release of virtual channel {} at cycle {}.",self.link,vc,time);
				if let Some(source) = source.upgrade()
				{
					source.borrow_mut().release_vc(port,vc,time);
				}
			},
			None => panic!("The handshake event of link {} has been processed twice.",self.link),
		}
	}
	fn as_eventful(&self) -> Weak<RefCell<dyn Eventful>>
	{
		self.self_rc.clone()
	}
}
