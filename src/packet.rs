/*!

Messages, the flits they are cut into, and the buffers holding flits.

A [Message] is created by a network interface and delivered to every interface in its destination set.
It travels as a sequence of [Flit]s: a head, some bodies and a tail; or a single head-tail flit for one-flit messages.
Only the head kind of flits carry the destination set, which is all the router needs from the message.

*/

use std::collections::{BTreeSet,VecDeque};
use std::iter::FromIterator;
use std::rc::Rc;

use crate::event::Time;

///A set of network interfaces.
#[derive(Debug,Clone,Default,PartialEq,Eq)]
pub struct NetDest
{
	members: BTreeSet<usize>,
}

impl NetDest
{
	pub fn new() -> NetDest
	{
		NetDest::default()
	}
	pub fn single(interface:usize) -> NetDest
	{
		let mut set = NetDest::new();
		set.add(interface);
		set
	}
	pub fn add(&mut self, interface:usize)
	{
		self.members.insert(interface);
	}
	pub fn contains(&self, interface:usize) -> bool
	{
		self.members.contains(&interface)
	}
	pub fn is_empty(&self) -> bool
	{
		self.members.is_empty()
	}
	pub fn len(&self) -> usize
	{
		self.members.len()
	}
	///Whether some interface belongs to both sets.
	pub fn intersection_is_not_empty(&self, other:&NetDest) -> bool
	{
		!self.members.is_disjoint(&other.members)
	}
	pub fn iter(&self) -> impl Iterator<Item=usize> + '_
	{
		self.members.iter().copied()
	}
}

impl FromIterator<usize> for NetDest
{
	fn from_iter<I:IntoIterator<Item=usize>>(iter:I) -> NetDest
	{
		NetDest{ members: iter.into_iter().collect() }
	}
}

///A message as created by a network interface. The router never looks into it.
#[derive(Debug,Clone,PartialEq)]
pub struct Message
{
	///Unique among the messages of a simulation.
	pub id: usize,
	///The interface that created the message.
	pub origin: usize,
	pub destination: NetDest,
	///The virtual network (traffic class) of the message. It selects the usable virtual channels.
	pub virtual_network: usize,
	///Size in flits. At least 1.
	pub size: usize,
	pub creation_cycle: Time,
	pub payload: Vec<u8>,
}

///The position of a flit inside its message.
#[derive(Debug,Clone,PartialEq)]
pub enum FlitKind
{
	Head(NetDest),
	Body,
	Tail,
	HeadTail(NetDest),
}

impl FlitKind
{
	///The destination, carried only by head kinds.
	pub fn destination(&self) -> Option<&NetDest>
	{
		match self
		{
			FlitKind::Head(destination) | FlitKind::HeadTail(destination) => Some(destination),
			FlitKind::Body | FlitKind::Tail => None,
		}
	}
	pub fn is_head(&self) -> bool
	{
		matches!(self, FlitKind::Head(_) | FlitKind::HeadTail(_))
	}
	pub fn is_tail(&self) -> bool
	{
		matches!(self, FlitKind::Tail | FlitKind::HeadTail(_))
	}
}

#[derive(Debug,Clone)]
pub struct Flit
{
	pub kind: FlitKind,
	///The virtual channel for the current hop. Rewritten by each router.
	pub vc: usize,
	///The cycle at which the flit becomes available where it is currently stored.
	pub time: Time,
	pub message: Rc<Message>,
	///Index of the flit inside its message.
	pub index: usize,
}

impl Flit
{
	///Cut a message into its flits, all of them in virtual channel `vc` and available at cycle `time`.
	pub fn split(message:&Rc<Message>, vc:usize, time:Time) -> Vec<Flit>
	{
		assert!(message.size>=1,"Messages must have at least one flit.");
		(0..message.size).map(|index|{
			let kind = if message.size==1
			{
				FlitKind::HeadTail(message.destination.clone())
			}
			else if index==0
			{
				FlitKind::Head(message.destination.clone())
			}
			else if index+1==message.size
			{
				FlitKind::Tail
			}
			else
			{
				FlitKind::Body
			};
			Flit{ kind, vc, time, message:message.clone(), index }
		}).collect()
	}
}

///A FIFO of flits ordered by their time stamps.
#[derive(Debug,Clone)]
pub struct FlitBuffer
{
	flits: VecDeque<Flit>,
	///Maximum number of flits, if bounded.
	capacity: Option<usize>,
}

impl FlitBuffer
{
	pub fn new() -> FlitBuffer
	{
		FlitBuffer{ flits: VecDeque::new(), capacity: None }
	}
	pub fn with_capacity(capacity:usize) -> FlitBuffer
	{
		FlitBuffer{ flits: VecDeque::with_capacity(capacity), capacity: Some(capacity) }
	}
	///Whether the oldest flit is available at cycle `now`.
	pub fn is_ready(&self, now:Time) -> bool
	{
		self.flits.front().map_or(false,|flit|flit.time<=now)
	}
	///Whether the oldest flit will be available at cycle `now+1`.
	pub fn is_ready_for_next(&self, now:Time) -> bool
	{
		self.flits.front().map_or(false,|flit|flit.time<=now+1)
	}
	pub fn peek(&self) -> Option<&Flit>
	{
		self.flits.front()
	}
	pub fn pop(&mut self) -> Option<Flit>
	{
		self.flits.pop_front()
	}
	pub fn insert(&mut self, flit:Flit)
	{
		if let Some(back) = self.flits.back()
		{
			debug_assert!(back.time<=flit.time,"flits must be inserted in time order");
		}
		self.flits.push_back(flit);
	}
	pub fn len(&self) -> usize
	{
		self.flits.len()
	}
	pub fn is_empty(&self) -> bool
	{
		self.flits.is_empty()
	}
	pub fn is_full(&self) -> bool
	{
		self.capacity.map_or(false,|capacity|self.flits.len()>=capacity)
	}
	///Free slots, or `usize::MAX` for unbounded buffers.
	pub fn free_space(&self) -> usize
	{
		self.capacity.map_or(usize::MAX,|capacity|capacity.saturating_sub(self.flits.len()))
	}
	pub fn iter(&self) -> impl Iterator<Item=&Flit>
	{
		self.flits.iter()
	}
}

impl Default for FlitBuffer
{
	fn default() -> FlitBuffer
	{
		FlitBuffer::new()
	}
}
