/*!

A Traffic decides which messages the network interfaces create and when.

see [`new_traffic`](fn.new_traffic.html) for documentation on the configuration syntax of predefined traffics.

*/

pub mod basic;

use std::fmt::{self,Display,Formatter};
use std::rc::Rc;

use ::rand::rngs::StdRng;

use crate::config::ConfigurationValue;
use crate::error::Error;
use crate::event::Time;
use crate::packet::Message;

pub use self::basic::{Homogeneous,Burst};

///Possible errors when trying to generate a message with a `Traffic`.
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum TrafficError
{
	///The traffic tried to send a message outside the network range.
	OriginOutsideTraffic,
	///A message was generated from an interface towards itself.
	SelfMessage,
	///The interface had nothing else to send.
	NoPendingMessages,
}

impl Display for TrafficError
{
	fn fmt(&self, formatter:&mut Formatter) -> fmt::Result
	{
		let text = match self
		{
			TrafficError::OriginOutsideTraffic => "origin outside the traffic",
			TrafficError::SelfMessage => "message towards its own origin",
			TrafficError::NoPendingMessages => "no pending messages",
		};
		write!(formatter,"{}",text)
	}
}

///A traffic to be offered to a network. Each interface is a task of the traffic.
pub trait Traffic
{
	///Returns a new message following the traffic. The `message.id` is given by the traffic.
	fn generate_message(&mut self, origin:usize, cycle:Time, rng:&mut StdRng) -> Result<Rc<Message>,TrafficError>;
	///Whether the interface `origin` should create a message at cycle `cycle`.
	fn should_generate(&mut self, origin:usize, cycle:Time, rng:&mut StdRng) -> bool;
	///Inform the traffic that `message` has been delivered. Returns whether the message belonged to the traffic.
	fn consume(&mut self, message:&Message, cycle:Time) -> bool;
	///Whether every message of the traffic has been generated and consumed.
	fn is_finished(&self) -> bool;
	///The number of interfaces taking part in the traffic.
	fn number_tasks(&self) -> usize;
}

#[non_exhaustive]
pub struct TrafficBuilderArgument<'a>
{
	///A ConfigurationValue::Object defining the traffic.
	pub cv: &'a ConfigurationValue,
	///The number of interfaces in the network, used when the traffic does not give its tasks.
	pub interfaces: usize,
}

/**Build a new traffic.

Uniform traffic, in which each interface sends messages to random interfaces other than itself.
```ignore
HomogeneousTraffic{
	load: 0.3,//flits per cycle offered by each interface.
	message_size: 4,
	virtual_network: 0,//optional, defaults to 0.
	tasks: 16,//optional, defaults to the number of interfaces.
}
```

A fixed amount of messages per interface, all generated as soon as possible. The `k`-th message of interface `i` goes to interface `i+1+(k mod (tasks-1))`, modulo the number of tasks.
The traffic is finished when every message has been consumed.
```ignore
Burst{
	messages_per_interface: 10,
	message_size: 4,
	virtual_network: 0,//optional
	tasks: 16,//optional
}
```
**/
pub fn new_traffic(arg:TrafficBuilderArgument) -> Result<Box<dyn Traffic>,Error>
{
	if let &ConfigurationValue::Object(ref cv_name, ref _cv_pairs)=arg.cv
	{
		match cv_name.as_ref()
		{
			"HomogeneousTraffic" => Ok(Box::new(Homogeneous::new(arg)?)),
			"Burst" => Ok(Box::new(Burst::new(arg)?)),
			_ => Err(arg.cv.ill(&format!("Unknown traffic {}",cv_name))),
		}
	}
	else
	{
		Err(arg.cv.ill("Trying to create a Traffic from a non-Object"))
	}
}
