
use std::collections::BTreeSet;
use std::rc::Rc;

use rand::prelude::StdRng;
use rand::Rng;

use crate::error::Error;
use crate::event::Time;
use crate::match_object;
use crate::packet::{Message,NetDest};
use crate::traffic::{Traffic,TrafficBuilderArgument,TrafficError};

///Read the fields shared by the basic traffics. Returns `(tasks,message_size,virtual_network)`.
fn check_common(arg:&TrafficBuilderArgument, tasks:Option<usize>, message_size:Option<usize>, virtual_network:Option<usize>) -> Result<(usize,usize,usize),Error>
{
	let tasks = tasks.unwrap_or(arg.interfaces);
	if tasks<2 || tasks>arg.interfaces
	{
		return Err(arg.cv.ill(&format!("A traffic needs between 2 and {} tasks, not {}",arg.interfaces,tasks)));
	}
	let message_size = message_size.ok_or_else(||arg.cv.ill("There were no message_size"))?;
	if message_size==0
	{
		return Err(arg.cv.ill("message_size must be at least 1"));
	}
	Ok((tasks,message_size,virtual_network.unwrap_or(0)))
}

/**
Traffic in which all messages have same size, go to a uniformly random interface other than its origin, and there is no change with time.
**/
#[derive(Debug)]
pub struct Homogeneous
{
	///Number of tasks applying this traffic.
	tasks: usize,
	///The size of each sent message.
	message_size: usize,
	virtual_network: usize,
	///The load offered to the network. Proportion of the cycles that should be injecting flits.
	load: f32,
	///Set of generated messages.
	generated_messages: BTreeSet<usize>,
	///The id of the next message to generate.
	next_id: usize,
}

impl Traffic for Homogeneous
{
	fn generate_message(&mut self, origin:usize, cycle:Time, rng:&mut StdRng) -> Result<Rc<Message>,TrafficError>
	{
		if origin>=self.tasks
		{
			return Err(TrafficError::OriginOutsideTraffic);
		}
		//Uniform among the others.
		let mut destination = rng.gen_range(0..self.tasks-1);
		if destination>=origin
		{
			destination+=1;
		}
		let id = self.next_id;
		self.next_id += 1;
		let message=Rc::new(Message{
			id,
			origin,
			destination: NetDest::single(destination),
			virtual_network: self.virtual_network,
			size: self.message_size,
			creation_cycle: cycle,
			payload: id.to_le_bytes().into(),
		});
		self.generated_messages.insert(id);
		Ok(message)
	}
	fn should_generate(&mut self, origin:usize, _cycle:Time, rng:&mut StdRng) -> bool
	{
		if origin>=self.tasks
		{
			return false;
		}
		let rate = self.load/self.message_size as f32;
		if rate>=1.0
		{
			true
		}
		else
		{
			rng.gen_range(0f32..1f32) < rate
		}
	}
	fn consume(&mut self, message:&Message, _cycle:Time) -> bool
	{
		self.generated_messages.remove(&message.id)
	}
	fn is_finished(&self) -> bool
	{
		false
	}
	fn number_tasks(&self) -> usize
	{
		self.tasks
	}
}

impl Homogeneous
{
	pub fn new(arg:TrafficBuilderArgument) -> Result<Homogeneous,Error>
	{
		let mut tasks=None;
		let mut load=None;
		let mut message_size=None;
		let mut virtual_network=None;
		match_object!(arg.cv,"HomogeneousTraffic",value,
			"tasks" | "interfaces" => tasks=Some(value.as_usize()?),
			"load" => load=Some(value.as_f64()? as f32),
			"message_size" => message_size=Some(value.as_usize()?),
			"virtual_network" => virtual_network=Some(value.as_usize()?),
		);
		let (tasks,message_size,virtual_network) = check_common(&arg,tasks,message_size,virtual_network)?;
		let load=load.ok_or_else(||arg.cv.ill("There were no load"))?;
		if !(0.0..=1.0).contains(&load)
		{
			return Err(arg.cv.ill("load must be between 0 and 1"));
		}
		Ok(Homogeneous{
			tasks,
			message_size,
			virtual_network,
			load,
			generated_messages: BTreeSet::new(),
			next_id: 0,
		})
	}
}

/**
Initialize an amount of messages to send from each task.
The traffic will be considered complete when all tasks have generated their messages and all of them have been consumed.
**/
#[derive(Debug)]
pub struct Burst
{
	///Number of tasks applying this traffic.
	tasks: usize,
	///The size of each sent message.
	message_size: usize,
	virtual_network: usize,
	messages_per_task: usize,
	///The number of messages each task has pending to sent.
	pending_messages: Vec<usize>,
	///Set of generated messages.
	generated_messages: BTreeSet<usize>,
	///The id of the next message to generate.
	next_id: usize,
}

impl Traffic for Burst
{
	fn generate_message(&mut self, origin:usize, cycle:Time, _rng:&mut StdRng) -> Result<Rc<Message>,TrafficError>
	{
		if origin>=self.tasks
		{
			return Err(TrafficError::OriginOutsideTraffic);
		}
		if self.pending_messages[origin]==0
		{
			return Err(TrafficError::NoPendingMessages);
		}
		let sent = self.messages_per_task - self.pending_messages[origin];
		self.pending_messages[origin]-=1;
		let destination = (origin + 1 + sent % (self.tasks-1)) % self.tasks;
		let id = self.next_id;
		self.next_id += 1;
		let message=Rc::new(Message{
			id,
			origin,
			destination: NetDest::single(destination),
			virtual_network: self.virtual_network,
			size: self.message_size,
			creation_cycle: cycle,
			payload: id.to_le_bytes().into(),
		});
		self.generated_messages.insert(id);
		Ok(message)
	}
	fn should_generate(&mut self, origin:usize, _cycle:Time, _rng:&mut StdRng) -> bool
	{
		origin<self.tasks && self.pending_messages[origin]>0
	}
	fn consume(&mut self, message:&Message, _cycle:Time) -> bool
	{
		self.generated_messages.remove(&message.id)
	}
	fn is_finished(&self) -> bool
	{
		self.generated_messages.is_empty() && self.pending_messages.iter().all(|&pending|pending==0)
	}
	fn number_tasks(&self) -> usize
	{
		self.tasks
	}
}

impl Burst
{
	pub fn new(arg:TrafficBuilderArgument) -> Result<Burst,Error>
	{
		let mut tasks=None;
		let mut messages_per_task=None;
		let mut message_size=None;
		let mut virtual_network=None;
		match_object!(arg.cv,"Burst",value,
			"tasks" | "interfaces" => tasks=Some(value.as_usize()?),
			"messages_per_interface" | "messages_per_task" => messages_per_task=Some(value.as_usize()?),
			"message_size" => message_size=Some(value.as_usize()?),
			"virtual_network" => virtual_network=Some(value.as_usize()?),
		);
		let (tasks,message_size,virtual_network) = check_common(&arg,tasks,message_size,virtual_network)?;
		let messages_per_task=messages_per_task.ok_or_else(||arg.cv.ill("There were no messages_per_interface"))?;
		Ok(Burst{
			tasks,
			message_size,
			virtual_network,
			messages_per_task,
			pending_messages: vec![messages_per_task;tasks],
			generated_messages: BTreeSet::new(),
			next_id: 0,
		})
	}
	///The virtual network of the generated messages.
	pub fn virtual_network(&self) -> usize
	{
		self.virtual_network
	}
}
