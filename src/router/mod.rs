/*!

The router and the interfaces through which it talks with the rest of the network.

A router receives flits from its input links and forwards them through its output links.
Before a message can be sent through an output port, its input virtual channel must obtain a virtual channel of that port,
which in turn is requested to the next hop. See [PipelinedRouter] for the timing of each step.

The parameters shared by every router are given as
```ignore
RouterParameters
{
	virtual_networks: 2,//classes of traffic. A message never changes its class.
	vcs_per_class: 4,//virtual channels for each class.
	buffer_size: 4,//capacity in flits of each staging buffer.
	pipeline_stages: 2,//cycles from the consumption of a flit until it may be sent. At least 1.
	ordered_virtual_networks: [true,false],//optional. Ordered classes only use their first virtual channel, so that messages do not overtake each other.
}
```

*/

pub mod virtual_channel;
pub mod port;
pub mod switch;
pub mod pipelined;

use std::ops::Range;
use std::rc::Rc;

use crate::config::ConfigurationValue;
use crate::error::Error;
use crate::event::{Eventful,Scheduler,Time};
use crate::packet::{Flit,NetDest};
use crate::match_object;

pub use self::virtual_channel::{VirtualChannel,VcStatus,TransitionError};
pub use self::port::{InputPort,OutputPort};
pub use self::pipelined::PipelinedRouter;

///The configuration shared by all the routers of a network.
#[derive(Debug,Clone,PartialEq)]
pub struct RouterParameters
{
	pub virtual_networks: usize,
	pub vcs_per_class: usize,
	///Capacity of each staging buffer, in flits.
	pub buffer_size: usize,
	pub pipeline_stages: usize,
	///`ordered_virtual_networks[vnet]` tells whether the virtual network `vnet` must deliver its messages in order.
	pub ordered_virtual_networks: Vec<bool>,
}

impl RouterParameters
{
	pub fn from_cv(cv:&ConfigurationValue) -> Result<RouterParameters,Error>
	{
		let mut virtual_networks = None;
		let mut vcs_per_class = None;
		let mut buffer_size = None;
		let mut pipeline_stages = None;
		let mut ordered_virtual_networks = None;
		match_object!(cv,"RouterParameters",value,
			"virtual_networks" => virtual_networks = Some(value.as_usize()?),
			"vcs_per_class" => vcs_per_class = Some(value.as_usize()?),
			"buffer_size" => buffer_size = Some(value.as_usize()?),
			"pipeline_stages" => pipeline_stages = Some(value.as_usize()?),
			"ordered_virtual_networks" => ordered_virtual_networks = Some(value.as_array()?.iter().map(|v|v.as_bool()).collect::<Result<Vec<bool>,Error>>()?),
		);
		let virtual_networks = virtual_networks.ok_or_else(||cv.ill("There were no virtual_networks"))?;
		let vcs_per_class = vcs_per_class.ok_or_else(||cv.ill("There were no vcs_per_class"))?;
		let buffer_size = buffer_size.ok_or_else(||cv.ill("There were no buffer_size"))?;
		let pipeline_stages = pipeline_stages.ok_or_else(||cv.ill("There were no pipeline_stages"))?;
		let ordered_virtual_networks = ordered_virtual_networks.unwrap_or_else(||vec![false;virtual_networks]);
		if virtual_networks==0 || vcs_per_class==0
		{
			return Err(cv.ill("A router needs at least one virtual channel"));
		}
		if buffer_size==0
		{
			return Err(cv.ill("buffer_size must be greater than 0"));
		}
		if pipeline_stages==0
		{
			return Err(cv.ill("pipeline_stages must be at least 1"));
		}
		if ordered_virtual_networks.len()!=virtual_networks
		{
			return Err(cv.ill(&format!("ordered_virtual_networks has {} values for {} virtual networks",ordered_virtual_networks.len(),virtual_networks)));
		}
		Ok(RouterParameters{
			virtual_networks,
			vcs_per_class,
			buffer_size,
			pipeline_stages,
			ordered_virtual_networks,
		})
	}
	///Virtual channels in each port.
	pub fn num_vcs(&self) -> usize
	{
		self.virtual_networks*self.vcs_per_class
	}
	pub fn virtual_network_of(&self, vc:usize) -> usize
	{
		vc/self.vcs_per_class
	}
	///The virtual channels of the virtual network `vnet`.
	pub fn partition(&self, vnet:usize) -> Range<usize>
	{
		let base = vnet*self.vcs_per_class;
		base..base+self.vcs_per_class
	}
	///The output virtual channels that the input virtual channel `vc` may take, in the order in which they are tried.
	pub fn valid_vcs(&self, vc:usize) -> Range<usize>
	{
		let vnet = self.virtual_network_of(vc);
		let partition = self.partition(vnet);
		if self.ordered_virtual_networks[vnet]
		{
			partition.start..partition.start+1
		}
		else
		{
			partition
		}
	}
}

///Advance the round robin `pointer` over `len` elements. The returned order begins just after the old value of the pointer.
pub fn round_robin_scan(pointer:&mut usize, len:usize) -> impl Iterator<Item=usize>
{
	let start = *pointer;
	if len>0
	{
		*pointer = (start+1)%len;
	}
	(1..=len).map(move |offset|(start+offset)%len)
}

///The link feeding an input port, as seen by the router.
pub trait InputLink
{
	///Whether there is a flit to consume at cycle `now`.
	fn is_ready(&self, now:Time) -> bool;
	fn peek(&self) -> Option<&Flit>;
	fn consume(&mut self) -> Option<Flit>;
	///Tell the upstream component that its request for the virtual channel `vc` has been granted at `time`.
	fn grant_vc(&mut self, vc:usize, time:Time);
	///Tell the upstream component that the virtual channel `vc` is free again since `time`.
	fn release_vc(&mut self, vc:usize, time:Time);
}

///The link behind an output port, as seen by the router.
pub trait OutputLink : Eventful
{
	///Ask the downstream component for the virtual channel `vc`, to be considered at `time`.
	fn request_vc(&mut self, vc:usize, destination:&NetDest, time:Time);
	///Whether the downstream component can hold another flit of `vc`.
	fn has_buffer_space(&self, vc:usize) -> bool;
	fn enqueue(&mut self, flit:Flit);
}

///Anything at the receiving end of a link.
pub trait FlitConsumer : Eventful
{
	///The upstream component wants the virtual channel `vc` of `in_port` for a message towards `destination`, from `time` onwards.
	fn request_vc(&mut self, in_port:usize, vc:usize, destination:&NetDest, time:Time);
	///Number of flits of `vc` that could still be received by `in_port`.
	fn free_space(&self, in_port:usize, vc:usize) -> usize;
}

///Anything at the sending end of a link.
pub trait FlitSource
{
	///The downstream component has granted its virtual channel `vc`, reached through `out_port`.
	fn grant_vc(&mut self, out_port:usize, vc:usize, time:Time);
	///The downstream component has finished with the virtual channel `vc`.
	fn release_vc(&mut self, out_port:usize, vc:usize, time:Time);
}

pub struct RouterBuilderArgument<'a>
{
	///The index of the router in the network. Used to identify it in logs and panics.
	pub index: usize,
	pub parameters: &'a RouterParameters,
	pub scheduler: Rc<dyn Scheduler>,
}

#[cfg(test)]
mod tests
{
	use super::*;

	fn parameters_cv(pairs:Vec<(&str,ConfigurationValue)>) -> ConfigurationValue
	{
		ConfigurationValue::object("RouterParameters",pairs)
	}

	#[test]
	fn read_parameters()
	{
		let cv = parameters_cv(vec![
			("virtual_networks",ConfigurationValue::Number(2.0)),
			("vcs_per_class",ConfigurationValue::Number(4.0)),
			("buffer_size",ConfigurationValue::Number(4.0)),
			("pipeline_stages",ConfigurationValue::Number(2.0)),
			("ordered_virtual_networks",ConfigurationValue::Array(vec![ConfigurationValue::True,ConfigurationValue::False])),
		]);
		let parameters = RouterParameters::from_cv(&cv).expect("valid parameters");
		assert_eq!(parameters.num_vcs(),8);
		assert_eq!(parameters.virtual_network_of(5),1);
		assert_eq!(parameters.valid_vcs(2),0..1);
		assert_eq!(parameters.valid_vcs(6),4..8);
	}

	#[test]
	fn reject_bad_parameters()
	{
		let base = vec![
			("virtual_networks",ConfigurationValue::Number(1.0)),
			("vcs_per_class",ConfigurationValue::Number(2.0)),
			("buffer_size",ConfigurationValue::Number(4.0)),
		];
		let mut no_stages = base.clone();
		no_stages.push(("pipeline_stages",ConfigurationValue::Number(0.0)));
		assert!(RouterParameters::from_cv(&parameters_cv(no_stages)).is_err());
		let mut bad_flags = base.clone();
		bad_flags.push(("pipeline_stages",ConfigurationValue::Number(1.0)));
		bad_flags.push(("ordered_virtual_networks",ConfigurationValue::Array(vec![ConfigurationValue::True,ConfigurationValue::True])));
		assert!(RouterParameters::from_cv(&parameters_cv(bad_flags)).is_err());
		let mut no_vcs = base;
		no_vcs[1] = ("vcs_per_class",ConfigurationValue::Number(0.0));
		no_vcs.push(("pipeline_stages",ConfigurationValue::Number(1.0)));
		assert!(RouterParameters::from_cv(&parameters_cv(no_vcs)).is_err());
	}

	#[test]
	fn round_robin_begins_after_pointer()
	{
		let mut pointer = 1;
		let order:Vec<usize> = round_robin_scan(&mut pointer,4).collect();
		assert_eq!(order,vec![2,3,0,1]);
		assert_eq!(pointer,2);
		let mut pointer = 3;
		let order:Vec<usize> = round_robin_scan(&mut pointer,4).collect();
		assert_eq!(order,vec![0,1,2,3]);
		assert_eq!(pointer,0);
		let mut empty = 0;
		assert_eq!(round_robin_scan(&mut empty,0).count(),0);
	}
}
