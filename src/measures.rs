/*!

Module encapsulating the statistics about several measures.

Each router, link and network interface keeps its own counters. At the end of a simulation they are gathered into a [Statistics], which builds the result object.

The values always written into the result are:
* `cycle` is the last simulated cycle.
* `injected_load` is the average number of flits injected per interface and cycle.
* `accepted_load` is the average number of flits consumed per interface and cycle.
* `average_message_delay` is the average delay of consumed messages, from the cycle in which the message was created until the cycle in which its tail was consumed.
* `consumed_messages` is the total number of messages delivered to their destinations.
* `routed_flits` is the total number of flits that went through the route computation of some router.
* `average_link_utilization` is 1 when each link carries a flit every cycle.

*/

use crate::config::ConfigurationValue;
use crate::event::Time;

///Statistics captured for each network interface.
#[derive(Debug,Clone,Default)]
pub struct InterfaceStatistics
{
	pub created_messages: usize,
	pub created_flits: usize,
	pub consumed_flits: usize,
	pub consumed_messages: usize,
	pub total_message_delay: Time,
	///The last cycle in which this interface sent a flit into the network. Or 0.
	pub cycle_last_created_flit: Time,
	///The last cycle in which a tail flit was consumed by this interface. Or 0.
	pub cycle_last_consumed_message: Time,
}

impl InterfaceStatistics
{
	pub fn new() -> InterfaceStatistics
	{
		InterfaceStatistics::default()
	}
	/// Called each time the traffic gives a new message to the interface.
	pub fn track_created_message(&mut self)
	{
		self.created_messages+=1;
	}
	/// Called each time the interface sends a flit to its router.
	pub fn track_created_flit(&mut self, cycle:Time)
	{
		self.created_flits+=1;
		self.cycle_last_created_flit = cycle;
	}
	pub fn track_consumed_flit(&mut self)
	{
		self.consumed_flits+=1;
	}
	/// Called when the interface consumes the tail of a message.
	pub fn track_consumed_message(&mut self, delay:Time, cycle:Time)
	{
		self.consumed_messages+=1;
		self.total_message_delay+=delay;
		self.cycle_last_consumed_message = cycle;
	}
}

///Statistics captured for each router.
#[derive(Debug,Clone,Default)]
pub struct RouterStatistics
{
	///Flits moved from an input link into a staging buffer.
	pub routed_flits: usize,
	///Flits moved from a staging buffer into an output link.
	pub transmitted_flits: usize,
	///Output virtual channels given by the allocator.
	pub vc_grants: usize,
}

///Statistics captured for each link.
#[derive(Debug,Clone)]
pub struct LinkStatistics
{
	pub carried_flits: usize,
	///`flits_per_vc[vc]` counts the flits carried in the virtual channel `vc`.
	pub flits_per_vc: Vec<usize>,
}

impl LinkStatistics
{
	pub fn new(num_vcs:usize) -> LinkStatistics
	{
		LinkStatistics{
			carried_flits: 0,
			flits_per_vc: vec![0;num_vcs],
		}
	}
	pub fn track_flit(&mut self, vc:usize)
	{
		self.carried_flits+=1;
		if self.flits_per_vc.len()<=vc
		{
			self.flits_per_vc.resize(vc+1,0);
		}
		self.flits_per_vc[vc]+=1;
	}
}

///The aggregation of the statistics of a whole network.
#[derive(Debug,Clone,Default)]
pub struct Statistics
{
	pub interfaces: usize,
	pub created_flits: usize,
	pub consumed_flits: usize,
	pub consumed_messages: usize,
	pub total_message_delay: Time,
	pub routers: usize,
	pub routed_flits: usize,
	pub transmitted_flits: usize,
	pub vc_grants: usize,
	pub links: usize,
	pub carried_flits: usize,
}

impl Statistics
{
	pub fn new() -> Statistics
	{
		Statistics::default()
	}
	pub fn track_interface(&mut self, statistics:&InterfaceStatistics)
	{
		self.interfaces+=1;
		self.created_flits+=statistics.created_flits;
		self.consumed_flits+=statistics.consumed_flits;
		self.consumed_messages+=statistics.consumed_messages;
		self.total_message_delay+=statistics.total_message_delay;
	}
	pub fn track_router(&mut self, statistics:&RouterStatistics)
	{
		self.routers+=1;
		self.routed_flits+=statistics.routed_flits;
		self.transmitted_flits+=statistics.transmitted_flits;
		self.vc_grants+=statistics.vc_grants;
	}
	pub fn track_link(&mut self, statistics:&LinkStatistics)
	{
		self.links+=1;
		self.carried_flits+=statistics.carried_flits;
	}
	pub fn average_message_delay(&self) -> f64
	{
		if self.consumed_messages==0 { 0f64 } else { self.total_message_delay as f64 / self.consumed_messages as f64 }
	}
	///Build the result object after `cycle` simulated cycles.
	pub fn parse_statistics(&self, cycle:Time) -> ConfigurationValue
	{
		let cycles = cycle.max(1) as f64;
		let per_interface = |flits:usize| if self.interfaces==0 { 0f64 } else { flits as f64 / cycles / self.interfaces as f64 };
		let link_utilization = if self.links==0 { 0f64 } else { self.carried_flits as f64 / cycles / self.links as f64 };
		ConfigurationValue::object("Result",vec![
			("cycle",ConfigurationValue::Number(cycle as f64)),
			("injected_load",ConfigurationValue::Number(per_interface(self.created_flits))),
			("accepted_load",ConfigurationValue::Number(per_interface(self.consumed_flits))),
			("average_message_delay",ConfigurationValue::Number(self.average_message_delay())),
			("consumed_messages",ConfigurationValue::Number(self.consumed_messages as f64)),
			("routed_flits",ConfigurationValue::Number(self.routed_flits as f64)),
			("average_link_utilization",ConfigurationValue::Number(link_utilization)),
		])
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::match_object_panic;

	#[test]
	fn aggregate_into_result()
	{
		let mut interface = InterfaceStatistics::new();
		for cycle in 0..4
		{
			interface.track_created_flit(cycle);
			interface.track_consumed_flit();
		}
		interface.track_consumed_message(6,5);
		interface.track_consumed_message(10,9);
		let mut link = LinkStatistics::new(2);
		link.track_flit(1);
		link.track_flit(3);
		assert_eq!(link.flits_per_vc,vec![0,1,0,1]);
		let mut statistics = Statistics::new();
		statistics.track_interface(&interface);
		statistics.track_interface(&InterfaceStatistics::new());
		statistics.track_link(&link);
		statistics.track_router(&RouterStatistics{ routed_flits:4, transmitted_flits:4, vc_grants:2 });
		let result = statistics.parse_statistics(10);
		let mut delay = None;
		let mut injected = None;
		let mut utilization = None;
		match_object_panic!(&result,"Result",value,
			"average_message_delay" => delay = Some(value.as_f64().expect("number")),
			"injected_load" => injected = Some(value.as_f64().expect("number")),
			"average_link_utilization" => utilization = Some(value.as_f64().expect("number")),
			"cycle" | "accepted_load" | "consumed_messages" | "routed_flits" => (),
		);
		assert_eq!(delay,Some(8.0));
		assert_eq!(injected,Some(0.2));
		assert_eq!(utilization,Some(0.2));
	}
}
