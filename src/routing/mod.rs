
/*!

The routing of a router is a static table with one row per output port.

Each row holds the set of network interfaces reachable through the port and the weight of doing so.
A message goes through the port of least weight among those whose row intersects its destination set.

*/

use crate::packet::NetDest;

pub mod prelude
{
	pub use super::{RoutingTable,RoutingEntry};
}

///A row of the [RoutingTable].
#[derive(Debug,Clone,PartialEq)]
pub struct RoutingEntry
{
	///The interfaces reachable through the port.
	pub destination: NetDest,
	///The cost of using the port. Lower is better.
	pub weight: i32,
}

///The routing table of a router. Rows are indexed by output port.
#[derive(Debug,Clone,Default)]
pub struct RoutingTable
{
	entries: Vec<RoutingEntry>,
}

impl RoutingTable
{
	pub fn new() -> RoutingTable
	{
		RoutingTable::default()
	}
	///Add the row of the next output port. Returns its index.
	pub fn add_entry(&mut self, destination:NetDest, weight:i32) -> usize
	{
		self.entries.push(RoutingEntry{destination,weight});
		self.entries.len()-1
	}
	pub fn len(&self) -> usize
	{
		self.entries.len()
	}
	pub fn is_empty(&self) -> bool
	{
		self.entries.is_empty()
	}
	pub fn entry(&self, port:usize) -> &RoutingEntry
	{
		&self.entries[port]
	}
	/**
	The output port towards `destination`, if any port covers it.
	Among the matching ports the one with strictly smallest weight is chosen, so on ties the lowest port index wins.
	This always favours the same port among equivalent ones, which can unbalance the load.
	**/
	pub fn route(&self, destination:&NetDest) -> Option<usize>
	{
		let mut best:Option<(usize,i32)> = None;
		for (port,entry) in self.entries.iter().enumerate()
		{
			if !entry.destination.intersection_is_not_empty(destination)
			{
				continue;
			}
			match best
			{
				Some((_,weight)) if weight <= entry.weight => (),
				_ => best = Some((port,entry.weight)),
			}
		}
		best.map(|(port,_)|port)
	}
}
