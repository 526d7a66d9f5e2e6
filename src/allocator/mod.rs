/*!

A VcAllocator decides which input virtual channels waiting for allocation get an output virtual channel.

The allocator only reads the state of the ports, besides moving their round robin pointers. The router applies the state transitions of the returned grants.

*/

pub mod round_robin;

use crate::event::Time;
use crate::router::{InputPort,OutputPort,RouterParameters};

pub use round_robin::SeparableRoundRobin;

/// A grant of a Virtual Channel Allocator.
/// The virtual channel `entry_vc` of the input port `entry_port` gets the virtual channel `requested_vc` of the output port `requested_port`.
#[derive(Clone,Debug,PartialEq,Eq)]
pub struct VCARequest
{
	pub entry_port: usize,
	pub entry_vc: usize,
	pub requested_port: usize,
	pub requested_vc: usize,
}

/// A collection of granted requests
#[derive(Default,Debug)]
pub struct GrantedRequests {
	/// The granted requests
	granted_requests: Vec<VCARequest>,
}
impl GrantedRequests {
	/// Add a granted request to the collection
	fn add_granted_request(&mut self, request: VCARequest) {
		self.granted_requests.push(request);
	}
	pub fn len(&self) -> usize {
		self.granted_requests.len()
	}
	pub fn is_empty(&self) -> bool {
		self.granted_requests.is_empty()
	}
}

impl IntoIterator for GrantedRequests {
	type Item = VCARequest;
	type IntoIter = <Vec<VCARequest> as IntoIterator>::IntoIter;
	fn into_iter(self) -> <Self as IntoIterator>::IntoIter {
		self.granted_requests.into_iter()
	}
}

/**
A VcAllocator matches the input virtual channels in `AllocPending` state against the `Idle` virtual channels of the output ports they were routed to.
Each call returns a valid, possibly partial, matching for the cycle `now`. An output virtual channel is never given twice in the same call.
**/
pub trait VcAllocator {
	/// # Parameters
	/// * `input_ports` - The input ports. Only their round robin pointers are modified.
	/// * `output_ports` - The output ports, to check which virtual channels are idle.
	/// * `parameters` - Give the virtual channels each input virtual channel may use.
	/// * `now` - The current cycle.
	fn allocate(&mut self, input_ports:&mut [InputPort], output_ports:&[OutputPort], parameters:&RouterParameters, now:Time) -> GrantedRequests;
}
