
use std::fmt::{self,Display,Formatter};

use crate::event::Time;

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum VcStatus
{
	Idle,
	///Waiting for the allocation of a virtual channel in the next hop.
	AllocPending,
	Active,
}

impl Display for VcStatus
{
	fn fmt(&self, formatter:&mut Formatter) -> fmt::Result
	{
		let name = match self
		{
			VcStatus::Idle => "IDLE",
			VcStatus::AllocPending => "ALLOC_PENDING",
			VcStatus::Active => "ACTIVE",
		};
		write!(formatter,"{}",name)
	}
}

///A transition attempted from a state in which it is not allowed.
#[derive(Debug,Clone,PartialEq,Eq)]
pub struct TransitionError
{
	///The state required by the transition.
	pub expected: VcStatus,
	pub found: VcStatus,
	///The time stamp of the current state.
	pub since: Time,
	///The time of the attempted transition.
	pub at: Time,
}

impl Display for TransitionError
{
	fn fmt(&self, formatter:&mut Formatter) -> fmt::Result
	{
		write!(formatter,"expected {} at cycle {} but found {} since cycle {}",self.expected,self.at,self.found,self.since)
	}
}

/**
The state of a virtual channel, either in an input port or in an output port.

The state changes are stamped with a time, which may be in the future. A virtual channel is in a state
at a time `t` only when `t` is not before that stamp, so an output channel released for the next cycle
is not idle yet in the current one.
The only transitions are `Idle -> AllocPending -> Active -> Idle`.
**/
#[derive(Debug,Clone)]
pub struct VirtualChannel
{
	id: usize,
	state: VcStatus,
	time: Time,
	///For input channels, the output port given by the routing table.
	route: Option<usize>,
	///For input channels, the granted virtual channel in the output port.
	output_vc: Option<usize>,
}

impl VirtualChannel
{
	pub fn new(id:usize) -> VirtualChannel
	{
		VirtualChannel{
			id,
			state: VcStatus::Idle,
			time: 0,
			route: None,
			output_vc: None,
		}
	}
	pub fn id(&self) -> usize
	{
		self.id
	}
	pub fn state(&self) -> VcStatus
	{
		self.state
	}
	///The stamp of the last transition.
	pub fn time(&self) -> Time
	{
		self.time
	}
	pub fn route(&self) -> Option<usize>
	{
		self.route
	}
	pub fn output_vc(&self) -> Option<usize>
	{
		self.output_vc
	}
	pub fn is_in_state(&self, state:VcStatus, time:Time) -> bool
	{
		self.state==state && time>=self.time
	}
	fn require(&self, state:VcStatus, time:Time) -> Result<(),TransitionError>
	{
		if self.is_in_state(state,time)
		{
			Ok(())
		}
		else
		{
			Err(TransitionError{
				expected: state,
				found: self.state,
				since: self.time,
				at: time,
			})
		}
	}
	///Start waiting for a virtual channel towards the output port `route`.
	pub fn request(&mut self, route:Option<usize>, time:Time) -> Result<(),TransitionError>
	{
		self.require(VcStatus::Idle,time)?;
		self.route = route;
		self.output_vc = None;
		self.state = VcStatus::AllocPending;
		self.time = time;
		Ok(())
	}
	///The virtual channel has been granted. Used for output channels, for which the next hop has granted its own channel.
	pub fn grant(&mut self, time:Time) -> Result<(),TransitionError>
	{
		self.require(VcStatus::AllocPending,time)?;
		self.state = VcStatus::Active;
		self.time = time;
		Ok(())
	}
	///An input channel has been given the output channel `output_vc`.
	pub fn grant_output(&mut self, output_vc:usize, time:Time) -> Result<(),TransitionError>
	{
		self.grant(time)?;
		self.output_vc = Some(output_vc);
		Ok(())
	}
	pub fn release(&mut self, time:Time) -> Result<(),TransitionError>
	{
		self.require(VcStatus::Active,time)?;
		self.state = VcStatus::Idle;
		self.time = time;
		Ok(())
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn full_cycle()
	{
		let mut vc = VirtualChannel::new(2);
		assert!(vc.is_in_state(VcStatus::Idle,0));
		vc.request(Some(1),5).expect("idle channel");
		assert_eq!(vc.route(),Some(1));
		//Stamped in the future.
		assert!(!vc.is_in_state(VcStatus::AllocPending,4));
		assert!(vc.is_in_state(VcStatus::AllocPending,5));
		vc.grant_output(3,6).expect("pending channel");
		assert_eq!(vc.output_vc(),Some(3));
		vc.release(9).expect("active channel");
		assert!(vc.is_in_state(VcStatus::Idle,9));
		assert!(!vc.is_in_state(VcStatus::Idle,8));
	}

	#[test]
	fn illegal_transitions()
	{
		let mut vc = VirtualChannel::new(0);
		let error = vc.grant(3).expect_err("cannot grant an idle channel");
		assert_eq!(error,TransitionError{ expected:VcStatus::AllocPending, found:VcStatus::Idle, since:0, at:3 });
		assert!(vc.release(3).is_err());
		vc.request(None,4).expect("idle channel");
		//Requesting before the stamp is also refused.
		assert!(vc.grant(3).is_err());
		assert!(vc.request(None,4).is_err());
		assert_eq!(vc.state(),VcStatus::AllocPending);
		assert_eq!(format!("{}",vc.release(5).expect_err("not active")),"expected ACTIVE at cycle 5 but found ALLOC_PENDING since cycle 4");
	}
}
