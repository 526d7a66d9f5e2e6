
use crate::event::Time;
use crate::packet::Flit;
use super::{OutputPort,VcStatus,round_robin_scan};

/**
Select the flit that the output port sends in the cycle `now`, if any.
The virtual channels are scanned once, beginning after the port's round robin pointer, which advances one position.
The first channel with a flit ready in its staging buffer, `Active` at `now` and for which `has_space` holds gives its flit.
The returned flit is stamped for the next cycle.
**/
pub fn select_flit<F:Fn(usize)->bool>(port:&mut OutputPort, now:Time, has_space:F) -> Option<Flit>
{
	let num_vcs = port.virtual_channels.len();
	for vc in round_robin_scan(&mut port.round_robin_vc,num_vcs)
	{
		if !port.buffers[vc].is_ready(now)
		{
			continue;
		}
		if port.virtual_channels[vc].is_in_state(VcStatus::Active,now) && has_space(vc)
		{
			let mut flit = port.buffers[vc].pop()?;
			flit.time = now+1;
			return Some(flit);
		}
	}
	None
}

#[cfg(test)]
mod tests
{
	use super::*;
	use std::rc::Rc;
	use crate::packet::{Message,NetDest};

	fn staged_port(vcs:&[usize]) -> OutputPort
	{
		let mut port = OutputPort::new(4,2);
		let message = Rc::new(Message{ id:0, origin:0, destination:NetDest::single(1), virtual_network:0, size:1, creation_cycle:0, payload:vec![] });
		for &vc in vcs
		{
			port.buffers[vc].insert(Flit::split(&message,vc,3).remove(0));
			port.virtual_channels[vc].request(None,0).expect("idle");
			port.virtual_channels[vc].grant(1).expect("pending");
		}
		port
	}

	#[test]
	fn rotates_among_active_channels()
	{
		let mut port = staged_port(&[0,2,3]);
		//Not ready before the flit time.
		assert!(select_flit(&mut port,2,|_|true).is_none());
		let first = select_flit(&mut port,3,|_|true).expect("ready flit");
		assert_eq!(first.vc,2);
		assert_eq!(first.time,4);
		let second = select_flit(&mut port,4,|_|true).expect("ready flit");
		assert_eq!(second.vc,3);
		let third = select_flit(&mut port,5,|_|true).expect("ready flit");
		assert_eq!(third.vc,0);
		assert!(select_flit(&mut port,6,|_|true).is_none());
	}

	#[test]
	fn backpressure_and_inactive_channels_block()
	{
		let mut port = staged_port(&[1]);
		assert!(select_flit(&mut port,3,|_|false).is_none());
		assert_eq!(port.buffers[1].len(),1);
		port.virtual_channels[1].release(3).expect("active");
		assert!(select_flit(&mut port,4,|_|true).is_none());
		assert_eq!(port.buffers[1].len(),1);
	}
}
