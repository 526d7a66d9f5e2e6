
use crate::packet::FlitBuffer;
use super::virtual_channel::VirtualChannel;

///The input side of a router port.
#[derive(Debug,Clone)]
pub struct InputPort
{
	pub virtual_channels: Vec<VirtualChannel>,
	///The last virtual channel from which the allocator began its scan.
	pub round_robin_vc: usize,
}

impl InputPort
{
	pub fn new(num_vcs:usize) -> InputPort
	{
		InputPort{
			virtual_channels: (0..num_vcs).map(VirtualChannel::new).collect(),
			round_robin_vc: 0,
		}
	}
}

///The output side of a router port. Flits wait in `buffers` from their route computation until the switch moves them to the link.
#[derive(Debug,Clone)]
pub struct OutputPort
{
	pub virtual_channels: Vec<VirtualChannel>,
	///`buffers[vc]` is the staging buffer of the virtual channel `vc`.
	pub buffers: Vec<FlitBuffer>,
	///The last virtual channel from which the switch began its scan.
	pub round_robin_vc: usize,
}

impl OutputPort
{
	pub fn new(num_vcs:usize, buffer_size:usize) -> OutputPort
	{
		OutputPort{
			virtual_channels: (0..num_vcs).map(VirtualChannel::new).collect(),
			buffers: (0..num_vcs).map(|_|FlitBuffer::with_capacity(buffer_size)).collect(),
			round_robin_vc: 0,
		}
	}
}
