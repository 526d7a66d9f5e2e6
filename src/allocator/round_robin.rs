
use crate::allocator::{VcAllocator,VCARequest,GrantedRequests};
use crate::event::Time;
use crate::router::{InputPort,OutputPort,RouterParameters,VcStatus,round_robin_scan};

/**
Separable allocation with round robin at both levels.
The input ports are visited starting after a pointer that advances once per call. Inside each port the virtual channels are visited
starting after the port's own pointer, which also advances once per call. Each pending virtual channel takes the first idle
channel among its valid ones in its output port, always tried from the lowest index.
**/
#[derive(Debug,Default)]
pub struct SeparableRoundRobin
{
	round_robin_inport: usize,
}

impl SeparableRoundRobin
{
	pub fn new() -> SeparableRoundRobin
	{
		SeparableRoundRobin::default()
	}
}

impl VcAllocator for SeparableRoundRobin
{
	fn allocate(&mut self, input_ports:&mut [InputPort], output_ports:&[OutputPort], parameters:&RouterParameters, now:Time) -> GrantedRequests
	{
		let mut granted = GrantedRequests::default();
		let num_vcs = parameters.num_vcs();
		//`taken[port][vc]` for output channels given in this call, which still look idle.
		let mut taken:Vec<Vec<bool>> = output_ports.iter().map(|port|vec![false;port.virtual_channels.len()]).collect();
		for entry_port in round_robin_scan(&mut self.round_robin_inport,input_ports.len())
		{
			let port = &mut input_ports[entry_port];
			for entry_vc in round_robin_scan(&mut port.round_robin_vc,num_vcs)
			{
				let input_vc = &port.virtual_channels[entry_vc];
				if !input_vc.is_in_state(VcStatus::AllocPending,now)
				{
					continue;
				}
				let requested_port = match input_vc.route()
				{
					Some(requested_port) => requested_port,
					None => panic!("The virtual channel {} of input port {} waits for allocation without a route at cycle {}.",entry_vc,entry_port,now),
				};
				let candidates = &output_ports[requested_port].virtual_channels;
				let requested_vc = parameters.valid_vcs(entry_vc).find(|&vc|
					!taken[requested_port][vc] && candidates[vc].is_in_state(VcStatus::Idle,now)
				);
				if let Some(requested_vc) = requested_vc
				{
					taken[requested_port][requested_vc] = true;
					granted.add_granted_request(VCARequest{entry_port,entry_vc,requested_port,requested_vc});
				}
			}
		}
		granted
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	fn parameters(virtual_networks:usize, vcs_per_class:usize, ordered:bool) -> RouterParameters
	{
		RouterParameters{
			virtual_networks,
			vcs_per_class,
			buffer_size: 4,
			pipeline_stages: 1,
			ordered_virtual_networks: vec![ordered;virtual_networks],
		}
	}

	fn ports(parameters:&RouterParameters, inputs:usize, outputs:usize) -> (Vec<InputPort>,Vec<OutputPort>)
	{
		let num_vcs = parameters.num_vcs();
		(
			(0..inputs).map(|_|InputPort::new(num_vcs)).collect(),
			(0..outputs).map(|_|OutputPort::new(num_vcs,parameters.buffer_size)).collect(),
		)
	}

	#[test]
	fn grants_are_exclusive()
	{
		let parameters = parameters(1,2,false);
		let (mut inputs,outputs) = ports(&parameters,3,1);
		for port in inputs.iter_mut()
		{
			port.virtual_channels[0].request(Some(0),0).expect("idle");
		}
		let mut allocator = SeparableRoundRobin::new();
		let granted:Vec<VCARequest> = allocator.allocate(&mut inputs,&outputs,&parameters,0).into_iter().collect();
		//Two output channels for three requests. The scan begins at input port 1.
		assert_eq!(granted,vec![
			VCARequest{entry_port:1,entry_vc:0,requested_port:0,requested_vc:0},
			VCARequest{entry_port:2,entry_vc:0,requested_port:0,requested_vc:1},
		]);
	}

	#[test]
	fn ordered_network_uses_only_the_base_channel()
	{
		let parameters = parameters(2,3,true);
		let (mut inputs,outputs) = ports(&parameters,1,1);
		inputs[0].virtual_channels[4].request(Some(0),0).expect("idle");
		inputs[0].virtual_channels[5].request(Some(0),0).expect("idle");
		let mut allocator = SeparableRoundRobin::new();
		let granted:Vec<VCARequest> = allocator.allocate(&mut inputs,&outputs,&parameters,0).into_iter().collect();
		assert_eq!(granted.len(),1);
		assert_eq!(granted[0].requested_vc,3);
	}

	#[test]
	fn requests_from_the_future_wait()
	{
		let parameters = parameters(1,1,false);
		let (mut inputs,outputs) = ports(&parameters,1,1);
		inputs[0].virtual_channels[0].request(Some(0),5).expect("idle");
		let mut allocator = SeparableRoundRobin::new();
		assert!(allocator.allocate(&mut inputs,&outputs,&parameters,4).is_empty());
		assert_eq!(allocator.allocate(&mut inputs,&outputs,&parameters,5).len(),1);
	}

	#[test]
	fn every_port_is_served_within_a_round()
	{
		let parameters = parameters(1,1,false);
		let (mut inputs,outputs) = ports(&parameters,4,1);
		let mut allocator = SeparableRoundRobin::new();
		let mut served = vec![0;4];
		for cycle in 0..12
		{
			for port in inputs.iter_mut()
			{
				let vc = &mut port.virtual_channels[0];
				if vc.is_in_state(VcStatus::Active,cycle)
				{
					vc.release(cycle).expect("active");
				}
				if vc.is_in_state(VcStatus::Idle,cycle)
				{
					vc.request(Some(0),cycle).expect("idle");
				}
			}
			let granted:Vec<VCARequest> = allocator.allocate(&mut inputs,&outputs,&parameters,cycle).into_iter().collect();
			assert_eq!(granted.len(),1);
			let grant = &granted[0];
			served[grant.entry_port]+=1;
			//The output channel is left idle, as if released every cycle.
			inputs[grant.entry_port].virtual_channels[0].grant_output(0,cycle).expect("pending");
		}
		assert_eq!(served,vec![3,3,3,3]);
	}

	#[test]
	fn channels_of_a_port_take_turns()
	{
		//Ordered, so both input channels compete for output channel 0.
		let parameters = parameters(1,2,true);
		let (mut inputs,outputs) = ports(&parameters,1,1);
		let mut allocator = SeparableRoundRobin::new();
		let mut winners = vec![];
		for cycle in 0..6
		{
			for vc in inputs[0].virtual_channels.iter_mut()
			{
				if vc.is_in_state(VcStatus::Active,cycle)
				{
					vc.release(cycle).expect("active");
				}
				if vc.is_in_state(VcStatus::Idle,cycle)
				{
					vc.request(Some(0),cycle).expect("idle");
				}
			}
			let granted:Vec<VCARequest> = allocator.allocate(&mut inputs,&outputs,&parameters,cycle).into_iter().collect();
			assert_eq!(granted.len(),1);
			let grant = &granted[0];
			assert_eq!(grant.requested_vc,0);
			winners.push(grant.entry_vc);
			inputs[0].virtual_channels[grant.entry_vc].grant_output(0,cycle).expect("pending");
		}
		//The port pointer starts at channel 0, so channel 1 goes first.
		assert_eq!(winners,vec![1,0,1,0,1,0]);
	}
}
