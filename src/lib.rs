/*!
caminos-vcrouter
=====

This crate provides a cycle-level model of a virtual channel router for on-chip networks, together with the links, network interfaces and traffics needed to simulate whole networks of them.

# Usage

This crate is `caminos-vcrouter`. To use it add `caminos-vcrouter` to your dependencies in your project's `Cargo.toml`.

```toml
[dependencies]
caminos-vcrouter = "0.1"
```

# The model

Time advances in cycles. Each component (routers, links, network interfaces) is an [Eventful] that is processed only in the cycles in which it has been scheduled through the [Scheduler].
The [EventQueue] is the scheduler of a [Simulation], but a router can be driven by any other implementation.

A message is cut into flits. The head flit carries the destination set of the message and makes each router ask the next hop for a virtual channel.
Flits only move through a virtual channel granted by the next hop and while the next hop has space for them.
See [PipelinedRouter] for the steps made by the router each cycle.

Each signal of the virtual channel handshake (request, grant and release) is delivered through the link at the cycle it refers to, as an event of its own.

# Configuration Syntax

A simulation is built from a `ConfigurationValue`, normally written programmatically.

```ignore
Configuration
{
	random_seed: 42,
	cycles: 2000,//maximum number of cycles to simulate.
	router: RouterParameters
	{
		virtual_networks: 1,
		vcs_per_class: 2,
		buffer_size: 4,
		pipeline_stages: 2,
	},
	routers: 2,
	interfaces: 2,
	links: [
		Link{ source:Interface{index:0}, target:Router{index:0} },
		Link{ source:Router{index:0}, target:Interface{index:0}, destinations:[0] },
		Link{ source:Router{index:0}, target:Router{index:1}, destinations:[1], latency:2, weight:1 },
		Link{ source:Router{index:1}, target:Router{index:0}, destinations:[0], latency:2 },
		Link{ source:Interface{index:1}, target:Router{index:1} },
		Link{ source:Router{index:1}, target:Interface{index:1}, destinations:[1] },
	],
	traffic: Burst{ messages_per_interface:10, message_size:4 },
	event_queue_size: 1024,//optional. Maximum delay that can be scheduled.
}
```

Each link goes from a `Router` or `Interface` to another one. Links leaving a router are its output ports; their `destinations` are the interfaces reachable through them, and the port with least `weight` is used.
The `latency` of a link defaults to 1 and the `weight` to 1. Each interface must be the source of a link and the target of another one, both with a router.

The results of a simulation are given as
```ignore
Result
{
	cycle: 208,
	injected_load: 0.19,
	accepted_load: 0.19,
	average_message_delay: 31.4,
	consumed_messages: 20,
	routed_flits: 160,
	average_link_utilization: 0.13,
}
```
See [measures] for their meaning.

*/

pub mod error;
pub mod config;
pub mod event;
pub mod packet;
pub mod routing;
pub mod allocator;
pub mod router;
pub mod link;
pub mod interface;
pub mod traffic;
pub mod measures;

use std::cell::RefCell;
use std::rc::{Rc,Weak};

use ::rand::{rngs::StdRng,SeedableRng};
use itertools::iproduct;

pub use config::ConfigurationValue;
pub use error::Error;
pub use event::{Time,Eventful,Scheduler,EventQueue};
pub use packet::{Message,Flit,FlitKind,NetDest,FlitBuffer};
pub use router::{PipelinedRouter,RouterParameters,RouterBuilderArgument,InputLink,OutputLink,FlitConsumer,FlitSource,VcStatus};
pub use link::{NetworkLink,LinkBuilderArgument};
pub use interface::NetworkInterface;
pub use traffic::{Traffic,TrafficError,new_traffic,TrafficBuilderArgument};
pub use measures::Statistics;

///A side of a link.
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum Endpoint
{
	Router(usize),
	Interface(usize),
}

impl Endpoint
{
	pub fn new(cv:&ConfigurationValue) -> Result<Endpoint,Error>
	{
		let mut index = None;
		match_object!(cv,["Router","Interface"],value,
			"index" => index = Some(value.as_usize()?),
		);
		let index = index.ok_or_else(||cv.ill("There were no index"))?;
		match cv
		{
			ConfigurationValue::Object(name,_) if name=="Router" => Ok(Endpoint::Router(index)),
			_ => Ok(Endpoint::Interface(index)),
		}
	}
}

///The description of a link in the configuration.
#[derive(Debug,Clone)]
pub struct LinkConfiguration
{
	pub source: Endpoint,
	pub target: Endpoint,
	pub latency: Time,
	///The interfaces reachable through the link. Only for links leaving a router.
	pub destinations: Option<NetDest>,
	pub weight: i32,
}

impl LinkConfiguration
{
	pub fn new(cv:&ConfigurationValue) -> Result<LinkConfiguration,Error>
	{
		let mut source = None;
		let mut target = None;
		let mut latency = 1;
		let mut destinations = None;
		let mut weight = 1;
		match_object!(cv,"Link",value,
			"source" => source = Some(Endpoint::new(value)?),
			"target" => target = Some(Endpoint::new(value)?),
			"latency" => latency = value.as_time()?,
			"destinations" => destinations = Some(value.as_array()?.iter().map(|v|v.as_usize()).collect::<Result<NetDest,Error>>()?),
			"weight" => weight = value.as_i32()?,
		);
		let source = source.ok_or_else(||cv.ill("There were no source"))?;
		let target = target.ok_or_else(||cv.ill("There were no target"))?;
		if latency==0
		{
			return Err(cv.ill("The latency of a link must be at least 1"));
		}
		match (source,&destinations)
		{
			(Endpoint::Router(_),None) => return Err(cv.ill("A link leaving a router needs its destinations")),
			(Endpoint::Interface(_),Some(_)) => return Err(cv.ill("Only links leaving a router have destinations")),
			_ => (),
		}
		Ok(LinkConfiguration{source,target,latency,destinations,weight})
	}
}

///The components of a simulated network.
pub struct Network
{
	pub routers: Vec<Rc<RefCell<PipelinedRouter>>>,
	pub interfaces: Vec<Rc<RefCell<NetworkInterface>>>,
	pub links: Vec<Rc<RefCell<NetworkLink>>>,
}

impl Network
{
	///Whether no flit remains anywhere in the network.
	pub fn is_drained(&self) -> bool
	{
		self.interfaces.iter().all(|interface|interface.borrow().is_idle())
			&& self.links.iter().all(|link|link.borrow().is_empty())
			&& self.routers.iter().all(|router|{
				let router = router.borrow();
				let vcs = router.parameters().num_vcs();
				iproduct!(0..router.num_output_ports(),0..vcs).all(|(port,vc)|router.staging_buffer(port,vc).is_empty())
			})
	}
}

///The object representing the whole simulation.
pub struct Simulation
{
	///The whole configuration.
	pub configuration: ConfigurationValue,
	///The seed of the random number generator.
	pub seed: u64,
	///The number of cycles after which the simulation stops.
	pub cycles: Time,
	pub parameters: RouterParameters,
	///The random number generator itself, with its current state.
	pub rng: StdRng,
	///The queue of events guiding the simulation.
	pub event_queue: Rc<EventQueue>,
	pub network: Network,
	pub traffic: Box<dyn Traffic>,
}

impl Simulation
{
	pub fn new(cv:&ConfigurationValue) -> Result<Simulation,Error>
	{
		let mut seed = None;
		let mut cycles = None;
		let mut parameters = None;
		let mut num_routers = None;
		let mut num_interfaces = None;
		let mut link_configurations = None;
		let mut traffic = None;
		let mut event_queue_size = 1024;
		match_object!(cv,"Configuration",value,
			"random_seed" => seed = Some(value.as_time()?),
			"cycles" => cycles = Some(value.as_time()?),
			"router" => parameters = Some(RouterParameters::from_cv(value)?),
			"routers" => num_routers = Some(value.as_usize()?),
			"interfaces" => num_interfaces = Some(value.as_usize()?),
			"links" => link_configurations = Some(value.as_array()?.iter().map(LinkConfiguration::new).collect::<Result<Vec<_>,Error>>()?),
			"traffic" => traffic = Some(value),
			"event_queue_size" => event_queue_size = value.as_usize()?,
		);
		let seed = seed.ok_or_else(||cv.ill("There were no random_seed"))?;
		let cycles = cycles.ok_or_else(||cv.ill("There were no cycles"))?;
		let parameters = parameters.ok_or_else(||cv.ill("There were no router"))?;
		let num_routers = num_routers.ok_or_else(||cv.ill("There were no routers"))?;
		let num_interfaces = num_interfaces.ok_or_else(||cv.ill("There were no interfaces"))?;
		let link_configurations = link_configurations.ok_or_else(||cv.ill("There were no links"))?;
		let traffic = traffic.ok_or_else(||cv.ill("There were no traffic"))?;
		let longest_link = link_configurations.iter().map(|link|link.latency).max().unwrap_or(1);
		if (event_queue_size as Time) <= longest_link.max(parameters.pipeline_stages as Time)
		{
			return Err(cv.ill(&format!("event_queue_size ({}) must exceed every latency",event_queue_size)));
		}
		let event_queue = Rc::new(EventQueue::new(event_queue_size));
		let routers:Vec<Rc<RefCell<PipelinedRouter>>> = (0..num_routers).map(|index|PipelinedRouter::new(RouterBuilderArgument{
			index,
			parameters: &parameters,
			scheduler: event_queue.clone(),
		})).collect();
		let interfaces:Vec<Rc<RefCell<NetworkInterface>>> = (0..num_interfaces).map(|index|NetworkInterface::new(index,&parameters,event_queue.clone())).collect();
		let mut links = Vec::with_capacity(link_configurations.len());
		for (index,link_configuration) in link_configurations.into_iter().enumerate()
		{
			links.push(connect(index,link_configuration,&routers,&interfaces,&parameters,&event_queue).map_err(|e|{
				let message = format!("link {}: {}",index,e.message.clone().unwrap_or_default());
				e.with_message(message)
			})?);
		}
		for interface in interfaces.iter()
		{
			let interface = interface.borrow();
			if !interface.has_out_link() || !interface.has_in_link()
			{
				return Err(cv.ill(&format!("The interface {} needs a link to a router and a link from a router",interface.get_index())));
			}
		}
		let traffic = new_traffic(TrafficBuilderArgument{
			cv: traffic,
			interfaces: num_interfaces,
		})?;
		if traffic.number_tasks() != num_interfaces
		{
			log::warn!("Generating traffic over {} tasks when the network has {} interfaces.",traffic.number_tasks(),num_interfaces);
		}
		Ok(Simulation{
			configuration: cv.clone(),
			seed,
			cycles,
			parameters,
			rng: StdRng::seed_from_u64(seed),
			event_queue,
			network: Network{
				routers,
				interfaces,
				links,
			},
			traffic,
		})
	}
	///Run the simulation until reaching `cycles` or until the traffic is finished and the network empty.
	pub fn run(&mut self) -> Result<(),Error>
	{
		log::info!("Simulation begins with {} routers, {} interfaces and {} links.",self.network.routers.len(),self.network.interfaces.len(),self.network.links.len());
		while self.event_queue.now() < self.cycles
		{
			self.advance()?;
			if self.traffic.is_finished() && self.network.is_drained()
			{
				log::info!("Traffic consumed before cycle {}.",self.event_queue.now());
				break;
			}
		}
		log::info!("Simulation ends at cycle {}.",self.event_queue.now());
		Ok(())
	}
	///Execute a single cycle of the simulation.
	fn advance(&mut self) -> Result<(),Error>
	{
		let cycle = self.event_queue.now();
		for (origin,interface) in self.network.interfaces.iter().enumerate()
		{
			if !self.traffic.should_generate(origin,cycle,&mut self.rng)
			{
				continue;
			}
			let message = match self.traffic.generate_message(origin,cycle,&mut self.rng)
			{
				Ok(message) => message,
				Err(problem) => return Err(error!(traffic_error).with_message(format!("interface {} at cycle {}: {}",origin,cycle,problem))),
			};
			if message.virtual_network >= self.parameters.virtual_networks
			{
				return Err(error!(traffic_error).with_message(format!("message {} uses virtual network {}, but there are only {}",message.id,message.virtual_network,self.parameters.virtual_networks)));
			}
			interface.borrow_mut().enqueue_message(message);
		}
		self.event_queue.process_cycle();
		for interface in self.network.interfaces.iter()
		{
			let consumed = interface.borrow_mut().take_consumed_messages();
			for message in consumed
			{
				if !self.traffic.consume(&message,cycle)
				{
					log::warn!("Message {} has been consumed but it was not expected by the traffic.",message.id);
				}
			}
		}
		Ok(())
	}
	///Gather the statistics of every component.
	pub fn statistics(&self) -> Statistics
	{
		let mut statistics = Statistics::new();
		for interface in self.network.interfaces.iter()
		{
			statistics.track_interface(interface.borrow().statistics());
		}
		for router in self.network.routers.iter()
		{
			statistics.track_router(router.borrow().statistics());
		}
		for link in self.network.links.iter()
		{
			statistics.track_link(link.borrow().statistics());
		}
		statistics
	}
	///Get config value for the simulation results.
	pub fn get_simulation_results(&self) -> ConfigurationValue
	{
		self.statistics().parse_statistics(self.event_queue.now())
	}
}

///Build the link `index` and attach it to its endpoints.
fn connect(index:usize, link:LinkConfiguration, routers:&[Rc<RefCell<PipelinedRouter>>], interfaces:&[Rc<RefCell<NetworkInterface>>], parameters:&RouterParameters, event_queue:&Rc<EventQueue>) -> Result<Rc<RefCell<NetworkLink>>,Error>
{
	let check = |endpoint:Endpoint| match endpoint
	{
		Endpoint::Router(router) if router>=routers.len() => Err(error!(bad_argument).with_message(format!("there is no router {}",router))),
		Endpoint::Interface(interface) if interface>=interfaces.len() => Err(error!(bad_argument).with_message(format!("there is no interface {}",interface))),
		_ => Ok(()),
	};
	check(link.source)?;
	check(link.target)?;
	match (link.source,link.target)
	{
		(Endpoint::Router(a),Endpoint::Router(b)) if a==b => return Err(error!(bad_argument).with_message(format!("router {} linked to itself",a))),
		(Endpoint::Interface(_),Endpoint::Interface(_)) => return Err(error!(bad_argument).with_message("interfaces must be linked to routers".to_string())),
		_ => (),
	}
	let (source,source_port):(Weak<RefCell<dyn FlitSource>>,usize) = match link.source
	{
		Endpoint::Router(router) =>
		{
			let port = routers[router].borrow().num_output_ports();
			let router:Rc<RefCell<dyn FlitSource>> = routers[router].clone();
			(Rc::downgrade(&router),port)
		},
		Endpoint::Interface(interface) =>
		{
			if interfaces[interface].borrow().has_out_link()
			{
				return Err(error!(bad_argument).with_message(format!("interface {} has already a link towards a router",interface)));
			}
			let interface:Rc<RefCell<dyn FlitSource>> = interfaces[interface].clone();
			(Rc::downgrade(&interface),0)
		},
	};
	let (consumer,consumer_port):(Weak<RefCell<dyn FlitConsumer>>,usize) = match link.target
	{
		Endpoint::Router(router) =>
		{
			let port = routers[router].borrow().num_input_ports();
			let router:Rc<RefCell<dyn FlitConsumer>> = routers[router].clone();
			(Rc::downgrade(&router),port)
		},
		Endpoint::Interface(interface) =>
		{
			if interfaces[interface].borrow().has_in_link()
			{
				return Err(error!(bad_argument).with_message(format!("interface {} has already a link from a router",interface)));
			}
			let interface:Rc<RefCell<dyn FlitConsumer>> = interfaces[interface].clone();
			(Rc::downgrade(&interface),0)
		},
	};
	let network_link = NetworkLink::new(LinkBuilderArgument{
		index,
		latency: link.latency,
		num_vcs: parameters.num_vcs(),
		scheduler: event_queue.clone(),
		source,
		source_port,
		consumer,
		consumer_port,
	});
	match link.source
	{
		Endpoint::Router(router) =>
		{
			let destinations = link.destinations.unwrap_or_default();
			routers[router].borrow_mut().add_output_port(network_link.clone(),destinations,link.weight);
		},
		Endpoint::Interface(interface) => interfaces[interface].borrow_mut().set_out_link(network_link.clone()),
	}
	match link.target
	{
		Endpoint::Router(router) =>
		{
			routers[router].borrow_mut().add_input_port(network_link.clone());
		},
		Endpoint::Interface(interface) => interfaces[interface].borrow_mut().set_in_link(network_link.clone()),
	}
	Ok(network_link)
}
