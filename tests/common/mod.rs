#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use caminos_vcrouter::*;

pub fn init_logger()
{
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn parameters(virtual_networks: usize, vcs_per_class: usize, buffer_size: usize, pipeline_stages: usize) -> RouterParameters
{
    RouterParameters{
        virtual_networks,
        vcs_per_class,
        buffer_size,
        pipeline_stages,
        ordered_virtual_networks: vec![false; virtual_networks],
    }
}

pub fn message(id: usize, origin: usize, destination: usize, virtual_network: usize, size: usize) -> Rc<Message>
{
    Rc::new(Message{
        id,
        origin,
        destination: NetDest::single(destination),
        virtual_network,
        size,
        creation_cycle: 0,
        payload: vec![],
    })
}

/// The flits of a message as they would arrive from the upstream link, in the virtual channel `vc` from cycle `time`.
pub fn arriving_flits(message: &Rc<Message>, vc: usize, time: Time) -> Vec<Flit>
{
    Flit::split(message, vc, time)
}

/// Stands for the link feeding an input port. The test puts the flits in `flits`.
#[derive(Default)]
pub struct MockInput
{
    pub flits: FlitBuffer,
    pub grants: Vec<(usize, Time)>,
    pub releases: Vec<(usize, Time)>,
}

impl InputLink for MockInput
{
    fn is_ready(&self, now: Time) -> bool
    {
        self.flits.is_ready(now)
    }
    fn peek(&self) -> Option<&Flit>
    {
        self.flits.peek()
    }
    fn consume(&mut self) -> Option<Flit>
    {
        self.flits.pop()
    }
    fn grant_vc(&mut self, vc: usize, time: Time)
    {
        self.grants.push((vc, time));
    }
    fn release_vc(&mut self, vc: usize, time: Time)
    {
        self.releases.push((vc, time));
    }
}

/// Stands for the link behind an output port, recording what the router asks of it.
pub struct MockOutput
{
    self_rc: Weak<RefCell<MockOutput>>,
    pub requests: Vec<(usize, NetDest, Time)>,
    pub sent: Vec<Flit>,
    /// Answer of `has_buffer_space` for every virtual channel.
    pub space: bool,
}

impl MockOutput
{
    pub fn new() -> Rc<RefCell<MockOutput>>
    {
        let r = Rc::new(RefCell::new(MockOutput{
            self_rc: Weak::new(),
            requests: vec![],
            sent: vec![],
            space: true,
        }));
        r.borrow_mut().self_rc = Rc::downgrade(&r);
        r
    }
}

impl Eventful for MockOutput
{
    fn process(&mut self)
    {
    }
    fn as_eventful(&self) -> Weak<RefCell<dyn Eventful>>
    {
        self.self_rc.clone()
    }
}

impl OutputLink for MockOutput
{
    fn request_vc(&mut self, vc: usize, destination: &NetDest, time: Time)
    {
        self.requests.push((vc, destination.clone(), time));
    }
    fn has_buffer_space(&self, _vc: usize) -> bool
    {
        self.space
    }
    fn enqueue(&mut self, flit: Flit)
    {
        self.sent.push(flit);
    }
}

pub struct RouterFixture
{
    pub queue: Rc<EventQueue>,
    pub router: Rc<RefCell<PipelinedRouter>>,
    pub inputs: Vec<Rc<RefCell<MockInput>>>,
    pub outputs: Vec<Rc<RefCell<MockOutput>>>,
}

/// A router with `inputs` mocked input ports and an output port for each `(destinations,weight)` in `routes`.
pub fn router_fixture(parameters: &RouterParameters, inputs: usize, routes: &[(Vec<usize>, i32)]) -> RouterFixture
{
    let queue = Rc::new(EventQueue::new(16));
    let router = PipelinedRouter::new(RouterBuilderArgument{
        index: 0,
        parameters,
        scheduler: queue.clone(),
    });
    let inputs: Vec<Rc<RefCell<MockInput>>> = (0..inputs).map(|_| Rc::new(RefCell::new(MockInput::default()))).collect();
    for input in inputs.iter()
    {
        router.borrow_mut().add_input_port(input.clone());
    }
    let mut outputs = vec![];
    for (destinations, weight) in routes.iter()
    {
        let output = MockOutput::new();
        router.borrow_mut().add_output_port(output.clone(), destinations.iter().cloned().collect(), *weight);
        outputs.push(output);
    }
    RouterFixture{ queue, router, inputs, outputs }
}

pub fn router_parameters_cv(virtual_networks: usize, vcs_per_class: usize, buffer_size: usize, pipeline_stages: usize) -> ConfigurationValue
{
    ConfigurationValue::object("RouterParameters", vec![
        ("virtual_networks", ConfigurationValue::Number(virtual_networks as f64)),
        ("vcs_per_class", ConfigurationValue::Number(vcs_per_class as f64)),
        ("buffer_size", ConfigurationValue::Number(buffer_size as f64)),
        ("pipeline_stages", ConfigurationValue::Number(pipeline_stages as f64)),
    ])
}

pub fn endpoint(kind: &str, index: usize) -> ConfigurationValue
{
    ConfigurationValue::object(kind, vec![("index", ConfigurationValue::Number(index as f64))])
}

pub fn link(source: ConfigurationValue, target: ConfigurationValue, destinations: Option<Vec<usize>>, latency: usize) -> ConfigurationValue
{
    let mut pairs = vec![
        ("source", source),
        ("target", target),
        ("latency", ConfigurationValue::Number(latency as f64)),
    ];
    if let Some(destinations) = destinations
    {
        pairs.push(("destinations", ConfigurationValue::Array(destinations.into_iter().map(|d| ConfigurationValue::Number(d as f64)).collect())));
    }
    ConfigurationValue::object("Link", pairs)
}

/// The links of a line of `routers` routers, each one with its own interface.
pub fn line_links(routers: usize, latency: usize) -> Vec<ConfigurationValue>
{
    let mut links = vec![];
    for index in 0..routers
    {
        links.push(link(endpoint("Interface", index), endpoint("Router", index), None, 1));
        links.push(link(endpoint("Router", index), endpoint("Interface", index), Some(vec![index]), 1));
        if index + 1 < routers
        {
            links.push(link(endpoint("Router", index), endpoint("Router", index + 1), Some((index + 1..routers).collect()), latency));
            links.push(link(endpoint("Router", index + 1), endpoint("Router", index), Some((0..=index).collect()), latency));
        }
    }
    links
}

pub fn configuration(router: ConfigurationValue, routers: usize, links: Vec<ConfigurationValue>, traffic: ConfigurationValue, cycles: usize) -> ConfigurationValue
{
    ConfigurationValue::object("Configuration", vec![
        ("random_seed", ConfigurationValue::Number(7.0)),
        ("cycles", ConfigurationValue::Number(cycles as f64)),
        ("router", router),
        ("routers", ConfigurationValue::Number(routers as f64)),
        ("interfaces", ConfigurationValue::Number(routers as f64)),
        ("links", ConfigurationValue::Array(links)),
        ("traffic", traffic),
    ])
}

pub fn burst_traffic(messages_per_interface: usize, message_size: usize) -> ConfigurationValue
{
    ConfigurationValue::object("Burst", vec![
        ("messages_per_interface", ConfigurationValue::Number(messages_per_interface as f64)),
        ("message_size", ConfigurationValue::Number(message_size as f64)),
    ])
}

pub fn homogeneous_traffic(load: f64, message_size: usize) -> ConfigurationValue
{
    ConfigurationValue::object("HomogeneousTraffic", vec![
        ("load", ConfigurationValue::Number(load)),
        ("message_size", ConfigurationValue::Number(message_size as f64)),
    ])
}

/// Read a numeric field of the results.
pub fn result_field(results: &ConfigurationValue, field: &str) -> f64
{
    match results
    {
        ConfigurationValue::Object(name, pairs) if name == "Result" =>
        {
            match pairs.iter().find(|(key, _)| key == field)
            {
                Some((_, ConfigurationValue::Number(x))) => *x,
                _ => panic!("there is no numeric field {} in the results", field),
            }
        },
        _ => panic!("the results are not a Result object"),
    }
}
