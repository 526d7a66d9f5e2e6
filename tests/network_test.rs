mod common;
use caminos_vcrouter::*;
use common::*;

#[test]
fn burst_is_delivered_along_a_line()
{
    init_logger();
    let cv = configuration(router_parameters_cv(1, 2, 4, 2), 3, line_links(3, 1), burst_traffic(5, 4), 2000);
    let mut simulation = Simulation::new(&cv).expect("valid configuration");
    simulation.run().expect("traffic without errors");
    assert!(simulation.traffic.is_finished());
    assert!(simulation.network.is_drained());
    assert!(simulation.event_queue.now() < 2000);
    let results = simulation.get_simulation_results();
    println!("{}", results);
    assert_eq!(result_field(&results, "consumed_messages"), 15.0);
    //Each message is routed by every router between its origin and its destination, both included.
    assert_eq!(result_field(&results, "routed_flits"), 140.0);
    assert!(result_field(&results, "average_message_delay") > 0.0);
    assert_eq!(result_field(&results, "cycle"), simulation.event_queue.now() as f64);
}

#[test]
fn single_flit_messages_over_slow_links()
{
    init_logger();
    let cv = configuration(router_parameters_cv(1, 1, 2, 1), 4, line_links(4, 3), burst_traffic(6, 1), 2000);
    let mut simulation = Simulation::new(&cv).expect("valid configuration");
    simulation.run().expect("traffic without errors");
    assert!(simulation.traffic.is_finished());
    assert!(simulation.network.is_drained());
    let results = simulation.get_simulation_results();
    assert_eq!(result_field(&results, "consumed_messages"), 24.0);
    //Crossing a router link alone takes its latency.
    assert!(result_field(&results, "average_message_delay") >= 3.0);
}

#[test]
fn ordered_network_delivers_in_order()
{
    init_logger();
    let mut router = router_parameters_cv(2, 3, 4, 2);
    if let ConfigurationValue::Object(_, ref mut pairs) = router
    {
        pairs.push(("ordered_virtual_networks".to_string(), ConfigurationValue::Array(vec![ConfigurationValue::False, ConfigurationValue::True])));
    }
    let cv = configuration(router, 3, line_links(3, 2), burst_traffic(1, 1), 2000);
    let simulation = Simulation::new(&cv).expect("valid configuration");
    for id in 0..8
    {
        simulation.network.interfaces[0].borrow_mut().enqueue_message(message(id, 0, 2, 1, 3));
    }
    let mut delivered = vec![];
    while delivered.len() < 8 && simulation.event_queue.now() < 1000
    {
        simulation.event_queue.process_cycle();
        delivered.extend(simulation.network.interfaces[2].borrow_mut().take_consumed_messages().iter().map(|message| message.id));
    }
    assert_eq!(delivered, (0..8).collect::<Vec<usize>>());
    //Only the first channel of the ordered class has been used.
    let carried: Vec<usize> = simulation.network.links.iter().map(|link| link.borrow().statistics().flits_per_vc[4]).collect();
    assert!(carried.iter().all(|&flits| flits == 0));
    assert!(simulation.network.is_drained());
}

#[test]
fn homogeneous_load_is_accepted()
{
    init_logger();
    let cv = configuration(router_parameters_cv(1, 2, 4, 2), 4, line_links(4, 1), homogeneous_traffic(0.2, 4), 1000);
    let mut simulation = Simulation::new(&cv).expect("valid configuration");
    simulation.run().expect("traffic without errors");
    assert_eq!(simulation.event_queue.now(), 1000);
    let results = simulation.get_simulation_results();
    println!("{}", results);
    let injected = result_field(&results, "injected_load");
    let accepted = result_field(&results, "accepted_load");
    assert!(injected > 0.12 && injected < 0.28, "injected load {}", injected);
    assert!(accepted <= injected);
    assert!(accepted > 0.1, "accepted load {}", accepted);
    assert!(result_field(&results, "average_link_utilization") > 0.0);
}

fn expect_error(links: Vec<ConfigurationValue>, traffic: ConfigurationValue)
{
    let cv = configuration(router_parameters_cv(1, 2, 4, 1), 2, links, traffic, 100);
    match Simulation::new(&cv)
    {
        Ok(_) => panic!("the configuration should have been rejected"),
        Err(error) => println!("rejected with {}", error),
    }
}

#[test]
fn reject_bad_networks()
{
    init_logger();
    let traffic = burst_traffic(1, 1);
    //A router linked to itself.
    let mut links = line_links(2, 1);
    links.push(link(endpoint("Router", 1), endpoint("Router", 1), Some(vec![0]), 1));
    expect_error(links, traffic.clone());
    //Zero latency.
    let mut links = line_links(2, 1);
    links[2] = link(endpoint("Router", 0), endpoint("Router", 1), Some(vec![1]), 0);
    expect_error(links, traffic.clone());
    //A router link without destinations.
    let mut links = line_links(2, 1);
    links[2] = link(endpoint("Router", 0), endpoint("Router", 1), None, 1);
    expect_error(links, traffic.clone());
    //An interface link with destinations.
    let mut links = line_links(2, 1);
    links[0] = link(endpoint("Interface", 0), endpoint("Router", 0), Some(vec![1]), 1);
    expect_error(links, traffic.clone());
    //A router that does not exist.
    let mut links = line_links(2, 1);
    links.push(link(endpoint("Router", 0), endpoint("Router", 5), Some(vec![1]), 1));
    expect_error(links, traffic.clone());
    //An interface without a way out.
    let mut links = line_links(2, 1);
    links.remove(0);
    expect_error(links, traffic.clone());
    //An interface attached twice.
    let mut links = line_links(2, 1);
    links.push(link(endpoint("Interface", 1), endpoint("Router", 0), None, 1));
    expect_error(links, traffic.clone());
    //A fractional weight.
    let mut links = line_links(2, 1);
    if let ConfigurationValue::Object(_, ref mut pairs) = links[2]
    {
        pairs.push(("weight".to_string(), ConfigurationValue::Number(3.7)));
    }
    expect_error(links, traffic.clone());
    //Unknown traffic.
    expect_error(line_links(2, 1), ConfigurationValue::object("Permutation", vec![]));
}

#[test]
fn reject_short_event_queue()
{
    let mut cv = configuration(router_parameters_cv(1, 2, 4, 1), 2, line_links(2, 8), burst_traffic(1, 1), 100);
    if let ConfigurationValue::Object(_, ref mut pairs) = cv
    {
        pairs.push(("event_queue_size".to_string(), ConfigurationValue::Number(8.0)));
    }
    assert!(Simulation::new(&cv).is_err());
}

#[test]
fn traffic_for_missing_virtual_network()
{
    let traffic = ConfigurationValue::object("Burst", vec![
        ("messages_per_interface", ConfigurationValue::Number(1.0)),
        ("message_size", ConfigurationValue::Number(1.0)),
        ("virtual_network", ConfigurationValue::Number(3.0)),
    ]);
    let cv = configuration(router_parameters_cv(1, 2, 4, 1), 2, line_links(2, 1), traffic, 100);
    let mut simulation = Simulation::new(&cv).expect("valid configuration");
    assert!(simulation.run().is_err());
}
