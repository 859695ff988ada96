//! End-to-end resolution of Heat templates through the public API.

use std::io::Write;

use heatstack::ip::AddressAllocator;
use heatstack::orchestrator::{deploy, DeploymentOptions};
use heatstack::resources::Router;
use heatstack::stack::{SharedStack, Stack};
use heatstack::template::{load_template, parse_template, resolve_template, RetryPolicy};
use tempfile::NamedTempFile;

const TWO_TIER: &str = r#"
heat_template_version: 2016-10-14
description: Two tier application network
parameters:
  public_net:
    type: string
    default: public
  flavor:
    type: string
    default: m1.tiny
resources:
  web_server:
    type: OS::Nova::Server
    properties:
      name: web
      flavor: {get_param: flavor}
      image: cirros
      networks:
        - port: {get_resource: web_port}
  web_port:
    type: OS::Neutron::Port
    properties:
      name: web-port
      network: {get_resource: front_net}
  web_fip:
    type: OS::Neutron::FloatingIP
    properties:
      floating_network_id: {get_param: public_net}
      port_id: {get_resource: web_port}
  front_iface:
    type: OS::Neutron::RouterInterface
    properties:
      router: {get_resource: edge}
      subnet: {get_resource: front_subnet}
  back_iface:
    type: OS::Neutron::RouterInterface
    properties:
      router: {get_resource: edge}
      subnet: {get_resource: back_subnet}
  edge:
    type: OS::Neutron::Router
    properties:
      name: edge
  front_subnet:
    type: OS::Neutron::Subnet
    properties:
      name: front-subnet
      cidr: 10.0.1.0/24
      gateway_ip: 10.0.1.1
      network: {get_resource: front_net}
  back_subnet:
    type: OS::Neutron::Subnet
    properties:
      name: back-subnet
      cidr: 10.0.2.0/24
      gateway_ip: 10.0.2.1
      network: {get_resource: back_net}
  front_net:
    type: OS::Neutron::Net
    properties:
      name: front
  back_net:
    type: OS::Neutron::Net
    properties:
      name: back
"#;

#[test]
fn test_two_tier_template() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", TWO_TIER).unwrap();
    let template = load_template(file.path()).unwrap();

    let mut stack = Stack::new("two-tier");
    let report = resolve_template(&template, &mut stack, RetryPolicy::default());

    assert!(report.is_complete(), "{:?}", report);
    assert_eq!(report.passes, 2);
    assert_eq!(report.resolved.len(), 10);

    assert_eq!(stack.networks.names().collect::<Vec<_>>(), vec!["back", "front"]);
    assert_eq!(stack.routers.len(), 1);
    assert_eq!(stack.ports.len(), 1);
    assert_eq!(stack.servers.len(), 1);

    let mut expected = Router::new("edge");
    expected.add_subnet("back-subnet");
    expected.add_subnet("front-subnet");
    assert_eq!(stack.routers.get("edge").unwrap(), &expected);

    let port = stack.ports.get("web-port").unwrap();
    assert_eq!(port.floating_ip.as_deref(), Some("public"));
    let server = stack.servers.get("web").unwrap();
    assert_eq!(server.flavor.as_deref(), Some("m1.tiny"));
    assert_eq!(server.networks[0].port.as_deref(), Some("web-port"));
}

#[test]
fn test_declaration_order_does_not_change_result() {
    let forward = r#"
heat_template_version: 2015-04-30
resources:
  net:
    type: OS::Neutron::Net
    properties:
      name: net
  subnet:
    type: OS::Neutron::Subnet
    properties:
      name: subnet
      cidr: 172.16.0.0/16
      gateway_ip: 172.16.0.1
      network: {get_resource: net}
  router:
    type: OS::Neutron::Router
    properties:
      name: router
  iface:
    type: OS::Neutron::RouterInterface
    properties:
      router: {get_resource: router}
      subnet: {get_resource: subnet}
"#;
    let reversed = r#"
heat_template_version: 2015-04-30
resources:
  iface:
    type: OS::Neutron::RouterInterface
    properties:
      router: {get_resource: router}
      subnet: {get_resource: subnet}
  router:
    type: OS::Neutron::Router
    properties:
      name: router
  subnet:
    type: OS::Neutron::Subnet
    properties:
      name: subnet
      cidr: 172.16.0.0/16
      gateway_ip: 172.16.0.1
      network: {get_resource: net}
  net:
    type: OS::Neutron::Net
    properties:
      name: net
"#;

    let mut a = Stack::new("a");
    let mut b = Stack::new("b");
    resolve_template(&parse_template(forward).unwrap(), &mut a, RetryPolicy::default());
    resolve_template(&parse_template(reversed).unwrap(), &mut b, RetryPolicy::default());

    assert_eq!(a.networks.get("net").unwrap(), b.networks.get("net").unwrap());
    assert_eq!(a.routers.get("router").unwrap(), b.routers.get("router").unwrap());
}

#[test]
fn test_port_addresses_follow_allocation_order() {
    let template = parse_template(
        r#"
heat_template_version: 2015-04-30
resources:
  net:
    type: OS::Neutron::Net
    properties:
      name: net
  subnet:
    type: OS::Neutron::Subnet
    properties:
      name: subnet
      cidr: 10.0.0.0/24
      gateway_ip: 10.0.0.1
      network: {get_resource: net}
"#,
    )
    .unwrap();
    let deployment = deploy(&template, &DeploymentOptions::default()).unwrap();
    let stack = deployment.stack;

    assert_eq!(stack.attach_port("a", "net", None).unwrap(), "10.0.0.2/24");
    assert_eq!(stack.attach_port("b", "net", None).unwrap(), "10.0.0.3/24");
    stack.detach_port("a").unwrap();
    assert_eq!(stack.attach_port("c", "net", None).unwrap(), "10.0.0.2/24");
}

#[test]
fn test_shared_stack_across_threads() {
    let mut stack = Stack::new("shared");
    let mut allocator = AddressAllocator::new();
    allocator.set_cidr("192.168.0.0/24").unwrap();
    stack
        .networks
        .get_or_create("net")
        .set_cidr("192.168.0.0/24")
        .unwrap();
    let shared = SharedStack::new(stack);

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let shared = shared.clone();
            std::thread::spawn(move || {
                (0..10)
                    .map(|i| shared.attach_port(&format!("p{}-{}", t, i), "net", None).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut addresses: Vec<String> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
    addresses.sort();
    addresses.dedup();
    assert_eq!(addresses.len(), 40);

    // Same addresses a single allocator hands out sequentially
    let mut sequential: Vec<String> = (0..40).map(|i| allocator.allocate_next(&format!("x{}", i)).unwrap()).collect();
    sequential.sort();
    assert_eq!(addresses, sequential);
}
