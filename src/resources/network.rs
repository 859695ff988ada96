//! Network resource.
//!
//! A network carries at most one subnet. Declaring the subnet sets its CIDR,
//! which (re)initializes the network's address allocator.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::wire::{AllocationPool, NetworkView, SubnetView, STATUS_ACTIVE};
use crate::ip::{AddressAllocator, AllocationError};

/// Subnet attributes applied to a network by a subnet declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetSpec {
    pub name: String,
    pub cidr: String,
    pub gateway_ip: String,
}

#[derive(Debug, Clone)]
pub struct Network {
    pub name: String,
    pub id: String,
    pub subnet_name: Option<String>,
    pub subnet_id: Option<String>,
    pub gateway_ip: Option<String>,
    /// Not set by templates
    pub segmentation_id: Option<u32>,
    pub subnet_created_at: Option<DateTime<Utc>>,
    pub subnet_updated_at: Option<DateTime<Utc>>,
    allocator: AddressAllocator,
}

impl Network {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            id: Uuid::new_v4().to_string(),
            subnet_name: None,
            subnet_id: None,
            gateway_ip: None,
            segmentation_id: None,
            subnet_created_at: None,
            subnet_updated_at: None,
            allocator: AddressAllocator::new(),
        }
    }

    /// First 6 characters of the id
    pub fn short_id(&self) -> &str {
        &self.id[..self.id.len().min(6)]
    }

    /// Attach (or replace) the subnet of this network.
    ///
    /// The CIDR is validated first; on error the network is left unchanged.
    /// A successful call drops every address issued under the previous CIDR.
    pub fn apply_subnet(&mut self, subnet: &SubnetSpec) -> Result<(), AllocationError> {
        self.allocator.set_cidr(&subnet.cidr)?;

        let now = Utc::now();
        if self.subnet_id.is_none() {
            self.subnet_id = Some(Uuid::new_v4().to_string());
            self.subnet_created_at = Some(now);
        }
        self.subnet_updated_at = Some(now);
        self.subnet_name = Some(subnet.name.clone());
        self.gateway_ip = Some(subnet.gateway_ip.clone());
        Ok(())
    }

    pub fn set_cidr(&mut self, cidr: &str) -> Result<(), AllocationError> {
        self.allocator.set_cidr(cidr)
    }

    pub fn cidr(&self) -> Option<&str> {
        self.allocator.cidr()
    }

    pub fn clear_cidr(&mut self) {
        self.allocator.clear_cidr();
    }

    pub fn allocator(&self) -> &AddressAllocator {
        &self.allocator
    }

    pub fn allocator_mut(&mut self) -> &mut AddressAllocator {
        &mut self.allocator
    }

    pub fn network_dict(&self, tenant_id: &str) -> NetworkView {
        NetworkView {
            status: STATUS_ACTIVE.to_string(),
            subnets: self.subnet_id.iter().cloned().collect(),
            name: self.name.clone(),
            admin_state_up: true,
            tenant_id: tenant_id.to_string(),
            id: self.id.clone(),
            shared: false,
        }
    }

    pub fn subnet_dict(&self, tenant_id: &str) -> SubnetView {
        let allocation_pools = self
            .allocator
            .range()
            .map(|range| AllocationPool {
                start: range.start_ip(),
                end: range.end_ip(),
            })
            .into_iter()
            .collect();

        SubnetView {
            name: self.subnet_name.clone(),
            network_id: self.id.clone(),
            tenant_id: tenant_id.to_string(),
            created_at: self.subnet_created_at,
            dns_nameservers: Vec::new(),
            allocation_pools,
            host_routers: Vec::new(),
            gateway_ip: self.gateway_ip.clone(),
            ip_version: "4".to_string(),
            cidr: self.cidr().map(str::to_string),
            updated_at: self.subnet_updated_at,
            id: self.subnet_id.clone(),
            enable_dhcp: false,
        }
    }
}

/// Identity and timestamps are ignored, as are issued addresses
impl PartialEq for Network {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.subnet_name == other.subnet_name
            && self.gateway_ip == other.gateway_ip
            && self.segmentation_id == other.segmentation_id
            && self.allocator.cidr() == other.allocator.cidr()
            && self.allocator.range() == other.allocator.range()
    }
}

impl Eq for Network {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::wire::DEFAULT_TENANT_ID;

    fn subnet(cidr: &str) -> SubnetSpec {
        SubnetSpec {
            name: "subnet-a".to_string(),
            cidr: cidr.to_string(),
            gateway_ip: "10.0.0.1".to_string(),
        }
    }

    #[test]
    fn test_new_network_has_no_subnet() {
        let net = Network::new("net-a");
        let view = net.network_dict(DEFAULT_TENANT_ID);
        assert!(view.subnets.is_empty());
        assert_eq!(view.status, "ACTIVE");
        assert_eq!(view.name, "net-a");
        assert_eq!(net.short_id().len(), 6);

        let subnet_view = net.subnet_dict(DEFAULT_TENANT_ID);
        assert!(subnet_view.allocation_pools.is_empty());
        assert_eq!(subnet_view.cidr, None);
    }

    #[test]
    fn test_apply_subnet() {
        let mut net = Network::new("net-a");
        net.apply_subnet(&subnet("10.0.0.0/24")).unwrap();

        assert_eq!(net.subnet_name.as_deref(), Some("subnet-a"));
        assert_eq!(net.gateway_ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(net.cidr(), Some("10.0.0.0/24"));
        // The subnet gets its own identifier, distinct from the gateway address
        let subnet_id = net.subnet_id.clone().unwrap();
        assert_ne!(subnet_id, "10.0.0.1");
        assert_eq!(net.network_dict(DEFAULT_TENANT_ID).subnets, vec![subnet_id.clone()]);

        // Re-applying keeps the identifier and creation time
        let created = net.subnet_created_at;
        net.apply_subnet(&subnet("10.0.1.0/24")).unwrap();
        assert_eq!(net.subnet_id.as_deref(), Some(subnet_id.as_str()));
        assert_eq!(net.subnet_created_at, created);
    }

    #[test]
    fn test_apply_subnet_with_bad_cidr_changes_nothing() {
        let mut net = Network::new("net-a");
        assert!(net.apply_subnet(&subnet("10.0.0.0")).is_err());
        assert_eq!(net.subnet_name, None);
        assert_eq!(net.subnet_id, None);
        assert_eq!(net.cidr(), None);
    }

    #[test]
    fn test_subnet_dict_fields() {
        let mut net = Network::new("net-a");
        net.apply_subnet(&subnet("10.0.0.0/24")).unwrap();

        let view = net.subnet_dict("tenant");
        assert_eq!(view.allocation_pools, vec![AllocationPool {
            start: "10.0.0.0".to_string(),
            end: "10.0.0.255".to_string(),
        }]);
        assert_eq!(view.network_id, net.id);
        assert_eq!(view.tenant_id, "tenant");

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["ip_version"], "4");
        assert_eq!(json["enable_dhcp"], false);
        assert_eq!(json["cidr"], "10.0.0.0/24");
        assert_eq!(json["gateway_ip"], "10.0.0.1");
        assert!(json["host_routers"].as_array().unwrap().is_empty());
        assert!(json["dns_nameservers"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_network_dict_json() {
        let net = Network::new("net-a");
        let json = serde_json::to_value(net.network_dict(DEFAULT_TENANT_ID)).unwrap();
        assert_eq!(json["tenant_id"], "abcdefghijklmnopqrstuvwxyz123456");
        assert_eq!(json["admin_state_up"], true);
        assert_eq!(json["shared"], false);
        assert_eq!(json["id"], net.id.as_str());
    }

    #[test]
    fn test_equality_ignores_identity_and_assignments() {
        let mut a = Network::new("net-a");
        let mut b = Network::new("net-a");
        assert_eq!(a, b);

        a.apply_subnet(&subnet("10.0.0.0/24")).unwrap();
        assert_ne!(a, b);
        b.apply_subnet(&subnet("10.0.0.0/24")).unwrap();
        assert_eq!(a, b);

        a.allocator_mut().allocate_next("p1");
        assert_eq!(a, b);
    }
}
