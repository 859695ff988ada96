//! Wire representations of stack resources.
//!
//! These structures serialize to the JSON bodies an OpenStack client
//! expects from the Neutron and Nova endpoints. Field names and the static
//! placeholder values must stay exactly as they are for client
//! compatibility.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Tenant identifier reported for every resource
pub const DEFAULT_TENANT_ID: &str = "abcdefghijklmnopqrstuvwxyz123456";

/// Status reported for every resource the stack knows about
pub const STATUS_ACTIVE: &str = "ACTIVE";

// ============================================================================
// Neutron
// ============================================================================

/// Body of a Neutron network object
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct NetworkView {
    pub status: String,
    /// Subnet identifiers, empty until a subnet was declared
    pub subnets: Vec<String>,
    pub name: String,
    pub admin_state_up: bool,
    pub tenant_id: String,
    pub id: String,
    pub shared: bool,
}

/// One entry of a subnet's `allocation_pools`
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AllocationPool {
    pub start: String,
    pub end: String,
}

/// Body of a Neutron subnet object
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SubnetView {
    pub name: Option<String>,
    pub network_id: String,
    pub tenant_id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub dns_nameservers: Vec<String>,
    pub allocation_pools: Vec<AllocationPool>,
    pub host_routers: Vec<String>,
    pub gateway_ip: Option<String>,
    /// Serialized as the string "4"
    pub ip_version: String,
    pub cidr: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub id: Option<String>,
    pub enable_dhcp: bool,
}

/// Body of a Neutron router object
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RouterView {
    pub id: String,
    pub name: String,
    pub status: String,
    pub admin_state_up: bool,
    pub tenant_id: String,
    pub external_gateway_info: Option<String>,
    /// Names of the attached subnets
    pub subnets: Vec<String>,
}

/// Entry of a port's `fixed_ips`
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FixedIp {
    pub ip_address: String,
    pub subnet_id: Option<String>,
}

/// Body of a Neutron port object
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PortView {
    pub id: String,
    pub name: String,
    pub status: String,
    pub admin_state_up: bool,
    pub tenant_id: String,
    pub network_id: Option<String>,
    pub fixed_ips: Vec<FixedIp>,
    pub floating_network_id: Option<String>,
    pub device_owner: String,
}

// ============================================================================
// Nova
// ============================================================================

/// Network entry of a server object
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ServerNetworkView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
}

/// Body of a Nova server object
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ServerView {
    pub id: String,
    pub name: String,
    pub status: String,
    pub tenant_id: String,
    pub flavor: Option<String>,
    pub image: Option<String>,
    pub networks: Vec<ServerNetworkView>,
}
