//! Port resource.
//!
//! Templates only name ports and attach floating IPs to them. The network
//! binding and the fixed address are written later by the stack's port
//! operations, never by template resolution.

use uuid::Uuid;

use super::wire::{FixedIp, PortView, STATUS_ACTIVE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    pub name: String,
    pub id: String,
    /// Floating network identifier recorded by a floating IP declaration
    pub floating_ip: Option<String>,
    pub network_name: Option<String>,
    /// Fixed address in "A.B.C.D/P" form
    pub ip_address: Option<String>,
}

impl Port {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            id: Uuid::new_v4().to_string(),
            floating_ip: None,
            network_name: None,
            ip_address: None,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.network_name.is_some()
    }

    /// `network_id` and `subnet_id` come from the owning network, if any
    pub fn port_dict(&self, tenant_id: &str, network_id: Option<&str>, subnet_id: Option<&str>) -> PortView {
        let fixed_ips = self
            .ip_address
            .iter()
            .map(|address| FixedIp {
                ip_address: crate::ip::cidr::strip_prefix(address).to_string(),
                subnet_id: subnet_id.map(str::to_string),
            })
            .collect();

        PortView {
            id: self.id.clone(),
            name: self.name.clone(),
            status: STATUS_ACTIVE.to_string(),
            admin_state_up: true,
            tenant_id: tenant_id.to_string(),
            network_id: network_id.map(str::to_string),
            fixed_ips,
            floating_network_id: self.floating_ip.clone(),
            device_owner: String::new(),
        }
    }
}
