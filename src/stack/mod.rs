//! # Resource Stack
//!
//! A stack is the in-memory result of resolving one template: four
//! independent registries of networks, ports, routers and servers, each
//! keyed by resource name. Entries are created on first reference, which is
//! how templates may name a resource before declaring it.
//!
//! References between resources are kept by name. A router stores subnet
//! names, a port stores the name of the network it is bound to.
//!
//! ## Port binding
//!
//! Template resolution never binds ports to addresses. The API layer does
//! that afterwards through [`Stack::attach_port`], [`Stack::detach_port`]
//! and [`Stack::rename_port`], which drive the owning network's allocator.
//! When several callers share a stack, use [`SharedStack`] so allocation
//! runs under a lock.

pub mod registry;
pub mod shared;
pub mod snapshot;

use uuid::Uuid;

use crate::ip::cidr::strip_prefix;
use crate::ip::AllocationError;
use crate::resources::{Network, Port, Router, Server, SubnetSpec};

pub use registry::{Registry, StackResource};
pub use shared::SharedStack;
pub use snapshot::{StackSnapshot, UnresolvedView};

/// Errors returned by stack-level port operations
#[derive(Debug, thiserror::Error)]
pub enum StackError {
    #[error("Network '{0}' not found")]
    NetworkNotFound(String),
    #[error("Port '{0}' not found")]
    PortNotFound(String),
    #[error("Port '{0}' already exists")]
    PortExists(String),
    #[error("Port '{port}' is already bound to network '{network}'")]
    PortAlreadyBound { port: String, network: String },
    #[error("No free address left in network '{0}'")]
    AddressExhausted(String),
    #[error("Address allocation failed in network '{network}': {source}")]
    Allocation {
        network: String,
        #[source]
        source: AllocationError,
    },
    #[error("Stack lock poisoned")]
    Poisoned,
}

#[derive(Debug, Clone)]
pub struct Stack {
    pub name: String,
    pub id: String,
    pub networks: Registry<Network>,
    pub ports: Registry<Port>,
    pub routers: Registry<Router>,
    pub servers: Registry<Server>,
}

impl Default for Stack {
    fn default() -> Self {
        Self::new("stack")
    }
}

impl Stack {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            id: Uuid::new_v4().to_string(),
            networks: Registry::new(),
            ports: Registry::new(),
            routers: Registry::new(),
            servers: Registry::new(),
        }
    }

    /// Find the network whose subnet carries `subnet_name`
    pub fn network_for_subnet(&self, subnet_name: &str) -> Option<&Network> {
        self.networks
            .values()
            .find(|net| net.subnet_name.as_deref() == Some(subnet_name))
    }

    /// Attach (or replace) the subnet of `network_name`, creating the network
    /// if needed.
    ///
    /// A new CIDR drops every address the network had issued, so ports bound
    /// to it are unbound as well. On error nothing changes.
    pub fn apply_subnet(&mut self, network_name: &str, subnet: &SubnetSpec) -> Result<(), AllocationError> {
        self.networks.get_or_create(network_name).apply_subnet(subnet)?;

        for port in self
            .ports
            .values_mut()
            .filter(|port| port.network_name.as_deref() == Some(network_name))
        {
            log::warn!(
                "Unbinding port {} from network {}: subnet {} was re-applied",
                port.name,
                network_name,
                subnet.name
            );
            port.network_name = None;
            port.ip_address = None;
        }
        Ok(())
    }

    /// Bind a port to a network and give it an address.
    ///
    /// With `fixed_ip` the caller's address is claimed, otherwise the lowest
    /// free one is issued. The port is created if it does not exist yet.
    /// Returns the address in "A.B.C.D/P" form.
    pub fn attach_port(
        &mut self,
        port_name: &str,
        network_name: &str,
        fixed_ip: Option<&str>,
    ) -> Result<String, StackError> {
        if let Some(bound_to) = self.ports.get(port_name).and_then(|port| port.network_name.clone()) {
            return Err(StackError::PortAlreadyBound {
                port: port_name.to_string(),
                network: bound_to,
            });
        }

        let network = self
            .networks
            .get_mut(network_name)
            .ok_or_else(|| StackError::NetworkNotFound(network_name.to_string()))?;
        let allocation_error = |source| StackError::Allocation {
            network: network_name.to_string(),
            source,
        };
        let range = network
            .allocator()
            .range()
            .ok_or_else(|| allocation_error(AllocationError::NoCidr))?;

        let address = match fixed_ip {
            Some(ip) => {
                network.allocator_mut().assign(ip, port_name).map_err(allocation_error)?;
                format!("{}/{}", strip_prefix(ip), range.prefix)
            }
            None => network
                .allocator_mut()
                .allocate_next(port_name)
                .ok_or_else(|| StackError::AddressExhausted(network_name.to_string()))?,
        };

        let port = self.ports.get_or_create(port_name);
        port.network_name = Some(network_name.to_string());
        port.ip_address = Some(address.clone());
        log::info!("Attached port {} to network {} with {}", port_name, network_name, address);

        Ok(address)
    }

    /// Unbind a port and return its address to the network's pool
    pub fn detach_port(&mut self, port_name: &str) -> Result<(), StackError> {
        let port = self
            .ports
            .get_mut(port_name)
            .ok_or_else(|| StackError::PortNotFound(port_name.to_string()))?;

        let network_name = port.network_name.take();
        let address = port.ip_address.take();
        if let (Some(network_name), Some(address)) = (network_name, address) {
            match self.networks.get_mut(&network_name) {
                Some(network) if network.allocator().is_assigned_to(&address, port_name) => {
                    network.allocator_mut().release(&address)
                }
                Some(_) => log::warn!(
                    "Port {} no longer holds {} in network {}, nothing to release",
                    port_name,
                    address,
                    network_name
                ),
                None => log::warn!(
                    "Port {} was bound to unknown network {}, nothing to release",
                    port_name,
                    network_name
                ),
            }
            log::info!("Detached port {} from network {}", port_name, network_name);
        }
        Ok(())
    }

    /// Rename a port, keeping its binding and issued address
    pub fn rename_port(&mut self, old_name: &str, new_name: &str) -> Result<(), StackError> {
        if self.ports.contains(new_name) {
            return Err(StackError::PortExists(new_name.to_string()));
        }
        let mut port = self
            .ports
            .remove(old_name)
            .ok_or_else(|| StackError::PortNotFound(old_name.to_string()))?;

        if let (Some(network_name), Some(address)) = (port.network_name.clone(), port.ip_address.clone()) {
            if let Some(network) = self.networks.get_mut(&network_name) {
                if let Err(source) = network.allocator_mut().rebind(&address, new_name) {
                    self.ports.insert(old_name, port);
                    return Err(StackError::Allocation {
                        network: network_name,
                        source,
                    });
                }
            }
        }

        port.name = new_name.to_string();
        self.ports.insert(new_name, port);
        Ok(())
    }

    /// Wire view of a port with its owning network's identifiers filled in
    pub fn port_dict(&self, port: &Port, tenant_id: &str) -> crate::resources::wire::PortView {
        let network = port
            .network_name
            .as_deref()
            .and_then(|name| self.networks.get(name));
        port.port_dict(
            tenant_id,
            network.map(|net| net.id.as_str()),
            network.and_then(|net| net.subnet_id.as_deref()),
        )
    }
}
