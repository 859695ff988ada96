//! Serializable view of a whole stack.

use serde::Serialize;

use super::Stack;
use crate::resources::wire::{NetworkView, PortView, RouterView, ServerView, SubnetView};

/// A declaration that could not be resolved, as reported in a snapshot
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedView {
    pub name: String,
    pub reason: String,
}

/// Everything the API layer would list for one stack
#[derive(Serialize, Debug, Clone)]
pub struct StackSnapshot {
    pub stack_name: String,
    pub stack_id: String,
    pub networks: Vec<NetworkView>,
    /// One entry per network that has a subnet
    pub subnets: Vec<SubnetView>,
    pub routers: Vec<RouterView>,
    pub ports: Vec<PortView>,
    pub servers: Vec<ServerView>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<UnresolvedView>,
}

impl StackSnapshot {
    pub fn capture(stack: &Stack, tenant_id: &str) -> Self {
        Self {
            stack_name: stack.name.clone(),
            stack_id: stack.id.clone(),
            networks: stack
                .networks
                .values()
                .map(|net| net.network_dict(tenant_id))
                .collect(),
            subnets: stack
                .networks
                .values()
                .filter(|net| net.subnet_name.is_some())
                .map(|net| net.subnet_dict(tenant_id))
                .collect(),
            routers: stack
                .routers
                .values()
                .map(|router| router.router_dict(tenant_id))
                .collect(),
            ports: stack
                .ports
                .values()
                .map(|port| stack.port_dict(port, tenant_id))
                .collect(),
            servers: stack
                .servers
                .values()
                .map(|server| server.server_dict(tenant_id))
                .collect(),
            unresolved: Vec::new(),
        }
    }

    pub fn with_unresolved(mut self, unresolved: Vec<UnresolvedView>) -> Self {
        self.unresolved = unresolved;
        self
    }
}
