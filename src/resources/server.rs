//! Compute instance resource.

use uuid::Uuid;

use super::wire::{ServerNetworkView, ServerView, STATUS_ACTIVE};

/// Launch command recorded for every server; starting it is up to the caller
pub const LAUNCH_COMMAND_PLACEHOLDER: &str = "dockerCommand";

/// One entry of a server's `networks` property
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkAttachment {
    pub port: Option<String>,
    pub network: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Server {
    pub name: String,
    pub id: String,
    pub flavor: Option<String>,
    pub image: Option<String>,
    pub networks: Vec<NetworkAttachment>,
    pub command: Option<String>,
}

impl Server {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            id: Uuid::new_v4().to_string(),
            flavor: None,
            image: None,
            networks: Vec::new(),
            command: None,
        }
    }

    pub fn server_dict(&self, tenant_id: &str) -> ServerView {
        ServerView {
            id: self.id.clone(),
            name: self.name.clone(),
            status: STATUS_ACTIVE.to_string(),
            tenant_id: tenant_id.to_string(),
            flavor: self.flavor.clone(),
            image: self.image.clone(),
            networks: self
                .networks
                .iter()
                .map(|attachment| ServerNetworkView {
                    port: attachment.port.clone(),
                    network: attachment.network.clone(),
                })
                .collect(),
        }
    }
}
