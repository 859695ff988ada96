//! Stack resource types.
//!
//! Networks, routers, ports and servers as held by a resource stack, plus
//! their wire projections for the OpenStack-style API layer.

pub mod network;
pub mod port;
pub mod router;
pub mod server;
pub mod wire;

pub use network::{Network, SubnetSpec};
pub use port::Port;
pub use router::Router;
pub use server::{NetworkAttachment, Server, LAUNCH_COMMAND_PLACEHOLDER};
pub use wire::DEFAULT_TENANT_ID;
