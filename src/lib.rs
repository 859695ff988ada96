//! # Heatstack - Heat template resolution for an OpenStack emulator
//!
//! This library turns Heat Orchestration Templates (HOT) into an in-memory
//! stack of emulated networking resources, and hands out per-network
//! addresses to ports bound after deployment.
//!
//! ## Overview
//!
//! A template's `resources` section is resolved into four registries
//! (networks, ports, routers, servers) keyed by resource name. Resources
//! may be referenced before they are declared; they are created on first
//! reference. Router interfaces need their subnet to exist and are retried
//! in later passes when it does not yet.
//!
//! ## Architecture
//!
//! - `ip`: IPv4 arithmetic, CIDR ranges and per-network address allocation
//! - `resources`: network, subnet, port, router and server state plus the
//!   JSON views the API layer reports
//! - `stack`: registries with get-or-create lookup, port binding, and a
//!   lock-protected handle for concurrent callers
//! - `template`: HOT parsing, version checks and the resolver
//! - `config`: optional YAML settings (tenant, retry policy, log level)
//! - `orchestrator`: load, resolve, attach ports and write the snapshot
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use heatstack::{orchestrator, template};
//!
//! let template = template::load_template("stack.yaml".as_ref())?;
//! let deployment = orchestrator::deploy(&template, &orchestrator::DeploymentOptions::default())?;
//! orchestrator::write_snapshot(&deployment.snapshot, "stack.json".as_ref())?;
//! # Ok::<(), color_eyre::Report>(())
//! ```
//!
//! ## Template Format
//!
//! ```yaml
//! heat_template_version: 2015-04-30
//! resources:
//!   net:
//!     type: OS::Neutron::Net
//!     properties:
//!       name: net
//!   subnet:
//!     type: OS::Neutron::Subnet
//!     properties:
//!       name: subnet
//!       cidr: 10.0.0.0/24
//!       gateway_ip: 10.0.0.1
//!       network: {get_resource: net}
//! ```

pub mod config;
pub mod ip;
pub mod orchestrator;
pub mod resources;
pub mod stack;
pub mod template;

// Re-export commonly used types
pub use config::{load_settings, Settings, SettingsError};
pub use ip::{AddressAllocator, AllocationError};
pub use stack::{SharedStack, Stack, StackError, StackSnapshot};
pub use template::{load_template, parse_template, ResolutionReport, Resolver, RetryPolicy, Template, TemplateError};
