//! Template resolution.
//!
//! Turns a list of declarations into stack resources. Declarations are
//! handled in document order; references to resources that are not known
//! yet are tolerated by get-or-create lookups on the stack. The only hard
//! dependency is a router interface's subnet, which must already be
//! attached to a network. Such declarations are deferred and retried in a
//! later pass.
//!
//! The worklist lives in [`Resolver::resolve`] only, so a resolver can be
//! reused for any number of templates and stacks.

use serde::Deserialize;
use std::collections::HashMap;

use super::types::{Declaration, Parameters, Reference, ResourceKind, Template};
use crate::ip::Cidr;
use crate::resources::{NetworkAttachment, SubnetSpec, LAUNCH_COMMAND_PLACEHOLDER};
use crate::stack::{Stack, UnresolvedView};

/// Pass limit used by [`RetryPolicy::default`]
pub const DEFAULT_MAX_PASSES: usize = 16;

/// How often deferred declarations are retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// One retry pass after the first one
    SingleRetry,
    /// Retry until a pass resolves nothing new, or `max_passes` is reached
    UntilStable { max_passes: usize },
}

impl RetryPolicy {
    pub fn max_passes(&self) -> usize {
        match self {
            RetryPolicy::SingleRetry => 2,
            RetryPolicy::UntilStable { max_passes } => (*max_passes).max(1),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::UntilStable {
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

/// Result of handling one declaration once
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A stack entry was created or updated
    Resolved(ResourceKind),
    /// Malformed or unsupported; not retried
    Skipped { reason: String },
    /// A dependency is missing; retried in the next pass
    Deferred { missing: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDeclaration {
    pub name: String,
    pub kind: ResourceKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDeclaration {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedDeclaration {
    pub name: String,
    pub missing: String,
}

/// Aggregated outcome of resolving a set of declarations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionReport {
    pub passes: usize,
    pub resolved: Vec<ResolvedDeclaration>,
    pub skipped: Vec<SkippedDeclaration>,
    /// Still deferred after the last pass
    pub unresolved: Vec<UnresolvedDeclaration>,
}

impl ResolutionReport {
    /// No declaration was skipped or left unresolved
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && self.unresolved.is_empty()
    }

    pub fn unresolved_views(&self) -> Vec<UnresolvedView> {
        self.unresolved
            .iter()
            .map(|entry| UnresolvedView {
                name: entry.name.clone(),
                reason: format!("{} not found", entry.missing),
            })
            .collect()
    }
}

// Property shapes per resource type

#[derive(Debug, Deserialize)]
struct NamedProperties {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubnetProperties {
    cidr: String,
    gateway_ip: String,
    name: String,
    network: Reference,
}

#[derive(Debug, Deserialize)]
struct PortProperties {
    #[serde(default)]
    name: Option<String>,
    network: Reference,
}

#[derive(Debug, Deserialize)]
struct ServerNetworkEntry {
    #[serde(default)]
    port: Option<Reference>,
    #[serde(default)]
    network: Option<Reference>,
}

#[derive(Debug, Deserialize)]
struct ServerProperties {
    #[serde(default)]
    name: Option<String>,
    flavor: Reference,
    image: Reference,
    #[serde(default)]
    networks: Vec<ServerNetworkEntry>,
}

#[derive(Debug, Deserialize)]
struct RouterInterfaceProperties {
    router: Reference,
    subnet: Reference,
}

#[derive(Debug, Deserialize)]
struct FloatingIpProperties {
    port_id: Reference,
    floating_network_id: Reference,
}

/// Why a single declaration could not be handled
enum Failure {
    Skip(String),
    Defer(String),
}

impl From<serde_yaml::Error> for Failure {
    fn from(e: serde_yaml::Error) -> Self {
        Failure::Skip(format!("malformed properties: {}", e))
    }
}

/// Maps `get_resource` targets (declaration keys) to the resource names
/// the declarations give themselves through their `name` property.
struct DeclaredNames<'a> {
    by_key: HashMap<&'a str, &'a str>,
}

impl<'a> DeclaredNames<'a> {
    fn collect(declarations: &'a [Declaration]) -> Self {
        let by_key = declarations
            .iter()
            .filter_map(|decl| decl.declared_name().map(|name| (decl.name.as_str(), name)))
            .collect();
        Self { by_key }
    }

    fn lookup(&self, key: &str) -> String {
        self.by_key.get(key).copied().unwrap_or(key).to_string()
    }
}

/// Resolves declarations into a [`Stack`]
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    parameters: Parameters,
    policy: RetryPolicy,
}

impl Resolver {
    /// Resolver using the template's parameter defaults for `get_param`
    pub fn for_template(template: &Template, policy: RetryPolicy) -> Self {
        Self {
            parameters: template.parameter_defaults(),
            policy,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Resolve all declarations into `stack`.
    ///
    /// A failing declaration never stops the others. Declarations that are
    /// still deferred when the retry policy gives up are listed in the
    /// report's `unresolved`.
    pub fn resolve(&self, declarations: &[Declaration], stack: &mut Stack) -> ResolutionReport {
        let names = DeclaredNames::collect(declarations);
        let max_passes = self.policy.max_passes();
        let mut report = ResolutionReport::default();
        let mut pending: Vec<&Declaration> = declarations.iter().collect();

        while !pending.is_empty() {
            report.passes += 1;
            log::debug!("Resolution pass {} over {} declarations", report.passes, pending.len());

            let mut deferred = Vec::new();
            let mut progressed = false;

            for decl in pending {
                match self.resolve_declaration(decl, &names, stack) {
                    Outcome::Resolved(kind) => {
                        log::debug!("Resolved {} '{}'", kind, decl.name);
                        progressed = true;
                        report.resolved.push(ResolvedDeclaration {
                            name: decl.name.clone(),
                            kind,
                        });
                    }
                    Outcome::Skipped { reason } => {
                        log::warn!("Skipping '{}': {}", decl.name, reason);
                        report.skipped.push(SkippedDeclaration {
                            name: decl.name.clone(),
                            reason,
                        });
                    }
                    Outcome::Deferred { missing } => {
                        log::info!("Deferring '{}': {} does not exist yet", decl.name, missing);
                        deferred.push((decl, missing));
                    }
                }
            }

            if deferred.is_empty() {
                break;
            }
            if !progressed || report.passes >= max_passes {
                for (decl, missing) in deferred {
                    log::warn!("Could not resolve '{}': {} not found", decl.name, missing);
                    report.unresolved.push(UnresolvedDeclaration {
                        name: decl.name.clone(),
                        missing,
                    });
                }
                break;
            }
            pending = deferred.into_iter().map(|(decl, _)| decl).collect();
        }

        log::info!(
            "Resolved {} declarations in {} passes ({} skipped, {} unresolved)",
            report.resolved.len(),
            report.passes,
            report.skipped.len(),
            report.unresolved.len()
        );
        report
    }

    /// Handle one declaration against the current stack state
    fn resolve_declaration(&self, decl: &Declaration, names: &DeclaredNames<'_>, stack: &mut Stack) -> Outcome {
        if decl.resource_type.is_empty() {
            return Outcome::Skipped {
                reason: "declaration has no type".to_string(),
            };
        }
        let Some(kind) = ResourceKind::classify(&decl.resource_type) else {
            return Outcome::Skipped {
                reason: format!("unsupported resource type '{}'", decl.resource_type),
            };
        };

        let handled = match kind {
            ResourceKind::Network => self.resolve_network(decl, stack),
            ResourceKind::Subnet => self.resolve_subnet(decl, names, stack),
            ResourceKind::Port => self.resolve_port(decl, names, stack),
            ResourceKind::Server => self.resolve_server(decl, names, stack),
            ResourceKind::RouterInterface => self.resolve_router_interface(decl, names, stack),
            ResourceKind::FloatingIp => self.resolve_floating_ip(decl, names, stack),
            ResourceKind::Router => self.resolve_router(decl, stack),
        };

        match handled {
            Ok(()) => Outcome::Resolved(kind),
            Err(Failure::Skip(reason)) => Outcome::Skipped { reason },
            Err(Failure::Defer(missing)) => Outcome::Deferred { missing },
        }
    }

    /// Name a reference points at
    fn target(&self, reference: &Reference, names: &DeclaredNames<'_>) -> Result<String, Failure> {
        match reference {
            Reference::Resource { get_resource } => Ok(names.lookup(get_resource)),
            Reference::Param { get_param } => self
                .parameters
                .get(get_param)
                .map(str::to_string)
                .ok_or_else(|| Failure::Skip(format!("parameter '{}' has no default value", get_param))),
            Reference::Name(name) => Ok(name.clone()),
        }
    }

    fn resolve_network(&self, decl: &Declaration, stack: &mut Stack) -> Result<(), Failure> {
        let props: NamedProperties = decl.properties_as()?;
        let name = props.name.unwrap_or_else(|| decl.name.clone());
        stack.networks.get_or_create(&name);
        Ok(())
    }

    fn resolve_subnet(&self, decl: &Declaration, names: &DeclaredNames<'_>, stack: &mut Stack) -> Result<(), Failure> {
        let props: SubnetProperties = decl.properties_as()?;
        let network_name = self.target(&props.network, names)?;
        Cidr::parse(&props.cidr).map_err(|e| Failure::Skip(e.to_string()))?;

        let subnet = SubnetSpec {
            name: props.name,
            cidr: props.cidr,
            gateway_ip: props.gateway_ip,
        };
        stack
            .apply_subnet(&network_name, &subnet)
            .map_err(|e| Failure::Skip(e.to_string()))?;

        log::debug!("Subnet {} ({}) attached to network {}", subnet.name, subnet.cidr, network_name);
        Ok(())
    }

    fn resolve_port(&self, decl: &Declaration, names: &DeclaredNames<'_>, stack: &mut Stack) -> Result<(), Failure> {
        let props: PortProperties = decl.properties_as()?;
        // Binding to the network is done by the API layer
        let network_name = self.target(&props.network, names)?;
        let name = props.name.unwrap_or_else(|| decl.name.clone());

        stack.ports.get_or_create(&name);
        log::debug!("Port {} declared on network {}", name, network_name);
        Ok(())
    }

    fn resolve_server(&self, decl: &Declaration, names: &DeclaredNames<'_>, stack: &mut Stack) -> Result<(), Failure> {
        let props: ServerProperties = decl.properties_as()?;
        let name = props.name.unwrap_or_else(|| decl.name.clone());
        let flavor = self.target(&props.flavor, names)?;
        let image = self.target(&props.image, names)?;

        let mut networks = Vec::with_capacity(props.networks.len());
        for entry in &props.networks {
            networks.push(NetworkAttachment {
                port: entry.port.as_ref().map(|r| self.target(r, names)).transpose()?,
                network: entry.network.as_ref().map(|r| self.target(r, names)).transpose()?,
            });
        }

        let server = stack.servers.get_or_create(&name);
        server.flavor = Some(flavor);
        server.image = Some(image);
        server.networks = networks;
        server.command = Some(LAUNCH_COMMAND_PLACEHOLDER.to_string());
        Ok(())
    }

    fn resolve_router_interface(
        &self,
        decl: &Declaration,
        names: &DeclaredNames<'_>,
        stack: &mut Stack,
    ) -> Result<(), Failure> {
        let props: RouterInterfaceProperties = decl.properties_as()?;
        let router_name = self.target(&props.router, names)?;
        let subnet_name = self.target(&props.subnet, names)?;

        let subnet_known = stack.network_for_subnet(&subnet_name).is_some();
        let router = stack.routers.get_or_create(&router_name);
        if !subnet_known {
            return Err(Failure::Defer(format!("subnet '{}'", subnet_name)));
        }

        router.add_subnet(&subnet_name);
        log::debug!("Router {} attached to subnet {}", router_name, subnet_name);
        Ok(())
    }

    fn resolve_floating_ip(&self, decl: &Declaration, names: &DeclaredNames<'_>, stack: &mut Stack) -> Result<(), Failure> {
        let props: FloatingIpProperties = decl.properties_as()?;
        let port_name = self.target(&props.port_id, names)?;
        let floating_network = self.target(&props.floating_network_id, names)?;

        stack.ports.get_or_create(&port_name).floating_ip = Some(floating_network);
        Ok(())
    }

    fn resolve_router(&self, decl: &Declaration, stack: &mut Stack) -> Result<(), Failure> {
        let props: NamedProperties = decl.properties_as()?;
        let name = props.name.unwrap_or_else(|| decl.name.clone());
        stack.routers.get_or_create(&name);
        Ok(())
    }
}

/// Resolve every declaration of `template` into `stack`
pub fn resolve_template(template: &Template, stack: &mut Stack, policy: RetryPolicy) -> ResolutionReport {
    Resolver::for_template(template, policy).resolve(&template.declarations(), stack)
}
