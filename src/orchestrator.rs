//! Stack orchestrator.
//!
//! Coordinates one deployment: template loading, resolution into a fresh
//! stack, port attachment requested on the command line, and writing the
//! resulting snapshot as JSON.

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use log::{info, warn};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::config::Settings;
use crate::stack::{SharedStack, Stack, StackSnapshot};
use crate::template::{load_template, ResolutionReport, Resolver, RetryPolicy, Template};

/// Port attachment request in `PORT=NETWORK[@IP]` form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachSpec {
    pub port: String,
    pub network: String,
    pub fixed_ip: Option<String>,
}

impl FromStr for AttachSpec {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (port, target) = s
            .split_once('=')
            .ok_or_else(|| format!("expected PORT=NETWORK[@IP], got '{}'", s))?;
        let (network, fixed_ip) = match target.split_once('@') {
            Some((network, ip)) => (network, Some(ip.trim())),
            None => (target, None),
        };

        let port = port.trim();
        let network = network.trim();
        if port.is_empty() || network.is_empty() {
            return Err(format!("port and network must not be empty in '{}'", s));
        }
        if fixed_ip == Some("") {
            return Err(format!("missing address after '@' in '{}'", s));
        }

        Ok(Self {
            port: port.to_string(),
            network: network.to_string(),
            fixed_ip: fixed_ip.map(str::to_string),
        })
    }
}

impl fmt::Display for AttachSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.port, self.network)?;
        if let Some(ip) = &self.fixed_ip {
            write!(f, "@{}", ip)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct DeploymentOptions {
    pub stack_name: String,
    pub tenant_id: String,
    pub policy: RetryPolicy,
    pub attachments: Vec<AttachSpec>,
}

impl DeploymentOptions {
    pub fn from_settings(stack_name: &str, settings: &Settings) -> Self {
        Self {
            stack_name: stack_name.to_string(),
            tenant_id: settings.tenant_id.clone(),
            policy: settings.retry_policy(),
            attachments: Vec::new(),
        }
    }
}

impl Default for DeploymentOptions {
    fn default() -> Self {
        Self::from_settings("stack", &Settings::default())
    }
}

/// Result of one deployment
#[derive(Debug)]
pub struct Deployment {
    pub stack: SharedStack,
    pub report: ResolutionReport,
    pub snapshot: StackSnapshot,
}

/// Resolve a parsed template into a new stack and apply the attachments
pub fn deploy(template: &Template, options: &DeploymentOptions) -> Result<Deployment> {
    let mut stack = Stack::new(&options.stack_name);
    info!("Creating stack {} ({})", stack.name, stack.id);

    let resolver = Resolver::for_template(template, options.policy);
    let report = resolver.resolve(&template.declarations(), &mut stack);
    if !report.unresolved.is_empty() {
        warn!("{} declarations could not be resolved", report.unresolved.len());
    }

    let stack = SharedStack::new(stack);
    for attachment in &options.attachments {
        let address = stack
            .attach_port(&attachment.port, &attachment.network, attachment.fixed_ip.as_deref())
            .wrap_err_with(|| format!("Failed to attach '{}'", attachment))?;
        info!("Port {} has address {}", attachment.port, address);
    }

    let snapshot = stack
        .with(|stack| StackSnapshot::capture(stack, &options.tenant_id))?
        .with_unresolved(report.unresolved_views());

    Ok(Deployment {
        stack,
        report,
        snapshot,
    })
}

/// Write a snapshot as pretty-printed JSON
pub fn write_snapshot(snapshot: &StackSnapshot, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("Failed to create output directory '{}'", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(snapshot).wrap_err("Failed to serialize stack snapshot")?;
    std::fs::write(output_path, json)
        .wrap_err_with(|| format!("Failed to write snapshot '{}'", output_path.display()))?;

    info!("Wrote stack snapshot to {:?}", output_path);
    Ok(())
}

/// Load a template file, deploy it and write the snapshot to `output_path`
pub fn deploy_template_file(
    template_path: &Path,
    options: &DeploymentOptions,
    output_path: &Path,
) -> Result<Deployment> {
    let template = load_template(template_path)?;
    let deployment = deploy(&template, options)?;
    write_snapshot(&deployment.snapshot, output_path)?;
    Ok(deployment)
}

/// Fail when declarations were left unresolved
pub fn ensure_complete(report: &ResolutionReport) -> Result<()> {
    if report.unresolved.is_empty() {
        return Ok(());
    }
    let names: Vec<&str> = report.unresolved.iter().map(|u| u.name.as_str()).collect();
    Err(eyre!("Unresolved declarations: {}", names.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::parse_template;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    const TEMPLATE: &str = r#"
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
  port-1:
    type: OS::Neutron::Port
    properties:
      name: port-1
      network: {get_resource: net}
"#;

    #[test]
    fn test_parse_attach_spec() {
        let spec: AttachSpec = "port-1=net".parse().unwrap();
        assert_eq!(spec, AttachSpec {
            port: "port-1".to_string(),
            network: "net".to_string(),
            fixed_ip: None,
        });

        let spec: AttachSpec = "port-2=net@10.0.0.7".parse().unwrap();
        assert_eq!(spec.fixed_ip.as_deref(), Some("10.0.0.7"));
        assert_eq!(spec.to_string(), "port-2=net@10.0.0.7");

        assert!("port-1".parse::<AttachSpec>().is_err());
        assert!("=net".parse::<AttachSpec>().is_err());
        assert!("port=".parse::<AttachSpec>().is_err());
        assert!("port=net@".parse::<AttachSpec>().is_err());
    }

    #[test]
    fn test_deploy_with_attachments() {
        let template = parse_template(TEMPLATE).unwrap();
        let options = DeploymentOptions {
            attachments: vec!["port-1=net".parse().unwrap(), "port-2=net@10.0.0.9".parse().unwrap()],
            ..DeploymentOptions::default()
        };

        let deployment = deploy(&template, &options).unwrap();
        assert!(deployment.report.is_complete());
        assert!(ensure_complete(&deployment.report).is_ok());

        let ports = &deployment.snapshot.ports;
        assert_eq!(ports.len(), 2);
        assert_eq!(ports[0].fixed_ips[0].ip_address, "10.0.0.2");
        assert_eq!(ports[1].fixed_ips[0].ip_address, "10.0.0.9");

        let stack = deployment.stack.into_inner().unwrap();
        assert_eq!(stack.networks.get("net").unwrap().allocator().assigned_count(), 2);
    }

    #[test]
    fn test_deploy_attach_failure() {
        let template = parse_template(TEMPLATE).unwrap();
        let options = DeploymentOptions {
            attachments: vec!["port-1=missing".parse().unwrap()],
            ..DeploymentOptions::default()
        };
        assert!(deploy(&template, &options).is_err());
    }

    #[test]
    fn test_unresolved_declarations_are_reported() {
        let yaml = r#"
heat_template_version: 2015-04-30
resources:
  iface:
    type: OS::Neutron::RouterInterface
    properties:
      router: r1
      subnet: nowhere
"#;
        let template = parse_template(yaml).unwrap();
        let deployment = deploy(&template, &DeploymentOptions::default()).unwrap();
        assert_eq!(deployment.snapshot.unresolved.len(), 1);
        assert_eq!(deployment.snapshot.unresolved[0].name, "iface");
        assert!(ensure_complete(&deployment.report).is_err());
    }

    #[test]
    fn test_deploy_template_file() {
        let mut template_file = NamedTempFile::new().unwrap();
        write!(template_file, "{}", TEMPLATE).unwrap();
        let output_dir = tempdir().unwrap();
        let output_path = output_dir.path().join("out").join("stack.json");

        let mut settings = Settings::default();
        settings.tenant_id = "tenant-x".to_string();
        let options = DeploymentOptions::from_settings("demo", &settings);

        deploy_template_file(template_file.path(), &options, &output_path).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output_path).unwrap()).unwrap();
        assert_eq!(written["stack_name"], "demo");
        assert_eq!(written["networks"][0]["tenant_id"], "tenant-x");
        assert_eq!(written["subnets"][0]["cidr"], "10.0.0.0/24");
        assert_eq!(written["ports"][0]["name"], "port-1");
    }
}
