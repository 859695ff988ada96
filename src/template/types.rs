//! Heat template document model.
//!
//! A template is parsed into a [`Template`]; its `resources` section is
//! turned into [`Declaration`]s in document order. Property shapes are
//! type-specific and only interpreted by the resolver.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use std::fmt;

/// Oldest `heat_template_version` accepted
pub const MINIMUM_TEMPLATE_VERSION: &str = "2015-04-30";

/// Top-level structure of a Heat Orchestration Template
#[derive(Debug, Clone, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub heat_template_version: Value,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameter_groups: Option<Value>,
    #[serde(default)]
    pub parameters: Option<Mapping>,
    #[serde(default)]
    pub resources: Option<Mapping>,
    #[serde(default)]
    pub outputs: Option<Value>,
}

impl Template {
    /// Version as written, if it is a scalar
    pub fn version(&self) -> Option<String> {
        scalar_to_string(&self.heat_template_version)
    }

    /// Resource declarations in document order
    pub fn declarations(&self) -> Vec<Declaration> {
        let Some(resources) = &self.resources else {
            return Vec::new();
        };

        resources
            .iter()
            .map(|(key, value)| {
                let name = scalar_to_string(key).unwrap_or_else(|| format!("{:?}", key));
                Declaration::from_value(name, value)
            })
            .collect()
    }

    /// Default values of the template parameters
    pub fn parameter_defaults(&self) -> Parameters {
        let mut parameters = Parameters::default();
        let Some(declared) = &self.parameters else {
            return parameters;
        };

        for (key, spec) in declared {
            let (Some(name), Some(default)) = (scalar_to_string(key), spec.get("default")) else {
                continue;
            };
            match scalar_to_string(default) {
                Some(value) => parameters.set(&name, &value),
                None => log::warn!("Parameter '{}' has a non-scalar default, ignoring it", name),
            }
        }
        parameters
    }
}

/// Render a YAML scalar as text
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Raw shape of one entry of the `resources` section
#[derive(Debug, Deserialize)]
struct RawDeclaration {
    #[serde(rename = "type")]
    resource_type: String,
    #[serde(default)]
    properties: Mapping,
}

/// One named entry of the template's `resources` section
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    /// e.g. "OS::Neutron::Net". Empty if the entry had no usable type.
    pub resource_type: String,
    pub properties: Mapping,
}

impl Declaration {
    fn from_value(name: String, value: &Value) -> Self {
        match serde_yaml::from_value::<RawDeclaration>(value.clone()) {
            Ok(raw) => Self {
                name,
                resource_type: raw.resource_type,
                properties: raw.properties,
            },
            Err(e) => {
                log::warn!("Declaration '{}' is malformed: {}", name, e);
                Self {
                    name,
                    resource_type: String::new(),
                    properties: Mapping::new(),
                }
            }
        }
    }

    /// Deserialize the properties into a type-specific structure
    pub fn properties_as<T: DeserializeOwned>(&self) -> Result<T, serde_yaml::Error> {
        serde_yaml::from_value(Value::Mapping(self.properties.clone()))
    }

    /// The `name` property, if it is a plain string
    pub fn declared_name(&self) -> Option<&str> {
        self.properties.get("name").and_then(Value::as_str)
    }
}

/// Template parameters with a default value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters {
    defaults: HashMap<String, String>,
}

impl Parameters {
    pub fn set(&mut self, name: &str, value: &str) {
        self.defaults.insert(name.to_string(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.defaults.get(name).map(String::as_str)
    }
}

/// A property value naming another resource or a parameter
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Reference {
    /// `{get_resource: name}`
    Resource { get_resource: String },
    /// `{get_param: name}`
    Param { get_param: String },
    /// A bare name. Numeric and boolean scalars are taken as their text.
    Name(#[serde(deserialize_with = "scalar_name")] String),
}

fn scalar_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    scalar_to_string(&value).ok_or_else(|| de::Error::custom(format!("expected a scalar name, got {:?}", value)))
}

impl Reference {
    pub fn resource(name: &str) -> Self {
        Reference::Resource {
            get_resource: name.to_string(),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Resource { get_resource } => write!(f, "{{get_resource: {}}}", get_resource),
            Reference::Param { get_param } => write!(f, "{{get_param: {}}}", get_param),
            Reference::Name(name) => write!(f, "{}", name),
        }
    }
}

/// Resource types the resolver knows how to handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Network,
    Subnet,
    Port,
    Server,
    RouterInterface,
    FloatingIp,
    Router,
}

impl ResourceKind {
    /// Classify a declared type string.
    ///
    /// Matching is by substring, in a fixed priority order. Types whose tag
    /// is contained in a more specific one (Subnet vs Net, Router vs
    /// RouterInterface) are separated by checking for the specific tag.
    pub fn classify(resource_type: &str) -> Option<Self> {
        let has = |tag: &str| resource_type.contains(tag);

        if has("Net") {
            Some(ResourceKind::Network)
        } else if has("Subnet") {
            Some(ResourceKind::Subnet)
        } else if has("Port") {
            Some(ResourceKind::Port)
        } else if has("OS::Nova::Server") {
            Some(ResourceKind::Server)
        } else if has("OS::Neutron::RouterInterface") {
            Some(ResourceKind::RouterInterface)
        } else if has("OS::Neutron::FloatingIP") {
            Some(ResourceKind::FloatingIp)
        } else if has("OS::Neutron::Router") && !has("RouterInterface") {
            Some(ResourceKind::Router)
        } else {
            None
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Network => "Net",
            ResourceKind::Subnet => "Subnet",
            ResourceKind::Port => "Port",
            ResourceKind::Server => "Server",
            ResourceKind::RouterInterface => "RouterInterface",
            ResourceKind::FloatingIp => "FloatingIP",
            ResourceKind::Router => "Router",
        };
        write!(f, "{}", name)
    }
}
