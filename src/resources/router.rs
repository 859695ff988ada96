//! Router resource.

use std::collections::HashSet;
use uuid::Uuid;

use super::wire::{RouterView, STATUS_ACTIVE};

/// A router and the subnets attached to it by router interfaces.
///
/// Subnets are referenced by subnet name, not by network.
#[derive(Debug, Clone)]
pub struct Router {
    pub name: String,
    pub id: String,
    pub subnet_names: Vec<String>,
}

impl Router {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            id: Uuid::new_v4().to_string(),
            subnet_names: Vec::new(),
        }
    }

    pub fn add_subnet(&mut self, subnet_name: &str) {
        self.subnet_names.push(subnet_name.to_string());
    }

    /// First 8 characters of the id
    pub fn short_id(&self) -> &str {
        &self.id[..self.id.len().min(8)]
    }

    pub fn router_dict(&self, tenant_id: &str) -> RouterView {
        RouterView {
            id: self.id.clone(),
            name: self.name.clone(),
            status: STATUS_ACTIVE.to_string(),
            admin_state_up: true,
            tenant_id: tenant_id.to_string(),
            external_gateway_info: None,
            subnets: self.subnet_names.clone(),
        }
    }
}

/// Same name and the same attached subnets, in any order
impl PartialEq for Router {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.subnet_names.len() == other.subnet_names.len()
            && self.subnet_names.iter().collect::<HashSet<_>>()
                == other.subnet_names.iter().collect::<HashSet<_>>()
    }
}

impl Eq for Router {}

#[cfg(test)]
mod tests {
    use super::*;

    fn router(name: &str, subnets: &[&str]) -> Router {
        let mut router = Router::new(name);
        for subnet in subnets {
            router.add_subnet(subnet);
        }
        router
    }

    #[test]
    fn test_equality_ignores_order() {
        assert_eq!(router("r1", &["s1", "s2"]), router("r1", &["s2", "s1"]));
    }

    #[test]
    fn test_inequality() {
        assert_ne!(router("r1", &["s1", "s2"]), router("r1", &["s1", "s3"]));
        assert_ne!(router("r1", &["s1"]), router("r2", &["s1"]));
        assert_ne!(router("r1", &["s1", "s1"]), router("r1", &["s1"]));
    }

    #[test]
    fn test_router_dict() {
        let router = router("r1", &["s1"]);
        assert_eq!(router.short_id().len(), 8);

        let json = serde_json::to_value(router.router_dict("tenant")).unwrap();
        assert_eq!(json["name"], "r1");
        assert_eq!(json["status"], "ACTIVE");
        assert_eq!(json["subnets"][0], "s1");
        assert!(json["external_gateway_info"].is_null());
    }
}
