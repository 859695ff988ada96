//! Name-keyed resource registries with get-or-create lookup.

use std::collections::BTreeMap;

use crate::resources::{Network, Port, Router, Server};

/// A resource that can be created from nothing but its name
pub trait StackResource {
    fn with_name(name: &str) -> Self;
}

impl StackResource for Network {
    fn with_name(name: &str) -> Self {
        Network::new(name)
    }
}

impl StackResource for Router {
    fn with_name(name: &str) -> Self {
        Router::new(name)
    }
}

impl StackResource for Port {
    fn with_name(name: &str) -> Self {
        Port::new(name)
    }
}

impl StackResource for Server {
    fn with_name(name: &str) -> Self {
        Server::new(name)
    }
}

/// Resources of one kind, keyed by name and iterated in name order
#[derive(Debug, Clone)]
pub struct Registry<T> {
    entries: BTreeMap<String, T>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T: StackResource> Registry<T> {
    /// Return the entry for `name`, registering a fresh one if absent
    pub fn get_or_create(&mut self, name: &str) -> &mut T {
        if !self.entries.contains_key(name) {
            log::debug!("Registering new resource '{}'", name);
        }
        self.entries
            .entry(name.to_string())
            .or_insert_with(|| T::with_name(name))
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        self.entries.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Register `resource` under `name`, returning the entry it replaced
    pub fn insert(&mut self, name: &str, resource: T) -> Option<T> {
        self.entries.insert(name.to_string(), resource)
    }

    pub fn remove(&mut self, name: &str) -> Option<T> {
        self.entries.remove(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(name, resource)| (name.as_str(), resource))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries.values_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_registers_once() {
        let mut routers: Registry<Router> = Registry::new();
        let id = routers.get_or_create("r1").id.clone();
        routers.get_or_create("r1").add_subnet("s1");

        assert_eq!(routers.len(), 1);
        let router = routers.get("r1").unwrap();
        assert_eq!(router.id, id);
        assert_eq!(router.subnet_names, vec!["s1".to_string()]);
    }

    #[test]
    fn test_lookup_does_not_create() {
        let mut ports: Registry<Port> = Registry::new();
        assert!(ports.get("p1").is_none());
        assert!(ports.get_mut("p1").is_none());
        assert!(!ports.contains("p1"));
        assert!(ports.is_empty());
    }

    #[test]
    fn test_names_are_sorted() {
        let mut servers: Registry<Server> = Registry::new();
        servers.get_or_create("web");
        servers.get_or_create("db");
        servers.get_or_create("cache");
        assert_eq!(servers.names().collect::<Vec<_>>(), vec!["cache", "db", "web"]);

        assert!(servers.remove("db").is_some());
        assert_eq!(servers.len(), 2);
    }
}
