//! Lock-guarded stack for concurrent API callers.
//!
//! Address allocation is a scan followed by a write. Two callers running it
//! at the same time against one network could both pick the same address,
//! so every operation here holds the stack lock for its whole duration.

use std::sync::{Arc, Mutex, MutexGuard};

use super::{Stack, StackError};

#[derive(Debug, Clone, Default)]
pub struct SharedStack {
    inner: Arc<Mutex<Stack>>,
}

impl SharedStack {
    pub fn new(stack: Stack) -> Self {
        Self {
            inner: Arc::new(Mutex::new(stack)),
        }
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, Stack>, StackError> {
        self.inner.lock().map_err(|_| StackError::Poisoned)
    }

    /// Run `f` with exclusive access to the stack
    pub fn with<R>(&self, f: impl FnOnce(&mut Stack) -> R) -> Result<R, StackError> {
        let mut stack = self.lock()?;
        Ok(f(&mut stack))
    }

    pub fn attach_port(&self, port_name: &str, network_name: &str, fixed_ip: Option<&str>) -> Result<String, StackError> {
        self.lock()?.attach_port(port_name, network_name, fixed_ip)
    }

    pub fn detach_port(&self, port_name: &str) -> Result<(), StackError> {
        self.lock()?.detach_port(port_name)
    }

    pub fn rename_port(&self, old_name: &str, new_name: &str) -> Result<(), StackError> {
        self.lock()?.rename_port(old_name, new_name)
    }

    /// Release an address of `network_name` without touching any port
    pub fn release_address(&self, network_name: &str, address: &str) -> Result<(), StackError> {
        let mut stack = self.lock()?;
        let network = stack
            .networks
            .get_mut(network_name)
            .ok_or_else(|| StackError::NetworkNotFound(network_name.to_string()))?;
        network.allocator_mut().release(address);
        Ok(())
    }

    /// Take the stack back out. Fails while other handles are alive.
    pub fn into_inner(self) -> Result<Stack, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => Ok(mutex.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())),
            Err(inner) => Err(Self { inner }),
        }
    }
}
