//! Per-network IP address allocation.
//!
//! An [`AddressAllocator`] holds the CIDR of one subnet, the usable range
//! derived from it and the table of issued addresses. The first address of
//! the range is the network address and the second one is kept for the
//! gateway, so automatic allocation starts at `start + 2`. The last address
//! is the broadcast address and is never issued.
//!
//! Explicit assignment through [`AddressAllocator::assign`] only reserves
//! the network address: a caller may claim the gateway slot by name.

use super::cidr::{cidr_to_int, int_to_ip, AddressError, Cidr};
use super::registry::AssignmentTable;

/// Errors returned by allocator operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocationError {
    #[error(transparent)]
    Address(#[from] AddressError),
    #[error("No CIDR configured for this network")]
    NoCidr,
    #[error("Address {address} is outside the usable range {start} - {end}")]
    OutOfRange {
        address: String,
        start: String,
        end: String,
    },
    #[error("Address {address} is already assigned to {assignee}")]
    AlreadyAssigned { address: String, assignee: String },
    #[error("Address {0} is not assigned")]
    NotAssigned(String),
}

/// Start and end address of a subnet, network and broadcast included
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRange {
    pub start: u32,
    pub end: u32,
    pub prefix: u8,
}

impl AddressRange {
    pub fn from_cidr(cidr: &Cidr) -> Self {
        Self {
            start: cidr.network_address(),
            end: cidr.broadcast_address(),
            prefix: cidr.prefix(),
        }
    }

    pub fn start_ip(&self) -> String {
        int_to_ip(self.start)
    }

    pub fn end_ip(&self) -> String {
        int_to_ip(self.end)
    }

    /// Bounds for automatic allocation: network address and gateway skipped,
    /// broadcast skipped. `None` when the block is too small.
    fn allocatable(&self) -> Option<(u32, u32)> {
        let first = self.start.checked_add(2)?;
        let last = self.end.checked_sub(1)?;
        (first <= last).then_some((first, last))
    }

    /// Bounds for explicit assignment: only network and broadcast skipped
    fn assignable(&self) -> Option<(u32, u32)> {
        let first = self.start.checked_add(1)?;
        let last = self.end.checked_sub(1)?;
        (first <= last).then_some((first, last))
    }
}

/// Address pool and assignment state of one network
#[derive(Debug, Clone, Default)]
pub struct AddressAllocator {
    cidr: Option<String>,
    range: Option<AddressRange>,
    issued: AssignmentTable,
}

impl AddressAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the CIDR and recompute the usable range.
    ///
    /// Any previously issued address is dropped. On error nothing changes.
    pub fn set_cidr(&mut self, cidr: &str) -> Result<(), AllocationError> {
        let parsed = Cidr::parse(cidr)?;

        if !self.issued.is_empty() {
            log::debug!(
                "Resetting {} issued addresses for new CIDR {}",
                self.issued.len(),
                cidr
            );
            self.issued.clear();
        }
        self.range = Some(AddressRange::from_cidr(&parsed));
        self.cidr = Some(cidr.to_string());
        Ok(())
    }

    /// Forget the CIDR, the range and every issued address
    pub fn clear_cidr(&mut self) {
        self.cidr = None;
        self.range = None;
        self.issued.clear();
    }

    /// The CIDR exactly as it was set
    pub fn cidr(&self) -> Option<&str> {
        self.cidr.as_deref()
    }

    pub fn range(&self) -> Option<AddressRange> {
        self.range
    }

    /// Issue the lowest free address to `assignee`.
    ///
    /// Returns the address as "A.B.C.D/P", or `None` if no CIDR is set or
    /// every allocatable address is taken.
    pub fn allocate_next(&mut self, assignee: &str) -> Option<String> {
        let range = self.range?;
        let (first, last) = range.allocatable()?;

        let address = (first..=last).find(|candidate| !self.issued.contains(*candidate))?;
        self.issued.insert(address, assignee);
        log::debug!("Issued {} to {}", int_to_ip(address), assignee);

        Some(format!("{}/{}", int_to_ip(address), range.prefix))
    }

    /// Issue a caller-chosen address ("A.B.C.D/P" or bare) to `assignee`
    pub fn assign(&mut self, cidr: &str, assignee: &str) -> Result<(), AllocationError> {
        let address = cidr_to_int(cidr)?;
        let range = self.range.ok_or(AllocationError::NoCidr)?;

        if let Some(holder) = self.issued.assignee(address) {
            return Err(AllocationError::AlreadyAssigned {
                address: int_to_ip(address),
                assignee: holder.to_string(),
            });
        }

        let out_of_range = || AllocationError::OutOfRange {
            address: int_to_ip(address),
            start: range.start_ip(),
            end: range.end_ip(),
        };
        let (first, last) = range.assignable().ok_or_else(out_of_range)?;
        if address < first || address > last {
            return Err(out_of_range());
        }

        self.issued.insert(address, assignee);
        Ok(())
    }

    /// Check if the address is already issued
    pub fn is_assigned(&self, cidr: &str) -> bool {
        cidr_to_int(cidr).is_ok_and(|address| self.issued.contains(address))
    }

    /// Check if the address is issued to `assignee`
    pub fn is_assigned_to(&self, cidr: &str, assignee: &str) -> bool {
        cidr_to_int(cidr).is_ok_and(|address| self.issued.assignee(address) == Some(assignee))
    }

    /// Return an address to the pool. Unknown, empty or malformed input is ignored.
    pub fn release(&mut self, address_or_cidr: &str) {
        if address_or_cidr.is_empty() {
            return;
        }
        match cidr_to_int(address_or_cidr) {
            Ok(address) => {
                if let Some(holder) = self.issued.remove(address) {
                    log::debug!("Released {} from {}", int_to_ip(address), holder);
                }
            }
            Err(e) => log::debug!("Ignoring release of {}: {}", address_or_cidr, e),
        }
    }

    /// Move an issued address to a new assignee
    pub fn rebind(&mut self, address_or_cidr: &str, new_assignee: &str) -> Result<(), AllocationError> {
        let address = cidr_to_int(address_or_cidr)?;
        if !self.issued.contains(address) {
            return Err(AllocationError::NotAssigned(int_to_ip(address)));
        }
        self.issued.insert(address, new_assignee);
        Ok(())
    }

    /// Issued addresses (dotted-quad) with their assignee, ascending
    pub fn assignments(&self) -> impl Iterator<Item = (String, &str)> {
        self.issued.iter().map(|(address, assignee)| (int_to_ip(address), assignee))
    }

    pub fn assigned_count(&self) -> usize {
        self.issued.len()
    }
}
