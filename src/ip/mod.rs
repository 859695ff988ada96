//! IP address arithmetic and per-network allocation.
//!
//! This module converts between dotted-quad and integer addresses, derives
//! usable ranges from CIDR blocks, and tracks which addresses of a network
//! are issued to which port.

pub mod allocator;
pub mod cidr;
pub mod registry;

// Re-export commonly used types
pub use allocator::{AddressAllocator, AddressRange, AllocationError};
pub use cidr::{int_to_ip, ip_to_int, AddressError, Cidr};
pub use registry::AssignmentTable;
