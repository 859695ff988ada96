//! Dotted-quad and CIDR arithmetic.
//!
//! Addresses are handled as `u32` values internally. Conversions to and
//! from the dotted-quad text form are exact inverses.

use regex::Regex;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use std::sync::LazyLock;

/// Match: "A.B.C.D/P" with a one or two digit prefix
static CIDR_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.(\d{1,3})/(\d{1,2})$")
        .expect("Invalid CIDR regex")
});

/// Errors produced while parsing addresses or CIDR strings
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("Invalid IPv4 address '{0}'")]
    InvalidAddress(String),
    #[error("Invalid CIDR '{0}'")]
    InvalidCidr(String),
}

/// Convert a dotted-quad address to its integer form
///
/// # Examples
/// ```
/// use heatstack::ip::cidr::ip_to_int;
///
/// assert_eq!(ip_to_int("10.0.0.1"), Ok(167_772_161));
/// assert!(ip_to_int("10.0.0.256").is_err());
/// ```
pub fn ip_to_int(ip: &str) -> Result<u32, AddressError> {
    ip.parse::<Ipv4Addr>()
        .map(u32::from)
        .map_err(|_| AddressError::InvalidAddress(ip.to_string()))
}

/// Convert an integer address back to dotted-quad form
pub fn int_to_ip(value: u32) -> String {
    Ipv4Addr::from(value).to_string()
}

/// Drop a trailing "/prefix" if present
pub fn strip_prefix(address_or_cidr: &str) -> &str {
    match address_or_cidr.rsplit_once('/') {
        Some((address, _)) => address,
        None => address_or_cidr,
    }
}

/// Integer form of the address part of "A.B.C.D/P" (or a bare address)
pub fn cidr_to_int(cidr: &str) -> Result<u32, AddressError> {
    ip_to_int(strip_prefix(cidr))
}

/// A parsed IPv4 CIDR block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cidr {
    address: u32,
    prefix: u8,
}

impl Cidr {
    pub fn parse(cidr: &str) -> Result<Self, AddressError> {
        let invalid = || AddressError::InvalidCidr(cidr.to_string());

        let caps = CIDR_FORMAT.captures(cidr).ok_or_else(invalid)?;
        let address = ip_to_int(strip_prefix(cidr)).map_err(|_| invalid())?;
        let prefix: u8 = caps[5].parse().map_err(|_| invalid())?;
        if prefix > 32 {
            return Err(invalid());
        }

        Ok(Self { address, prefix })
    }

    /// Address as written, host bits included
    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    pub fn netmask(&self) -> u32 {
        if self.prefix == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(self.prefix))
        }
    }

    pub fn network_address(&self) -> u32 {
        self.address & self.netmask()
    }

    /// Last address of the block: network address + 2^(32-P) - 1
    pub fn broadcast_address(&self) -> u32 {
        self.network_address() | !self.netmask()
    }

    /// Number of addresses in the block, reserved ones included
    pub fn size(&self) -> u64 {
        1u64 << (32 - u32::from(self.prefix))
    }
}

impl FromStr for Cidr {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Cidr::parse(s)
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", int_to_ip(self.address), self.prefix)
    }
}
