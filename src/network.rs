//! IPv4 address blocks in prefix notation.
//!
//! [`Ipv4Cidr`] is the value object every network-facing declaration uses for
//! its address ranges. Parsing enforces the canonical form Terraform and the
//! AWS API expect: the address must be the network address of the block, so
//! `10.0.0.1/16` is rejected while `10.0.0.0/16` and host blocks such as
//! `206.248.172.36/32` are accepted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::error::{Error, Result};

/// An IPv4 CIDR block.
///
/// # Examples
///
/// ```rust
/// use stackform::network::Ipv4Cidr;
///
/// let vpc: Ipv4Cidr = "10.0.0.0/16".parse().unwrap();
/// let subnet: Ipv4Cidr = "10.0.3.0/24".parse().unwrap();
/// assert!(vpc.contains(&subnet));
/// assert_eq!(subnet.size(), 256);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ipv4Cidr {
    network: Ipv4Addr,
    prefix_len: u8,
}

impl Ipv4Cidr {
    /// The default route, `0.0.0.0/0`.
    pub const ANY: Ipv4Cidr = Ipv4Cidr {
        network: Ipv4Addr::UNSPECIFIED,
        prefix_len: 0,
    };

    /// Create a block from its network address and prefix length.
    ///
    /// # Invariants
    /// - Prefix length is 0-32
    /// - No host bits are set below the prefix
    pub fn new(address: Ipv4Addr, prefix_len: u8) -> Result<Self> {
        let raw = format!("{}/{}", address, prefix_len);
        if prefix_len > 32 {
            return Err(Error::invalid_cidr(raw, "prefix length must be 0-32"));
        }

        let bits = u32::from(address);
        if bits & !mask(prefix_len) != 0 {
            return Err(Error::invalid_cidr(
                raw,
                format!(
                    "host bits set; the network address is {}",
                    Ipv4Addr::from(bits & mask(prefix_len))
                ),
            ));
        }

        Ok(Self {
            network: address,
            prefix_len,
        })
    }

    /// The block of length `prefix_len` (clamped to 32) that contains
    /// `address`, with host bits cleared.
    pub fn truncated(address: Ipv4Addr, prefix_len: u8) -> Self {
        let prefix_len = prefix_len.min(32);
        Self {
            network: Ipv4Addr::from(u32::from(address) & mask(prefix_len)),
            prefix_len,
        }
    }

    /// A single-address `/32` block.
    pub fn host(address: Ipv4Addr) -> Self {
        Self {
            network: address,
            prefix_len: 32,
        }
    }

    /// The network (first) address of the block.
    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    /// The prefix length.
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// The last address of the block.
    pub fn broadcast(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.network) | !mask(self.prefix_len))
    }

    /// Number of addresses in the block.
    pub fn size(&self) -> u64 {
        1u64 << (32 - u32::from(self.prefix_len))
    }

    /// True for `0.0.0.0/0`.
    pub fn is_default_route(&self) -> bool {
        self.prefix_len == 0
    }

    /// True for `/32` blocks.
    pub fn is_host(&self) -> bool {
        self.prefix_len == 32
    }

    /// Check whether an address lies inside the block.
    pub fn contains_addr(&self, addr: Ipv4Addr) -> bool {
        u32::from(addr) & mask(self.prefix_len) == u32::from(self.network)
    }

    /// Check whether `other` is a sub-range of this block (or equal to it).
    pub fn contains(&self, other: &Ipv4Cidr) -> bool {
        other.prefix_len >= self.prefix_len && self.contains_addr(other.network)
    }

    /// Check whether the two blocks share any address.
    pub fn overlaps(&self, other: &Ipv4Cidr) -> bool {
        self.contains(other) || other.contains(self)
    }
}

fn mask(prefix_len: u8) -> u32 {
    match prefix_len {
        0 => 0,
        p => u32::MAX << (32 - u32::from(p.min(32))),
    }
}

impl FromStr for Ipv4Cidr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (addr_str, prefix_str) = s
            .split_once('/')
            .ok_or_else(|| Error::invalid_cidr(s, "missing '/<prefix>'"))?;

        let address = Ipv4Addr::from_str(addr_str)
            .map_err(|_| Error::invalid_cidr(s, format!("'{}' is not an IPv4 address", addr_str)))?;

        let prefix_len = prefix_str
            .parse::<u8>()
            .map_err(|_| Error::invalid_cidr(s, format!("'{}' is not a prefix length", prefix_str)))?;

        Self::new(address, prefix_len)
    }
}

impl TryFrom<String> for Ipv4Cidr {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Ipv4Cidr> for String {
    fn from(cidr: Ipv4Cidr) -> Self {
        cidr.to_string()
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}
