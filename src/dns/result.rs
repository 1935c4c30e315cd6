use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::error::NameError;

/// Output capacity of a decoded name: 255 content bytes plus a terminator.
pub const NAME_CAPACITY: usize = 256;

/// Addresses kept per response. About 25 fit in a 512 byte UDP answer.
pub const MAX_ADDRESSES: usize = 16;

const SEPARATOR: u8 = b'.';

/// A resolved address, copied out of an A or AAAA record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Address {
    V4([u8; 4]),
    V6([u8; 16]),
}

impl Address {
    pub fn to_ip(self) -> IpAddr {
        match self {
            Self::V4(octets) => IpAddr::V4(Ipv4Addr::from(octets)),
            Self::V6(octets) => IpAddr::V6(Ipv6Addr::from(octets)),
        }
    }
}

impl From<Address> for IpAddr {
    fn from(address: Address) -> Self {
        address.to_ip()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_ip().fmt(f)
    }
}

/// A decoded domain name in a fixed 256 byte buffer.
///
/// While decoding, every label is followed by a separator; [`DnsName::finish`]
/// drops the last one. Bytes are kept as they appeared on the wire, so a
/// name is only guaranteed to be ASCII if the sender sent ASCII.
#[derive(Clone, Copy)]
pub struct DnsName {
    buf: [u8; NAME_CAPACITY],
    len: usize,
}

impl DnsName {
    pub const fn new() -> Self {
        Self {
            buf: [0; NAME_CAPACITY],
            len: 0,
        }
    }

    pub fn clear(&mut self) {
        self.buf = [0; NAME_CAPACITY];
        self.len = 0;
    }

    /// Append `label` and a separator, failing if the 256 byte buffer would
    /// overflow.
    pub(crate) fn push_label(&mut self, label: &[u8]) -> Result<(), NameError> {
        let end = self.len + label.len();
        if end + 1 > NAME_CAPACITY {
            return Err(NameError::TooLong);
        }
        self.buf[self.len..end].copy_from_slice(label);
        self.buf[end] = SEPARATOR;
        self.len = end + 1;
        Ok(())
    }

    /// Bytes written so far, one per label length byte plus label contents.
    pub(crate) fn raw_len(&self) -> usize {
        self.len
    }

    /// Turn the trailing separator into the terminator and reject names whose
    /// contents would be cut short by a NUL byte.
    pub(crate) fn finish(&mut self) -> Result<(), NameError> {
        if self.len == 0 {
            return Ok(());
        }
        self.len -= 1;
        self.buf[self.len] = 0;

        let terminator = self.buf.iter().position(|&b| b == 0);
        if terminator != Some(self.len) {
            return Err(NameError::EmbeddedNul);
        }
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate over the labels of the name.
    pub fn labels(&self) -> impl Iterator<Item = &[u8]> {
        self.as_bytes()
            .split(|&b| b == SEPARATOR)
            .filter(|label| !label.is_empty())
    }
}

impl Default for DnsName {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for DnsName {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for DnsName {}

impl PartialEq<str> for DnsName {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<&str> for DnsName {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl fmt::Display for DnsName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_bytes().escape_ascii())
    }
}

impl fmt::Debug for DnsName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

/// Returned when an [`AddressList`] is already full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityError;

/// Append-only list of at most [`MAX_ADDRESSES`] addresses.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AddressList {
    entries: [Address; MAX_ADDRESSES],
    len: usize,
}

impl AddressList {
    pub const fn new() -> Self {
        Self {
            entries: [Address::V4([0; 4]); MAX_ADDRESSES],
            len: 0,
        }
    }

    pub fn push(&mut self, address: Address) -> Result<(), CapacityError> {
        if self.is_full() {
            return Err(CapacityError);
        }
        self.entries[self.len] = address;
        self.len += 1;
        Ok(())
    }

    pub fn as_slice(&self) -> &[Address] {
        &self.entries[..self.len]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Address> {
        self.as_slice().iter()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == MAX_ADDRESSES
    }
}

impl Default for AddressList {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AddressList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<'a> IntoIterator for &'a AddressList {
    type Item = &'a Address;
    type IntoIter = std::slice::Iter<'a, Address>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// What a DNS response told us: the question name and its addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DnsResult {
    /// DNS transaction ID.
    pub id: u16,
    pub name: DnsName,
    pub addresses: AddressList,
}

impl DnsResult {
    pub fn new() -> Self {
        Self::default()
    }
}
