use log::info;
use std::collections::HashSet;
use std::net::{Ipv4Addr, Ipv6Addr};

use super::{AllowSet, AllowSetError};
use crate::dns::Address;

/// In-process allow-sets, for dry runs and tests.
#[derive(Debug, Default, Clone)]
pub struct MemorySet {
    ipv4: HashSet<Ipv4Addr>,
    ipv6: HashSet<Ipv6Addr>,
}

impl MemorySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ipv4(&self) -> &HashSet<Ipv4Addr> {
        &self.ipv4
    }

    pub fn ipv6(&self) -> &HashSet<Ipv6Addr> {
        &self.ipv6
    }

    pub fn contains(&self, address: &Address) -> bool {
        match *address {
            Address::V4(octets) => self.ipv4.contains(&Ipv4Addr::from(octets)),
            Address::V6(octets) => self.ipv6.contains(&Ipv6Addr::from(octets)),
        }
    }

    pub fn len(&self) -> usize {
        self.ipv4.len() + self.ipv6.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AllowSet for MemorySet {
    fn insert(&mut self, address: &Address) -> Result<(), AllowSetError> {
        let added = match *address {
            Address::V4(octets) => self.ipv4.insert(Ipv4Addr::from(octets)),
            Address::V6(octets) => self.ipv6.insert(Ipv6Addr::from(octets)),
        };
        if added {
            info!("dry run: would allow {address}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_are_no_ops() {
        let mut set = MemorySet::new();
        set.insert(&Address::V4([10, 0, 0, 1])).unwrap();
        set.insert(&Address::V4([10, 0, 0, 1])).unwrap();
        set.insert(&Address::V6([0; 16])).unwrap();

        assert_eq!(set.ipv4().len(), 1);
        assert_eq!(set.ipv6().len(), 1);
        assert!(set.contains(&Address::V6([0; 16])));
        assert!(!set.contains(&Address::V4([10, 0, 0, 2])));
    }
}
