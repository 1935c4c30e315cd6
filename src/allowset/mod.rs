//! Kernel address sets that firewall rules consult.

mod ipset;
mod memory;

pub use ipset::{DEFAULT_IPV4_SET, DEFAULT_IPV6_SET, IpsetCommand};
pub use memory::MemorySet;

use thiserror::Error;

use crate::dns::Address;

#[derive(Debug, Error)]
pub enum AllowSetError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("ipset {action} {set} failed: {stderr}")]
    Command {
        action: &'static str,
        set: String,
        stderr: String,
    },
}

/// Destination for addresses of allowed names. Inserting an address that is
/// already present is not an error.
pub trait AllowSet: Send {
    fn insert(&mut self, address: &Address) -> Result<(), AllowSetError>;
}

impl<T: AllowSet + ?Sized> AllowSet for Box<T> {
    fn insert(&mut self, address: &Address) -> Result<(), AllowSetError> {
        (**self).insert(address)
    }
}
