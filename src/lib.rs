//! Watch DNS responses and open the firewall for the addresses of names
//! the policy allows.

pub mod allowset;
pub mod capture;
pub mod dispatch;
pub mod dns;
pub mod error;
pub mod handler;
pub mod hexdump;
pub mod packet;
pub mod policy;

pub use dispatch::parse_ip_dns;
pub use dns::{Address, DnsName, DnsResult};
pub use error::{FailureKind, ParseError};
