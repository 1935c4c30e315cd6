mod ip;
mod link;

pub use ip::{IPPROTO_UDP, Transport, parse_ip};
pub use link::LinkLayer;
