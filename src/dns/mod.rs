mod collector;
mod event;
mod message;
mod name;
mod query;
mod result;
pub mod types;

pub use collector::{DnsCollector, DnsState, EVENT_CHANNEL_SIZE};
pub use event::ResolutionEvent;
pub use message::{DnsHeader, Entry, HEADER_LEN, decode_entry, parse_dns};
pub use name::decode_name;
pub use query::{ResolutionAggregator, ResolvedDomain, SortBy};
pub use result::{
    Address, AddressList, CapacityError, DnsName, DnsResult, MAX_ADDRESSES, NAME_CAPACITY,
};
