use std::net::IpAddr;

use chrono::{DateTime, Local};

use super::DnsResult;
use crate::policy::Decision;

/// One DNS response after the policy decided on it.
#[derive(Clone, Debug)]
pub struct ResolutionEvent {
    pub domain: String,
    pub addresses: Vec<IpAddr>,
    pub decision: Decision,
    pub timestamp: DateTime<Local>,
}

impl ResolutionEvent {
    pub fn new(result: &DnsResult, decision: Decision) -> Self {
        Self {
            domain: result.name.to_string().to_ascii_lowercase(),
            addresses: result.addresses.iter().map(|a| a.to_ip()).collect(),
            decision,
            timestamp: Local::now(),
        }
    }
}
