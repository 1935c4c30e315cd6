use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::net::IpAddr;

use super::ResolutionEvent;
use crate::policy::Decision;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    LastSeen,
    Count,
    Domain,
}

/// Everything seen for one domain since start-up.
#[derive(Debug, Clone)]
pub struct ResolvedDomain {
    pub domain: String,
    pub addresses: Vec<IpAddr>,
    pub last_decision: Decision,
    pub last_seen: DateTime<Local>,
    pub count: u64,
    pub denied: u64,
}

impl ResolvedDomain {
    pub fn new(event: ResolutionEvent) -> Self {
        let denied = u64::from(event.decision == Decision::Deny);
        Self {
            domain: event.domain,
            addresses: event.addresses,
            last_decision: event.decision,
            last_seen: event.timestamp,
            count: 1,
            denied,
        }
    }

    pub fn update(&mut self, event: ResolutionEvent) {
        for address in event.addresses {
            if !self.addresses.contains(&address) {
                self.addresses.push(address);
            }
        }
        if event.timestamp > self.last_seen {
            self.last_seen = event.timestamp;
            self.last_decision = event.decision;
        }
        if event.decision == Decision::Deny {
            self.denied += 1;
        }
        self.count += 1;
    }

    pub fn address_list(&self) -> String {
        const MAX_DISPLAY_ADDRESSES: usize = 3;

        if self.addresses.len() <= MAX_DISPLAY_ADDRESSES {
            self.addresses
                .iter()
                .map(std::string::ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        } else {
            let displayed: Vec<String> = self
                .addresses
                .iter()
                .take(MAX_DISPLAY_ADDRESSES)
                .map(std::string::ToString::to_string)
                .collect();
            format!(
                "{}, ... (+{})",
                displayed.join(", "),
                self.addresses.len() - MAX_DISPLAY_ADDRESSES
            )
        }
    }
}

const MAX_DOMAINS: usize = 10000;

#[derive(Debug, Default)]
pub struct ResolutionAggregator {
    domains: HashMap<String, ResolvedDomain>,
}

impl ResolutionAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_event(&mut self, event: ResolutionEvent) {
        if let Some(domain) = self.domains.get_mut(&event.domain) {
            domain.update(event);
            return;
        }

        if self.domains.len() >= MAX_DOMAINS
            && let Some(oldest) = self.find_oldest()
        {
            self.domains.remove(&oldest);
        }
        self.domains
            .insert(event.domain.clone(), ResolvedDomain::new(event));
    }

    fn find_oldest(&self) -> Option<String> {
        self.domains
            .values()
            .min_by_key(|d| d.last_seen)
            .map(|d| d.domain.clone())
    }

    pub fn get_domains(&self, sort_by: SortBy, filter: Option<&str>) -> Vec<ResolvedDomain> {
        let mut domains: Vec<ResolvedDomain> = self
            .domains
            .values()
            .filter(|d| filter.is_none_or(|pattern| d.domain.contains(pattern)))
            .cloned()
            .collect();

        match sort_by {
            SortBy::LastSeen => domains.sort_by(|a, b| b.last_seen.cmp(&a.last_seen)),
            SortBy::Count => domains.sort_by(|a, b| b.count.cmp(&a.count)),
            SortBy::Domain => domains.sort_by(|a, b| a.domain.cmp(&b.domain)),
        }

        domains
    }

    pub fn total_domains(&self) -> usize {
        self.domains.len()
    }

    pub fn total_count(&self) -> u64 {
        self.domains.values().map(|d| d.count).sum()
    }
}
