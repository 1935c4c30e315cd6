use log::{Level, debug, info, log_enabled, trace, warn};
use std::fmt;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::allowset::AllowSet;
use crate::dispatch::parse_ip_dns;
use crate::dns::{DnsResult, ResolutionEvent};
use crate::error::{FailureKind, ParseError};
use crate::hexdump::HexDump;
use crate::policy::{Decision, Policy};

/// Packet counters, kept by the capture thread.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub packets: u64,
    pub resolved: u64,
    pub malformed: u64,
    pub unusable: u64,
    pub denied: u64,
    pub inserted: u64,
    pub insert_failures: u64,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} packets, {} resolved ({} denied), {} malformed, {} unusable, \
             {} addresses inserted, {} insert failures",
            self.packets,
            self.resolved,
            self.denied,
            self.malformed,
            self.unusable,
            self.inserted,
            self.insert_failures
        )
    }
}

/// What happened to a single packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Rejected(ParseError),
    Denied,
    Allowed { inserted: usize, failed: usize },
}

/// Runs one packet through parser, policy and allow-set.
pub struct PacketHandler<S = Box<dyn AllowSet>> {
    policy: Policy,
    allow_set: S,
    events: Option<mpsc::Sender<ResolutionEvent>>,
    stats: Stats,
}

impl<S: AllowSet> PacketHandler<S> {
    pub fn new(policy: Policy, allow_set: S) -> Self {
        Self {
            policy,
            allow_set,
            events: None,
            stats: Stats::default(),
        }
    }

    /// Report every policy decision to a collector.
    pub fn with_events(mut self, events: mpsc::Sender<ResolutionEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn allow_set(&self) -> &S {
        &self.allow_set
    }

    pub fn into_stats(self) -> Stats {
        self.stats
    }

    /// Handle a packet that starts at its IP header. Never fails: bad
    /// packets are counted, logged and dropped.
    pub fn handle(&mut self, packet: &[u8]) -> Outcome {
        self.stats.packets += 1;
        if log_enabled!(Level::Trace) {
            trace!("packet of {} bytes\n{}", packet.len(), HexDump(packet));
        }

        let result = match parse_ip_dns(packet) {
            Ok(result) => result,
            Err(e) => {
                match e.kind() {
                    FailureKind::Malformed => {
                        self.stats.malformed += 1;
                        debug!("parsing failed: {e}");
                    }
                    FailureKind::Unusable => {
                        self.stats.unusable += 1;
                        debug!("ignoring packet: {e}");
                    }
                }
                return Outcome::Rejected(e);
            }
        };
        self.stats.resolved += 1;

        let decision = self.policy.check(&result.name);
        self.emit(&result, decision);

        if decision == Decision::Deny {
            self.stats.denied += 1;
            info!("policy check failed for {}", result.name);
            return Outcome::Denied;
        }

        let (mut inserted, mut failed) = (0, 0);
        for address in &result.addresses {
            match self.allow_set.insert(address) {
                Ok(()) => inserted += 1,
                Err(e) => {
                    failed += 1;
                    warn!("failed to allow {address} for {}: {e}", result.name);
                }
            }
        }
        self.stats.inserted += inserted as u64;
        self.stats.insert_failures += failed as u64;

        info!(
            "{} -> {}",
            result.name,
            result
                .addresses
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Outcome::Allowed { inserted, failed }
    }

    fn emit(&mut self, result: &DnsResult, decision: Decision) {
        let Some(tx) = &self.events else {
            return;
        };
        match tx.try_send(ResolutionEvent::new(result, decision)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => debug!("event channel full, dropping event"),
            Err(TrySendError::Closed(_)) => {
                debug!("event collector gone");
                self.events = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allowset::{AllowSetError, MemorySet};
    use crate::dns::Address;
    use crate::policy::PolicyConfig;

    /// IPv4/UDP response for `name` with one A record per address.
    fn packet(name: &[&str], addresses: &[[u8; 4]]) -> Vec<u8> {
        let mut dns = vec![0xab, 0xcd, 0x81, 0x80, 0x00, 0x01, 0x00, addresses.len() as u8];
        dns.extend_from_slice(&[0, 0, 0, 0]);
        for label in name {
            dns.push(label.len() as u8);
            dns.extend_from_slice(label.as_bytes());
        }
        dns.extend_from_slice(&[0x00, 0x00, 0x01, 0x00, 0x01]);
        for address in addresses {
            dns.extend_from_slice(&[0xc0, 0x0c, 0x00, 0x01, 0x00, 0x01, 0, 0, 0, 60, 0, 4]);
            dns.extend_from_slice(address);
        }

        let mut ip = vec![0x45, 0, 0, 0, 0, 0, 0, 0, 64, 17, 0, 0, 8, 8, 8, 8, 10, 0, 0, 2];
        ip.extend_from_slice(&[0x00, 0x35, 0xd0, 0xb2, 0x00, 0x00, 0x00, 0x00]);
        ip.extend_from_slice(&dns);
        ip
    }

    fn deny_ads() -> Policy {
        Policy::new(
            &PolicyConfig::parse("rules:\n  - pattern: \"*.ads.test\"\n    action: deny\n")
                .unwrap(),
        )
    }

    #[test]
    fn allowed_addresses_reach_the_set() {
        let mut handler = PacketHandler::new(Policy::allow_all(), MemorySet::new());
        let outcome = handler.handle(&packet(&["example", "com"], &[[1, 2, 3, 4], [5, 6, 7, 8]]));

        assert_eq!(
            outcome,
            Outcome::Allowed {
                inserted: 2,
                failed: 0
            }
        );
        assert!(handler.allow_set().contains(&Address::V4([1, 2, 3, 4])));
        assert!(handler.allow_set().contains(&Address::V4([5, 6, 7, 8])));
        assert_eq!(handler.stats().inserted, 2);
    }

    #[test]
    fn denied_names_insert_nothing() {
        let mut handler = PacketHandler::new(deny_ads(), MemorySet::new());
        let outcome = handler.handle(&packet(&["x", "ads", "test"], &[[1, 2, 3, 4]]));

        assert_eq!(outcome, Outcome::Denied);
        assert!(handler.allow_set().is_empty());
        assert_eq!(handler.stats().denied, 1);
    }

    #[test]
    fn bad_packets_are_counted_by_kind() {
        let mut handler = PacketHandler::new(Policy::allow_all(), MemorySet::new());
        handler.handle(&[0x45, 0x00]);
        handler.handle(&packet(&["example", "com"], &[]));

        let stats = handler.into_stats();
        assert_eq!(stats.packets, 2);
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.unusable, 1);
        assert_eq!(stats.resolved, 0);
    }

    struct FailingSet;

    impl AllowSet for FailingSet {
        fn insert(&mut self, _: &Address) -> Result<(), AllowSetError> {
            Err(AllowSetError::Command {
                action: "add",
                set: "test".to_string(),
                stderr: "no such set".to_string(),
            })
        }
    }

    #[test]
    fn insert_failures_do_not_stop_the_handler() {
        let mut handler = PacketHandler::new(Policy::allow_all(), FailingSet);
        let outcome = handler.handle(&packet(&["example", "com"], &[[1, 2, 3, 4]]));

        assert_eq!(
            outcome,
            Outcome::Allowed {
                inserted: 0,
                failed: 1
            }
        );
        assert_eq!(handler.stats().insert_failures, 1);
    }

    #[test]
    fn decisions_are_reported() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut handler = PacketHandler::new(deny_ads(), MemorySet::new()).with_events(tx);
        handler.handle(&packet(&["Example", "com"], &[[1, 2, 3, 4]]));
        handler.handle(&packet(&["x", "ads", "test"], &[[1, 2, 3, 4]]));

        let first = rx.try_recv().unwrap();
        assert_eq!(first.domain, "example.com");
        assert_eq!(first.decision, Decision::Allow);
        assert_eq!(rx.try_recv().unwrap().decision, Decision::Deny);
    }

    #[test]
    fn boxed_sets_work() {
        let set: Box<dyn AllowSet> = Box::new(MemorySet::new());
        let mut handler = PacketHandler::new(Policy::allow_all(), set);
        assert!(matches!(
            handler.handle(&packet(&["a"], &[[9, 9, 9, 9]])),
            Outcome::Allowed { inserted: 1, .. }
        ));
    }
}
