use crate::dns::{ResolutionEvent, ResolvedDomain, SortBy};
use anyhow::Result;
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;

use super::query::ResolutionAggregator;

/// Capacity of the channel between the capture thread and the collector.
pub const EVENT_CHANNEL_SIZE: usize = 10000;

pub struct DnsCollector {
    aggregator: Arc<RwLock<ResolutionAggregator>>,
    rx: mpsc::Receiver<ResolutionEvent>,
}

impl DnsCollector {
    pub fn new(rx: mpsc::Receiver<ResolutionEvent>) -> Self {
        Self {
            aggregator: Arc::new(RwLock::new(ResolutionAggregator::new())),
            rx,
        }
    }

    pub fn aggregator(&self) -> Arc<RwLock<ResolutionAggregator>> {
        Arc::clone(&self.aggregator)
    }

    /// Runs until every sender is dropped.
    pub async fn run(mut self) -> Result<()> {
        while let Some(event) = self.rx.recv().await {
            let mut agg = match self.aggregator.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            agg.add_event(event);
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct DnsState {
    aggregator: Arc<RwLock<ResolutionAggregator>>,
}

impl DnsState {
    pub fn new(aggregator: Arc<RwLock<ResolutionAggregator>>) -> Self {
        Self { aggregator }
    }

    pub fn get_domains(&self, sort_by: SortBy, filter: Option<&str>) -> Vec<ResolvedDomain> {
        let agg = match self.aggregator.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        agg.get_domains(sort_by, filter)
    }

    pub fn stats(&self) -> (usize, u64) {
        let agg = match self.aggregator.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        (agg.total_domains(), agg.total_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Decision;
    use chrono::Local;
    use std::net::{IpAddr, Ipv4Addr};

    #[tokio::test]
    async fn collects_until_senders_are_gone() {
        let (tx, rx) = mpsc::channel(8);
        let collector = DnsCollector::new(rx);
        let state = DnsState::new(collector.aggregator());
        let handle = tokio::spawn(collector.run());

        for domain in ["example.com", "example.com", "example.org"] {
            tx.send(ResolutionEvent {
                domain: domain.to_string(),
                addresses: vec![IpAddr::V4(Ipv4Addr::LOCALHOST)],
                decision: Decision::Allow,
                timestamp: Local::now(),
            })
            .await
            .unwrap();
        }
        drop(tx);
        handle.await.unwrap().unwrap();

        assert_eq!(state.stats(), (2, 3));
        let top = state.get_domains(SortBy::Count, None);
        assert_eq!(top[0].domain, "example.com");
    }
}
