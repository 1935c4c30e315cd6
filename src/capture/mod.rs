//! Packet sources feeding the handler from a blocking thread.

mod nfqueue;
mod pcap;

use anyhow::Result;
use log::info;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::handler::{PacketHandler, Stats};

pub use self::pcap::{list_interfaces, select_default_interface};

/// pcap read timeout, the longest the capture waits before it looks at the
/// cancellation token.
const POLL_INTERVAL_MS: u64 = 100;

pub struct CaptureLoader;

impl CaptureLoader {
    /// Intercept packets from NFQUEUE `queue_num`. Every packet is accepted
    /// once the handler is done with it.
    pub fn load_nfqueue(
        queue_num: u16,
        handler: PacketHandler,
        token: CancellationToken,
    ) -> JoinHandle<Result<Stats>> {
        info!("Binding NFQUEUE {queue_num}");
        tokio::task::spawn_blocking(move || nfqueue::run(queue_num, handler, token))
    }

    /// Observe DNS responses on `interface` without intercepting them.
    pub fn load_pcap(
        interface: &str,
        handler: PacketHandler,
        token: CancellationToken,
    ) -> Result<JoinHandle<Result<Stats>>> {
        let source = pcap::PcapSource::open(interface)?;
        Ok(tokio::task::spawn_blocking(move || {
            Ok(source.run(handler, token))
        }))
    }
}
