use anyhow::{Context, Result, bail};
use log::{debug, info, warn};
use pcap::{Active, Capture, Device, Error};
use tokio_util::sync::CancellationToken;

use super::POLL_INTERVAL_MS;
use crate::handler::{PacketHandler, Stats};
use crate::packet::LinkLayer;

/// Responses only; queries carry no addresses.
const BPF_FILTER: &str = "udp src port 53";

pub fn list_interfaces() -> Result<Vec<Device>> {
    Ok(Device::list()?)
}

pub fn select_default_interface() -> Result<String> {
    let devices = Device::list()?;

    for device in &devices {
        if device.name == "any" {
            continue;
        }
        if !device.flags.is_loopback() && device.flags.is_up() && device.flags.is_running() {
            return Ok(device.name.clone());
        }
    }

    for device in &devices {
        if device.name != "any" && device.flags.is_up() {
            return Ok(device.name.clone());
        }
    }

    bail!("No suitable network interface found")
}

pub(super) struct PcapSource {
    cap: Capture<Active>,
    link: LinkLayer,
}

impl PcapSource {
    pub(super) fn open(interface: &str) -> Result<Self> {
        info!("Opening capture on interface: {interface}");

        let cap = if interface == "any" {
            Capture::from_device("any")?
        } else {
            let device = Device::list()?
                .into_iter()
                .find(|d| d.name == interface)
                .with_context(|| format!("Interface {interface} not found"))?;
            Capture::from_device(device)?
        };
        let mut cap = cap
            .immediate_mode(true)
            .timeout(POLL_INTERVAL_MS as i32)
            .open()
            .with_context(|| format!("Failed to open capture on {interface}"))?;

        cap.filter(BPF_FILTER, true)?;

        let linktype = cap.get_datalink();
        let link = LinkLayer::from_linktype(linktype.0).with_context(|| {
            format!("Unsupported data link type {} on {interface}", linktype.0)
        })?;

        info!("Capture started on interface: {interface} ({link:?})");
        Ok(Self { cap, link })
    }

    pub(super) fn run(mut self, mut handler: PacketHandler, token: CancellationToken) -> Stats {
        while !token.is_cancelled() {
            match self.cap.next_packet() {
                Ok(packet) => match self.link.strip(packet.data) {
                    Some(ip) => {
                        handler.handle(ip);
                    }
                    None => debug!("skipping non-IP frame of {} bytes", packet.data.len()),
                },
                Err(Error::TimeoutExpired) => continue,
                Err(e) => {
                    warn!("Error reading packet: {e}");
                    continue;
                }
            }
        }
        info!("Packet capture task terminated");
        handler.into_stats()
    }
}
