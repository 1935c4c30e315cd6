mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Args, Source};
use dnsallow::allowset::{AllowSet, IpsetCommand, MemorySet};
use dnsallow::capture::{self, CaptureLoader};
use dnsallow::dns::{DnsCollector, DnsState, EVENT_CHANNEL_SIZE, SortBy};
use dnsallow::handler::PacketHandler;
use dnsallow::policy::{Policy, PolicyConfig};
use log::{error, info, warn};
use tokio::signal::unix::{Signal, SignalKind, signal};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const SUMMARY_LEN: usize = 10;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.list_interfaces {
        let interfaces = capture::list_interfaces()?;
        println!("Available network interfaces:");
        for device in interfaces {
            let status = if device.flags.is_up() { "UP" } else { "DOWN" };
            let running = if device.flags.is_running() {
                "RUNNING"
            } else {
                ""
            };
            let loopback = if device.flags.is_loopback() {
                "LOOPBACK"
            } else {
                ""
            };

            println!("  {} [{}] {} {}", device.name, status, running, loopback);

            if let Some(desc) = device.desc {
                println!("    Description: {desc}");
            }
        }
        return Ok(());
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    info!("Starting dnsallow");

    let policy = match &args.policy {
        Some(path) => {
            let config = PolicyConfig::load(path)
                .with_context(|| format!("Failed to load policy {}", path.display()))?;
            info!(
                "Loaded {} rules from {} (default {:?})",
                config.rules.len(),
                path.display(),
                config.default_policy
            );
            Policy::new(&config)
        }
        None => {
            info!("No policy file given, allowing every name");
            Policy::allow_all()
        }
    };

    let allow_set: Box<dyn AllowSet> = if args.dry_run {
        info!("Dry run: allowed addresses are kept in memory");
        Box::new(MemorySet::new())
    } else {
        let ipset = IpsetCommand::new(&args.ipv4_set, &args.ipv6_set);
        ipset
            .ensure_sets()
            .context("Failed to prepare ipsets (is ipset installed and are we root?)")?;
        Box::new(ipset)
    };

    let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
    let handler = PacketHandler::new(policy, allow_set).with_events(event_tx);

    let collector = DnsCollector::new(event_rx);
    let dns_state = DnsState::new(collector.aggregator());
    let collector_handle = tokio::spawn(async move {
        if let Err(e) = collector.run().await {
            error!("Collector error: {e}");
        }
    });

    let mut terminate =
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;

    let cancel_token = CancellationToken::new();
    let mut capture_handle = match args.source {
        Source::Nfqueue => {
            CaptureLoader::load_nfqueue(args.queue_num, handler, cancel_token.clone())
        }
        Source::Pcap => {
            let interface = match args.interface {
                Some(iface) => iface,
                None => capture::select_default_interface()?,
            };
            CaptureLoader::load_pcap(&interface, handler, cancel_token.clone())?
        }
    };

    let finished = tokio::select! {
        joined = &mut capture_handle => Some(joined),
        () = shutdown_signal(&mut terminate) => None,
    };
    let joined = match finished {
        Some(joined) => joined,
        None => {
            info!("Stopping packet capture...");
            cancel_token.cancel();
            capture_handle.await
        }
    };
    let stats = joined.context("Capture task panicked")??;
    info!("Statistics: {stats}");

    // The handler owned the only event sender, so the collector drains and ends.
    if let Err(e) = collector_handle.await {
        warn!("Collector task failed: {e}");
    }
    log_summary(&dns_state);

    info!("dnsallow stopped");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM. Without a working SIGINT listener only
/// SIGTERM ends the wait.
async fn shutdown_signal(terminate: &mut Signal) {
    let interrupted = tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = terminate.recv() => return,
    };
    if let Err(e) = interrupted {
        warn!("Failed to listen for SIGINT: {e}");
        terminate.recv().await;
    }
}

fn log_summary(state: &DnsState) {
    let (domains, responses) = state.stats();
    info!("{domains} domains in {responses} responses");
    for domain in state
        .get_domains(SortBy::Count, None)
        .iter()
        .take(SUMMARY_LEN)
    {
        info!(
            "  {:>6} {:<40} {:?} ({} denied) {}",
            domain.count,
            domain.domain,
            domain.last_decision,
            domain.denied,
            domain.address_list()
        );
    }
}
