use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use dnsallow::allowset::{DEFAULT_IPV4_SET, DEFAULT_IPV6_SET};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    /// Intercept packets queued by an iptables NFQUEUE rule
    Nfqueue,
    /// Passively capture DNS responses on an interface
    Pcap,
}

#[derive(Parser, Debug)]
#[command(name = "dnsallow")]
#[command(about = "Allow traffic only to addresses of permitted DNS names", long_about = None)]
pub struct Args {
    #[arg(short, long, value_enum, default_value_t = Source::Nfqueue)]
    pub source: Source,

    #[arg(short, long, default_value_t = 53)]
    pub queue_num: u16,

    #[arg(short, long)]
    pub interface: Option<String>,

    /// YAML policy file; every name is allowed without one
    #[arg(short, long)]
    pub policy: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_IPV4_SET)]
    pub ipv4_set: String,

    #[arg(long, default_value = DEFAULT_IPV6_SET)]
    pub ipv6_set: String,

    /// Keep allowed addresses in memory instead of calling ipset
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    #[arg(long)]
    pub list_interfaces: bool,
}
