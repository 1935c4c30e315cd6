use log::{debug, info};
use std::path::PathBuf;
use std::process::Command;

use super::{AllowSet, AllowSetError};
use crate::dns::Address;

/// Set names usable in "ipset list NAME" and iptables "-m set --match-set".
pub const DEFAULT_IPV4_SET: &str = "dnsallow-ipv4";
pub const DEFAULT_IPV6_SET: &str = "dnsallow-ipv6";

/// Maintains a pair of `hash:ip` sets through the ipset tool.
#[derive(Debug, Clone)]
pub struct IpsetCommand {
    program: PathBuf,
    ipv4_set: String,
    ipv6_set: String,
}

impl IpsetCommand {
    pub fn new(ipv4_set: impl Into<String>, ipv6_set: impl Into<String>) -> Self {
        Self {
            program: PathBuf::from("ipset"),
            ipv4_set: ipv4_set.into(),
            ipv6_set: ipv6_set.into(),
        }
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Create both sets unless compatible ones exist already. Entries never
    /// expire (timeout 0) unless a per-entry timeout is given later.
    pub fn ensure_sets(&self) -> Result<(), AllowSetError> {
        for (set, family) in [(&self.ipv4_set, "inet"), (&self.ipv6_set, "inet6")] {
            self.run(
                "create",
                set,
                &["hash:ip", "family", family, "timeout", "0", "-exist"],
            )?;
            info!("ipset {set} ready ({family})");
        }
        Ok(())
    }

    fn set_for(&self, address: &Address) -> &str {
        match address {
            Address::V4(_) => &self.ipv4_set,
            Address::V6(_) => &self.ipv6_set,
        }
    }

    fn run(&self, action: &'static str, set: &str, args: &[&str]) -> Result<(), AllowSetError> {
        let output = Command::new(&self.program)
            .arg(action)
            .arg(set)
            .args(args)
            .output()
            .map_err(|source| AllowSetError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(AllowSetError::Command {
                action,
                set: set.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

impl AllowSet for IpsetCommand {
    fn insert(&mut self, address: &Address) -> Result<(), AllowSetError> {
        let set = self.set_for(address);
        let ip = address.to_string();
        self.run("add", set, &[ip.as_str(), "-exist"])?;
        debug!("added {address} to {set}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses_pick_set_by_family() {
        let ipset = IpsetCommand::new(DEFAULT_IPV4_SET, DEFAULT_IPV6_SET);
        assert_eq!(ipset.set_for(&Address::V4([1, 2, 3, 4])), "dnsallow-ipv4");
        assert_eq!(ipset.set_for(&Address::V6([0; 16])), "dnsallow-ipv6");
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let mut ipset = IpsetCommand::new("v4", "v6").with_program("/nonexistent/ipset");
        let err = ipset.insert(&Address::V4([1, 2, 3, 4])).unwrap_err();
        assert!(matches!(err, AllowSetError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn failing_program_reports_command_error() {
        let mut ipset = IpsetCommand::new("v4", "v6").with_program("false");
        let err = ipset.ensure_sets().unwrap_err();
        assert!(matches!(
            err,
            AllowSetError::Command {
                action: "create",
                ..
            }
        ));
    }

    #[cfg(unix)]
    #[test]
    fn succeeding_program_inserts() {
        let mut ipset = IpsetCommand::new("v4", "v6").with_program("true");
        ipset.ensure_sets().unwrap();
        ipset.insert(&Address::V6([0; 16])).unwrap();
    }
}
