use log::debug;

use super::config::{Decision, PolicyConfig, Rule};
use crate::dns::DnsName;

/// Compiled policy for matching decoded names.
#[derive(Debug)]
pub struct Policy {
    default_policy: Decision,
    rules: Vec<CompiledRule>,
}

#[derive(Debug)]
struct CompiledRule {
    /// Lowercased labels, reversed for suffix matching.
    /// e.g., "*.example.com" -> ["com", "example"]
    parts: Vec<Vec<u8>>,
    is_wildcard: bool,
    action: Decision,
    pattern: String,
}

impl Policy {
    pub fn new(config: &PolicyConfig) -> Self {
        Self {
            default_policy: config.default_policy,
            rules: config.rules.iter().map(CompiledRule::from).collect(),
        }
    }

    pub fn allow_all() -> Self {
        Self::new(&PolicyConfig::allow_all())
    }

    /// Decide whether addresses resolved for `name` may be added to the
    /// allow-sets. The first matching rule wins.
    pub fn check(&self, name: &DnsName) -> Decision {
        for rule in &self.rules {
            if rule.matches(name) {
                debug!("{name} matched rule {:?}: {:?}", rule.pattern, rule.action);
                return rule.action;
            }
        }
        self.default_policy
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::allow_all()
    }
}

impl From<&Rule> for CompiledRule {
    fn from(rule: &Rule) -> Self {
        let (is_wildcard, domain) = match rule.pattern.strip_prefix("*.") {
            Some(rest) => (true, rest),
            None => (false, rule.pattern.as_str()),
        };
        let parts = domain
            .split('.')
            .rev()
            .map(|label| label.to_ascii_lowercase().into_bytes())
            .collect();

        Self {
            parts,
            is_wildcard,
            action: rule.action,
            pattern: rule.pattern.clone(),
        }
    }
}

impl CompiledRule {
    fn matches(&self, name: &DnsName) -> bool {
        let labels: Vec<&[u8]> = name.labels().collect();

        // Wildcards need at least one label in front of the suffix.
        let length_ok = if self.is_wildcard {
            labels.len() > self.parts.len()
        } else {
            labels.len() == self.parts.len()
        };

        length_ok
            && labels
                .iter()
                .rev()
                .zip(&self.parts)
                .all(|(label, part)| label.eq_ignore_ascii_case(part))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::decode_name;

    fn name(dotted: &str) -> DnsName {
        let mut wire = Vec::new();
        for label in dotted.split('.') {
            wire.push(label.len() as u8);
            wire.extend_from_slice(label.as_bytes());
        }
        wire.push(0);

        let mut name = DnsName::new();
        decode_name(&wire, 0, &mut name).unwrap();
        name
    }

    fn test_policy() -> Policy {
        Policy::new(
            &PolicyConfig::parse(
                r#"
default_policy: deny
rules:
  - pattern: "*.ads.example.com"
    action: deny
  - pattern: "example.com"
    action: allow
  - pattern: "*.example.com"
    action: allow
"#,
            )
            .unwrap(),
        )
    }

    #[test]
    fn allow_all_by_default() {
        let policy = Policy::default();
        assert_eq!(policy.check(&name("anything.test")), Decision::Allow);
    }

    #[test]
    fn first_match_wins() {
        let policy = test_policy();
        assert_eq!(policy.check(&name("tracker.ads.example.com")), Decision::Deny);
        assert_eq!(policy.check(&name("www.example.com")), Decision::Allow);
        assert_eq!(policy.check(&name("example.com")), Decision::Allow);
    }

    #[test]
    fn wildcard_needs_a_subdomain() {
        let policy = test_policy();
        // "ads.example.com" itself only matches the later "*.example.com".
        assert_eq!(policy.check(&name("ads.example.com")), Decision::Allow);
    }

    #[test]
    fn unmatched_names_use_default() {
        let policy = test_policy();
        assert_eq!(policy.check(&name("example.org")), Decision::Deny);
        assert_eq!(policy.check(&name("notexample.com")), Decision::Deny);
    }

    #[test]
    fn case_insensitive() {
        let policy = test_policy();
        assert_eq!(policy.check(&name("WWW.Example.COM")), Decision::Allow);
        assert_eq!(policy.check(&name("x.ADS.example.com")), Decision::Deny);
    }
}
