use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("failed to read policy file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse policy: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid domain pattern: {0:?}")]
    InvalidPattern(String),
    #[error("unsupported policy version {0} (expected {max})", max = SUPPORTED_VERSION)]
    UnsupportedVersion(u32),
}

/// The only policy file format understood so far.
pub const SUPPORTED_VERSION: u32 = 1;

/// Outcome of a policy check, also used as the action of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Deny,
}

/// A domain rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    /// Domain pattern. "*.example.com" matches subdomains only.
    pub pattern: String,
    pub action: Decision,
    /// Human-readable reason for this rule.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Policy file format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Decision when no rule matches.
    #[serde(default = "default_policy")]
    pub default_policy: Decision,

    /// Rules in priority order; the first match wins.
    #[serde(default)]
    pub rules: Vec<Rule>,
}

fn default_version() -> u32 {
    SUPPORTED_VERSION
}

fn default_policy() -> Decision {
    Decision::Allow
}

impl PolicyConfig {
    /// Loads a policy from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parses a policy from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, PolicyError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Policy that lets every name through.
    pub fn allow_all() -> Self {
        Self {
            version: SUPPORTED_VERSION,
            default_policy: Decision::Allow,
            rules: Vec::new(),
        }
    }

    fn validate(&self) -> Result<(), PolicyError> {
        if self.version != SUPPORTED_VERSION {
            return Err(PolicyError::UnsupportedVersion(self.version));
        }
        for rule in &self.rules {
            let pattern = &rule.pattern;
            let body = pattern.strip_prefix("*.").unwrap_or(pattern);
            if body.is_empty()
                || body.contains('*')
                || body.starts_with('.')
                || body.ends_with('.')
                || body.chars().any(char::is_whitespace)
            {
                return Err(PolicyError::InvalidPattern(pattern.clone()));
            }
        }
        Ok(())
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self::allow_all()
    }
}
