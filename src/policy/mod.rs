mod config;
mod matcher;

pub use config::{Decision, PolicyConfig, PolicyError, Rule, SUPPORTED_VERSION};
pub use matcher::Policy;
