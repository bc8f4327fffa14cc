//! Controller configuration from the environment

use anyhow::{bail, Context, Result};
use std::time::Duration;

/// Controller configuration
#[derive(Clone, Debug)]
pub struct ControllerConfig {
    /// Interval between refreshes of a settled gateway
    pub requeue_interval: Duration,
    /// Interval before retrying a failed reconciliation
    pub error_requeue_interval: Duration,
    /// Network offerings (name, ID) known to the in-memory backend
    pub network_offerings: Vec<(String, String)>,
    /// ACL lists (name, ID) known to the in-memory backend
    pub network_acls: Vec<(String, String)>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            requeue_interval: Duration::from_secs(300),
            error_requeue_interval: Duration::from_secs(60),
            network_offerings: Vec::new(),
            network_acls: Vec::new(),
        }
    }
}

impl ControllerConfig {
    /// Read configuration from `GATEWAY_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup("GATEWAY_REQUEUE_SECS") {
            config.requeue_interval = parse_secs("GATEWAY_REQUEUE_SECS", &raw)?;
        }
        if let Some(raw) = lookup("GATEWAY_ERROR_REQUEUE_SECS") {
            config.error_requeue_interval = parse_secs("GATEWAY_ERROR_REQUEUE_SECS", &raw)?;
        }
        if let Some(raw) = lookup("GATEWAY_NETWORK_OFFERINGS") {
            config.network_offerings =
                parse_catalog(&raw).context("invalid GATEWAY_NETWORK_OFFERINGS")?;
        }
        if let Some(raw) = lookup("GATEWAY_NETWORK_ACLS") {
            config.network_acls = parse_catalog(&raw).context("invalid GATEWAY_NETWORK_ACLS")?;
        }

        Ok(config)
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<Duration> {
    let secs: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{} must be a number of seconds, got {:?}", key, raw))?;
    Ok(Duration::from_secs(secs))
}

/// Parse `name=id,name=id`
fn parse_catalog(raw: &str) -> Result<Vec<(String, String)>> {
    let mut entries = Vec::new();
    for item in raw.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        let Some((name, id)) = item.split_once('=') else {
            bail!("expected name=id, got {:?}", item);
        };
        let (name, id) = (name.trim(), id.trim());
        if name.is_empty() || id.is_empty() {
            bail!("expected name=id, got {:?}", item);
        }
        entries.push((name.to_string(), id.to_string()));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ControllerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.requeue_interval, Duration::from_secs(300));
        assert_eq!(config.error_requeue_interval, Duration::from_secs(60));
        assert!(config.network_offerings.is_empty());
    }

    #[test]
    fn test_from_lookup() {
        let config = ControllerConfig::from_lookup(lookup(&[
            ("GATEWAY_REQUEUE_SECS", "120"),
            ("GATEWAY_NETWORK_OFFERINGS", "DefaultOffering=off-123, Other = off-456"),
            ("GATEWAY_NETWORK_ACLS", "web=acl-1"),
        ]))
        .unwrap();
        assert_eq!(config.requeue_interval, Duration::from_secs(120));
        assert_eq!(
            config.network_offerings,
            vec![
                ("DefaultOffering".to_string(), "off-123".to_string()),
                ("Other".to_string(), "off-456".to_string()),
            ]
        );
        assert_eq!(config.network_acls, vec![("web".to_string(), "acl-1".to_string())]);
    }

    #[test]
    fn test_invalid_values() {
        assert!(ControllerConfig::from_lookup(lookup(&[("GATEWAY_ERROR_REQUEUE_SECS", "soon")])).is_err());
        assert!(ControllerConfig::from_lookup(lookup(&[("GATEWAY_NETWORK_OFFERINGS", "DefaultOffering")])).is_err());
        assert!(ControllerConfig::from_lookup(lookup(&[("GATEWAY_NETWORK_ACLS", "=acl-1")])).is_err());
    }
}
