use std::{str::FromStr, time::Duration};

use anyhow::{anyhow, Context, Result};

use crate::mcp;

pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";
pub const DEFAULT_METRICS_PORT: u16 = 9090;
pub const DEFAULT_RECONNECT_DELAY_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub slack_bot_token: String,
    pub slack_app_token: String,
    pub slack_api_base: String,
    pub mcp_port: u16,
    pub metrics_port: u16,
    pub reconnect_delay: Duration,
}

impl Config {
    pub fn from_env() -> Result<Config> {
        Config::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow!("{name} must be set"))
        };

        Ok(Config {
            slack_bot_token: required("SLACK_BOT_TOKEN")?,
            slack_app_token: required("SLACK_APP_TOKEN")?,
            slack_api_base: lookup("SLACK_API_BASE").unwrap_or_else(|| DEFAULT_SLACK_API_BASE.into()),
            mcp_port: parsed(&lookup, "MCP_PORT", mcp::DEFAULT_PORT)?,
            metrics_port: parsed(&lookup, "METRICS_PORT", DEFAULT_METRICS_PORT)?,
            reconnect_delay: Duration::from_secs(parsed(
                &lookup,
                "RECONNECT_DELAY_SECS",
                DEFAULT_RECONNECT_DELAY_SECS,
            )?),
        })
    }
}

fn parsed<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{name} has an invalid value {value:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::from_lookup(lookup(&[("SLACK_BOT_TOKEN", "xoxb-1"), ("SLACK_APP_TOKEN", "xapp-1")])).unwrap();
        assert_eq!(
            config,
            Config {
                slack_bot_token: "xoxb-1".into(),
                slack_app_token: "xapp-1".into(),
                slack_api_base: "https://slack.com/api".into(),
                mcp_port: 6274,
                metrics_port: 9090,
                reconnect_delay: Duration::from_secs(5),
            }
        );
    }

    #[test]
    fn overrides() {
        let config = Config::from_lookup(lookup(&[
            ("SLACK_BOT_TOKEN", "xoxb-1"),
            ("SLACK_APP_TOKEN", "xapp-1"),
            ("MCP_PORT", "7000"),
            ("RECONNECT_DELAY_SECS", " 1 "),
        ]))
        .unwrap();
        assert_eq!(config.mcp_port, 7000);
        assert_eq!(config.reconnect_delay, Duration::from_secs(1));
    }

    #[test]
    fn tokens_are_required() {
        let err = Config::from_lookup(lookup(&[("SLACK_BOT_TOKEN", "xoxb-1")])).unwrap_err();
        assert_eq!(err.to_string(), "SLACK_APP_TOKEN must be set");

        let err = Config::from_lookup(lookup(&[("SLACK_BOT_TOKEN", ""), ("SLACK_APP_TOKEN", "xapp-1")])).unwrap_err();
        assert_eq!(err.to_string(), "SLACK_BOT_TOKEN must be set");
    }

    #[test]
    fn unparsable_port() {
        let err = Config::from_lookup(lookup(&[
            ("SLACK_BOT_TOKEN", "xoxb-1"),
            ("SLACK_APP_TOKEN", "xapp-1"),
            ("METRICS_PORT", "http"),
        ]))
        .unwrap_err();
        assert!(err.to_string().starts_with("METRICS_PORT has an invalid value"));
    }
}
