use crate::follow::BackoffPolicy;
use anyhow::Context;
use dispatch_protocol::DEFAULT_DISPATCH_ADDR;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "~/.rd-queue/config.toml";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    addr: Option<String>,
    request_timeout: Option<String>,
    follow: Option<RawFollowConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFollowConfig {
    wait_base_delay: Option<String>,
    wait_max_delay: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ToolConfig {
    pub(crate) addr: String,
    pub(crate) request_timeout: Duration,
    pub(crate) backoff: BackoffPolicy,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_DISPATCH_ADDR.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            backoff: BackoffPolicy::default(),
        }
    }
}

/// Loads the tool config. An explicit path must exist; the default path is optional.
pub(crate) fn load_tool_config(path: Option<&Path>) -> anyhow::Result<ToolConfig> {
    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (expand_tilde(DEFAULT_CONFIG_PATH), false),
    };
    if !required && !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(ToolConfig::default());
    }
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_tool_config(&raw)
        .with_context(|| format!("failed to parse config {}", path.display()))
}

pub(crate) fn parse_tool_config(raw: &str) -> anyhow::Result<ToolConfig> {
    let parsed: RawConfig = toml::from_str(raw)?;
    let defaults = ToolConfig::default();
    let follow = parsed.follow.unwrap_or_default();
    let backoff = BackoffPolicy {
        base: parse_duration_or(
            "follow.wait_base_delay",
            follow.wait_base_delay,
            defaults.backoff.base,
        )?,
        max: parse_duration_or(
            "follow.wait_max_delay",
            follow.wait_max_delay,
            defaults.backoff.max,
        )?,
    };
    if backoff.base.is_zero() {
        anyhow::bail!("follow.wait_base_delay must be greater than zero");
    }
    if backoff.max < backoff.base {
        anyhow::bail!("follow.wait_max_delay must not be less than follow.wait_base_delay");
    }
    let addr = parsed.addr.unwrap_or(defaults.addr);
    if addr.trim().is_empty() {
        anyhow::bail!("addr must not be empty");
    }
    let request_timeout = parse_duration_or(
        "request_timeout",
        parsed.request_timeout,
        defaults.request_timeout,
    )?;
    if request_timeout.is_zero() {
        anyhow::bail!("request_timeout must be greater than zero");
    }
    Ok(ToolConfig {
        addr,
        request_timeout,
        backoff,
    })
}

fn parse_duration_or(
    key: &str,
    value: Option<String>,
    default: Duration,
) -> anyhow::Result<Duration> {
    match value {
        Some(value) => humantime::parse_duration(value.trim())
            .with_context(|| format!("{key} is not a valid duration: {value}")),
        None => Ok(default),
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}
