use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";
pub const DEFAULT_CHAIN_API: &str = "https://mainnet-api.algonode.cloud";
pub const DEFAULT_REGISTRY_API: &str = "https://registry.npmjs.org";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unsupported refresh interval: {0}s (expected 0, 30, 60 or 300)")]
    Interval(u64),
    #[error("invalid value for {key}: {message}")]
    InvalidVar { key: String, message: String },
    #[error("invalid config patch: {0}")]
    Patch(#[from] serde_json::Error),
    #[error("failed to read env file: {0}")]
    EnvFile(#[from] dotenvy::Error),
}

/// Options offered by the dashboard's refresh selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub enum RefreshInterval {
    Secs30,
    Secs60,
    Secs300,
    Off,
}

impl RefreshInterval {
    pub const OPTIONS: [RefreshInterval; 4] = [
        RefreshInterval::Secs30,
        RefreshInterval::Secs60,
        RefreshInterval::Secs300,
        RefreshInterval::Off,
    ];

    pub fn seconds(self) -> u64 {
        match self {
            RefreshInterval::Secs30 => 30,
            RefreshInterval::Secs60 => 60,
            RefreshInterval::Secs300 => 300,
            RefreshInterval::Off => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RefreshInterval::Secs30 => "30s",
            RefreshInterval::Secs60 => "1m",
            RefreshInterval::Secs300 => "5m",
            RefreshInterval::Off => "Off",
        }
    }
}

impl TryFrom<u64> for RefreshInterval {
    type Error = ConfigError;

    fn try_from(secs: u64) -> Result<Self, Self::Error> {
        RefreshInterval::OPTIONS
            .into_iter()
            .find(|opt| opt.seconds() == secs)
            .ok_or(ConfigError::Interval(secs))
    }
}

impl From<RefreshInterval> for u64 {
    fn from(interval: RefreshInterval) -> Self {
        interval.seconds()
    }
}

impl Default for RefreshInterval {
    fn default() -> Self {
        RefreshInterval::Secs60
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GithubConfig {
    pub api_base: String,
    pub org: String,
    pub token: Option<String>,
    /// Repositories polled for CI runs and commit activity.
    pub repos: Vec<String>,
    pub timeout_ms: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_GITHUB_API.to_string(),
            org: String::new(),
            token: None,
            repos: Vec::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChainConfig {
    pub api_base: String,
    pub address: String,
    pub timeout_ms: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_CHAIN_API.to_string(),
            address: String::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EndpointConfig {
    pub url: String,
    pub timeout_ms: u64,
}

impl EndpointConfig {
    fn registry() -> Self {
        Self {
            url: DEFAULT_REGISTRY_API.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Passing,
    Failing,
    Unknown,
}

/// Locally maintained package, not fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageEntry {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub test_count: u32,
    pub tests: TestStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardConfig {
    pub refresh_interval: RefreshInterval,
    pub github: GithubConfig,
    pub chain: ChainConfig,
    pub registry: EndpointConfig,
    /// Published origin of the dashboard itself, probed for latency.
    pub page: EndpointConfig,
    pub packages: Vec<PackageEntry>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_interval: RefreshInterval::default(),
            github: GithubConfig::default(),
            chain: ChainConfig::default(),
            registry: EndpointConfig::registry(),
            page: EndpointConfig::default(),
            packages: Vec::new(),
        }
    }
}

impl DashboardConfig {
    /// Load `.env` (next to the manifest, then the working directory) and
    /// build the config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
        if dotenvy::from_path(manifest_dir.join(".env")).is_err() {
            dotenvy::dotenv().ok();
        }
        Self::from_vars(std::env::vars())
    }

    /// Build the config from a `.env` file without touching the process env.
    pub fn from_env_file(path: &Path) -> Result<Self, ConfigError> {
        let vars = dotenvy::from_path_iter(path)?.collect::<Result<Vec<_>, _>>()?;
        Self::from_vars(vars)
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .filter(|(k, _)| k.starts_with("STATUSBOARD_") || k == "GITHUB_TOKEN")
            .collect();
        let mut config = Self::default();

        if let Some(raw) = vars.get("STATUSBOARD_INTERVAL") {
            let secs = parse_u64("STATUSBOARD_INTERVAL", raw)?;
            config.refresh_interval = RefreshInterval::try_from(secs)?;
        }
        if let Some(raw) = vars.get("STATUSBOARD_TIMEOUT_MS") {
            let timeout_ms = parse_u64("STATUSBOARD_TIMEOUT_MS", raw)?;
            config.github.timeout_ms = timeout_ms;
            config.chain.timeout_ms = timeout_ms;
            config.registry.timeout_ms = timeout_ms;
            config.page.timeout_ms = timeout_ms;
        }
        if let Some(org) = vars.get("STATUSBOARD_GITHUB_ORG") {
            config.github.org = org.trim().to_string();
        }
        if let Some(repos) = vars.get("STATUSBOARD_GITHUB_REPOS") {
            config.github.repos = repos
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(token) = vars.get("GITHUB_TOKEN").filter(|t| !t.is_empty()) {
            config.github.token = Some(token.clone());
        }
        if let Some(api) = vars.get("STATUSBOARD_GITHUB_API") {
            config.github.api_base = api.trim_end_matches('/').to_string();
        }
        if let Some(api) = vars.get("STATUSBOARD_CHAIN_API") {
            config.chain.api_base = api.trim_end_matches('/').to_string();
        }
        if let Some(address) = vars.get("STATUSBOARD_CHAIN_ADDRESS") {
            config.chain.address = address.trim().to_string();
        }
        if let Some(api) = vars.get("STATUSBOARD_REGISTRY_API") {
            config.registry.url = api.trim_end_matches('/').to_string();
        }
        if let Some(origin) = vars.get("STATUSBOARD_PAGE_ORIGIN") {
            config.page.url = origin.trim().to_string();
        }
        if let Some(raw) = vars.get("STATUSBOARD_PACKAGES") {
            config.packages =
                serde_json::from_str(raw).map_err(|e| ConfigError::InvalidVar {
                    key: "STATUSBOARD_PACKAGES".to_string(),
                    message: e.to_string(),
                })?;
        }

        if config.github.org.is_empty() {
            warn!("STATUSBOARD_GITHUB_ORG not set; source-control panels will stay empty");
        }
        debug!(
            interval = config.refresh_interval.seconds(),
            repos = config.github.repos.len(),
            packages = config.packages.len(),
            "Loaded dashboard config"
        );
        Ok(config)
    }

    /// Deep-merge a JSON patch into this config and return the merged result.
    pub fn apply_patch(&self, patch_json: &str) -> Result<Self, ConfigError> {
        let mut current = serde_json::to_value(self)?;
        let patch: serde_json::Value = serde_json::from_str(patch_json)?;
        merge_json(&mut current, &patch);
        Ok(serde_json::from_value(current)?)
    }
}

fn parse_u64(key: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::InvalidVar {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn merge_json(base: &mut serde_json::Value, patch: &serde_json::Value) {
    if let (serde_json::Value::Object(base_map), serde_json::Value::Object(patch_map)) =
        (base, patch)
    {
        for (key, value) in patch_map {
            match base_map.get_mut(key) {
                Some(existing) if value.is_object() && existing.is_object() => {
                    merge_json(existing, value);
                }
                _ => {
                    base_map.insert(key.clone(), value.clone());
                }
            }
        }
    }
}
