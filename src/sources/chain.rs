use async_trait::async_trait;
use serde::Deserialize;

use super::http::{timed, Endpoint};
use super::SourceAdapter;
use crate::types::records::{ChainAccountInfo, ChainNetworkInfo};
use crate::types::source::{NormalizedRecord, SourceId, SourceResult};

/// Account object returned by the node's `/v2/accounts/{address}`.
/// Only `amount` is mandatory; light indexers omit the rest.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawAccount {
    pub amount: u64,
    #[serde(default)]
    pub min_balance: u64,
    #[serde(default)]
    pub assets: Option<Vec<serde_json::Value>>,
    pub total_assets_opted_in: Option<u32>,
    #[serde(default)]
    pub created_apps: Option<Vec<serde_json::Value>>,
    pub total_created_apps: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawStatus {
    pub last_round: u64,
    #[serde(default)]
    pub time_since_last_round: u64,
    #[serde(default)]
    pub catchup_time: u64,
    pub next_version: Option<String>,
}

pub fn normalize_account(raw: RawAccount) -> ChainAccountInfo {
    let asset_count = raw
        .total_assets_opted_in
        .unwrap_or_else(|| raw.assets.as_ref().map_or(0, |a| a.len() as u32));
    let created_app_count = raw
        .total_created_apps
        .unwrap_or_else(|| raw.created_apps.as_ref().map_or(0, |a| a.len() as u32));
    ChainAccountInfo {
        micro_algo_balance: raw.amount,
        min_balance_micro_algo: raw.min_balance,
        asset_count,
        created_app_count,
    }
}

/// Protocol versions are reported as spec URLs; keep the trailing segment.
pub fn version_label(raw: &str) -> Option<String> {
    raw.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(String::from)
}

pub fn normalize_status(raw: RawStatus) -> ChainNetworkInfo {
    ChainNetworkInfo {
        last_round: raw.last_round,
        since_last_round_ns: raw.time_since_last_round,
        catchup_ns: raw.catchup_time,
        next_version_label: raw.next_version.as_deref().and_then(version_label),
    }
}

pub struct ChainAccountAdapter {
    endpoint: Endpoint,
    address: String,
}

impl ChainAccountAdapter {
    pub fn new(endpoint: Endpoint, address: &str) -> Self {
        Self {
            endpoint,
            address: address.to_string(),
        }
    }
}

#[async_trait]
impl SourceAdapter for ChainAccountAdapter {
    fn id(&self) -> SourceId {
        SourceId::ChainAccount
    }

    async fn fetch(&self) -> SourceResult<NormalizedRecord> {
        let path = format!("/v2/accounts/{}", self.address);
        timed(async {
            let raw: RawAccount = self.endpoint.get_json(&path, &[]).await?;
            Ok(NormalizedRecord::ChainAccount(normalize_account(raw)))
        })
        .await
    }
}

pub struct ChainNetworkAdapter {
    endpoint: Endpoint,
}

impl ChainNetworkAdapter {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl SourceAdapter for ChainNetworkAdapter {
    fn id(&self) -> SourceId {
        SourceId::ChainNetwork
    }

    async fn fetch(&self) -> SourceResult<NormalizedRecord> {
        timed(async {
            let raw: RawStatus = self.endpoint.get_json("/v2/status", &[]).await?;
            Ok(NormalizedRecord::ChainNetwork(normalize_status(raw)))
        })
        .await
    }
}
