pub mod chain;
pub mod github;
pub mod http;
pub mod ping;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::config::DashboardConfig;
use crate::types::source::{NormalizedRecord, SourceId, SourceResult};

/// One external endpoint family. `fetch` always resolves; failures come back
/// as `SourceResult::Failed`.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn id(&self) -> SourceId;

    async fn fetch(&self) -> SourceResult<NormalizedRecord>;
}

pub type SharedAdapter = Arc<dyn SourceAdapter>;

/// Build every adapter the config has enough information for.
pub fn build_adapters(config: &DashboardConfig) -> Result<Vec<SharedAdapter>, String> {
    let client = http::build_client()?;
    let mut adapters: Vec<SharedAdapter> = Vec::new();

    let gh = &config.github;
    let github = http::Endpoint::github(
        client.clone(),
        &gh.api_base,
        Duration::from_millis(gh.timeout_ms),
        gh.token.as_deref(),
    );
    if gh.org.is_empty() {
        warn!("No source-control org configured; skipping repository sources");
    } else {
        adapters.push(Arc::new(github::RepoActivityAdapter::new(
            github.clone(),
            &gh.org,
        )));
        adapters.push(Arc::new(github::RepoCatalogAdapter::new(
            github.clone(),
            &gh.org,
        )));
        adapters.push(Arc::new(github::CiStatusAdapter::new(
            github.clone(),
            &gh.org,
            gh.repos.clone(),
        )));
        adapters.push(Arc::new(github::CommitHistoryAdapter::new(
            github.clone(),
            &gh.org,
            gh.repos.clone(),
        )));
    }
    adapters.push(Arc::new(ping::PingAdapter::api_latency(github)));

    let chain = http::Endpoint::new(
        client.clone(),
        &config.chain.api_base,
        Duration::from_millis(config.chain.timeout_ms),
    );
    if config.chain.address.is_empty() {
        warn!("No chain address configured; skipping wallet source");
    } else {
        adapters.push(Arc::new(chain::ChainAccountAdapter::new(
            chain.clone(),
            &config.chain.address,
        )));
    }
    adapters.push(Arc::new(chain::ChainNetworkAdapter::new(chain)));

    adapters.push(Arc::new(ping::PingAdapter::registry(http::Endpoint::new(
        client.clone(),
        &config.registry.url,
        Duration::from_millis(config.registry.timeout_ms),
    ))));

    if config.page.url.is_empty() {
        warn!("No page origin configured; skipping page latency probe");
    } else {
        adapters.push(Arc::new(ping::PingAdapter::page(http::Endpoint::new(
            client,
            &config.page.url,
            Duration::from_millis(config.page.timeout_ms),
        ))));
    }

    Ok(adapters)
}
