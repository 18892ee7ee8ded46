use async_trait::async_trait;

use super::http::{classify_status, timed, Endpoint};
use super::SourceAdapter;
use crate::types::records::PingInfo;
use crate::types::source::{NormalizedRecord, SourceId, SourceResult};

/// Liveness/latency probe against a single URL.
///
/// Opaque probes mirror a browser `no-cors` request: the response is never
/// inspected, so any HTTP answer counts as up and only transport failures or
/// the deadline count as down.
pub struct PingAdapter {
    id: SourceId,
    endpoint: Endpoint,
    path: &'static str,
    opaque: bool,
}

impl PingAdapter {
    /// Package registry `/-/ping`.
    pub fn registry(endpoint: Endpoint) -> Self {
        Self {
            id: SourceId::RegistryPing,
            endpoint,
            path: "/-/ping",
            opaque: false,
        }
    }

    /// The dashboard's own published origin.
    pub fn page(endpoint: Endpoint) -> Self {
        Self {
            id: SourceId::PageLatency,
            endpoint,
            path: "",
            opaque: true,
        }
    }

    /// Source-control API round trip via `/rate_limit`, which does not count
    /// against the quota.
    pub fn api_latency(endpoint: Endpoint) -> Self {
        Self {
            id: SourceId::ApiLatency,
            endpoint,
            path: "/rate_limit",
            opaque: false,
        }
    }
}

#[async_trait]
impl SourceAdapter for PingAdapter {
    fn id(&self) -> SourceId {
        self.id
    }

    async fn fetch(&self) -> SourceResult<NormalizedRecord> {
        timed(async {
            let raw = self.endpoint.get_raw(self.path, &[]).await?;
            if !self.opaque {
                classify_status(raw.status)?;
            }
            Ok(NormalizedRecord::Ping(PingInfo {
                status_code: raw.status.as_u16(),
            }))
        })
        .await
    }
}
