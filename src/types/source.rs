use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::records::{
    ActivityEvent, ChainAccountInfo, ChainNetworkInfo, CiRun, CommitWeek, PingInfo, RepoSummary,
};
use super::uptime::ServiceId;

/// One identifier per external endpoint family the engine polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceId {
    RepoActivity,
    RepoCatalog,
    CiStatus,
    CommitHistory,
    ChainAccount,
    ChainNetwork,
    RegistryPing,
    PageLatency,
    ApiLatency,
}

impl SourceId {
    pub const ALL: [SourceId; 9] = [
        SourceId::RepoActivity,
        SourceId::RepoCatalog,
        SourceId::CiStatus,
        SourceId::CommitHistory,
        SourceId::ChainAccount,
        SourceId::ChainNetwork,
        SourceId::RegistryPing,
        SourceId::PageLatency,
        SourceId::ApiLatency,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceId::RepoActivity => "repo-activity",
            SourceId::RepoCatalog => "repo-catalog",
            SourceId::CiStatus => "ci-status",
            SourceId::CommitHistory => "commit-history",
            SourceId::ChainAccount => "chain-account",
            SourceId::ChainNetwork => "chain-network",
            SourceId::RegistryPing => "registry-ping",
            SourceId::PageLatency => "page-latency",
            SourceId::ApiLatency => "api-latency",
        }
    }

    /// The uptime row fed by this source, if any.
    pub fn monitored_service(self) -> Option<ServiceId> {
        match self {
            SourceId::CiStatus => Some(ServiceId::CiCd),
            SourceId::RegistryPing => Some(ServiceId::Packages),
            SourceId::ChainNetwork => Some(ServiceId::Chain),
            SourceId::PageLatency => Some(ServiceId::Agent),
            _ => None,
        }
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", content = "status", rename_all = "snake_case")]
pub enum ErrorKind {
    #[error("request timed out")]
    Timeout,
    #[error("network unreachable")]
    NetworkUnreachable,
    #[error("HTTP {0}")]
    HttpError(u16),
    #[error("malformed response")]
    MalformedResponse,
    #[error("unknown error")]
    Unknown,
}

/// Outcome of one adapter fetch. Adapters resolve to this instead of erroring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceResult<T> {
    #[serde(rename_all = "camelCase")]
    Ok {
        data: T,
        fetched_at: DateTime<Utc>,
        latency_ms: u64,
    },
    #[serde(rename_all = "camelCase")]
    Failed {
        reason: ErrorKind,
        attempted_at: DateTime<Utc>,
    },
}

impl<T> SourceResult<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, SourceResult::Ok { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            SourceResult::Ok { data, .. } => Some(data),
            SourceResult::Failed { .. } => None,
        }
    }

    pub fn latency_ms(&self) -> Option<u64> {
        match self {
            SourceResult::Ok { latency_ms, .. } => Some(*latency_ms),
            SourceResult::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<ErrorKind> {
        match self {
            SourceResult::Ok { .. } => None,
            SourceResult::Failed { reason, .. } => Some(*reason),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            SourceResult::Ok { fetched_at, .. } => *fetched_at,
            SourceResult::Failed { attempted_at, .. } => *attempted_at,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> SourceResult<U> {
        match self {
            SourceResult::Ok {
                data,
                fetched_at,
                latency_ms,
            } => SourceResult::Ok {
                data: f(data),
                fetched_at,
                latency_ms,
            },
            SourceResult::Failed {
                reason,
                attempted_at,
            } => SourceResult::Failed {
                reason,
                attempted_at,
            },
        }
    }
}

/// Normalized payload of a source, one variant per endpoint family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum NormalizedRecord {
    RepoActivity(Vec<ActivityEvent>),
    RepoCatalog(Vec<RepoSummary>),
    CiStatus(Vec<CiRun>),
    CommitHistory(Vec<CommitWeek>),
    ChainAccount(ChainAccountInfo),
    ChainNetwork(ChainNetworkInfo),
    Ping(PingInfo),
}

impl NormalizedRecord {
    pub fn as_activity(&self) -> Option<&[ActivityEvent]> {
        match self {
            NormalizedRecord::RepoActivity(events) => Some(events),
            _ => None,
        }
    }

    pub fn as_repos(&self) -> Option<&[RepoSummary]> {
        match self {
            NormalizedRecord::RepoCatalog(repos) => Some(repos),
            _ => None,
        }
    }

    pub fn as_ci_runs(&self) -> Option<&[CiRun]> {
        match self {
            NormalizedRecord::CiStatus(runs) => Some(runs),
            _ => None,
        }
    }

    pub fn as_commit_weeks(&self) -> Option<&[CommitWeek]> {
        match self {
            NormalizedRecord::CommitHistory(weeks) => Some(weeks),
            _ => None,
        }
    }

    pub fn as_chain_account(&self) -> Option<&ChainAccountInfo> {
        match self {
            NormalizedRecord::ChainAccount(info) => Some(info),
            _ => None,
        }
    }

    pub fn as_chain_network(&self) -> Option<&ChainNetworkInfo> {
        match self {
            NormalizedRecord::ChainNetwork(info) => Some(info),
            _ => None,
        }
    }

    pub fn as_ping(&self) -> Option<&PingInfo> {
        match self {
            NormalizedRecord::Ping(info) => Some(info),
            _ => None,
        }
    }
}
