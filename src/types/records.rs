use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoSummary {
    pub name: String,
    pub url: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stars: u32,
    pub is_fork: bool,
    pub pushed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CiConclusion {
    Success,
    Failure,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CiRun {
    pub repo: String,
    pub workflow: Option<String>,
    pub conclusion: CiConclusion,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One week of commit counts, Sunday first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitWeek {
    /// Unix seconds of the week's Sunday, when the source reports it.
    pub week_start: Option<i64>,
    pub days: [u32; 7],
    pub total: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Push,
    Create,
    Delete,
    PullRequest,
    Issues,
    IssueComment,
    Watch,
    Fork,
    Release,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEvent {
    pub id: String,
    pub kind: ActivityKind,
    pub repo: String,
    pub actor: Option<String>,
    pub created_at: DateTime<Utc>,
    pub commit_count: u32,
    pub action: Option<String>,
    pub ref_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainAccountInfo {
    pub micro_algo_balance: u64,
    pub min_balance_micro_algo: u64,
    pub asset_count: u32,
    pub created_app_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainNetworkInfo {
    pub last_round: u64,
    /// Nanoseconds since the last round, as reported by the node.
    pub since_last_round_ns: u64,
    /// Nanoseconds of catchup remaining; zero when synced.
    pub catchup_ns: u64,
    pub next_version_label: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingInfo {
    pub status_code: u16,
}
