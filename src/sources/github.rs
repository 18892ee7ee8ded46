use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Days, Utc};
use futures::future::join_all;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use super::http::{classify_status, timed, Endpoint};
use super::SourceAdapter;
use crate::types::records::{
    ActivityEvent, ActivityKind, CiConclusion, CiRun, CommitWeek, RepoSummary,
};
use crate::types::source::{ErrorKind, NormalizedRecord, SourceId, SourceResult};

// Vendor shapes. Only the fields the dashboard reads are declared.

#[derive(Debug, Deserialize)]
pub struct RawEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub repo: RawEventRepo,
    pub actor: Option<RawActor>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub payload: RawPayload,
}

#[derive(Debug, Deserialize)]
pub struct RawEventRepo {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RawActor {
    pub login: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawPayload {
    pub size: Option<u32>,
    #[serde(default)]
    pub commits: Vec<serde_json::Value>,
    pub action: Option<String>,
    #[serde(rename = "ref")]
    pub ref_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawRepo {
    pub name: String,
    pub html_url: String,
    pub description: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: u32,
    #[serde(default)]
    pub fork: bool,
    pub pushed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct RawRuns {
    #[serde(default)]
    pub workflow_runs: Vec<RawRun>,
}

#[derive(Debug, Deserialize)]
pub struct RawRun {
    pub name: Option<String>,
    pub status: Option<String>,
    pub conclusion: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct RawWeek {
    pub week: Option<i64>,
    pub days: [u32; 7],
    #[serde(default)]
    pub total: Option<u32>,
}

fn activity_kind(raw: &str) -> ActivityKind {
    match raw {
        "PushEvent" => ActivityKind::Push,
        "CreateEvent" => ActivityKind::Create,
        "DeleteEvent" => ActivityKind::Delete,
        "PullRequestEvent" => ActivityKind::PullRequest,
        "IssuesEvent" => ActivityKind::Issues,
        "IssueCommentEvent" => ActivityKind::IssueComment,
        "WatchEvent" => ActivityKind::Watch,
        "ForkEvent" => ActivityKind::Fork,
        "ReleaseEvent" => ActivityKind::Release,
        _ => ActivityKind::Other,
    }
}

pub fn normalize_events(raw: Vec<RawEvent>) -> Vec<ActivityEvent> {
    raw.into_iter()
        .map(|e| {
            let commit_count = e
                .payload
                .size
                .unwrap_or(e.payload.commits.len() as u32);
            ActivityEvent {
                id: e.id,
                kind: activity_kind(&e.kind),
                repo: e.repo.name,
                actor: e.actor.map(|a| a.login),
                created_at: e.created_at,
                commit_count,
                action: e.payload.action,
                ref_name: e.payload.ref_name,
            }
        })
        .collect()
}

pub fn normalize_repos(raw: Vec<RawRepo>) -> Vec<RepoSummary> {
    raw.into_iter()
        .map(|r| RepoSummary {
            name: r.name,
            url: r.html_url,
            description: r.description.filter(|d| !d.trim().is_empty()),
            language: r.language,
            stars: r.stargazers_count,
            is_fork: r.fork,
            pushed_at: r.pushed_at,
        })
        .collect()
}

/// Map a workflow run's status/conclusion pair onto the three-state badge.
pub fn conclusion_of(status: Option<&str>, conclusion: Option<&str>) -> CiConclusion {
    if status.is_some_and(|s| s != "completed") {
        return CiConclusion::Unknown;
    }
    match conclusion {
        Some("success") => CiConclusion::Success,
        Some("failure") | Some("timed_out") | Some("startup_failure") => CiConclusion::Failure,
        _ => CiConclusion::Unknown,
    }
}

/// Latest run of a repo's workflow list; an empty list is `Unknown`.
pub fn normalize_runs(repo: &str, raw: RawRuns) -> CiRun {
    match raw.workflow_runs.into_iter().next() {
        Some(run) => CiRun {
            repo: repo.to_string(),
            workflow: run.name,
            conclusion: conclusion_of(run.status.as_deref(), run.conclusion.as_deref()),
            updated_at: run.updated_at,
        },
        None => CiRun {
            repo: repo.to_string(),
            workflow: None,
            conclusion: CiConclusion::Unknown,
            updated_at: None,
        },
    }
}

fn saturating_total(days: &[u32; 7]) -> u32 {
    days.iter().fold(0u32, |acc, n| acc.saturating_add(*n))
}

/// A week start must leave all seven of its days on the calendar.
fn week_in_range(start: i64) -> bool {
    DateTime::from_timestamp(start, 0)
        .and_then(|dt| dt.date_naive().checked_add_days(Days::new(6)))
        .is_some()
}

pub fn normalize_weeks(raw: Vec<RawWeek>) -> Result<Vec<CommitWeek>, ErrorKind> {
    raw.into_iter()
        .map(|w| {
            if let Some(start) = w.week.filter(|s| !week_in_range(*s)) {
                debug!(week = start, "Commit week start out of range");
                return Err(ErrorKind::MalformedResponse);
            }
            Ok(CommitWeek {
                week_start: w.week,
                days: w.days,
                total: w.total.unwrap_or_else(|| saturating_total(&w.days)),
            })
        })
        .collect()
}

/// Sum per-repo weekly series into one. Weeks with a start timestamp merge by
/// that timestamp; undated weeks merge by their distance from the newest week.
pub fn merge_weeks(series: Vec<Vec<CommitWeek>>) -> Vec<CommitWeek> {
    let mut dated: BTreeMap<i64, CommitWeek> = BTreeMap::new();
    let mut undated: Vec<CommitWeek> = Vec::new();

    for weeks in series {
        let len = weeks.len();
        for (idx, week) in weeks.into_iter().enumerate() {
            match week.week_start {
                Some(start) => {
                    let slot = dated.entry(start).or_insert_with(|| CommitWeek {
                        week_start: Some(start),
                        days: [0; 7],
                        total: 0,
                    });
                    add_week(slot, &week);
                }
                None => {
                    let from_end = len - 1 - idx;
                    while undated.len() <= from_end {
                        undated.push(CommitWeek {
                            week_start: None,
                            days: [0; 7],
                            total: 0,
                        });
                    }
                    add_week(&mut undated[from_end], &week);
                }
            }
        }
    }

    if dated.is_empty() {
        undated.reverse();
        undated
    } else {
        // Undated weeks cannot be placed next to dated ones; drop them.
        if !undated.is_empty() {
            debug!(count = undated.len(), "Dropping undated commit weeks");
        }
        dated.into_values().collect()
    }
}

fn add_week(into: &mut CommitWeek, week: &CommitWeek) {
    for (slot, count) in into.days.iter_mut().zip(week.days.iter()) {
        *slot = slot.saturating_add(*count);
    }
    into.total = into.total.saturating_add(week.total);
}

pub struct RepoActivityAdapter {
    endpoint: Endpoint,
    org: String,
}

impl RepoActivityAdapter {
    pub fn new(endpoint: Endpoint, org: &str) -> Self {
        Self {
            endpoint,
            org: org.to_string(),
        }
    }
}

#[async_trait]
impl SourceAdapter for RepoActivityAdapter {
    fn id(&self) -> SourceId {
        SourceId::RepoActivity
    }

    async fn fetch(&self) -> SourceResult<NormalizedRecord> {
        let path = format!("/users/{}/events", self.org);
        timed(async {
            let raw: Vec<RawEvent> = self.endpoint.get_json(&path, &[("per_page", "30")]).await?;
            Ok(NormalizedRecord::RepoActivity(normalize_events(raw)))
        })
        .await
    }
}

pub struct RepoCatalogAdapter {
    endpoint: Endpoint,
    org: String,
}

impl RepoCatalogAdapter {
    pub fn new(endpoint: Endpoint, org: &str) -> Self {
        Self {
            endpoint,
            org: org.to_string(),
        }
    }
}

#[async_trait]
impl SourceAdapter for RepoCatalogAdapter {
    fn id(&self) -> SourceId {
        SourceId::RepoCatalog
    }

    async fn fetch(&self) -> SourceResult<NormalizedRecord> {
        let path = format!("/users/{}/repos", self.org);
        timed(async {
            let raw: Vec<RawRepo> = self
                .endpoint
                .get_json(&path, &[("per_page", "100"), ("sort", "pushed")])
                .await?;
            Ok(NormalizedRecord::RepoCatalog(normalize_repos(raw)))
        })
        .await
    }
}

/// Keep per-repo successes; fail only if every repo failed.
fn settle_per_repo<T>(
    results: Vec<(String, Result<T, ErrorKind>)>,
    on_error: impl Fn(&str) -> Option<T>,
) -> Result<Vec<T>, ErrorKind> {
    let mut first_error = None;
    let mut settled = Vec::with_capacity(results.len());
    let total = results.len();
    let mut failed = 0;

    for (repo, result) in results {
        match result {
            Ok(value) => settled.push(value),
            Err(kind) => {
                warn!(repo = %repo, error = %kind, "Per-repo request failed");
                failed += 1;
                first_error.get_or_insert(kind);
                if let Some(fallback) = on_error(&repo) {
                    settled.push(fallback);
                }
            }
        }
    }

    match first_error {
        Some(kind) if failed == total => Err(kind),
        _ => Ok(settled),
    }
}

pub struct CiStatusAdapter {
    endpoint: Endpoint,
    org: String,
    repos: Vec<String>,
}

impl CiStatusAdapter {
    pub fn new(endpoint: Endpoint, org: &str, repos: Vec<String>) -> Self {
        Self {
            endpoint,
            org: org.to_string(),
            repos,
        }
    }

    async fn latest_run(&self, repo: &str) -> Result<CiRun, ErrorKind> {
        let path = format!("/repos/{}/{}/actions/runs", self.org, repo);
        let raw: RawRuns = self.endpoint.get_json(&path, &[("per_page", "1")]).await?;
        Ok(normalize_runs(repo, raw))
    }
}

#[async_trait]
impl SourceAdapter for CiStatusAdapter {
    fn id(&self) -> SourceId {
        SourceId::CiStatus
    }

    async fn fetch(&self) -> SourceResult<NormalizedRecord> {
        timed(async {
            let results = join_all(self.repos.iter().map(|repo| async move {
                (repo.clone(), self.latest_run(repo).await)
            }))
            .await;
            let runs = settle_per_repo(results, |repo| {
                Some(CiRun {
                    repo: repo.to_string(),
                    workflow: None,
                    conclusion: CiConclusion::Unknown,
                    updated_at: None,
                })
            })?;
            Ok(NormalizedRecord::CiStatus(runs))
        })
        .await
    }
}

pub struct CommitHistoryAdapter {
    endpoint: Endpoint,
    org: String,
    repos: Vec<String>,
}

impl CommitHistoryAdapter {
    pub fn new(endpoint: Endpoint, org: &str, repos: Vec<String>) -> Self {
        Self {
            endpoint,
            org: org.to_string(),
            repos,
        }
    }

    async fn weeks(&self, repo: &str) -> Result<Vec<CommitWeek>, ErrorKind> {
        let path = format!("/repos/{}/{}/stats/commit_activity", self.org, repo);
        let raw = self.endpoint.get_raw(&path, &[]).await?;
        // 202 means the statistics are still being computed upstream.
        if raw.status == StatusCode::ACCEPTED || raw.status == StatusCode::NO_CONTENT {
            debug!(repo, "Commit activity not ready yet");
            return Ok(Vec::new());
        }
        classify_status(raw.status)?;
        let weeks: Vec<RawWeek> = raw.json()?;
        normalize_weeks(weeks)
    }
}

#[async_trait]
impl SourceAdapter for CommitHistoryAdapter {
    fn id(&self) -> SourceId {
        SourceId::CommitHistory
    }

    async fn fetch(&self) -> SourceResult<NormalizedRecord> {
        timed(async {
            let results = join_all(
                self.repos
                    .iter()
                    .map(|repo| async move { (repo.clone(), self.weeks(repo).await) }),
            )
            .await;
            let series = settle_per_repo(results, |_| None)?;
            Ok(NormalizedRecord::CommitHistory(merge_weeks(series)))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::http::build_client;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn endpoint(server: &MockServer) -> Endpoint {
        Endpoint::github(
            build_client().unwrap(),
            &server.uri(),
            Duration::from_secs(2),
            None,
        )
    }

    fn repo_json(name: &str, fork: bool) -> serde_json::Value {
        serde_json::json!({
            "name": name,
            "html_url": format!("https://github.com/acme/{}", name),
            "description": "",
            "language": "Rust",
            "stargazers_count": 3,
            "fork": fork,
            "pushed_at": "2026-10-01T12:00:00Z"
        })
    }

    #[test]
    fn conclusion_mapping() {
        assert_eq!(conclusion_of(Some("completed"), Some("success")), CiConclusion::Success);
        assert_eq!(conclusion_of(Some("completed"), Some("timed_out")), CiConclusion::Failure);
        assert_eq!(conclusion_of(Some("completed"), Some("cancelled")), CiConclusion::Unknown);
        assert_eq!(conclusion_of(Some("in_progress"), None), CiConclusion::Unknown);
        assert_eq!(conclusion_of(None, Some("failure")), CiConclusion::Failure);
    }

    #[test]
    fn empty_run_list_is_unknown() {
        let run = normalize_runs("api", RawRuns { workflow_runs: vec![] });
        assert_eq!(run.conclusion, CiConclusion::Unknown);
        assert_eq!(run.repo, "api");
    }

    #[test]
    fn weeks_without_total_are_summed() {
        let weeks = normalize_weeks(vec![RawWeek {
            week: None,
            days: [2, 3, 1, 0, 4, 2, 1],
            total: None,
        }])
        .unwrap();
        assert_eq!(weeks[0].total, 13);
    }

    #[test]
    fn huge_day_counts_saturate_instead_of_overflowing() {
        let weeks = normalize_weeks(vec![RawWeek {
            week: None,
            days: [u32::MAX, 1, 0, 0, 0, 0, 0],
            total: None,
        }])
        .unwrap();
        assert_eq!(weeks[0].total, u32::MAX);

        let a = vec![CommitWeek { week_start: Some(100), days: [u32::MAX; 7], total: u32::MAX }];
        let b = vec![CommitWeek { week_start: Some(100), days: [1; 7], total: 7 }];
        let merged = merge_weeks(vec![a, b]);
        assert_eq!(merged[0].days, [u32::MAX; 7]);
        assert_eq!(merged[0].total, u32::MAX);
    }

    #[test]
    fn week_start_beyond_calendar_is_malformed() {
        let result = normalize_weeks(vec![RawWeek {
            week: Some(i64::MAX),
            days: [1; 7],
            total: None,
        }]);
        assert_eq!(result.unwrap_err(), ErrorKind::MalformedResponse);
    }

    #[test]
    fn merge_weeks_sums_dated_weeks_by_start() {
        let a = vec![CommitWeek { week_start: Some(100), days: [1, 0, 0, 0, 0, 0, 0], total: 1 }];
        let b = vec![
            CommitWeek { week_start: Some(100), days: [0, 2, 0, 0, 0, 0, 0], total: 2 },
            CommitWeek { week_start: Some(200), days: [0, 0, 3, 0, 0, 0, 0], total: 3 },
        ];
        let merged = merge_weeks(vec![a, b]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].days, [1, 2, 0, 0, 0, 0, 0]);
        assert_eq!(merged[0].total, 3);
        assert_eq!(merged[1].week_start, Some(200));
    }

    #[test]
    fn merge_weeks_aligns_undated_weeks_from_newest() {
        let a = vec![
            CommitWeek { week_start: None, days: [1; 7], total: 7 },
            CommitWeek { week_start: None, days: [2; 7], total: 14 },
        ];
        let b = vec![CommitWeek { week_start: None, days: [1; 7], total: 7 }];
        let merged = merge_weeks(vec![a, b]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].total, 7);
        assert_eq!(merged[1].days, [3; 7]);
    }

    #[tokio::test]
    async fn repo_catalog_normalizes_forks_and_blank_descriptions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/acme/repos"))
            .and(query_param("sort", "pushed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                repo_json("api", false),
                repo_json("web", false),
                repo_json("cli", false),
                repo_json("upstream", true),
            ])))
            .mount(&server)
            .await;

        let adapter = RepoCatalogAdapter::new(endpoint(&server), "acme");
        let result = adapter.fetch().await;
        let repos = result.data().and_then(|r| r.as_repos()).unwrap();
        assert_eq!(repos.len(), 4);
        assert_eq!(repos.iter().filter(|r| r.is_fork).count(), 1);
        assert!(repos[0].description.is_none());
    }

    #[tokio::test]
    async fn repo_activity_counts_push_commits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/acme/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "id": "1",
                    "type": "PushEvent",
                    "repo": {"name": "acme/api"},
                    "actor": {"login": "dev"},
                    "created_at": "2026-10-16T10:00:00Z",
                    "payload": {"commits": [{}, {}, {}], "ref": "refs/heads/main"}
                },
                {
                    "id": "2",
                    "type": "GollumEvent",
                    "repo": {"name": "acme/wiki"},
                    "created_at": "2026-10-16T09:00:00Z"
                }
            ])))
            .mount(&server)
            .await;

        let adapter = RepoActivityAdapter::new(endpoint(&server), "acme");
        let result = adapter.fetch().await;
        let events = result.data().and_then(|r| r.as_activity()).unwrap();
        assert_eq!(events[0].kind, ActivityKind::Push);
        assert_eq!(events[0].commit_count, 3);
        assert_eq!(events[1].kind, ActivityKind::Other);
    }

    #[tokio::test]
    async fn ci_status_marks_failing_repo_unknown_but_keeps_others() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/api/actions/runs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "total_count": 1,
                "workflow_runs": [{
                    "name": "ci",
                    "status": "completed",
                    "conclusion": "success",
                    "updated_at": "2026-10-16T10:00:00Z"
                }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/web/actions/runs"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let adapter = CiStatusAdapter::new(
            endpoint(&server),
            "acme",
            vec!["api".to_string(), "web".to_string()],
        );
        let result = adapter.fetch().await;
        let runs = result.data().and_then(|r| r.as_ci_runs()).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].conclusion, CiConclusion::Success);
        assert_eq!(runs[1].conclusion, CiConclusion::Unknown);
    }

    #[tokio::test]
    async fn ci_status_fails_when_every_repo_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let adapter = CiStatusAdapter::new(endpoint(&server), "acme", vec!["api".to_string()]);
        let result = adapter.fetch().await;
        assert_eq!(result.error(), Some(ErrorKind::HttpError(403)));
    }

    #[tokio::test]
    async fn commit_history_treats_accepted_as_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/api/stats/commit_activity"))
            .respond_with(ResponseTemplate::new(202).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/web/stats/commit_activity"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"days": [2, 3, 1, 0, 4, 2, 1], "total": 13}
            ])))
            .mount(&server)
            .await;

        let adapter = CommitHistoryAdapter::new(
            endpoint(&server),
            "acme",
            vec!["api".to_string(), "web".to_string()],
        );
        let result = adapter.fetch().await;
        let weeks = result.data().and_then(|r| r.as_commit_weeks()).unwrap();
        assert_eq!(weeks.len(), 1);
        assert_eq!(weeks[0].total, 13);
    }

    #[tokio::test]
    async fn commit_history_rejects_out_of_range_week() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/api/stats/commit_activity"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"week": i64::MAX, "days": [1, 0, 0, 0, 0, 0, 0], "total": 1}
            ])))
            .mount(&server)
            .await;

        let adapter = CommitHistoryAdapter::new(endpoint(&server), "acme", vec!["api".to_string()]);
        let result = adapter.fetch().await;
        assert_eq!(result.error(), Some(ErrorKind::MalformedResponse));
    }

    #[tokio::test]
    async fn schema_mismatch_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"message": "nope"})))
            .mount(&server)
            .await;

        let adapter = RepoCatalogAdapter::new(endpoint(&server), "acme");
        let result = adapter.fetch().await;
        assert_eq!(result.error(), Some(ErrorKind::MalformedResponse));
    }
}
