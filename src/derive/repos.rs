use chrono::{DateTime, Utc};

use super::format::{relative_or_placeholder, relative_time};
use crate::panels::{ActivityItem, CiBadge, CiRow, RepoCard};
use crate::types::records::{ActivityEvent, ActivityKind, CiConclusion, CiRun, RepoSummary};

/// Events shown on the activity feed.
pub const FEED_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepoStats {
    pub total: usize,
    pub owned: usize,
}

pub fn repo_stats(repos: &[RepoSummary]) -> RepoStats {
    RepoStats {
        total: repos.len(),
        owned: repos.iter().filter(|r| !r.is_fork).count(),
    }
}

/// Repository cards, most recently pushed first.
pub fn repo_cards(repos: &[RepoSummary], now: DateTime<Utc>) -> Vec<RepoCard> {
    let mut sorted: Vec<&RepoSummary> = repos.iter().collect();
    sorted.sort_by(|a, b| b.pushed_at.cmp(&a.pushed_at).then_with(|| a.name.cmp(&b.name)));
    sorted
        .into_iter()
        .map(|r| RepoCard {
            name: r.name.clone(),
            url: r.url.clone(),
            description: r
                .description
                .clone()
                .unwrap_or_else(|| "No description".to_string()),
            language: r.language.clone(),
            stars: r.stars,
            is_fork: r.is_fork,
            pushed: relative_or_placeholder(r.pushed_at, now),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CiSummary {
    pub passing: usize,
    pub total: usize,
    pub badge: CiBadge,
}

pub fn ci_summary(runs: &[CiRun]) -> CiSummary {
    let passing = runs
        .iter()
        .filter(|r| r.conclusion == CiConclusion::Success)
        .count();
    let badge = if runs.is_empty() {
        CiBadge::Unknown
    } else if runs.iter().any(|r| r.conclusion == CiConclusion::Failure) {
        CiBadge::Failing
    } else if passing == runs.len() {
        CiBadge::Passing
    } else {
        CiBadge::Unknown
    };
    CiSummary {
        passing,
        total: runs.len(),
        badge,
    }
}

pub fn ci_rows(runs: &[CiRun], now: DateTime<Utc>) -> Vec<CiRow> {
    runs.iter()
        .map(|r| CiRow {
            repo: r.repo.clone(),
            workflow: r.workflow.clone(),
            conclusion: r.conclusion,
            updated: relative_or_placeholder(r.updated_at, now),
        })
        .collect()
}

fn capitalized(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn branch(ref_name: Option<&str>) -> Option<&str> {
    ref_name.map(|r| r.strip_prefix("refs/heads/").unwrap_or(r))
}

pub fn describe_event(event: &ActivityEvent) -> String {
    let action = event.action.as_deref().map(capitalized);
    match event.kind {
        ActivityKind::Push => {
            let noun = if event.commit_count == 1 { "commit" } else { "commits" };
            match branch(event.ref_name.as_deref()) {
                Some(b) => format!("Pushed {} {} to {}", event.commit_count, noun, b),
                None => format!("Pushed {} {}", event.commit_count, noun),
            }
        }
        ActivityKind::Create => match event.ref_name.as_deref() {
            Some(r) => format!("Created {}", r),
            None => "Created repository".to_string(),
        },
        ActivityKind::Delete => format!("Deleted {}", event.ref_name.as_deref().unwrap_or("ref")),
        ActivityKind::PullRequest => {
            format!("{} pull request", action.unwrap_or_else(|| "Updated".to_string()))
        }
        ActivityKind::Issues => format!("{} issue", action.unwrap_or_else(|| "Updated".to_string())),
        ActivityKind::IssueComment => "Commented on issue".to_string(),
        ActivityKind::Watch => "Starred".to_string(),
        ActivityKind::Fork => "Forked".to_string(),
        ActivityKind::Release => {
            format!("{} release", action.unwrap_or_else(|| "Published".to_string()))
        }
        ActivityKind::Other => "Activity".to_string(),
    }
}

pub fn activity_items(events: &[ActivityEvent], now: DateTime<Utc>) -> Vec<ActivityItem> {
    events
        .iter()
        .take(FEED_LIMIT)
        .map(|e| ActivityItem {
            kind: e.kind,
            repo: e.repo.clone(),
            text: describe_event(e),
            when: relative_time(e.created_at, now),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap()
    }

    fn repo(name: &str, fork: bool, days_ago: i64) -> RepoSummary {
        RepoSummary {
            name: name.to_string(),
            url: format!("https://github.com/acme/{}", name),
            description: None,
            language: Some("Rust".to_string()),
            stars: 1,
            is_fork: fork,
            pushed_at: Some(now() - Duration::days(days_ago)),
        }
    }

    fn run(repo: &str, conclusion: CiConclusion) -> CiRun {
        CiRun {
            repo: repo.to_string(),
            workflow: Some("ci".to_string()),
            conclusion,
            updated_at: None,
        }
    }

    fn event(kind: ActivityKind) -> ActivityEvent {
        ActivityEvent {
            id: "1".to_string(),
            kind,
            repo: "acme/api".to_string(),
            actor: None,
            created_at: now() - Duration::hours(2),
            commit_count: 0,
            action: None,
            ref_name: None,
        }
    }

    #[test]
    fn four_repos_one_fork() {
        let repos = vec![
            repo("a", false, 1),
            repo("b", false, 2),
            repo("c", true, 3),
            repo("d", false, 4),
        ];
        assert_eq!(repo_stats(&repos), RepoStats { total: 4, owned: 3 });
    }

    #[test]
    fn cards_sorted_by_latest_push() {
        let repos = vec![repo("old", false, 10), repo("new", false, 1)];
        let cards = repo_cards(&repos, now());
        assert_eq!(cards[0].name, "new");
        assert_eq!(cards[0].pushed, "1d ago");
        assert_eq!(cards[1].description, "No description");
    }

    #[test]
    fn ci_all_success_is_passing() {
        let summary = ci_summary(&[run("a", CiConclusion::Success), run("b", CiConclusion::Success)]);
        assert_eq!(summary.passing, 2);
        assert_eq!(summary.badge, CiBadge::Passing);
    }

    #[test]
    fn ci_any_failure_is_failing() {
        let summary = ci_summary(&[run("a", CiConclusion::Success), run("b", CiConclusion::Failure)]);
        assert_eq!(summary.passing, 1);
        assert_eq!(summary.badge, CiBadge::Failing);
    }

    #[test]
    fn ci_unknown_or_empty_is_unknown() {
        assert_eq!(ci_summary(&[]).badge, CiBadge::Unknown);
        let summary = ci_summary(&[run("a", CiConclusion::Success), run("b", CiConclusion::Unknown)]);
        assert_eq!(summary.badge, CiBadge::Unknown);
    }

    #[test]
    fn push_event_mentions_branch_and_count() {
        let mut push = event(ActivityKind::Push);
        push.commit_count = 1;
        push.ref_name = Some("refs/heads/main".to_string());
        assert_eq!(describe_event(&push), "Pushed 1 commit to main");
    }

    #[test]
    fn pull_request_uses_action() {
        let mut pr = event(ActivityKind::PullRequest);
        pr.action = Some("opened".to_string());
        assert_eq!(describe_event(&pr), "Opened pull request");
    }

    #[test]
    fn feed_is_capped_and_timestamped() {
        let events: Vec<ActivityEvent> = (0..15).map(|_| event(ActivityKind::Watch)).collect();
        let items = activity_items(&events, now());
        assert_eq!(items.len(), FEED_LIMIT);
        assert_eq!(items[0].when, "2h ago");
        assert_eq!(items[0].text, "Starred");
    }
}
