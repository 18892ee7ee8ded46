use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::config::TestStatus;
use crate::state::Freshness;
use crate::types::records::{ActivityKind, CiConclusion};
use crate::types::source::{ErrorKind, SourceId};
use crate::types::uptime::ServiceId;

/// Event names pushed to the page, keyed by the element each panel owns.
pub mod panel_names {
    pub const STATS: &str = "panel:stats";
    pub const PACKAGES: &str = "panel:package-list";
    pub const CI: &str = "panel:ci-grid";
    pub const CONTRIBUTION_GRAPH: &str = "panel:contribution-graph";
    pub const ACTIVITY_FEED: &str = "panel:activity-feed";
    pub const WALLET: &str = "panel:wallet";
    pub const NETWORK: &str = "panel:network";
    pub const UPTIME: &str = "panel:uptime";
    pub const REPOS: &str = "panel:repo-grid";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PanelId {
    Stats,
    Packages,
    Ci,
    ContributionGraph,
    ActivityFeed,
    Wallet,
    Network,
    Uptime,
    Repos,
}

impl PanelId {
    pub const ALL: [PanelId; 9] = [
        PanelId::Stats,
        PanelId::Packages,
        PanelId::Ci,
        PanelId::ContributionGraph,
        PanelId::ActivityFeed,
        PanelId::Wallet,
        PanelId::Network,
        PanelId::Uptime,
        PanelId::Repos,
    ];

    pub fn event_name(self) -> &'static str {
        match self {
            PanelId::Stats => panel_names::STATS,
            PanelId::Packages => panel_names::PACKAGES,
            PanelId::Ci => panel_names::CI,
            PanelId::ContributionGraph => panel_names::CONTRIBUTION_GRAPH,
            PanelId::ActivityFeed => panel_names::ACTIVITY_FEED,
            PanelId::Wallet => panel_names::WALLET,
            PanelId::Network => panel_names::NETWORK,
            PanelId::Uptime => panel_names::UPTIME,
            PanelId::Repos => panel_names::REPOS,
        }
    }

    /// Sources whose results this panel is derived from.
    pub fn sources(self) -> &'static [SourceId] {
        match self {
            PanelId::Stats => &[SourceId::RepoCatalog, SourceId::CiStatus, SourceId::ChainAccount],
            PanelId::Packages => &[SourceId::RegistryPing],
            PanelId::Ci => &[SourceId::CiStatus],
            PanelId::ContributionGraph => &[SourceId::CommitHistory],
            PanelId::ActivityFeed => &[SourceId::RepoActivity],
            PanelId::Wallet => &[SourceId::ChainAccount],
            PanelId::Network => &[SourceId::ChainNetwork, SourceId::ApiLatency],
            PanelId::Uptime => &[
                SourceId::CiStatus,
                SourceId::RegistryPing,
                SourceId::ChainNetwork,
                SourceId::PageLatency,
            ],
            PanelId::Repos => &[SourceId::RepoCatalog],
        }
    }

    /// Panels that must re-render once `source` resolves.
    pub fn affected_by(source: SourceId) -> Vec<PanelId> {
        PanelId::ALL
            .into_iter()
            .filter(|panel| panel.sources().contains(&source))
            .collect()
    }
}

/// Freshness and degradation shown in a panel's header badge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelStatus {
    pub freshness: Freshness,
    pub error: Option<ErrorKind>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PanelStatus {
    pub fn loading() -> Self {
        Self {
            freshness: Freshness::Loading,
            error: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatCard {
    pub label: String,
    pub value: String,
    pub detail: String,
    pub freshness: Freshness,
    /// False when the card's source is not configured; such cards show a
    /// placeholder and do not count toward the panel's freshness.
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsView {
    pub cards: Vec<StatCard>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRow {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    pub test_count: u32,
    pub tests: TestStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackagesView {
    pub status: PanelStatus,
    pub packages: Vec<PackageRow>,
    pub package_count: usize,
    pub test_count: u32,
    pub all_passing: bool,
    pub badge: String,
    pub registry: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CiBadge {
    Passing,
    Failing,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CiRow {
    pub repo: String,
    pub workflow: Option<String>,
    pub conclusion: CiConclusion,
    pub updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CiView {
    pub status: PanelStatus,
    pub badge: CiBadge,
    pub passing: usize,
    pub total: usize,
    pub runs: Vec<CiRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub count: u32,
    pub level: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionView {
    pub status: PanelStatus,
    pub cells: Vec<DayCell>,
    pub total: u32,
    pub legend: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityItem {
    pub kind: ActivityKind,
    pub repo: String,
    pub text: String,
    pub when: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityView {
    pub status: PanelStatus,
    pub items: Vec<ActivityItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletView {
    pub status: PanelStatus,
    pub balance: String,
    pub min_balance: String,
    pub assets: String,
    pub apps: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkView {
    pub status: PanelStatus,
    pub last_round: String,
    pub round_time: String,
    pub catchup: String,
    pub next_version: String,
    pub api_latency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UptimeRow {
    pub service: ServiceId,
    pub label: String,
    pub percentage: String,
    pub latency: String,
    pub history: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UptimeView {
    pub rows: Vec<UptimeRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoCard {
    pub name: String,
    pub url: String,
    pub description: String,
    pub language: Option<String>,
    pub stars: u32,
    pub is_fork: bool,
    pub pushed: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReposView {
    pub status: PanelStatus,
    pub repos: Vec<RepoCard>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "panel", content = "view", rename_all = "kebab-case")]
pub enum PanelView {
    Stats(StatsView),
    Packages(PackagesView),
    Ci(CiView),
    ContributionGraph(ContributionView),
    ActivityFeed(ActivityView),
    Wallet(WalletView),
    Network(NetworkView),
    Uptime(UptimeView),
    Repos(ReposView),
}

impl PanelView {
    /// Panel-level freshness. Stats and uptime aggregate several sources and
    /// report the least fresh of their parts. Disabled stat cards are ignored.
    pub fn freshness(&self) -> Freshness {
        match self {
            PanelView::Stats(v) => worst(v.cards.iter().filter(|c| c.enabled).map(|c| c.freshness)),
            PanelView::Packages(v) => v.status.freshness,
            PanelView::Ci(v) => v.status.freshness,
            PanelView::ContributionGraph(v) => v.status.freshness,
            PanelView::ActivityFeed(v) => v.status.freshness,
            PanelView::Wallet(v) => v.status.freshness,
            PanelView::Network(v) => v.status.freshness,
            PanelView::Uptime(v) => {
                if v.rows.iter().all(|r| r.history.is_empty()) {
                    Freshness::Loading
                } else {
                    Freshness::Fresh
                }
            }
            PanelView::Repos(v) => v.status.freshness,
        }
    }
}

fn worst(items: impl Iterator<Item = Freshness>) -> Freshness {
    let mut result = Freshness::Fresh;
    for f in items {
        match f {
            Freshness::Loading => return Freshness::Loading,
            Freshness::Stale => result = Freshness::Stale,
            Freshness::Fresh => {}
        }
    }
    result
}

/// Consumer of derived panel views. Implementations must only touch the
/// region owned by `panel`.
pub trait PanelRenderer: Send + Sync {
    fn render(&self, panel: PanelId, view: &PanelView);
}

/// Logs every render; the default when no front-end is attached.
pub struct TracingRenderer;

impl PanelRenderer for TracingRenderer {
    fn render(&self, panel: PanelId, view: &PanelView) {
        info!(panel = panel.event_name(), freshness = ?view.freshness(), "Panel rendered");
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PanelEvent {
    pub name: &'static str,
    pub payload: serde_json::Value,
}

/// Forwards panel views as JSON events to a front-end channel.
pub struct ChannelRenderer {
    tx: UnboundedSender<PanelEvent>,
}

impl ChannelRenderer {
    pub fn new(tx: UnboundedSender<PanelEvent>) -> Self {
        Self { tx }
    }
}

impl PanelRenderer for ChannelRenderer {
    fn render(&self, panel: PanelId, view: &PanelView) {
        let payload = match serde_json::to_value(view) {
            Ok(v) => v,
            Err(e) => {
                debug!(panel = panel.event_name(), error = %e, "Failed to serialize panel view");
                return;
            }
        };
        let event = PanelEvent {
            name: panel.event_name(),
            payload,
        };
        if self.tx.send(event).is_err() {
            debug!(panel = panel.event_name(), "Panel channel closed; dropping render");
        }
    }
}

/// Keeps every render in order.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingRenderer {
    renders: std::sync::Mutex<Vec<(PanelId, PanelView)>>,
}

#[cfg(test)]
impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn renders(&self) -> Vec<(PanelId, PanelView)> {
        self.renders
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn last(&self, panel: PanelId) -> Option<PanelView> {
        self.renders
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .rev()
            .find(|(p, _)| *p == panel)
            .map(|(_, v)| v.clone())
    }

    pub fn count(&self, panel: PanelId) -> usize {
        self.renders
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|(p, _)| *p == panel)
            .count()
    }
}

#[cfg(test)]
impl PanelRenderer for RecordingRenderer {
    fn render(&self, panel: PanelId, view: &PanelView) {
        self.renders
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((panel, view.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::panel_names::*;
    use super::*;

    fn wallet(freshness: Freshness) -> PanelView {
        PanelView::Wallet(WalletView {
            status: PanelStatus {
                freshness,
                error: None,
                updated_at: None,
            },
            balance: "1.000000 ALGO".to_string(),
            min_balance: "0.100000 ALGO".to_string(),
            assets: "0".to_string(),
            apps: "0".to_string(),
        })
    }

    #[test]
    fn panel_names_match_page_elements() {
        assert_eq!(PACKAGES, "panel:package-list");
        assert_eq!(CI, "panel:ci-grid");
        assert_eq!(CONTRIBUTION_GRAPH, "panel:contribution-graph");
        assert_eq!(REPOS, "panel:repo-grid");
    }

    #[test]
    fn every_panel_has_a_distinct_event_name() {
        let mut names: Vec<&str> = PanelId::ALL.iter().map(|p| p.event_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), PanelId::ALL.len());
    }

    #[test]
    fn every_source_feeds_some_panel() {
        for source in SourceId::ALL {
            if source == SourceId::PageLatency {
                assert_eq!(PanelId::affected_by(source), vec![PanelId::Uptime]);
                continue;
            }
            assert!(
                !PanelId::affected_by(source).is_empty(),
                "{} feeds no panel",
                source
            );
        }
    }

    #[test]
    fn catalog_refresh_touches_stats_and_repos_only() {
        assert_eq!(
            PanelId::affected_by(SourceId::RepoCatalog),
            vec![PanelId::Stats, PanelId::Repos]
        );
    }

    #[test]
    fn stats_freshness_is_least_fresh_card() {
        let card = |freshness| StatCard {
            label: "x".to_string(),
            value: "1".to_string(),
            detail: String::new(),
            freshness,
            enabled: true,
        };
        let view = PanelView::Stats(StatsView {
            cards: vec![card(Freshness::Fresh), card(Freshness::Stale)],
        });
        assert_eq!(view.freshness(), Freshness::Stale);
    }

    #[test]
    fn disabled_stat_cards_do_not_hold_panel_in_loading() {
        let card = |freshness, enabled| StatCard {
            label: "x".to_string(),
            value: "1".to_string(),
            detail: String::new(),
            freshness,
            enabled,
        };
        let view = PanelView::Stats(StatsView {
            cards: vec![card(Freshness::Fresh, true), card(Freshness::Loading, false)],
        });
        assert_eq!(view.freshness(), Freshness::Fresh);
    }

    #[test]
    fn channel_renderer_emits_json_payload() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let renderer = ChannelRenderer::new(tx);
        renderer.render(PanelId::Wallet, &wallet(Freshness::Fresh));

        let event = rx.try_recv().unwrap();
        assert_eq!(event.name, WALLET);
        assert_eq!(event.payload["panel"], "wallet");
        assert_eq!(event.payload["view"]["balance"], "1.000000 ALGO");
        assert_eq!(event.payload["view"]["status"]["freshness"], "fresh");
    }

    #[test]
    fn channel_renderer_tolerates_closed_channel() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);
        ChannelRenderer::new(tx).render(PanelId::Wallet, &wallet(Freshness::Loading));
    }

    #[test]
    fn recording_renderer_returns_latest_per_panel() {
        let renderer = RecordingRenderer::new();
        renderer.render(PanelId::Wallet, &wallet(Freshness::Loading));
        renderer.render(PanelId::Wallet, &wallet(Freshness::Fresh));
        assert_eq!(renderer.count(PanelId::Wallet), 2);
        assert_eq!(
            renderer.last(PanelId::Wallet).unwrap().freshness(),
            Freshness::Fresh
        );
        assert!(renderer.last(PanelId::Stats).is_none());
    }
}
