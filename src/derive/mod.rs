//! Pure derivation from the latest source results to panel views.
//!
//! Every function here is deterministic given its inputs; the current time is
//! always passed in, never read.

pub mod chain;
pub mod contributions;
pub mod format;
pub mod packages;
pub mod repos;
pub mod uptime;

use chrono::{DateTime, Utc};

use crate::config::PackageEntry;
use crate::history::UptimeHistoryStore;
use crate::panels::{
    ActivityView, CiView, ContributionView, NetworkView, PackagesView, PanelId, PanelStatus,
    PanelView, ReposView, StatCard, StatsView, UptimeView, WalletView,
};
use crate::state::{Freshness, SourceBook};
use crate::types::source::SourceId;
use crate::types::uptime::ServiceId;
use format::PLACEHOLDER;

/// Everything derivation reads.
pub struct DeriveContext<'a> {
    pub book: &'a SourceBook,
    pub history: &'a UptimeHistoryStore,
    pub packages: &'a [PackageEntry],
    /// Sources with a configured adapter.
    pub active: &'a [SourceId],
    pub now: DateTime<Utc>,
}

impl DeriveContext<'_> {
    fn is_active(&self, id: SourceId) -> bool {
        self.active.contains(&id)
    }
}

fn status_of(book: &SourceBook, id: SourceId) -> PanelStatus {
    PanelStatus {
        freshness: book.freshness(id),
        error: book.error(id),
        updated_at: book.good(id).map(|g| g.fetched_at),
    }
}

pub fn derive_panel(panel: PanelId, ctx: &DeriveContext<'_>) -> PanelView {
    match panel {
        PanelId::Stats => PanelView::Stats(stats_view(ctx)),
        PanelId::Packages => PanelView::Packages(packages_view(ctx)),
        PanelId::Ci => PanelView::Ci(ci_view(ctx)),
        PanelId::ContributionGraph => PanelView::ContributionGraph(contribution_view(ctx)),
        PanelId::ActivityFeed => PanelView::ActivityFeed(activity_view(ctx)),
        PanelId::Wallet => PanelView::Wallet(wallet_view(ctx)),
        PanelId::Network => PanelView::Network(network_view(ctx)),
        PanelId::Uptime => PanelView::Uptime(uptime_view(ctx)),
        PanelId::Repos => PanelView::Repos(repos_view(ctx)),
    }
}

pub fn derive_all(ctx: &DeriveContext<'_>) -> Vec<(PanelId, PanelView)> {
    PanelId::ALL
        .into_iter()
        .map(|panel| (panel, derive_panel(panel, ctx)))
        .collect()
}

fn stats_view(ctx: &DeriveContext<'_>) -> StatsView {
    let book = ctx.book;

    let repos = book
        .record(SourceId::RepoCatalog)
        .and_then(|r| r.as_repos())
        .map(repos::repo_stats);
    let repo_card = StatCard {
        label: "Repositories".to_string(),
        value: repos.map_or_else(|| PLACEHOLDER.to_string(), |s| s.total.to_string()),
        detail: repos.map_or_else(String::new, |s| format!("{} owned", s.owned)),
        freshness: book.freshness(SourceId::RepoCatalog),
        enabled: ctx.is_active(SourceId::RepoCatalog),
    };

    let pkgs = packages::package_summary(ctx.packages);
    let package_card = StatCard {
        label: "Packages".to_string(),
        value: pkgs.package_count.to_string(),
        detail: format!("{} tests, {}", pkgs.test_count, packages::badge(&pkgs)),
        freshness: Freshness::Fresh,
        enabled: true,
    };

    let ci = book
        .record(SourceId::CiStatus)
        .and_then(|r| r.as_ci_runs())
        .map(repos::ci_summary);
    let ci_card = StatCard {
        label: "CI".to_string(),
        value: ci.map_or_else(
            || PLACEHOLDER.to_string(),
            |s| format!("{}/{}", s.passing, s.total),
        ),
        detail: "passing".to_string(),
        freshness: book.freshness(SourceId::CiStatus),
        enabled: ctx.is_active(SourceId::CiStatus),
    };

    let balance = book
        .record(SourceId::ChainAccount)
        .and_then(|r| r.as_chain_account())
        .map(|a| format::algo_stat(a.micro_algo_balance));
    let balance_card = StatCard {
        label: "Balance".to_string(),
        value: balance.unwrap_or_else(|| PLACEHOLDER.to_string()),
        detail: "ALGO".to_string(),
        freshness: book.freshness(SourceId::ChainAccount),
        enabled: ctx.is_active(SourceId::ChainAccount),
    };

    StatsView {
        cards: vec![repo_card, package_card, ci_card, balance_card],
    }
}

fn packages_view(ctx: &DeriveContext<'_>) -> PackagesView {
    let summary = packages::package_summary(ctx.packages);
    let status = status_of(ctx.book, SourceId::RegistryPing);
    let registry = match (status.freshness, ctx.book.good(SourceId::RegistryPing)) {
        (Freshness::Fresh, Some(good)) => format!("online, {}ms", good.latency_ms),
        _ => match status.error {
            Some(err) => format!("degraded ({})", err),
            None => PLACEHOLDER.to_string(),
        },
    };
    PackagesView {
        status,
        packages: packages::package_rows(ctx.packages),
        package_count: summary.package_count,
        test_count: summary.test_count,
        all_passing: summary.all_passing,
        badge: packages::badge(&summary),
        registry,
    }
}

fn ci_view(ctx: &DeriveContext<'_>) -> CiView {
    let runs = ctx
        .book
        .record(SourceId::CiStatus)
        .and_then(|r| r.as_ci_runs())
        .unwrap_or(&[]);
    let summary = repos::ci_summary(runs);
    CiView {
        status: status_of(ctx.book, SourceId::CiStatus),
        badge: summary.badge,
        passing: summary.passing,
        total: summary.total,
        runs: repos::ci_rows(runs, ctx.now),
    }
}

fn contribution_view(ctx: &DeriveContext<'_>) -> ContributionView {
    let weeks = ctx
        .book
        .record(SourceId::CommitHistory)
        .and_then(|r| r.as_commit_weeks())
        .unwrap_or(&[]);
    let cells = contributions::contribution_cells(weeks, ctx.now.date_naive());
    ContributionView {
        status: status_of(ctx.book, SourceId::CommitHistory),
        total: cells.iter().fold(0u32, |acc, c| acc.saturating_add(c.count)),
        cells,
        legend: contributions::LEGEND.iter().map(|s| s.to_string()).collect(),
    }
}

fn activity_view(ctx: &DeriveContext<'_>) -> ActivityView {
    let events = ctx
        .book
        .record(SourceId::RepoActivity)
        .and_then(|r| r.as_activity())
        .unwrap_or(&[]);
    ActivityView {
        status: status_of(ctx.book, SourceId::RepoActivity),
        items: repos::activity_items(events, ctx.now),
    }
}

fn wallet_view(ctx: &DeriveContext<'_>) -> WalletView {
    let figures = chain::wallet_figures(
        ctx.book
            .record(SourceId::ChainAccount)
            .and_then(|r| r.as_chain_account()),
    );
    WalletView {
        status: status_of(ctx.book, SourceId::ChainAccount),
        balance: figures.balance,
        min_balance: figures.min_balance,
        assets: figures.assets,
        apps: figures.apps,
    }
}

fn network_view(ctx: &DeriveContext<'_>) -> NetworkView {
    let figures = chain::network_figures(
        ctx.book
            .record(SourceId::ChainNetwork)
            .and_then(|r| r.as_chain_network()),
    );
    NetworkView {
        status: status_of(ctx.book, SourceId::ChainNetwork),
        last_round: figures.last_round,
        round_time: figures.round_time,
        catchup: figures.catchup,
        next_version: figures.next_version,
        api_latency: format::latency(ctx.book.good(SourceId::ApiLatency).map(|g| g.latency_ms)),
    }
}

fn uptime_view(ctx: &DeriveContext<'_>) -> UptimeView {
    UptimeView {
        rows: ServiceId::ALL
            .into_iter()
            .map(|service| uptime::uptime_row(service, &ctx.history.snapshot(service)))
            .collect(),
    }
}

fn repos_view(ctx: &DeriveContext<'_>) -> ReposView {
    let list = ctx
        .book
        .record(SourceId::RepoCatalog)
        .and_then(|r| r.as_repos())
        .unwrap_or(&[]);
    ReposView {
        status: status_of(ctx.book, SourceId::RepoCatalog),
        repos: repos::repo_cards(list, ctx.now),
    }
}
