use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::source::{ErrorKind, NormalizedRecord, SourceId, SourceResult};

/// How current the data behind a panel is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    /// No successful fetch yet.
    Loading,
    Fresh,
    /// Showing last-good data because the latest fetch failed.
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoodRecord {
    pub record: NormalizedRecord,
    pub fetched_at: DateTime<Utc>,
    pub latency_ms: u64,
}

/// Latest outcome of one source plus the last successful payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceSlot {
    pub latest: Option<SourceResult<NormalizedRecord>>,
    pub last_good: Option<GoodRecord>,
}

impl SourceSlot {
    /// Store a completed fetch. An Ok replaces the last-good payload; a
    /// Failed only replaces `latest`.
    pub fn apply(&mut self, result: SourceResult<NormalizedRecord>) {
        if let SourceResult::Ok {
            data,
            fetched_at,
            latency_ms,
        } = &result
        {
            self.last_good = Some(GoodRecord {
                record: data.clone(),
                fetched_at: *fetched_at,
                latency_ms: *latency_ms,
            });
        }
        self.latest = Some(result);
    }

    pub fn freshness(&self) -> Freshness {
        match (&self.latest, &self.last_good) {
            (Some(SourceResult::Ok { .. }), _) => Freshness::Fresh,
            (Some(SourceResult::Failed { .. }), Some(_)) => Freshness::Stale,
            _ => Freshness::Loading,
        }
    }

    pub fn error(&self) -> Option<ErrorKind> {
        self.latest.as_ref().and_then(|r| r.error())
    }

    pub fn record(&self) -> Option<&NormalizedRecord> {
        self.last_good.as_ref().map(|g| &g.record)
    }
}

/// Per-source results, owned by the scheduler and read by derivation.
#[derive(Debug, Clone, Default)]
pub struct SourceBook {
    slots: HashMap<SourceId, SourceSlot>,
}

impl SourceBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, id: SourceId, result: SourceResult<NormalizedRecord>) {
        self.slots.entry(id).or_default().apply(result);
    }

    pub fn slot(&self, id: SourceId) -> Option<&SourceSlot> {
        self.slots.get(&id)
    }

    pub fn latest(&self, id: SourceId) -> Option<&SourceResult<NormalizedRecord>> {
        self.slots.get(&id).and_then(|s| s.latest.as_ref())
    }

    pub fn freshness(&self, id: SourceId) -> Freshness {
        self.slots
            .get(&id)
            .map_or(Freshness::Loading, SourceSlot::freshness)
    }

    pub fn error(&self, id: SourceId) -> Option<ErrorKind> {
        self.slots.get(&id).and_then(SourceSlot::error)
    }

    pub fn record(&self, id: SourceId) -> Option<&NormalizedRecord> {
        self.slots.get(&id).and_then(SourceSlot::record)
    }

    pub fn good(&self, id: SourceId) -> Option<&GoodRecord> {
        self.slots.get(&id).and_then(|s| s.last_good.as_ref())
    }
}

/// Diagnostic view of the refresh cycle. Overlapping ticks are allowed, so
/// `in_flight` counts outstanding fetches per source rather than gating.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshCycle {
    pub started_at: Option<DateTime<Utc>>,
    pub interval_seconds: u64,
    #[serde(skip)]
    outstanding: BTreeMap<SourceId, usize>,
}

impl RefreshCycle {
    pub fn begin(&mut self, ids: impl IntoIterator<Item = SourceId>, now: DateTime<Utc>) {
        self.started_at = Some(now);
        for id in ids {
            *self.outstanding.entry(id).or_insert(0) += 1;
        }
    }

    pub fn finish(&mut self, id: SourceId) {
        if let Some(count) = self.outstanding.get_mut(&id) {
            *count -= 1;
            if *count == 0 {
                self.outstanding.remove(&id);
            }
        }
    }

    pub fn in_flight(&self) -> BTreeSet<SourceId> {
        self.outstanding.keys().copied().collect()
    }

    pub fn outstanding(&self, id: SourceId) -> usize {
        self.outstanding.get(&id).copied().unwrap_or(0)
    }
}
