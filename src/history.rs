use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::types::uptime::{ServiceId, UptimeSample};

/// Samples kept per service.
pub const HISTORY_CAPACITY: usize = 30;

/// Rolling per-service uptime history. Append-only for the scheduler,
/// read-only for renderers.
pub struct UptimeHistoryStore {
    capacity: usize,
    buffers: Mutex<HashMap<ServiceId, VecDeque<UptimeSample>>>,
}

impl UptimeHistoryStore {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            buffers: Mutex::new(HashMap::new()),
        }
    }

    pub fn record(&self, service_id: ServiceId, ok: bool, latency_ms: Option<u64>) {
        self.record_at(service_id, ok, latency_ms, Utc::now());
    }

    pub fn record_at(
        &self,
        service_id: ServiceId,
        ok: bool,
        latency_ms: Option<u64>,
        timestamp: DateTime<Utc>,
    ) {
        let mut map = self.buffers.lock().unwrap_or_else(|e| e.into_inner());
        let buffer = map
            .entry(service_id)
            .or_insert_with(|| VecDeque::with_capacity(self.capacity));
        if buffer.len() == self.capacity {
            buffer.pop_front();
        }
        buffer.push_back(UptimeSample {
            service_id,
            timestamp,
            ok,
            latency_ms,
        });
        debug!(service = ?service_id, ok, len = buffer.len(), "Recorded uptime sample");
    }

    /// Samples for one service, oldest first.
    pub fn snapshot(&self, service_id: ServiceId) -> Vec<UptimeSample> {
        self.buffers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&service_id)
            .map(|buffer| buffer.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for UptimeHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn snapshot_of_unknown_service_is_empty() {
        let store = UptimeHistoryStore::new();
        assert!(store.snapshot(ServiceId::Chain).is_empty());
    }

    #[test]
    fn samples_are_ordered_oldest_first() {
        let store = UptimeHistoryStore::new();
        store.record_at(ServiceId::CiCd, true, Some(10), at(1));
        store.record_at(ServiceId::CiCd, false, None, at(2));
        let samples = store.snapshot(ServiceId::CiCd);
        assert_eq!(samples.len(), 2);
        assert!(samples[0].ok);
        assert!(!samples[1].ok);
        assert!(samples[0].timestamp < samples[1].timestamp);
    }

    #[test]
    fn thirty_one_appends_keep_the_last_thirty() {
        let store = UptimeHistoryStore::new();
        for i in 0..31 {
            store.record_at(ServiceId::Packages, i % 2 == 0, Some(i as u64), at(i));
        }
        let samples = store.snapshot(ServiceId::Packages);
        assert_eq!(samples.len(), HISTORY_CAPACITY);
        assert_eq!(samples.first().unwrap().timestamp, at(1));
        assert_eq!(samples.last().unwrap().timestamp, at(30));
        assert!(samples.iter().all(|s| s.timestamp != at(0)));
    }

    #[test]
    fn buffer_never_exceeds_capacity() {
        let store = UptimeHistoryStore::with_capacity(3);
        for i in 0..100 {
            store.record_at(ServiceId::Agent, true, None, at(i));
            assert!(store.snapshot(ServiceId::Agent).len() <= 3);
        }
    }

    #[test]
    fn services_are_independent() {
        let store = UptimeHistoryStore::new();
        store.record(ServiceId::Chain, true, Some(5));
        assert_eq!(store.snapshot(ServiceId::Chain).len(), 1);
        assert!(store.snapshot(ServiceId::Agent).is_empty());
    }
}
