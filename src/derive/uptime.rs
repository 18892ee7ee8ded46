use super::format::{latency, percentage};
use crate::panels::UptimeRow;
use crate::types::uptime::{ServiceId, UptimeSample};

pub fn uptime_percentage(samples: &[UptimeSample]) -> String {
    let ok = samples.iter().filter(|s| s.ok).count();
    percentage(ok, samples.len())
}

pub fn uptime_row(service: ServiceId, samples: &[UptimeSample]) -> UptimeRow {
    UptimeRow {
        service,
        label: service.label().to_string(),
        percentage: uptime_percentage(samples),
        latency: latency(samples.last().and_then(|s| s.latency_ms)),
        history: samples.iter().map(|s| s.ok).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::format::PLACEHOLDER;
    use chrono::Utc;

    fn sample(ok: bool, latency_ms: Option<u64>) -> UptimeSample {
        UptimeSample {
            service_id: ServiceId::Chain,
            timestamp: Utc::now(),
            ok,
            latency_ms,
        }
    }

    #[test]
    fn empty_history_is_placeholder() {
        let row = uptime_row(ServiceId::Chain, &[]);
        assert_eq!(row.percentage, PLACEHOLDER);
        assert_eq!(row.latency, PLACEHOLDER);
        assert!(row.history.is_empty());
    }

    #[test]
    fn percentage_counts_ok_samples() {
        let samples = vec![
            sample(true, Some(10)),
            sample(false, None),
            sample(true, Some(30)),
            sample(true, Some(20)),
        ];
        let row = uptime_row(ServiceId::Chain, &samples);
        assert_eq!(row.percentage, "75.0%");
        assert_eq!(row.latency, "20ms");
        assert_eq!(row.history, vec![true, false, true, true]);
        assert_eq!(row.label, "Algorand Node");
    }
}
