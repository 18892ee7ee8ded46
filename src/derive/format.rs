use chrono::{DateTime, Utc};

/// Shown wherever a value is not available yet.
pub const PLACEHOLDER: &str = "--";

const MICRO_DIGITS: u32 = 6;

/// Render a micro-unit integer (1e-6) with `decimals` places, rounding half up.
/// Integer arithmetic keeps `12345678` at exactly `12.345678`.
pub fn format_micro_units(amount: u64, decimals: u32) -> String {
    let decimals = decimals.min(MICRO_DIGITS);
    let scale = 10u64.pow(MICRO_DIGITS - decimals);
    let rounded = amount / scale + u64::from(amount % scale >= scale / 2 && scale > 1);
    if decimals == 0 {
        return rounded.to_string();
    }
    let unit = 10u64.pow(decimals);
    format!(
        "{}.{:0width$}",
        rounded / unit,
        rounded % unit,
        width = decimals as usize
    )
}

/// Balance as shown on the summary stat card.
pub fn algo_stat(micro_algo: u64) -> String {
    format_micro_units(micro_algo, 3)
}

/// Balance as shown on the wallet panel.
pub fn algo_wallet(micro_algo: u64) -> String {
    format!("{} ALGO", format_micro_units(micro_algo, 6))
}

pub fn compact_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else {
        n.to_string()
    }
}

pub fn nanos_as_secs(ns: u64) -> String {
    format!("{:.1}s", ns as f64 / 1_000_000_000.0)
}

pub fn catchup_label(ns: u64) -> String {
    if ns == 0 {
        "Synced".to_string()
    } else {
        format!("{} ns", ns)
    }
}

pub fn percentage(ok: usize, total: usize) -> String {
    if total == 0 {
        return PLACEHOLDER.to_string();
    }
    format!("{:.1}%", ok as f64 / total as f64 * 100.0)
}

pub fn latency(ms: Option<u64>) -> String {
    ms.map_or_else(|| PLACEHOLDER.to_string(), |ms| format!("{}ms", ms))
}

pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds();
    if secs < 60 {
        "just now".to_string()
    } else if secs < 3_600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86_400 {
        format!("{}h ago", secs / 3_600)
    } else if secs < 30 * 86_400 {
        format!("{}d ago", secs / 86_400)
    } else {
        then.format("%b %d, %Y").to_string()
    }
}

pub fn relative_or_placeholder(then: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    then.map_or_else(|| PLACEHOLDER.to_string(), |t| relative_time(t, now))
}
