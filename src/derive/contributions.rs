use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Days, Duration, NaiveDate};

use crate::panels::DayCell;
use crate::types::records::CommitWeek;

/// Days shown on the graph, ending today.
pub const GRAPH_DAYS: i64 = 365;

pub const LEGEND: [&str; 7] = ["Less", "0", "1-2", "3-4", "5-7", "8+", "More"];

/// Intensity bucket for a day's commit count: {0, 1-2, 3-4, 5-7, 8+}.
pub fn intensity_level(count: u32) -> u8 {
    match count {
        0 => 0,
        1..=2 => 1,
        3..=4 => 2,
        5..=7 => 3,
        _ => 4,
    }
}

fn week_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// Spread weekly buckets onto calendar days. Undated weeks are placed by
/// position, the last bucket being the week containing `today`. Days that
/// fall off the calendar are skipped.
pub fn day_counts(weeks: &[CommitWeek], today: NaiveDate) -> BTreeMap<NaiveDate, u32> {
    let current_week = week_of(today);
    let n = weeks.len() as u64;
    let mut counts = BTreeMap::new();

    for (idx, week) in weeks.iter().enumerate() {
        let start = match week.week_start {
            Some(ts) => DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive()),
            None => current_week.checked_sub_days(Days::new(7 * (n - 1 - idx as u64))),
        };
        let Some(start) = start else {
            continue;
        };
        for (offset, count) in week.days.iter().enumerate() {
            let Some(date) = start.checked_add_days(Days::new(offset as u64)) else {
                break;
            };
            let slot = counts.entry(date).or_insert(0u32);
            *slot = slot.saturating_add(*count);
        }
    }
    counts
}

/// One cell per day over the trailing year, oldest first.
pub fn contribution_cells(weeks: &[CommitWeek], today: NaiveDate) -> Vec<DayCell> {
    let counts = day_counts(weeks, today);
    let first = today - Duration::days(GRAPH_DAYS - 1);
    first
        .iter_days()
        .take(GRAPH_DAYS as usize)
        .map(|date| {
            let count = counts.get(&date).copied().unwrap_or(0);
            DayCell {
                date,
                count,
                level: intensity_level(count),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn saturday() -> NaiveDate {
        let date = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        assert_eq!(date.weekday(), Weekday::Sat);
        date
    }

    fn single_week() -> Vec<CommitWeek> {
        vec![CommitWeek {
            week_start: None,
            days: [2, 3, 1, 0, 4, 2, 1],
            total: 13,
        }]
    }

    #[test]
    fn level_boundaries() {
        let levels: Vec<u8> = [0, 1, 2, 3, 4, 5, 7, 8, 40]
            .into_iter()
            .map(intensity_level)
            .collect();
        assert_eq!(levels, vec![0, 1, 1, 2, 2, 3, 3, 4, 4]);
    }

    #[test]
    fn graph_spans_trailing_year() {
        let cells = contribution_cells(&single_week(), saturday());
        assert_eq!(cells.len(), GRAPH_DAYS as usize);
        assert!(cells.len() >= 100);
        assert_eq!(cells.last().unwrap().date, saturday());
        assert_eq!(
            cells.first().unwrap().date,
            saturday() - Duration::days(GRAPH_DAYS - 1)
        );
    }

    #[test]
    fn undated_week_lands_on_current_week() {
        let cells = contribution_cells(&single_week(), saturday());
        let last_week: Vec<(u32, u8)> = cells[cells.len() - 7..]
            .iter()
            .map(|c| (c.count, c.level))
            .collect();
        assert_eq!(
            last_week,
            vec![(2, 1), (3, 2), (1, 1), (0, 0), (4, 2), (2, 1), (1, 1)]
        );
        let earlier_total: u32 = cells[..cells.len() - 7].iter().map(|c| c.count).sum();
        assert_eq!(earlier_total, 0);
    }

    #[test]
    fn dated_weeks_use_their_timestamp() {
        // Sunday 2026-10-04 00:00 UTC
        let week = CommitWeek {
            week_start: Some(1_791_072_000),
            days: [9, 0, 0, 0, 0, 0, 0],
            total: 9,
        };
        let counts = day_counts(&[week], saturday());
        assert_eq!(
            counts.get(&NaiveDate::from_ymd_opt(2026, 10, 4).unwrap()),
            Some(&9)
        );
    }

    #[test]
    fn week_at_calendar_edge_is_skipped() {
        let edge = NaiveDate::MAX.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp();
        let weeks = vec![CommitWeek {
            week_start: Some(edge),
            days: [5; 7],
            total: 35,
        }];
        let counts = day_counts(&weeks, saturday());
        assert_eq!(counts.len(), 1);
        let cells = contribution_cells(&weeks, saturday());
        assert_eq!(cells.len(), GRAPH_DAYS as usize);
        assert!(cells.iter().all(|c| c.count == 0));
    }

    #[test]
    fn future_days_are_not_rendered() {
        let wednesday = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
        let cells = contribution_cells(&single_week(), wednesday);
        assert_eq!(cells.last().unwrap().date, wednesday);
        let visible: u32 = cells.iter().map(|c| c.count).sum();
        assert_eq!(visible, 2 + 3 + 1 + 0);
    }
}
