use crate::config::{PackageEntry, TestStatus};
use crate::panels::PackageRow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSummary {
    pub package_count: usize,
    pub test_count: u32,
    pub failing: usize,
    /// Every entry passing; an empty catalog does not count.
    pub all_passing: bool,
}

pub fn package_summary(catalog: &[PackageEntry]) -> PackageSummary {
    let failing = catalog
        .iter()
        .filter(|p| p.tests != TestStatus::Passing)
        .count();
    PackageSummary {
        package_count: catalog.len(),
        test_count: catalog.iter().fold(0u32, |acc, p| acc.saturating_add(p.test_count)),
        failing,
        all_passing: !catalog.is_empty() && failing == 0,
    }
}

pub fn badge(summary: &PackageSummary) -> String {
    if summary.package_count == 0 {
        "no packages".to_string()
    } else if summary.all_passing {
        "all passing".to_string()
    } else {
        format!("{} not passing", summary.failing)
    }
}

pub fn package_rows(catalog: &[PackageEntry]) -> Vec<PackageRow> {
    catalog
        .iter()
        .map(|p| PackageRow {
            name: p.name.clone(),
            version: p.version.clone(),
            description: p.description.clone(),
            test_count: p.test_count,
            tests: p.tests,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, tests: TestStatus, count: u32) -> PackageEntry {
        PackageEntry {
            name: name.to_string(),
            version: "0.1.0".to_string(),
            description: None,
            test_count: count,
            tests,
        }
    }

    #[test]
    fn all_passing_requires_every_entry() {
        let catalog = vec![
            entry("a", TestStatus::Passing, 10),
            entry("b", TestStatus::Passing, 5),
        ];
        let summary = package_summary(&catalog);
        assert!(summary.all_passing);
        assert_eq!(summary.test_count, 15);
        assert_eq!(badge(&summary), "all passing");
    }

    #[test]
    fn unknown_status_breaks_all_passing() {
        let catalog = vec![
            entry("a", TestStatus::Passing, 10),
            entry("b", TestStatus::Unknown, 0),
        ];
        let summary = package_summary(&catalog);
        assert!(!summary.all_passing);
        assert_eq!(badge(&summary), "1 not passing");
    }

    #[test]
    fn empty_catalog_is_not_all_passing() {
        let summary = package_summary(&[]);
        assert!(!summary.all_passing);
        assert_eq!(badge(&summary), "no packages");
    }
}
