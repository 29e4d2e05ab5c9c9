//! Per-section validation
//!
//! Every section writes its problems into one shared [`ValidationReport`], so
//! a single pass over a file reports all of its bad values at once.

pub use crate::error::ValidationError;
use std::collections::BTreeSet;
use std::fmt::Display;
use std::ops::RangeInclusive;

/// A config section that can check its own values
pub trait ConfigSection {
    /// Records every invalid value of the section into `report`
    fn check(&self, report: &mut ValidationReport);

    /// Checks the section on its own
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut report = ValidationReport::default();
        self.check(&mut report);
        report.finish()
    }
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    problems: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn reject(&mut self, key: &str, problem: impl Into<String>) {
        self.problems.push(ValidationError::new(key, problem));
    }

    /// Blank and whitespace-only strings are rejected
    pub fn require_text(&mut self, key: &str, value: &str) {
        if value.trim().is_empty() {
            self.reject(key, "must not be blank");
        }
    }

    pub fn require_within<T>(&mut self, key: &str, value: T, range: RangeInclusive<T>)
    where
        T: PartialOrd + Display,
    {
        if !range.contains(&value) {
            self.reject(
                key,
                format!("{} is outside {}..={}", value, range.start(), range.end()),
            );
        }
    }

    /// Reports the first name seen twice
    pub fn require_distinct<'a>(&mut self, key: &str, names: impl IntoIterator<Item = &'a str>) {
        let mut seen = BTreeSet::new();
        if let Some(repeated) = names.into_iter().find(|name| !seen.insert(*name)) {
            self.reject(key, format!("'{}' is listed twice", repeated));
        }
    }

    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn finish(self) -> Result<(), Vec<ValidationError>> {
        if self.problems.is_empty() {
            Ok(())
        } else {
            Err(self.problems)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_within_is_inclusive() {
        let mut report = ValidationReport::default();
        report.require_within("store.max_connections", 1u32, 1..=64);
        report.require_within("store.max_connections", 64u32, 1..=64);
        assert!(report.is_clean());

        report.require_within("store.max_connections", 65u32, 1..=64);
        let problems = report.finish().unwrap_err();
        assert_eq!(problems[0].problem, "65 is outside 1..=64");
    }

    #[test]
    fn test_require_text_rejects_whitespace() {
        let mut report = ValidationReport::default();
        report.require_text("finder.impacted_user_key", "impactedUserName");
        assert!(report.is_clean());

        report.require_text("finder.impacted_user_key", "  ");
        assert!(!report.is_clean());
    }

    #[test]
    fn test_require_distinct_names_the_repeat() {
        let mut report = ValidationReport::default();
        report.require_distinct("repositories.name", ["default", "archive"]);
        assert!(report.is_clean());

        report.require_distinct("repositories.name", ["default", "archive", "default"]);
        let problems = report.finish().unwrap_err();
        assert_eq!(
            problems,
            vec![ValidationError::new(
                "repositories.name",
                "'default' is listed twice"
            )]
        );
    }

    #[test]
    fn test_report_keeps_every_problem() {
        let mut report = ValidationReport::default();
        report.reject("a", "first");
        report.reject("b", "second");
        assert_eq!(report.finish().unwrap_err().len(), 2);
    }
}
