use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{Severity, SeverityCounts};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub healthy: i32,
    pub unhealthy: i32,
    #[serde(default = "default_minimum_severity")]
    pub minimum_severity: Severity,
}

fn default_minimum_severity() -> Severity {
    Severity::Low
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            healthy: 0,
            unhealthy: 0,
            minimum_severity: default_minimum_severity(),
        }
    }
}

impl ThresholdConfig {
    pub fn new(healthy: i32, unhealthy: i32, minimum_severity: Severity) -> Self {
        Self {
            healthy,
            unhealthy,
            minimum_severity,
        }
    }

    pub fn is_valid(&self) -> bool {
        0 <= self.healthy && self.healthy < self.unhealthy
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub percentage: u8,
    pub message: String,
}

pub trait TooltipSource {
    fn tooltip(&self, relevant: u64) -> String;
}

impl<F> TooltipSource for F
where
    F: Fn(u64) -> String,
{
    fn tooltip(&self, relevant: u64) -> String {
        self(relevant)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolLabels {
    pub name: String,
}

impl ToolLabels {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for ToolLabels {
    fn default() -> Self {
        Self::new("Static Analysis")
    }
}

impl TooltipSource for ToolLabels {
    fn tooltip(&self, relevant: u64) -> String {
        match relevant {
            0 => format!("{}: no warnings", self.name),
            1 => format!("{}: one warning", self.name),
            n => format!("{}: {} warnings", self.name, n),
        }
    }
}

pub fn relevant_count(config: &ThresholdConfig, counts: &SeverityCounts) -> u64 {
    let filtered: u64 = Severity::at_or_above(config.minimum_severity)
        .map(|s| u64::from(counts.get(s)))
        .sum();
    filtered + u64::from(counts.get(Severity::Error))
}

pub fn health_percentage(config: &ThresholdConfig, relevant: u64) -> Option<u8> {
    if !config.is_valid() {
        return None;
    }

    let healthy = i64::from(config.healthy);
    let unhealthy = i64::from(config.unhealthy);
    let relevant = i64::try_from(relevant).unwrap_or(i64::MAX);

    let percentage = if relevant < healthy {
        100
    } else if relevant > unhealthy {
        0
    } else {
        100 - ((relevant - healthy) * 100 / (unhealthy - healthy))
    };

    Some(percentage.clamp(0, 100) as u8)
}

/// Returns `None` when the configuration is invalid, meaning health
/// reporting is turned off and nothing should be displayed.
pub fn compute_health<T>(
    config: &ThresholdConfig,
    labels: &T,
    counts: &SeverityCounts,
) -> Option<HealthReport>
where
    T: TooltipSource + ?Sized,
{
    let relevant = relevant_count(config, counts);

    let Some(percentage) = health_percentage(config, relevant) else {
        debug!(
            healthy = config.healthy,
            unhealthy = config.unhealthy,
            "health reporting disabled by thresholds"
        );
        return None;
    };

    debug!(relevant, percentage, "computed build health");

    Some(HealthReport {
        percentage,
        message: labels.tooltip(relevant),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(entries: &[(Severity, u32)]) -> SeverityCounts {
        entries.iter().copied().collect()
    }

    fn echo(relevant: u64) -> String {
        relevant.to_string()
    }

    #[test]
    fn normal_issues_interpolate_between_thresholds() {
        let config = ThresholdConfig::new(1, 9, Severity::Normal);
        let report = compute_health(&config, &echo, &counts(&[(Severity::Normal, 5)])).unwrap();
        assert_eq!(report.percentage, 50);
        assert_eq!(report.message, "5");
    }

    #[test]
    fn errors_count_even_when_filtered_by_minimum() {
        let config = ThresholdConfig::new(0, 10, Severity::High);
        let c = counts(&[(Severity::Error, 3), (Severity::Low, 2)]);
        assert_eq!(relevant_count(&config, &c), 3);
        let report = compute_health(&config, &echo, &c).unwrap();
        assert_eq!(report.percentage, 70);
        assert_eq!(report.message, "3");
    }

    #[test]
    fn equal_thresholds_disable_reporting() {
        let config = ThresholdConfig::new(5, 5, Severity::Low);
        assert!(compute_health(&config, &echo, &SeverityCounts::new()).is_none());
        assert!(compute_health(&config, &echo, &counts(&[(Severity::High, 50)])).is_none());
    }

    #[test]
    fn negative_healthy_threshold_disables_reporting() {
        let config = ThresholdConfig::new(-1, 5, Severity::Low);
        assert!(!config.is_valid());
        assert!(compute_health(&config, &echo, &counts(&[(Severity::Low, 2)])).is_none());
    }

    #[test]
    fn default_config_is_disabled() {
        assert!(!ThresholdConfig::default().is_valid());
    }

    #[test]
    fn no_issues_is_fully_healthy() {
        let config = ThresholdConfig::new(0, 1, Severity::Low);
        let report = compute_health(&config, &echo, &SeverityCounts::new()).unwrap();
        assert_eq!(report.percentage, 100);
    }

    #[test]
    fn boundaries_are_continuous() {
        let config = ThresholdConfig::new(3, 7, Severity::Low);
        assert_eq!(health_percentage(&config, 2), Some(100));
        assert_eq!(health_percentage(&config, 3), Some(100));
        assert_eq!(health_percentage(&config, 7), Some(0));
        assert_eq!(health_percentage(&config, 8), Some(0));
    }

    #[test]
    fn severities_below_minimum_are_ignored() {
        let config = ThresholdConfig::new(0, 4, Severity::Normal);
        let c = counts(&[(Severity::Low, 100), (Severity::High, 1)]);
        assert_eq!(relevant_count(&config, &c), 1);
        assert_eq!(compute_health(&config, &echo, &c).unwrap().percentage, 75);
    }

    #[test]
    fn error_minimum_counts_only_errors() {
        let config = ThresholdConfig::new(0, 10, Severity::Error);
        let c = counts(&[(Severity::Error, 2), (Severity::High, 9)]);
        assert_eq!(relevant_count(&config, &c), 2);
    }

    #[test]
    fn tool_labels_pluralize() {
        let labels = ToolLabels::new("checkstyle");
        assert_eq!(labels.tooltip(0), "checkstyle: no warnings");
        assert_eq!(labels.tooltip(1), "checkstyle: one warning");
        assert_eq!(labels.tooltip(12), "checkstyle: 12 warnings");
    }

    #[test]
    fn message_uses_relevant_count_not_total() {
        let config = ThresholdConfig::new(0, 10, Severity::High);
        let c = counts(&[(Severity::High, 1), (Severity::Low, 40)]);
        let report = compute_health(&config, &ToolLabels::new("pmd"), &c).unwrap();
        assert_eq!(report.message, "pmd: one warning");
    }
}
