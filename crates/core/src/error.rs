use thiserror::Error;

use crate::types::Severity;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HealthError {
    #[error("negative issue count {count} for severity {severity}")]
    NegativeCount { severity: Severity, count: i64 },

    #[error("issue count {count} for severity {severity} does not fit in 32 bits")]
    CountOverflow { severity: Severity, count: i64 },

    #[error("unknown severity '{0}' (expected one of ERROR, HIGH, NORMAL, LOW)")]
    UnknownSeverity(String),
}
