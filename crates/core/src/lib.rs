pub mod config;
pub mod error;
pub mod health;
pub mod types;

pub use error::HealthError;
pub use health::{
    compute_health, health_percentage, relevant_count, HealthReport, ThresholdConfig, ToolLabels,
    TooltipSource,
};
pub use types::{Severity, SeverityCounts};
