use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::HealthError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Error,
    High,
    Normal,
    Low,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Error,
        Severity::High,
        Severity::Normal,
        Severity::Low,
    ];

    pub const PRIORITIES: [Severity; 3] = [Severity::High, Severity::Normal, Severity::Low];

    /// Priority levels at least as severe as `minimum`.
    ///
    /// Yields nothing for `Error`, which is not part of the priority scale.
    pub fn at_or_above(minimum: Severity) -> impl Iterator<Item = Severity> {
        Self::PRIORITIES
            .into_iter()
            .filter(move |s| minimum != Severity::Error && *s <= minimum)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::High => "HIGH",
            Severity::Normal => "NORMAL",
            Severity::Low => "LOW",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = HealthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ERROR" => Ok(Severity::Error),
            "HIGH" => Ok(Severity::High),
            "NORMAL" => Ok(Severity::Normal),
            "LOW" => Ok(Severity::Low),
            _ => Err(HealthError::UnknownSeverity(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeverityCounts {
    counts: BTreeMap<Severity, u32>,
}

impl SeverityCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, severity: Severity) -> u32 {
        self.counts.get(&severity).copied().unwrap_or(0)
    }

    pub fn set(&mut self, severity: Severity, count: u32) {
        self.counts.insert(severity, count);
    }

    pub fn add(&mut self, severity: Severity, count: u32) {
        let entry = self.counts.entry(severity).or_insert(0);
        *entry = entry.saturating_add(count);
    }

    pub fn try_add(&mut self, severity: Severity, count: u32) -> Result<(), HealthError> {
        let current = self.get(severity);
        let total = current
            .checked_add(count)
            .ok_or_else(|| HealthError::CountOverflow {
                severity,
                count: i64::from(current) + i64::from(count),
            })?;
        self.counts.insert(severity, total);
        Ok(())
    }

    pub fn merge(&mut self, other: &SeverityCounts) -> Result<(), HealthError> {
        for (severity, count) in other.iter() {
            self.try_add(severity, count)?;
        }
        Ok(())
    }

    pub fn total(&self) -> u64 {
        self.counts.values().map(|&c| u64::from(c)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Severity, u32)> + '_ {
        self.counts.iter().map(|(s, c)| (*s, *c))
    }

    pub fn from_severities<I>(severities: I) -> Self
    where
        I: IntoIterator<Item = Severity>,
    {
        let mut counts = Self::new();
        for severity in severities {
            counts.add(severity, 1);
        }
        counts
    }

    /// Rejects negative counts instead of clamping them.
    pub fn try_from_signed<I>(entries: I) -> Result<Self, HealthError>
    where
        I: IntoIterator<Item = (Severity, i64)>,
    {
        let mut counts = Self::new();
        for (severity, count) in entries {
            let count = u32::try_from(count).map_err(|_| {
                if count < 0 {
                    HealthError::NegativeCount { severity, count }
                } else {
                    HealthError::CountOverflow { severity, count }
                }
            })?;
            counts.try_add(severity, count)?;
        }
        Ok(counts)
    }

    pub fn from_json(bytes: &[u8]) -> anyhow::Result<Self> {
        let raw: BTreeMap<String, i64> =
            serde_json::from_slice(bytes).context("parse severity counts json")?;
        let entries = raw
            .into_iter()
            .map(|(name, count)| -> Result<_, HealthError> {
                Ok((name.parse::<Severity>()?, count))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::try_from_signed(entries)?)
    }
}

impl FromIterator<(Severity, u32)> for SeverityCounts {
    fn from_iter<T: IntoIterator<Item = (Severity, u32)>>(iter: T) -> Self {
        let mut counts = Self::new();
        for (severity, count) in iter {
            counts.add(severity, count);
        }
        counts
    }
}
