//! Row-level calculation check: stated total vs. `quantity * unit_price`.

use serde::Serialize;

use crate::config::ValidationSettings;
use crate::model::MeasurementEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
}

impl ErrorSeverity {
    /// `> 10%` is high, `> 5%` is medium, anything else low.
    pub fn from_percent(percent_diff: f64) -> Self {
        if percent_diff > 10.0 {
            Self::High
        } else if percent_diff > 5.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Derived record for one measurement line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedEntry {
    pub id: String,
    pub calculated_total: f64,
    pub stated_total: f64,
    /// `|calculated - stated|`.
    pub difference: f64,
    /// `difference / stated * 100`, zero when the stated total is zero.
    pub percent_diff: f64,
    pub has_calculation_error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<ErrorSeverity>,
}

pub fn validate_entry(entry: &MeasurementEntry, settings: &ValidationSettings) -> ValidatedEntry {
    let calculated_total = entry.quantity * entry.unit_price;
    let stated = entry.stated_total;
    let difference = (calculated_total - stated).abs();
    let percent_diff = if stated != 0.0 {
        difference / stated.abs() * 100.0
    } else {
        0.0
    };

    // Zero unit price or zero stated total marks a placeholder row, not an error.
    let has_calculation_error =
        stated > 0.0 && entry.unit_price > 0.0 && percent_diff > settings.tolerance_percent;

    ValidatedEntry {
        id: entry.id.clone(),
        calculated_total,
        stated_total: stated,
        difference,
        percent_diff,
        has_calculation_error,
        severity: has_calculation_error.then(|| ErrorSeverity::from_percent(percent_diff)),
    }
}

pub fn validate_entries(
    entries: &[MeasurementEntry],
    settings: &ValidationSettings,
) -> Vec<ValidatedEntry> {
    let validated: Vec<ValidatedEntry> =
        entries.iter().map(|e| validate_entry(e, settings)).collect();
    let errors = validated.iter().filter(|v| v.has_calculation_error).count();
    log::debug!("validated {} entries, {} calculation errors", validated.len(), errors);
    validated
}
