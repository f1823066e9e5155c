//! Dashboard rollups: per-group totals and the batch headline figures.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::ValidationSettings;
use crate::model::{EntryStatus, MeasurementEntry};
use crate::validate::validate_entry;

/// Label used for entries whose grouping field is blank.
pub const UNGROUPED: &str = "(none)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    Discipline,
    Location,
    Responsible,
}

impl GroupBy {
    fn label<'a>(&self, entry: &'a MeasurementEntry) -> &'a str {
        let raw = match self {
            Self::Discipline => &entry.discipline,
            Self::Location => &entry.location,
            Self::Responsible => &entry.responsible,
        };
        match raw.trim() {
            "" => UNGROUPED,
            s => s,
        }
    }
}

impl std::fmt::Display for GroupBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Discipline => write!(f, "discipline"),
            Self::Location => write!(f, "location"),
            Self::Responsible => write!(f, "responsible"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollupRow {
    pub group: String,
    pub entries: usize,
    pub total_quantity: f64,
    pub total_value: f64,
    pub outliers: usize,
    pub calculation_errors: usize,
}

/// Group the batch and total each group, largest value first. Groups with
/// equal value are ordered by label.
pub fn rollup(
    entries: &[MeasurementEntry],
    group_by: GroupBy,
    settings: &ValidationSettings,
) -> Vec<RollupRow> {
    let mut groups: HashMap<&str, RollupRow> = HashMap::new();

    for entry in entries {
        let label = group_by.label(entry);
        let row = groups.entry(label).or_insert_with(|| RollupRow {
            group: label.to_string(),
            entries: 0,
            total_quantity: 0.0,
            total_value: 0.0,
            outliers: 0,
            calculation_errors: 0,
        });
        row.entries += 1;
        row.total_quantity += entry.quantity;
        row.total_value += entry.stated_total;
        if entry.status == EntryStatus::Outlier {
            row.outliers += 1;
        }
        if validate_entry(entry, settings).has_calculation_error {
            row.calculation_errors += 1;
        }
    }

    let mut rows: Vec<RollupRow> = groups.into_values().collect();
    rows.sort_by(|a, b| {
        b.total_value
            .total_cmp(&a.total_value)
            .then_with(|| a.group.cmp(&b.group))
    });
    rows
}

/// Headline figures for one batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchOverview {
    pub entries: usize,
    pub total_value: f64,
    pub total_calculated: f64,
    pub calculation_errors: usize,
    pub outliers: usize,
    pub pending: usize,
}

pub fn batch_overview(entries: &[MeasurementEntry], settings: &ValidationSettings) -> BatchOverview {
    let mut overview = BatchOverview {
        entries: entries.len(),
        total_value: 0.0,
        total_calculated: 0.0,
        calculation_errors: 0,
        outliers: 0,
        pending: 0,
    };
    for entry in entries {
        let v = validate_entry(entry, settings);
        overview.total_value += entry.stated_total;
        overview.total_calculated += v.calculated_total;
        if v.has_calculation_error {
            overview.calculation_errors += 1;
        }
        match entry.status {
            EntryStatus::Outlier => overview.outliers += 1,
            EntryStatus::Pending => overview.pending += 1,
            EntryStatus::Normal => {}
        }
    }
    overview
}
