//! Cell-level alerts over one measurement batch.
//!
//! Each pass regenerates the full alert list; alerts are never patched in
//! place.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::config::ValidationSettings;
use crate::model::{AlertKind, AlertSeverity, CellAlert, MeasurementEntry};
use crate::validate::{validate_entry, ErrorSeverity};

pub const COL_DESCRIPTION: &str = "description";
pub const COL_QUANTITY: &str = "quantity";
pub const COL_UNIT: &str = "unit";
pub const COL_UNIT_PRICE: &str = "unit_price";
pub const COL_TOTAL: &str = "stated_total";
pub const COL_CODE: &str = "code";

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub rows_analyzed: usize,
    pub alerts: Vec<CellAlert>,
    pub by_kind: BTreeMap<AlertKind, usize>,
    pub by_severity: BTreeMap<AlertSeverity, usize>,
}

impl AnalysisReport {
    pub fn count(&self, severity: AlertSeverity) -> usize {
        self.by_severity.get(&severity).copied().unwrap_or(0)
    }

    pub fn has_errors(&self) -> bool {
        self.count(AlertSeverity::Error) > 0
    }
}

fn alert(
    row: usize,
    column: &str,
    kind: AlertKind,
    severity: AlertSeverity,
    message: String,
) -> CellAlert {
    CellAlert {
        row,
        column: Some(column.to_string()),
        kind,
        severity,
        message,
        value: None,
        expected: None,
    }
}

fn money(v: f64) -> String {
    format!("{v:.2}")
}

/// Run every row check over the batch. Alerts come out ordered by row, and
/// within a row: calculation, missing, duplicate, inconsistent.
pub fn analyze_entries(entries: &[MeasurementEntry], settings: &ValidationSettings) -> AnalysisReport {
    let mut alerts = Vec::new();
    // key -> (first row, unit seen on that row)
    let mut seen: HashMap<String, (usize, String)> = HashMap::new();

    for (row, entry) in entries.iter().enumerate() {
        let validated = validate_entry(entry, settings);

        if validated.has_calculation_error {
            let severity = match validated.severity {
                Some(ErrorSeverity::High) => AlertSeverity::Error,
                Some(ErrorSeverity::Medium) => AlertSeverity::Warning,
                _ => AlertSeverity::Info,
            };
            let mut a = alert(
                row,
                COL_TOTAL,
                AlertKind::Calculation,
                severity,
                format!(
                    "stated total {} differs from quantity x unit price {} by {:.2}%",
                    money(entry.stated_total),
                    money(validated.calculated_total),
                    validated.percent_diff
                ),
            );
            a.value = Some(money(entry.stated_total));
            a.expected = Some(money(validated.calculated_total));
            alerts.push(a);
        }

        if entry.description.trim().is_empty() {
            alerts.push(alert(
                row,
                COL_DESCRIPTION,
                AlertKind::Missing,
                AlertSeverity::Warning,
                "description is empty".into(),
            ));
        }
        if entry.unit.trim().is_empty() {
            alerts.push(alert(
                row,
                COL_UNIT,
                AlertKind::Missing,
                AlertSeverity::Info,
                "unit is empty".into(),
            ));
        }
        if entry.stated_total == 0.0 && entry.quantity > 0.0 && entry.unit_price > 0.0 {
            let mut a = alert(
                row,
                COL_TOTAL,
                AlertKind::Missing,
                AlertSeverity::Warning,
                "total is zero although quantity and unit price are filled".into(),
            );
            a.value = Some(money(0.0));
            a.expected = Some(money(validated.calculated_total));
            alerts.push(a);
        }

        let key = entry.key();
        let mut unit_conflict: Option<(usize, String)> = None;
        if !key.is_empty() {
            match seen.get(&key) {
                Some((first_row, first_unit)) => {
                    alerts.push(alert(
                        row,
                        COL_CODE,
                        AlertKind::Duplicate,
                        AlertSeverity::Warning,
                        format!("item '{key}' already appears on row {}", first_row + 1),
                    ));
                    let unit = entry.unit.trim();
                    if !unit.is_empty()
                        && !first_unit.is_empty()
                        && !unit.eq_ignore_ascii_case(first_unit)
                    {
                        unit_conflict = Some((*first_row, first_unit.clone()));
                    }
                }
                None => {
                    seen.insert(key.clone(), (row, entry.unit.trim().to_string()));
                }
            }
        }

        if entry.quantity < 0.0 {
            let mut a = alert(
                row,
                COL_QUANTITY,
                AlertKind::Inconsistent,
                AlertSeverity::Error,
                "quantity is negative".into(),
            );
            a.value = Some(entry.quantity.to_string());
            alerts.push(a);
        }
        if entry.unit_price < 0.0 {
            let mut a = alert(
                row,
                COL_UNIT_PRICE,
                AlertKind::Inconsistent,
                AlertSeverity::Error,
                "unit price is negative".into(),
            );
            a.value = Some(money(entry.unit_price));
            alerts.push(a);
        }
        if let Some((first_row, first_unit)) = unit_conflict {
            let mut a = alert(
                row,
                COL_UNIT,
                AlertKind::Inconsistent,
                AlertSeverity::Warning,
                format!(
                    "item '{key}' uses unit '{}' but row {} uses '{first_unit}'",
                    entry.unit.trim(),
                    first_row + 1
                ),
            );
            a.value = Some(entry.unit.trim().to_string());
            a.expected = Some(first_unit);
            alerts.push(a);
        }
    }

    let mut by_kind = BTreeMap::new();
    let mut by_severity = BTreeMap::new();
    for a in &alerts {
        *by_kind.entry(a.kind).or_insert(0) += 1;
        *by_severity.entry(a.severity).or_insert(0) += 1;
    }

    log::debug!("analyzed {} rows, {} alerts", entries.len(), alerts.len());

    AnalysisReport {
        rows_analyzed: entries.len(),
        alerts,
        by_kind,
        by_severity,
    }
}
