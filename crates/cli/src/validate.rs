//! `medir validate`: per-row calculation check.

use std::path::PathBuf;

use serde::Serialize;

use medir_core::validate::{validate_entries, ErrorSeverity, ValidatedEntry};
use medir_core::{MeasurementEntry, Settings};

use crate::exit_codes::EXIT_FINDINGS;
use crate::util::{fmt_amount, pad_left, pad_right};
use crate::{emit_json, file_label, load_measurements, CliError};

#[derive(Serialize)]
struct ValidateOutput<'a> {
    file: String,
    tolerance_percent: f64,
    summary: ValidateSummary,
    rows: Vec<ValidateRow<'a>>,
}

#[derive(Serialize)]
struct ValidateSummary {
    entries: usize,
    calculation_errors: usize,
    high: usize,
    medium: usize,
    low: usize,
    stated_total: f64,
    calculated_total: f64,
}

#[derive(Serialize)]
struct ValidateRow<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    description: &'a str,
    quantity: f64,
    unit_price: f64,
    #[serde(flatten)]
    result: ValidatedEntry,
}

fn summarize(entries: &[MeasurementEntry], validated: &[ValidatedEntry]) -> ValidateSummary {
    let count = |s: ErrorSeverity| validated.iter().filter(|v| v.severity == Some(s)).count();
    ValidateSummary {
        entries: entries.len(),
        calculation_errors: validated.iter().filter(|v| v.has_calculation_error).count(),
        high: count(ErrorSeverity::High),
        medium: count(ErrorSeverity::Medium),
        low: count(ErrorSeverity::Low),
        stated_total: validated.iter().map(|v| v.stated_total).sum(),
        calculated_total: validated.iter().map(|v| v.calculated_total).sum(),
    }
}

pub fn cmd_validate(
    settings: &Settings,
    file: PathBuf,
    json: bool,
    only_errors: bool,
    sheet: Option<String>,
    strict: bool,
) -> Result<(), CliError> {
    let import = load_measurements(settings, &file, sheet)?;
    let entries = &import.entries;
    let validated = validate_entries(entries, &settings.validation);
    let summary = summarize(entries, &validated);
    let errors = summary.calculation_errors;

    let rows: Vec<ValidateRow> = entries
        .iter()
        .zip(validated)
        .filter(|(_, v)| !only_errors || v.has_calculation_error)
        .map(|(e, v)| ValidateRow {
            code: e.code.as_deref(),
            description: &e.description,
            quantity: e.quantity,
            unit_price: e.unit_price,
            result: v,
        })
        .collect();

    if json {
        let output = ValidateOutput {
            file: file_label(&file),
            tolerance_percent: settings.validation.tolerance_percent,
            summary,
            rows,
        };
        emit_json(&output, true, None)?;
    } else {
        print_table(&rows);
        eprintln!(
            "{}: {} entries, {} calculation error(s) ({} high, {} medium, {} low); stated {} vs calculated {}",
            file_label(&file),
            summary.entries,
            errors,
            summary.high,
            summary.medium,
            summary.low,
            fmt_amount(summary.stated_total),
            fmt_amount(summary.calculated_total),
        );
    }

    if strict && errors > 0 {
        return Err(CliError::new(
            EXIT_FINDINGS,
            format!("{errors} row(s) with calculation errors"),
        ));
    }
    Ok(())
}

fn print_table(rows: &[ValidateRow]) {
    if rows.is_empty() {
        return;
    }
    println!(
        "{}  {}  {}  {}  {}  {}  {}",
        pad_right("id", 10),
        pad_right("description", 32),
        pad_left("stated", 14),
        pad_left("calculated", 14),
        pad_left("diff", 12),
        pad_left("diff %", 8),
        "severity"
    );
    for row in rows {
        let r = &row.result;
        println!(
            "{}  {}  {}  {}  {}  {}  {}",
            pad_right(&r.id, 10),
            pad_right(row.description, 32),
            pad_left(&fmt_amount(r.stated_total), 14),
            pad_left(&fmt_amount(r.calculated_total), 14),
            pad_left(&fmt_amount(r.difference), 12),
            pad_left(&format!("{:.2}", r.percent_diff), 8),
            match (r.has_calculation_error, r.severity) {
                (true, Some(s)) => s.to_string(),
                _ => "ok".to_string(),
            }
        );
    }
}
