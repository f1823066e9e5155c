//! `medir analyze`: cell-level alerts plus the batch overview.

use std::path::PathBuf;

use serde::Serialize;

use medir_core::analysis::{analyze_entries, AnalysisReport};
use medir_core::model::AlertSeverity;
use medir_core::outlier::QuantityStats;
use medir_core::rollup::{batch_overview, BatchOverview};
use medir_core::Settings;
use medir_io::ColumnMap;

use crate::exit_codes::EXIT_FINDINGS;
use crate::util::{pad_right, truncate_display};
use crate::{emit_json, file_label, load_measurements, CliError};

#[derive(Serialize)]
struct AnalyzeOutput<'a> {
    file: String,
    mapping: &'a ColumnMap,
    skipped_rows: usize,
    quantity_stats: QuantityStats,
    overview: BatchOverview,
    report: AnalysisReport,
}

pub fn cmd_analyze(
    settings: &Settings,
    file: PathBuf,
    json: bool,
    sheet: Option<String>,
    strict: bool,
) -> Result<(), CliError> {
    let import = load_measurements(settings, &file, sheet)?;
    let report = analyze_entries(&import.entries, &settings.validation);
    let overview = batch_overview(&import.entries, &settings.validation);
    let error_count = report.count(AlertSeverity::Error);

    if json {
        let output = AnalyzeOutput {
            file: file_label(&file),
            mapping: &import.mapping,
            skipped_rows: import.skipped_rows,
            quantity_stats: import.stats,
            overview,
            report,
        };
        emit_json(&output, true, None)?;
    } else {
        for alert in &report.alerts {
            let id = import
                .entries
                .get(alert.row)
                .map(|e| e.id.as_str())
                .unwrap_or("?");
            println!(
                "{}  {}  {}  {}  {}",
                pad_right(id, 10),
                pad_right(&alert.severity.to_string(), 7),
                pad_right(&alert.kind.to_string(), 12),
                pad_right(alert.column.as_deref().unwrap_or("-"), 12),
                truncate_display(&alert.message, 80),
            );
        }
        eprintln!(
            "{}: {} rows, {} alert(s): {} error, {} warning, {} info; {} outlier(s), {} pending",
            file_label(&file),
            report.rows_analyzed,
            report.alerts.len(),
            error_count,
            report.count(AlertSeverity::Warning),
            report.count(AlertSeverity::Info),
            overview.outliers,
            overview.pending,
        );
    }

    if strict && error_count > 0 {
        return Err(CliError::new(
            EXIT_FINDINGS,
            format!("{error_count} error-level alert(s)"),
        ));
    }
    Ok(())
}
