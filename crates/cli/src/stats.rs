//! `medir stats`: grouped totals for one batch.

use std::path::PathBuf;

use serde::Serialize;

use medir_core::rollup::{batch_overview, rollup, BatchOverview, GroupBy, RollupRow};
use medir_core::Settings;

use crate::util::{fmt_amount, pad_left, pad_right};
use crate::{emit_json, file_label, load_measurements, CliError, GroupArg};

#[derive(Serialize)]
struct StatsOutput {
    file: String,
    group_by: GroupBy,
    overview: BatchOverview,
    groups: Vec<RollupRow>,
}

fn to_group_by(arg: GroupArg) -> GroupBy {
    match arg {
        GroupArg::Discipline => GroupBy::Discipline,
        GroupArg::Location => GroupBy::Location,
        GroupArg::Responsible => GroupBy::Responsible,
    }
}

pub fn cmd_stats(
    settings: &Settings,
    file: PathBuf,
    by: GroupArg,
    json: bool,
    sheet: Option<String>,
) -> Result<(), CliError> {
    let import = load_measurements(settings, &file, sheet)?;
    let group_by = to_group_by(by);
    let groups = rollup(&import.entries, group_by, &settings.validation);
    let overview = batch_overview(&import.entries, &settings.validation);

    if json {
        return emit_json(
            &StatsOutput {
                file: file_label(&file),
                group_by,
                overview,
                groups,
            },
            true,
            None,
        );
    }

    println!(
        "{}  {}  {}  {}  {}  {}",
        pad_right(&group_by.to_string(), 24),
        pad_left("entries", 7),
        pad_left("quantity", 12),
        pad_left("value", 16),
        pad_left("outliers", 8),
        pad_left("errors", 6),
    );
    for g in &groups {
        println!(
            "{}  {}  {}  {}  {}  {}",
            pad_right(&g.group, 24),
            pad_left(&g.entries.to_string(), 7),
            pad_left(&fmt_amount(g.total_quantity), 12),
            pad_left(&fmt_amount(g.total_value), 16),
            pad_left(&g.outliers.to_string(), 8),
            pad_left(&g.calculation_errors.to_string(), 6),
        );
    }
    eprintln!(
        "{}: {} entries in {} group(s), total {} ({} calculation error(s), {} outlier(s), {} pending)",
        file_label(&file),
        overview.entries,
        groups.len(),
        fmt_amount(overview.total_value),
        overview.calculation_errors,
        overview.outliers,
        overview.pending,
    );
    Ok(())
}
