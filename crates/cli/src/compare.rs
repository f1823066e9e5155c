//! `medir compare`: period-over-period or table-over-table comparison.

use std::path::{Path, PathBuf};

use medir_core::{compare_catalog, compare_measurements, ComparisonKind, ComparisonResult, Settings};

use crate::util::{fmt_amount, fmt_percent, pad_left, pad_right};
use crate::{emit_json, file_label, import_options, load_measurements, CliError, KindArg};

fn side_label(explicit: Option<String>, path: &Path) -> Result<String, CliError> {
    match explicit {
        Some(label) if label.trim().is_empty() => {
            Err(CliError::args("labels must not be empty"))
        }
        Some(label) => Ok(label.trim().to_string()),
        None => Ok(file_label(path)),
    }
}

fn load_catalog(
    settings: &Settings,
    file: &Path,
    sheet: Option<String>,
) -> Result<Vec<medir_core::CatalogEntry>, CliError> {
    if !file.exists() {
        return Err(CliError::io(format!("{}: file not found", file.display())));
    }
    medir_io::import_catalog(file, &import_options(settings, sheet))
        .map(|import| import.entries)
        .map_err(|e| CliError::ingest(file, e))
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_compare(
    settings: &Settings,
    base: PathBuf,
    comparison: PathBuf,
    kind: KindArg,
    base_label: Option<String>,
    comparison_label: Option<String>,
    sheet: Option<String>,
    json: bool,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let base_label = side_label(base_label, &base)?;
    let comparison_label = side_label(comparison_label, &comparison)?;

    let result = match kind {
        KindArg::Tpu => {
            let b = load_catalog(settings, &base, sheet.clone())?;
            let c = load_catalog(settings, &comparison, sheet)?;
            compare_catalog(&b, &c, &base_label, &comparison_label, &settings.comparison)
        }
        KindArg::Medicao => {
            let b = load_measurements(settings, &base, sheet.clone())?.entries;
            let c = load_measurements(settings, &comparison, sheet)?.entries;
            compare_measurements(&b, &c, &base_label, &comparison_label, &settings.comparison)
        }
    };

    emit_json(&result, json, output.as_deref())?;

    if !json {
        print_table(&result);
    }
    print_summary(&result);
    Ok(())
}

fn print_table(result: &ComparisonResult) {
    let (left, right) = match result.kind {
        ComparisonKind::Catalog => ("base price", "new price"),
        ComparisonKind::Measurement => ("base qty", "new qty"),
    };
    println!(
        "{}  {}  {}  {}  {}  {}",
        pad_right("status", 9),
        pad_right("key", 12),
        pad_right("description", 32),
        pad_left(left, 14),
        pad_left(right, 14),
        pad_left("variation", 10),
    );
    for item in &result.items {
        let (b, c) = match result.kind {
            ComparisonKind::Catalog => (item.base_price, item.comparison_price),
            ComparisonKind::Measurement => (item.base_quantity, item.comparison_quantity),
        };
        let cell = |v: Option<f64>| v.map(fmt_amount).unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {}  {}  {}  {}  {}",
            pad_right(&item.status.to_string(), 9),
            pad_right(&item.key, 12),
            pad_right(&item.description, 32),
            pad_left(&cell(b), 14),
            pad_left(&cell(c), 14),
            pad_left(&fmt_percent(item.variation), 10),
        );
    }
}

fn print_summary(result: &ComparisonResult) {
    let s = &result.summary;
    eprintln!(
        "{} {} -> {}: {} items - {} increased, {} decreased, {} stable, {} new, {} removed",
        result.kind,
        result.base_label,
        result.comparison_label,
        s.total_items,
        s.increased_items,
        s.decreased_items,
        s.stable_items,
        s.new_items,
        s.removed_items,
    );
    eprintln!(
        "total: {} -> {} ({})",
        fmt_amount(s.base_total),
        fmt_amount(s.comparison_total),
        fmt_percent(s.overall_variation),
    );
    if let Some(ref item) = s.largest_increase {
        eprintln!("largest increase: {} {} ({})", item.key, item.description, fmt_percent(item.variation));
    }
    if let Some(ref item) = s.largest_decrease {
        eprintln!("largest decrease: {} {} ({})", item.key, item.description, fmt_percent(item.variation));
    }
}
