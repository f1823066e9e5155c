use std::collections::HashSet;

use medir_core::analysis::analyze_entries;
use medir_core::model::{AlertKind, ChangeStatus, EntryStatus};
use medir_core::outlier::tag_outliers;
use medir_core::validate::{validate_entries, ErrorSeverity};
use medir_core::{
    compare_catalog, compare_measurements, CatalogEntry, ComparisonKind, ComparisonSettings,
    MeasurementEntry, Settings,
};

fn tpu(code: &str, price: f64) -> CatalogEntry {
    CatalogEntry {
        code: code.into(),
        name: format!("Serviço {code}"),
        unit: "m2".into(),
        unit_price: price,
        origin: "SINAPI".into(),
        regime: "desonerado".into(),
        reference: "2025-06".into(),
    }
}

fn med(code: &str, description: &str, quantity: f64, unit_price: f64, total: f64) -> MeasurementEntry {
    let mut e = MeasurementEntry::new(format!("row-{code}"), quantity, unit_price, total);
    e.code = Some(code.into());
    e.description = description.into();
    e.unit = "m3".into();
    e.discipline = "Estrutura".into();
    e
}

// -------------------------------------------------------------------------
// Validator
// -------------------------------------------------------------------------

#[test]
fn calculation_error_example() {
    let settings = Settings::default();
    let rows = validate_entries(&[med("1", "Concreto", 10.0, 50.0, 600.0)], &settings.validation);
    let v = &rows[0];
    assert_eq!(v.calculated_total, 500.0);
    assert_eq!(v.difference, 100.0);
    assert!((v.percent_diff - 16.67).abs() < 0.01);
    assert!(v.has_calculation_error);
    assert_eq!(v.severity, Some(ErrorSeverity::High));
}

#[test]
fn placeholder_rows_are_never_errors() {
    let settings = Settings::default();
    let rows = validate_entries(
        &[
            med("1", "a", 999.0, 0.0, 10.0),
            med("2", "b", 999.0, 10.0, 0.0),
            med("3", "c", 0.0, 0.0, 0.0),
        ],
        &settings.validation,
    );
    assert!(rows.iter().all(|r| !r.has_calculation_error));
}

#[test]
fn outlier_batch_from_ingestion() {
    let mut batch: Vec<MeasurementEntry> = [10.0, 10.0, 10.0, 10.0, 1000.0]
        .iter()
        .enumerate()
        .map(|(i, q)| med(&i.to_string(), "x", *q, 1.0, *q))
        .collect();
    // mean 208, sd 396: 1000 stays below 208 + 3*396.
    assert_eq!(tag_outliers(&mut batch, 3.0), 0);

    let mut wide: Vec<MeasurementEntry> = (0..25)
        .map(|i| med(&i.to_string(), "x", if i == 24 { 1000.0 } else { 10.0 }, 1.0, 1.0))
        .collect();
    assert_eq!(tag_outliers(&mut wide, 3.0), 1);
    assert_eq!(wide[24].status, EntryStatus::Outlier);
}

// -------------------------------------------------------------------------
// Comparator
// -------------------------------------------------------------------------

#[test]
fn catalog_example_scenario() {
    let base = vec![tpu("A", 100.0)];
    let comparison = vec![tpu("A", 110.0), tpu("B", 50.0)];
    let result = compare_catalog(&base, &comparison, "TPU 2024", "TPU 2025", &ComparisonSettings::default());

    assert_eq!(result.kind, ComparisonKind::Catalog);
    assert_eq!(result.base_label, "TPU 2024");
    assert_eq!(result.comparison_label, "TPU 2025");

    let a = result.items.iter().find(|i| i.key == "A").unwrap();
    assert_eq!(a.price_variation, Some(10.0));
    assert_eq!(a.status, ChangeStatus::Increased);
    let b = result.items.iter().find(|i| i.key == "B").unwrap();
    assert_eq!(b.status, ChangeStatus::New);

    assert_eq!(result.summary.new_items, 1);
    assert_eq!(result.summary.increased_items, 1);
    assert_eq!(result.summary.removed_items, 0);
    assert_eq!(result.summary.largest_increase.as_ref().unwrap().key, "A");
    assert!(result.summary.largest_decrease.is_none());
}

#[test]
fn self_comparison_is_all_stable() {
    let rows = vec![
        med("1.1", "Escavação", 120.0, 15.0, 1800.0),
        med("1.2", "Aterro", 80.0, 12.0, 960.0),
        med("1.1", "Escavação", 30.0, 15.0, 450.0),
        med("2.1", "Concreto", 0.0, 450.0, 0.0),
    ];
    let result = compare_measurements(&rows, &rows, "Medição 01", "Medição 01", &ComparisonSettings::default());

    assert_eq!(result.summary.new_items, 0);
    assert_eq!(result.summary.removed_items, 0);
    assert_eq!(result.summary.stable_items, result.items.len());
    for item in &result.items {
        assert_eq!(item.status, ChangeStatus::Stable);
        assert_eq!(item.quantity_difference, Some(0.0));
        assert_eq!(item.total_difference, Some(0.0));
        assert_eq!(item.price_difference, Some(0.0));
    }
}

#[test]
fn classification_covers_union_of_keys() {
    let base = vec![tpu("A", 10.0), tpu("B", 10.0), tpu("C", 10.0)];
    let comparison = vec![tpu("B", 12.0), tpu("C", 9.0), tpu("D", 1.0), tpu("E", 1.0)];
    let result = compare_catalog(&base, &comparison, "a", "b", &ComparisonSettings::default());

    let keys: Vec<&str> = result.items.iter().map(|i| i.key.as_str()).collect();
    let unique: HashSet<&str> = keys.iter().copied().collect();
    assert_eq!(keys.len(), unique.len());
    assert_eq!(unique, HashSet::from(["A", "B", "C", "D", "E"]));

    let s = &result.summary;
    assert_eq!(
        s.new_items + s.removed_items + s.increased_items + s.decreased_items + s.stable_items,
        5
    );
    assert_eq!(s.removed_items, 1);
    assert_eq!(s.new_items, 2);
    assert_eq!(s.largest_decrease.as_ref().unwrap().key, "C");
}

#[test]
fn threshold_boundary() {
    let base = vec![tpu("EXACT", 100.0), tpu("OVER", 100.0), tpu("UNDER", 100.0)];
    let comparison = vec![tpu("EXACT", 100.5), tpu("OVER", 100.51), tpu("UNDER", 99.49)];
    let result = compare_catalog(&base, &comparison, "a", "b", &ComparisonSettings::default());
    let status = |k: &str| result.items.iter().find(|i| i.key == k).unwrap().status;
    assert_eq!(status("EXACT"), ChangeStatus::Stable);
    assert_eq!(status("OVER"), ChangeStatus::Increased);
    assert_eq!(status("UNDER"), ChangeStatus::Decreased);
}

#[test]
fn measurement_periods_end_to_end() {
    let period_1 = vec![
        med("1.1", "Escavação", 100.0, 15.0, 1500.0),
        med("1.2", "Aterro", 50.0, 12.0, 600.0),
        med("2.1", "Forma", 30.0, 80.0, 2400.0),
    ];
    let period_2 = vec![
        med("1.1", "Escavação", 150.0, 15.0, 2250.0),
        med("1.2", "Aterro", 40.0, 12.0, 480.0),
        med("3.1", "Armação", 500.0, 9.0, 4500.0),
    ];
    let result = compare_measurements(&period_1, &period_2, "Medição 01", "Medição 02", &ComparisonSettings::default());

    assert_eq!(result.kind, ComparisonKind::Measurement);
    let keys: Vec<&str> = result.items.iter().map(|i| i.key.as_str()).collect();
    // 50% up, 20% down, then new/removed in union order.
    assert_eq!(keys, vec!["1.1", "1.2", "2.1", "3.1"]);
    assert_eq!(result.items[0].status, ChangeStatus::Increased);
    assert_eq!(result.items[1].status, ChangeStatus::Decreased);
    assert_eq!(result.items[2].status, ChangeStatus::Removed);
    assert_eq!(result.items[3].status, ChangeStatus::New);

    assert_eq!(result.summary.base_total, 4500.0);
    assert_eq!(result.summary.comparison_total, 7230.0);
    let overall = result.summary.overall_variation.unwrap();
    assert!((overall - 60.666_666).abs() < 1e-3);
}

#[test]
fn comparison_result_serializes_with_dashboard_statuses() {
    let result = compare_catalog(&[tpu("A", 1.0)], &[tpu("B", 1.0)], "a", "b", &ComparisonSettings::default());
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["kind"], "tpu");
    assert_eq!(json["items"][0]["status"], "removido");
    assert_eq!(json["items"][1]["status"], "novo");
    assert!(json["items"][0]["quantity_variation"].is_null());
}

// -------------------------------------------------------------------------
// Analysis
// -------------------------------------------------------------------------

#[test]
fn analysis_flags_each_kind() {
    let mut rows = vec![
        med("1", "Concreto", 10.0, 50.0, 600.0),
        med("2", "", 1.0, 1.0, 1.0),
        med("1", "Concreto", 1.0, 1.0, 1.0),
        med("3", "Aço", -1.0, 1.0, 1.0),
    ];
    rows[3].unit = "kg".into();
    let report = analyze_entries(&rows, &Settings::default().validation);
    let kinds: HashSet<AlertKind> = report.alerts.iter().map(|a| a.kind).collect();
    assert_eq!(
        kinds,
        HashSet::from([
            AlertKind::Calculation,
            AlertKind::Missing,
            AlertKind::Duplicate,
            AlertKind::Inconsistent
        ])
    );
    let rows_with_alerts: Vec<usize> = report.alerts.iter().map(|a| a.row).collect();
    let mut sorted = rows_with_alerts.clone();
    sorted.sort();
    assert_eq!(rows_with_alerts, sorted);
}
