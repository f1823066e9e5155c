//! Period comparator: aligns two collections by key and classifies each key.
//!
//! One skeleton serves both entry shapes. What differs between a catalog
//! comparison and a measurement comparison lives in [`Accessors`]: which
//! fields exist, how duplicates fold, and which variation drives the status.

use crate::config::{ComparisonSettings, UnitPricePolicy};
use crate::fold::{fold_entries, FoldPolicy, FoldedEntry};
use crate::model::{
    CatalogEntry, ChangeStatus, ComparisonItem, ComparisonKind, ComparisonResult,
    MeasurementEntry,
};
use crate::summary::compute_summary;

// ---------------------------------------------------------------------------
// Changes
// ---------------------------------------------------------------------------

/// Percentage change from `base` to `comparison`.
///
/// `None` when either side is missing, or when only the base is zero.
/// Two zeros are no change.
pub fn percent_change(base: Option<f64>, comparison: Option<f64>) -> Option<f64> {
    let (b, c) = (base?, comparison?);
    if b == 0.0 {
        return if c == 0.0 { Some(0.0) } else { None };
    }
    Some((c - b) * 100.0 / b.abs())
}

/// Signed difference and percentage change of one numeric field.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Change {
    pub percent: Option<f64>,
    pub difference: Option<f64>,
}

impl Change {
    pub fn between(base: Option<f64>, comparison: Option<f64>) -> Self {
        Self {
            percent: percent_change(base, comparison),
            difference: base.zip(comparison).map(|(b, c)| c - b),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Changes {
    pub price: Change,
    pub quantity: Change,
    pub total: Change,
}

/// Status of a key present on both sides.
///
/// Within `threshold` percent (inclusive) is stable. When the percentage is
/// unavailable because the base value was zero, the sign of the difference
/// decides.
pub fn classify_change(change: &Change, threshold: f64) -> ChangeStatus {
    match change.percent {
        Some(p) if p.abs() <= threshold => ChangeStatus::Stable,
        Some(p) if p > 0.0 => ChangeStatus::Increased,
        Some(_) => ChangeStatus::Decreased,
        None => match change.difference {
            Some(d) if d > 0.0 => ChangeStatus::Increased,
            Some(d) if d < 0.0 => ChangeStatus::Decreased,
            _ => ChangeStatus::Stable,
        },
    }
}

// ---------------------------------------------------------------------------
// Accessors
// ---------------------------------------------------------------------------

/// Field accessors and policies that adapt [`compare_with`] to an entry shape.
pub struct Accessors<T> {
    pub kind: ComparisonKind,
    pub key: fn(&T) -> String,
    pub code: fn(&T) -> Option<String>,
    pub description: fn(&T) -> &str,
    pub unit: fn(&T) -> &str,
    pub price: fn(&T) -> Option<f64>,
    pub quantity: fn(&T) -> Option<f64>,
    pub total: fn(&T) -> Option<f64>,
    /// Value summed over the raw input collections for the summary totals.
    pub aggregate: fn(&T) -> f64,
    /// Picks the change that decides the status and the sort order.
    pub driver: fn(&Changes) -> Change,
    pub fold: FoldPolicy,
}

impl Accessors<CatalogEntry> {
    /// Unit-price tables: keyed by code, last duplicate wins, status driven
    /// by unit-price change.
    pub fn catalog() -> Self {
        Self {
            kind: ComparisonKind::Catalog,
            key: CatalogEntry::key,
            code: |e| Some(e.code.trim().to_string()).filter(|c| !c.is_empty()),
            description: |e| e.name.as_str(),
            unit: |e| e.unit.as_str(),
            price: |e| Some(e.unit_price),
            quantity: |_| None,
            total: |_| None,
            aggregate: |e| e.unit_price,
            driver: |c| c.price,
            fold: FoldPolicy::LastWins,
        }
    }
}

impl Accessors<MeasurementEntry> {
    /// Measurement periods: keyed by code (description fallback), duplicates
    /// summed, status driven by quantity change and then total change.
    pub fn measurement(policy: UnitPricePolicy) -> Self {
        Self {
            kind: ComparisonKind::Measurement,
            key: MeasurementEntry::key,
            code: |e| {
                e.code
                    .as_deref()
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
            },
            description: |e| e.description.as_str(),
            unit: |e| e.unit.as_str(),
            price: |e| Some(e.unit_price),
            quantity: |e| Some(e.quantity),
            total: |e| Some(e.stated_total),
            aggregate: |e| e.stated_total,
            driver: |c| {
                if c.quantity.percent.is_some() {
                    c.quantity
                } else if c.total.percent.is_some() {
                    c.total
                } else {
                    c.quantity
                }
            },
            fold: FoldPolicy::Sum(policy),
        }
    }
}

// ---------------------------------------------------------------------------
// Compare
// ---------------------------------------------------------------------------

pub fn compare_catalog(
    base: &[CatalogEntry],
    comparison: &[CatalogEntry],
    base_label: &str,
    comparison_label: &str,
    settings: &ComparisonSettings,
) -> ComparisonResult {
    compare_with(
        &Accessors::catalog(),
        base,
        comparison,
        base_label,
        comparison_label,
        settings,
    )
}

pub fn compare_measurements(
    base: &[MeasurementEntry],
    comparison: &[MeasurementEntry],
    base_label: &str,
    comparison_label: &str,
    settings: &ComparisonSettings,
) -> ComparisonResult {
    compare_with(
        &Accessors::measurement(settings.unit_price_policy),
        base,
        comparison,
        base_label,
        comparison_label,
        settings,
    )
}

/// Align `base` and `comparison` by key, classify each key and summarize.
///
/// Never fails: values a shape does not carry come out as `None`.
pub fn compare_with<T>(
    acc: &Accessors<T>,
    base: &[T],
    comparison: &[T],
    base_label: &str,
    comparison_label: &str,
    settings: &ComparisonSettings,
) -> ComparisonResult {
    let base_fold = fold_entries(base, acc);
    let comparison_fold = fold_entries(comparison, acc);

    // Union of keys: base order first, then keys new in the comparison.
    let keys: Vec<&str> = base_fold
        .keys()
        .chain(comparison_fold.keys().filter(|k| !base_fold.contains(k)))
        .collect();

    let threshold = settings.stable_threshold_percent;
    let mut items: Vec<ComparisonItem> = keys
        .into_iter()
        .map(|key| align(acc, key, base_fold.get(key), comparison_fold.get(key), threshold))
        .collect();

    // Stable: equal magnitudes keep union order.
    items.sort_by(|a, b| magnitude(b).total_cmp(&magnitude(a)));

    let base_total: f64 = base.iter().map(acc.aggregate).sum();
    let comparison_total: f64 = comparison.iter().map(acc.aggregate).sum();
    let summary = compute_summary(&items, base_total, comparison_total);

    log::info!(
        "{} comparison '{}' vs '{}': {} keys ({} new, {} removed, {} up, {} down, {} stable)",
        acc.kind,
        base_label,
        comparison_label,
        summary.total_items,
        summary.new_items,
        summary.removed_items,
        summary.increased_items,
        summary.decreased_items,
        summary.stable_items,
    );

    ComparisonResult {
        kind: acc.kind,
        base_label: base_label.to_string(),
        comparison_label: comparison_label.to_string(),
        items,
        summary,
    }
}

fn align<T>(
    acc: &Accessors<T>,
    key: &str,
    base: Option<&FoldedEntry<'_, T>>,
    comparison: Option<&FoldedEntry<'_, T>>,
    threshold: f64,
) -> ComparisonItem {
    // Labels come from the most recent side.
    let labels = comparison.or(base).map(|f| f.entry);

    let changes = Changes {
        price: Change::between(base.and_then(|b| b.price), comparison.and_then(|c| c.price)),
        quantity: Change::between(
            base.and_then(|b| b.quantity),
            comparison.and_then(|c| c.quantity),
        ),
        total: Change::between(base.and_then(|b| b.total), comparison.and_then(|c| c.total)),
    };

    let (status, driving) = match (base, comparison) {
        (Some(_), Some(_)) => {
            let driving = (acc.driver)(&changes);
            (classify_change(&driving, threshold), driving)
        }
        (Some(_), None) => (ChangeStatus::Removed, Change::default()),
        _ => (ChangeStatus::New, Change::default()),
    };

    ComparisonItem {
        key: key.to_string(),
        code: labels.and_then(acc.code),
        description: labels.map(acc.description).unwrap_or_default().to_string(),
        unit: labels.map(acc.unit).unwrap_or_default().to_string(),
        base_price: base.and_then(|b| b.price),
        comparison_price: comparison.and_then(|c| c.price),
        base_quantity: base.and_then(|b| b.quantity),
        comparison_quantity: comparison.and_then(|c| c.quantity),
        base_total: base.and_then(|b| b.total),
        comparison_total: comparison.and_then(|c| c.total),
        price_variation: changes.price.percent,
        quantity_variation: changes.quantity.percent,
        total_variation: changes.total.percent,
        price_difference: changes.price.difference,
        quantity_difference: changes.quantity.difference,
        total_difference: changes.total.difference,
        status,
        variation: driving.percent,
    }
}

/// Signed ordering value of an item's driving variation. A change away from
/// a zero base has no percentage and ranks beyond every finite one.
pub(crate) fn signed_rank(item: &ComparisonItem) -> f64 {
    match (item.variation, item.status) {
        (Some(v), _) => v,
        (None, ChangeStatus::Increased) => f64::INFINITY,
        (None, ChangeStatus::Decreased) => f64::NEG_INFINITY,
        (None, _) => 0.0,
    }
}

fn magnitude(item: &ComparisonItem) -> f64 {
    signed_rank(item).abs()
}
