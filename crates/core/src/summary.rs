use crate::compare::{percent_change, signed_rank};
use crate::model::{ChangeStatus, ComparisonItem, ComparisonSummary};

/// Roll classified items up into per-status counts, overall totals and the
/// extreme movers. `items` must already be in display order: ties for the
/// largest increase or decrease go to the first item encountered.
pub fn compute_summary(
    items: &[ComparisonItem],
    base_total: f64,
    comparison_total: f64,
) -> ComparisonSummary {
    let mut new_items = 0;
    let mut removed_items = 0;
    let mut increased_items = 0;
    let mut decreased_items = 0;
    let mut stable_items = 0;
    let mut largest_increase: Option<&ComparisonItem> = None;
    let mut largest_decrease: Option<&ComparisonItem> = None;

    for item in items {
        match item.status {
            ChangeStatus::New => new_items += 1,
            ChangeStatus::Removed => removed_items += 1,
            ChangeStatus::Stable => stable_items += 1,
            ChangeStatus::Increased => {
                increased_items += 1;
                if largest_increase.map_or(true, |best| signed_rank(item) > signed_rank(best)) {
                    largest_increase = Some(item);
                }
            }
            ChangeStatus::Decreased => {
                decreased_items += 1;
                if largest_decrease.map_or(true, |best| signed_rank(item) < signed_rank(best)) {
                    largest_decrease = Some(item);
                }
            }
        }
    }

    ComparisonSummary {
        total_items: items.len(),
        new_items,
        removed_items,
        increased_items,
        decreased_items,
        stable_items,
        base_total,
        comparison_total,
        overall_variation: percent_change(Some(base_total), Some(comparison_total)),
        largest_increase: largest_increase.cloned(),
        largest_decrease: largest_decrease.cloned(),
    }
}
