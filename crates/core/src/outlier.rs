//! Batch-relative quantity outliers (mean + k·σ over positive quantities).

use serde::Serialize;

use crate::model::{EntryStatus, MeasurementEntry};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuantityStats {
    /// Number of positive quantities the statistics were computed over.
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    /// `mean + sigma * std_dev`; quantities strictly above it are outliers.
    pub threshold: f64,
}

impl QuantityStats {
    pub fn is_outlier(&self, quantity: f64) -> bool {
        self.count > 0 && quantity > self.threshold
    }
}

/// Mean and population standard deviation of the batch's positive
/// quantities. An empty (or all-zero) batch yields zeros.
pub fn quantity_stats(entries: &[MeasurementEntry], sigma: f64) -> QuantityStats {
    let positives: Vec<f64> = entries
        .iter()
        .map(|e| e.quantity)
        .filter(|q| *q > 0.0)
        .collect();

    if positives.is_empty() {
        return QuantityStats {
            count: 0,
            mean: 0.0,
            std_dev: 0.0,
            threshold: 0.0,
        };
    }

    let n = positives.len() as f64;
    let mean = positives.iter().sum::<f64>() / n;
    let variance = positives.iter().map(|q| (q - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    QuantityStats {
        count: positives.len(),
        mean,
        std_dev,
        threshold: mean + sigma * std_dev,
    }
}

/// Tag every entry whose quantity exceeds the batch threshold as
/// [`EntryStatus::Outlier`]. Returns the number of entries tagged.
pub fn tag_outliers(entries: &mut [MeasurementEntry], sigma: f64) -> usize {
    let stats = quantity_stats(entries, sigma);
    let mut tagged = 0;
    for entry in entries.iter_mut() {
        if stats.is_outlier(entry.quantity) {
            entry.status = EntryStatus::Outlier;
            tagged += 1;
        }
    }
    if tagged > 0 {
        log::info!(
            "tagged {tagged} outlier(s): quantity > {:.4} (mean {:.4}, sd {:.4})",
            stats.threshold,
            stats.mean,
            stats.std_dev
        );
    }
    tagged
}
