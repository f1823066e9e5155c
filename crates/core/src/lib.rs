//! `medir-core` — measurement validation and period comparison engine.
//!
//! Pure engine crate: receives parsed measurement or catalog entries, returns
//! validated rows, alerts, rollups and comparison results. No CLI or IO
//! dependencies.

pub mod analysis;
pub mod compare;
pub mod config;
pub mod error;
pub mod fold;
pub mod model;
pub mod outlier;
pub mod rollup;
pub mod summary;
pub mod validate;

pub use compare::{compare_catalog, compare_measurements, compare_with, Accessors};
pub use config::{ComparisonSettings, Settings, UnitPricePolicy, ValidationSettings};
pub use error::MedirError;
pub use model::{
    CatalogEntry, ChangeStatus, ComparisonItem, ComparisonKind, ComparisonResult,
    ComparisonSummary, EntryStatus, MeasurementEntry,
};
