use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Review status of a measurement line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    #[default]
    Normal,
    Outlier,
    Pending,
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Outlier => write!(f, "outlier"),
            Self::Pending => write!(f, "pending"),
        }
    }
}

/// One line item of a measurement period.
///
/// `quantity`, `unit_price` and `stated_total` are supplied independently;
/// nothing here enforces `stated_total == quantity * unit_price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub discipline: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub responsible: String,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub unit_price: f64,
    #[serde(default)]
    pub stated_total: f64,
    /// ISO `YYYY-MM-DD`, empty when the source had no usable date.
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub status: EntryStatus,
}

impl MeasurementEntry {
    /// Minimal entry with every label blank. Mostly useful for callers that
    /// fill the record field by field.
    pub fn new(id: impl Into<String>, quantity: f64, unit_price: f64, stated_total: f64) -> Self {
        Self {
            id: id.into(),
            code: None,
            description: String::new(),
            discipline: String::new(),
            location: String::new(),
            responsible: String::new(),
            quantity,
            unit: String::new(),
            unit_price,
            stated_total,
            date: String::new(),
            status: EntryStatus::Normal,
        }
    }

    /// Join key: trimmed code, or trimmed description when the code is blank.
    pub fn key(&self) -> String {
        match self.code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => code.to_string(),
            _ => self.description.trim().to_string(),
        }
    }
}

/// One priced item of a unit-price reference table (TPU).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub unit_price: f64,
    /// Source table the price was taken from (e.g. "SINAPI").
    #[serde(default)]
    pub origin: String,
    /// Pricing regime tag (e.g. "desonerado").
    #[serde(default)]
    pub regime: String,
    /// Reference date or table version.
    #[serde(default)]
    pub reference: String,
}

impl CatalogEntry {
    pub fn key(&self) -> String {
        self.code.trim().to_string()
    }
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonKind {
    /// Unit-price catalog vs. catalog.
    #[serde(rename = "tpu")]
    Catalog,
    /// Measurement period vs. measurement period.
    #[serde(rename = "medicao")]
    Measurement,
}

impl std::fmt::Display for ComparisonKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Catalog => write!(f, "tpu"),
            Self::Measurement => write!(f, "medicao"),
        }
    }
}

/// Change status of one aligned key. Wire names are the dashboard's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeStatus {
    #[serde(rename = "novo")]
    New,
    #[serde(rename = "removido")]
    Removed,
    #[serde(rename = "aumentou")]
    Increased,
    #[serde(rename = "diminuiu")]
    Decreased,
    #[serde(rename = "estavel")]
    Stable,
}

impl std::fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "novo"),
            Self::Removed => write!(f, "removido"),
            Self::Increased => write!(f, "aumentou"),
            Self::Decreased => write!(f, "diminuiu"),
            Self::Stable => write!(f, "estavel"),
        }
    }
}

/// One key aligned across the base and comparison collections.
///
/// Values that do not exist for the entry shape (quantity on a catalog
/// entry) or for the side (base values of a `novo` item) are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonItem {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub description: String,
    pub unit: String,
    pub base_price: Option<f64>,
    pub comparison_price: Option<f64>,
    pub base_quantity: Option<f64>,
    pub comparison_quantity: Option<f64>,
    pub base_total: Option<f64>,
    pub comparison_total: Option<f64>,
    pub price_variation: Option<f64>,
    pub quantity_variation: Option<f64>,
    pub total_variation: Option<f64>,
    pub price_difference: Option<f64>,
    pub quantity_difference: Option<f64>,
    pub total_difference: Option<f64>,
    pub status: ChangeStatus,
    /// Variation that decided `status` (price for catalogs, quantity or
    /// total for measurements).
    pub variation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSummary {
    pub total_items: usize,
    pub new_items: usize,
    pub removed_items: usize,
    pub increased_items: usize,
    pub decreased_items: usize,
    pub stable_items: usize,
    pub base_total: f64,
    pub comparison_total: f64,
    pub overall_variation: Option<f64>,
    pub largest_increase: Option<ComparisonItem>,
    pub largest_decrease: Option<ComparisonItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub kind: ComparisonKind,
    pub base_label: String,
    pub comparison_label: String,
    pub items: Vec<ComparisonItem>,
    pub summary: ComparisonSummary,
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Calculation,
    Inconsistent,
    Duplicate,
    Missing,
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Calculation => write!(f, "calculation"),
            Self::Inconsistent => write!(f, "inconsistent"),
            Self::Duplicate => write!(f, "duplicate"),
            Self::Missing => write!(f, "missing"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A flagged problem on one row (and optionally one column) of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellAlert {
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
}
