use serde::{Deserialize, Serialize};

use crate::error::MedirError;

/// Relative difference (in percent) below which stated and calculated totals
/// are considered equal. Absorbs floating-point rounding.
pub const DEFAULT_TOLERANCE_PERCENT: f64 = 0.01;

/// Standard deviations above the batch mean that make a quantity an outlier.
pub const DEFAULT_OUTLIER_SIGMA: f64 = 3.0;

/// Variations with magnitude at or below this percentage are `estavel`.
pub const DEFAULT_STABLE_THRESHOLD_PERCENT: f64 = 0.5;

// ---------------------------------------------------------------------------
// Top-level settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub validation: ValidationSettings,
    #[serde(default)]
    pub comparison: ComparisonSettings,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationSettings {
    #[serde(default = "default_tolerance")]
    pub tolerance_percent: f64,
    #[serde(default = "default_sigma")]
    pub outlier_sigma: f64,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            tolerance_percent: DEFAULT_TOLERANCE_PERCENT,
            outlier_sigma: DEFAULT_OUTLIER_SIGMA,
        }
    }
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE_PERCENT
}

fn default_sigma() -> f64 {
    DEFAULT_OUTLIER_SIGMA
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// How the unit price of a measurement key is chosen when the same key
/// appears on several rows of one period. Quantities and totals are always
/// summed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitPricePolicy {
    /// Keep the unit price of the first row seen for the key.
    #[default]
    FirstWins,
    /// Keep the unit price of the last row seen for the key.
    LastWins,
    /// Quantity-weighted average of the rows' unit prices. Falls back to
    /// first-wins when the summed quantity is zero.
    WeightedAverage,
}

impl std::fmt::Display for UnitPricePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FirstWins => write!(f, "first_wins"),
            Self::LastWins => write!(f, "last_wins"),
            Self::WeightedAverage => write!(f, "weighted_average"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComparisonSettings {
    #[serde(default = "default_stable_threshold")]
    pub stable_threshold_percent: f64,
    #[serde(default)]
    pub unit_price_policy: UnitPricePolicy,
}

impl Default for ComparisonSettings {
    fn default() -> Self {
        Self {
            stable_threshold_percent: DEFAULT_STABLE_THRESHOLD_PERCENT,
            unit_price_policy: UnitPricePolicy::FirstWins,
        }
    }
}

fn default_stable_threshold() -> f64 {
    DEFAULT_STABLE_THRESHOLD_PERCENT
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl Settings {
    pub fn from_toml(input: &str) -> Result<Self, MedirError> {
        let settings: Settings =
            toml::from_str(input).map_err(|e| MedirError::ConfigParse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &std::path::Path) -> Result<Self, MedirError> {
        let input = std::fs::read_to_string(path)
            .map_err(|e| MedirError::Io(format!("cannot read {}: {e}", path.display())))?;
        log::debug!("loading settings from {}", path.display());
        Self::from_toml(&input)
    }

    pub fn to_toml(&self) -> Result<String, MedirError> {
        toml::to_string_pretty(self).map_err(|e| MedirError::ConfigParse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), MedirError> {
        let v = &self.validation;
        if !v.tolerance_percent.is_finite() || v.tolerance_percent < 0.0 {
            return Err(MedirError::ConfigValidation(format!(
                "validation.tolerance_percent must be >= 0, got {}",
                v.tolerance_percent
            )));
        }
        if !v.outlier_sigma.is_finite() || v.outlier_sigma <= 0.0 {
            return Err(MedirError::ConfigValidation(format!(
                "validation.outlier_sigma must be > 0, got {}",
                v.outlier_sigma
            )));
        }

        let c = &self.comparison;
        if !c.stable_threshold_percent.is_finite() || c.stable_threshold_percent < 0.0 {
            return Err(MedirError::ConfigValidation(format!(
                "comparison.stable_threshold_percent must be >= 0, got {}",
                c.stable_threshold_percent
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_uses_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.validation.tolerance_percent, 0.01);
        assert_eq!(settings.validation.outlier_sigma, 3.0);
        assert_eq!(settings.comparison.stable_threshold_percent, 0.5);
        assert_eq!(settings.comparison.unit_price_policy, UnitPricePolicy::FirstWins);
    }

    #[test]
    fn parse_full_settings() {
        let input = r#"
[validation]
tolerance_percent = 0.5
outlier_sigma = 2.5

[comparison]
stable_threshold_percent = 1.0
unit_price_policy = "weighted_average"
"#;
        let settings = Settings::from_toml(input).unwrap();
        assert_eq!(settings.validation.tolerance_percent, 0.5);
        assert_eq!(settings.validation.outlier_sigma, 2.5);
        assert_eq!(settings.comparison.stable_threshold_percent, 1.0);
        assert_eq!(
            settings.comparison.unit_price_policy,
            UnitPricePolicy::WeightedAverage
        );
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let input = r#"
[comparison]
unit_price_policy = "last_wins"
"#;
        let settings = Settings::from_toml(input).unwrap();
        assert_eq!(settings.comparison.stable_threshold_percent, 0.5);
        assert_eq!(settings.validation, ValidationSettings::default());
    }

    #[test]
    fn reject_unknown_policy() {
        let input = r#"
[comparison]
unit_price_policy = "average"
"#;
        let err = Settings::from_toml(input).unwrap_err();
        assert!(matches!(err, MedirError::ConfigParse(_)));
    }

    #[test]
    fn reject_unknown_key() {
        let err = Settings::from_toml("[validation]\ntolerance = 1.0\n").unwrap_err();
        assert!(matches!(err, MedirError::ConfigParse(_)));
    }

    #[test]
    fn reject_negative_tolerance() {
        let err = Settings::from_toml("[validation]\ntolerance_percent = -1.0\n").unwrap_err();
        assert!(err.to_string().contains("tolerance_percent"));
    }

    #[test]
    fn reject_zero_sigma() {
        let err = Settings::from_toml("[validation]\noutlier_sigma = 0.0\n").unwrap_err();
        assert!(err.to_string().contains("outlier_sigma"));
    }

    #[test]
    fn toml_round_trip_of_defaults() {
        let text = Settings::default().to_toml().unwrap();
        assert!(text.contains("unit_price_policy = \"first_wins\""));
        assert_eq!(Settings::from_toml(&text).unwrap(), Settings::default());
    }
}
