// ============================================================
// PIPELINE CONFIGURATION
// ============================================================
// Tunables for the cleaner and the anomaly detector

use serde::{Deserialize, Serialize};

/// Which columns the forward-fill step touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPolicy {
    /// Fill every column, including `Date`, `Amount` and `Qty`.
    /// A malformed required value inherits the previous row's value.
    #[default]
    Uniform,

    /// Fill every column except `Date`, `Amount` and `Qty`.
    RequiredFieldsExcluded,
}

/// What happens to rows whose required fields are null after coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResidualNullPolicy {
    /// Drop them so every cleaned row satisfies the completeness invariant.
    #[default]
    Drop,

    /// Keep them with null cells.
    Keep,
}

/// Configuration for the cleaner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    pub fill_policy: FillPolicy,
    pub residual_nulls: ResidualNullPolicy,
}

impl CleaningConfig {
    /// Uniform fill and no re-drop after coercion.
    pub fn reference() -> Self {
        Self {
            fill_policy: FillPolicy::Uniform,
            residual_nulls: ResidualNullPolicy::Keep,
        }
    }
}

/// Random source for the isolation forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedPolicy {
    /// Reproducible runs
    Fixed(u64),

    /// Seed from OS entropy on every fit
    Entropy,
}

impl Default for SeedPolicy {
    fn default() -> Self {
        SeedPolicy::Fixed(42)
    }
}

/// Configuration for the anomaly detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Expected fraction of outliers (default: 0.01)
    pub contamination: f64,

    /// Number of isolation trees (default: 100)
    pub n_estimators: usize,

    /// Rows drawn per tree, capped at the table size (default: 256)
    pub max_samples: usize,

    pub seed: SeedPolicy,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            contamination: 0.01,
            n_estimators: 100,
            max_samples: 256,
            seed: SeedPolicy::default(),
        }
    }
}

impl AnomalyConfig {
    pub fn with_contamination(mut self, contamination: f64) -> Self {
        self.contamination = contamination;
        self
    }

    pub fn with_seed(mut self, seed: SeedPolicy) -> Self {
        self.seed = seed;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err("contamination must be in (0.0, 0.5]".to_string());
        }
        if self.n_estimators == 0 {
            return Err("n_estimators must be > 0".to_string());
        }
        if self.max_samples < 2 {
            return Err("max_samples must be >= 2".to_string());
        }
        Ok(())
    }
}
