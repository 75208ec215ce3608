use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::FlowError;
use crate::view::{ViewKind, ViewLabels, ViewSpec};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct FlowConfig {
    pub name: String,
    /// JSON record store, relative to the config file.
    pub data: String,
    pub views: Vec<ViewKind>,
    #[serde(default)]
    pub labels: ViewLabels,
    /// Store key -> CSV file replacing that key's records.
    #[serde(default)]
    pub sources: BTreeMap<String, String>,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Validation + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_tolerance")]
    pub conservation_tolerance: f64,
    #[serde(default = "default_true")]
    pub fail_on_invalid: bool,
    #[serde(default)]
    pub fail_on_imbalance: bool,
}

fn default_tolerance() -> f64 {
    0.01
}

fn default_true() -> bool {
    true
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            conservation_tolerance: default_tolerance(),
            fail_on_invalid: true,
            fail_on_imbalance: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// `{nodes: [{id, label, layer}], links: [{source, target, weight}]}`
    #[default]
    Graph,
    /// `{nodes: [{name, title}], links: [{source, target, value}]}`
    D3,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub json: Option<String>,
    #[serde(default)]
    pub format: OutputFormat,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl FlowConfig {
    pub fn from_toml(input: &str) -> Result<Self, FlowError> {
        let config: FlowConfig = toml::from_str(input).map_err(|e| FlowError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), FlowError> {
        if self.data.trim().is_empty() {
            return Err(FlowError::ConfigValidation("data path must not be empty".into()));
        }

        if self.views.is_empty() {
            return Err(FlowError::ConfigValidation("at least one view is required".into()));
        }

        let mut seen = HashSet::new();
        for view in &self.views {
            if !seen.insert(view) {
                return Err(FlowError::ConfigValidation(format!("view '{view}' listed twice")));
            }
        }

        if self.labels.institution.trim().is_empty() {
            return Err(FlowError::ConfigValidation("labels.institution must not be empty".into()));
        }
        if self.labels.revenue_year.trim().is_empty() {
            return Err(FlowError::ConfigValidation("labels.revenue_year must not be empty".into()));
        }

        let tol = self.validation.conservation_tolerance;
        if !tol.is_finite() || tol < 0.0 {
            return Err(FlowError::ConfigValidation(format!(
                "conservation_tolerance must be a non-negative number, got {tol}"
            )));
        }

        for key in self.sources.keys() {
            if !ViewKind::ALL.iter().any(|v| v.store_key() == key) {
                return Err(FlowError::ConfigValidation(format!(
                    "sources: '{key}' is not a store key read by any view"
                )));
            }
        }

        Ok(())
    }

    /// View tables for the configured views, in config order.
    pub fn view_specs(&self) -> Vec<ViewSpec> {
        self.views.iter().map(|&kind| ViewSpec::new(kind, &self.labels)).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
