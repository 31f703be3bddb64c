use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Pipeline settings. Every field has a default, so an empty TOML document
/// yields the standard claim export layout.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Status value a row must carry to survive the status filter.
    pub accepted_status: String,
    pub sc: ClaimConfig,
    pub benefit: BenefitConfig,
    pub report: ReportConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            accepted_status: "R".into(),
            sc: ClaimConfig::default(),
            benefit: BenefitConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Per-dataset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClaimConfig {
    pub date_columns: Vec<String>,
    pub text_columns: Vec<String>,
}

impl Default for ClaimConfig {
    fn default() -> Self {
        Self {
            date_columns: strings(&["TreatmentStart", "TreatmentFinish", "Date"]),
            text_columns: strings(&["RoomOption", "TreatmentPlace", "PrimaryDiagnosis"]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenefitConfig {
    /// Raw status column, renamed to `ClaimStatus` before filtering.
    pub status_column: String,
    pub date_columns: Vec<String>,
    pub text_columns: Vec<String>,
    /// Raw-only columns removed from the output.
    pub drop_columns: Vec<String>,
}

impl Default for BenefitConfig {
    fn default() -> Self {
        Self {
            status_column: "Status_Claim".into(),
            date_columns: strings(&["TreatmentStart", "TreatmentFinish", "PaymentDate"]),
            text_columns: strings(&["RoomOption", "TreatmentPlace", "Diagnosis"]),
            drop_columns: strings(&["StatusClaim", "BAmount"]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Output file name (without extension) when none is given.
    pub default_name: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { default_name: "Transformed_Claim_Data".into() }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl PipelineConfig {
    pub fn from_toml(input: &str) -> Result<Self, PipelineError> {
        let config: PipelineConfig =
            toml::from_str(input).map_err(|e| PipelineError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, PipelineError> {
        toml::to_string_pretty(self).map_err(|e| PipelineError::ConfigParse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.accepted_status.trim().is_empty() {
            return Err(PipelineError::ConfigValidation(
                "accepted_status must not be empty".into(),
            ));
        }

        if self.benefit.status_column.trim().is_empty() {
            return Err(PipelineError::ConfigValidation(
                "benefit.status_column must not be empty".into(),
            ));
        }

        let lists = [
            ("sc.date_columns", &self.sc.date_columns),
            ("sc.text_columns", &self.sc.text_columns),
            ("benefit.date_columns", &self.benefit.date_columns),
            ("benefit.text_columns", &self.benefit.text_columns),
            ("benefit.drop_columns", &self.benefit.drop_columns),
        ];
        for (name, columns) in lists {
            if columns.iter().any(|c| c.trim().is_empty()) {
                return Err(PipelineError::ConfigValidation(format!(
                    "{name} contains an empty column name"
                )));
            }
        }

        if self.report.default_name.trim().is_empty() {
            return Err(PipelineError::ConfigValidation(
                "report.default_name must not be empty".into(),
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
