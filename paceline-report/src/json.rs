//! JSON Output

use crate::report::{Report, SCHEMA_VERSION};
use serde::{Deserialize, Serialize};

/// Schema information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSchema {
    /// Schema identifier
    pub schema: String,
    /// Schema version
    pub version: u32,
}

impl Default for ReportSchema {
    fn default() -> Self {
        Self {
            schema: "paceline-report".to_string(),
            version: SCHEMA_VERSION,
        }
    }
}

/// Generate a prettified JSON report.
pub fn generate_json_report(report: &Report) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
