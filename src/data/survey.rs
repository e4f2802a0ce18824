use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Observational comparison data
// ---------------------------------------------------------------------------

/// One absorber measurement from a comparison survey.
#[derive(Debug, Clone, Deserialize)]
pub struct SurveyPoint {
    /// Ion field the measurement belongs to, e.g. `H_number_density`.
    pub field: String,
    /// Projected distance from the galaxy, kpc.
    pub radius_kpc: f64,
    /// log10 of the measured column density.
    pub log_column_density: f64,
    /// Azimuthal angle of the sightline, degrees, when published.
    #[serde(default)]
    pub azimuth_deg: Option<f64>,
    /// Non-detections are reported as upper limits.
    #[serde(default)]
    pub upper_limit: bool,
    /// Survey or target galaxy identifier.
    #[serde(default)]
    pub label: Option<String>,
}

/// Load survey points from a JSON array of records.
pub fn load_survey(path: &Path) -> Result<Vec<SurveyPoint>> {
    let text = std::fs::read_to_string(path).context("reading survey file")?;
    parse_survey(&text)
}

fn parse_survey(text: &str) -> Result<Vec<SurveyPoint>> {
    serde_json::from_str(text).context("parsing survey JSON")
}
