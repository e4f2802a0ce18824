use eframe::egui::Color32;

use crate::color::generate_palette;
use crate::data::binning::{BinEdges, default_angle_edges, default_radius_edges};
use crate::data::model::SightlineSet;
use crate::data::profile::{ProfileBand, angular_wedge_profile, radial_shell_profile};
use crate::data::survey::SurveyPoint;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Which axis the profiles run along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileView {
    /// Column density versus azimuthal angle, one band per radius shell.
    ByAngle,
    /// Column density versus impact radius, one band per azimuthal wedge.
    ByRadius,
}

impl ProfileView {
    pub fn label(self) -> &'static str {
        match self {
            ProfileView::ByAngle => "Azimuthal profile",
            ProfileView::ByRadius => "Radial profile",
        }
    }
}

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Concatenated sightlines from every loaded file (None until one loads).
    pub dataset: Option<SightlineSet>,

    /// Names of the loaded files, for display.
    pub source_files: Vec<String>,

    /// Ion field whose profiles are shown.
    pub selected_field: Option<String>,

    /// Profile axis currently shown.
    pub view: ProfileView,

    /// Azimuthal-angle bin grid.
    pub angle_edges: BinEdges,

    /// Impact-parameter bin grid.
    pub radius_edges: BinEdges,

    /// Profile bands for the current field and view (cached).
    pub bands: Vec<ProfileBand>,

    /// Colour per band, aligned with `bands`.
    pub band_colors: Vec<Color32>,

    /// Per-band visibility, aligned with `bands`.
    pub visible_bands: Vec<bool>,

    /// Show log10 of the column density.
    pub log_scale: bool,

    /// Observational comparison points.
    pub survey: Vec<SurveyPoint>,

    /// Overlay the survey points on the plot.
    pub show_survey: bool,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            dataset: None,
            source_files: Vec::new(),
            selected_field: None,
            view: ProfileView::ByAngle,
            angle_edges: default_angle_edges(),
            radius_edges: default_radius_edges(),
            bands: Vec::new(),
            band_colors: Vec::new(),
            visible_bands: Vec::new(),
            log_scale: true,
            survey: Vec::new(),
            show_survey: true,
            status_message: None,
        }
    }
}

impl AppState {
    /// Concatenate a newly loaded table onto the dataset and refresh the
    /// profiles.
    pub fn add_dataset(&mut self, set: SightlineSet, source: String) {
        match &mut self.dataset {
            Some(existing) => {
                if let Err(e) = existing.append(set) {
                    log::error!("cannot concatenate {source}: {e}");
                    self.status_message = Some(format!("Error: {e}"));
                    return;
                }
            }
            None => self.dataset = Some(set),
        }
        self.source_files.push(source);

        // Default field: first available (if any).
        if self.selected_field.is_none() {
            self.selected_field = self
                .dataset
                .as_ref()
                .and_then(|ds| ds.field_names().first().cloned());
        }
        self.status_message = None;
        self.recompute_profiles();
    }

    /// Replace the observational comparison points.
    pub fn set_survey(&mut self, points: Vec<SurveyPoint>) {
        self.survey = points;
        self.show_survey = true;
        self.status_message = None;
    }

    pub fn set_field(&mut self, field: String) {
        self.selected_field = Some(field);
        self.recompute_profiles();
    }

    pub fn set_view(&mut self, view: ProfileView) {
        if self.view != view {
            self.view = view;
            self.recompute_profiles();
        }
    }

    /// Rebuild the cached profile bands for the current field and view.
    pub fn recompute_profiles(&mut self) {
        self.bands.clear();

        let Some(ds) = &self.dataset else { return };
        let Some(field) = self.selected_field.as_deref() else {
            return;
        };
        let Some(values) = ds.field(field) else {
            self.status_message = Some(format!("Error: no field '{field}' in the loaded data"));
            return;
        };

        let result = match self.view {
            ProfileView::ByAngle => radial_shell_profile(
                &ds.angle,
                &ds.radius,
                values,
                &self.angle_edges,
                &self.radius_edges,
            ),
            ProfileView::ByRadius => angular_wedge_profile(
                &ds.angle,
                &ds.radius,
                values,
                &self.angle_edges,
                &self.radius_edges,
            ),
        };

        match result {
            Ok(bands) => {
                if self.visible_bands.len() != bands.len() {
                    self.visible_bands = vec![true; bands.len()];
                }
                self.band_colors = generate_palette(bands.len());
                self.bands = bands;
            }
            Err(e) => {
                log::error!("profile computation failed: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn demo_set() -> SightlineSet {
        let n = 200;
        let angle: Vec<f64> = (0..n).map(|i| (i * 13 % 900) as f64 / 10.0).collect();
        let radius: Vec<f64> = (0..n).map(|i| (i * 29 % 1500) as f64 / 10.0).collect();
        let mut fields = BTreeMap::new();
        fields.insert(
            "H_number_density".to_string(),
            (0..n).map(|i| 1e14 * (1.0 + (i % 17) as f64)).collect(),
        );
        SightlineSet::from_parts(angle, radius, fields).unwrap()
    }

    #[test]
    fn add_dataset_selects_a_field_and_builds_bands() {
        let mut state = AppState::default();
        state.add_dataset(demo_set(), "snapshot_600_cdens.parquet".into());

        assert_eq!(state.selected_field.as_deref(), Some("H_number_density"));
        assert_eq!(state.bands.len(), 3);
        assert_eq!(state.band_colors.len(), 3);
        assert_eq!(state.visible_bands, vec![true; 3]);
        assert_eq!(state.bands[0].bins.len(), state.angle_edges.len());
    }

    #[test]
    fn switching_view_switches_the_profile_axis() {
        let mut state = AppState::default();
        state.add_dataset(demo_set(), "a".into());

        state.set_view(ProfileView::ByRadius);
        assert_eq!(state.bands[0].bins.len(), state.radius_edges.len());
        assert_eq!(state.bands[0].label, "0°-30°");
    }
}
