use eframe::egui::{Color32, Stroke, Ui};
use egui_plot::{Legend, Line, MarkerShape, Plot, PlotPoints, PlotUi, Points, Polygon};

use crate::color::band_fill;
use crate::data::profile::{ProfileBand, Quartiles};
use crate::data::survey::SurveyPoint;
use crate::state::{AppState, ProfileView};

// ---------------------------------------------------------------------------
// Profile plot (central panel)
// ---------------------------------------------------------------------------

/// Render the profile plot in the central panel.
pub fn profile_plot(ui: &mut Ui, state: &AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a column density table to view profiles  (File → Open data…)");
        });
        return;
    }
    let Some(field) = state.selected_field.as_deref() else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("The loaded files carry no ion fields");
        });
        return;
    };

    let centers = match state.view {
        ProfileView::ByAngle => state.angle_edges.centers(0.0),
        ProfileView::ByRadius => state.radius_edges.centers(0.0),
    };
    let x_label = match state.view {
        ProfileView::ByAngle => "Azimuthal Angle [deg]",
        ProfileView::ByRadius => "Impact Parameter [kpc]",
    };
    let y_label = if state.log_scale {
        format!("log10 N({field})")
    } else {
        format!("N({field})")
    };

    Plot::new("profile_plot")
        .legend(Legend::default())
        .x_axis_label(x_label)
        .y_axis_label(y_label)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for (i, band) in state.bands.iter().enumerate() {
                if !state.visible_bands.get(i).copied().unwrap_or(true) {
                    continue;
                }
                let color = state
                    .band_colors
                    .get(i)
                    .copied()
                    .unwrap_or(Color32::LIGHT_BLUE);
                draw_band(plot_ui, band, &centers, color, state.log_scale);
            }
            if state.show_survey {
                draw_survey(plot_ui, &state.survey, field, state.view, state.log_scale);
            }
        });
}

// ---------------------------------------------------------------------------
// Bands
// ---------------------------------------------------------------------------

/// Median line plus translucent interquartile fill for one band.
fn draw_band(
    plot_ui: &mut PlotUi,
    band: &ProfileBand,
    centers: &[f64],
    color: Color32,
    log_scale: bool,
) {
    for run in band_runs(band, centers, log_scale) {
        if run.len() >= 2 {
            // Forward along p75, back along p25.
            let mut outline: Vec<[f64; 2]> = run.iter().map(|&(x, q)| [x, q.p75]).collect();
            outline.extend(run.iter().rev().map(|&(x, q)| [x, q.p25]));
            plot_ui.polygon(
                Polygon::new(PlotPoints::from(outline))
                    .fill_color(band_fill(color))
                    .stroke(Stroke::NONE),
            );
        }

        let median: PlotPoints = run.iter().map(|&(x, q)| [x, q.median]).collect();
        plot_ui.line(Line::new(median).name(&band.label).color(color).width(2.0));
    }
}

/// Contiguous runs of populated bins; no-data bins break both the median line
/// and the fill.
fn band_runs(band: &ProfileBand, centers: &[f64], log_scale: bool) -> Vec<Vec<(f64, Quartiles)>> {
    let mut runs = Vec::new();
    let mut current: Vec<(f64, Quartiles)> = Vec::new();
    for (bin, &x) in band.bins.iter().zip(centers) {
        match bin.and_then(|q| scaled(q, log_scale)) {
            Some(q) => current.push((x, q)),
            None => {
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// Log-transform a bin summary; non-positive column densities cannot be drawn
/// in log space and turn the bin into a gap.
fn scaled(q: Quartiles, log_scale: bool) -> Option<Quartiles> {
    if !log_scale {
        return Some(q);
    }
    let q = Quartiles {
        p25: q.p25.log10(),
        median: q.median.log10(),
        p75: q.p75.log10(),
    };
    (q.p25.is_finite() && q.median.is_finite() && q.p75.is_finite()).then_some(q)
}

// ---------------------------------------------------------------------------
// Survey overlay
// ---------------------------------------------------------------------------

fn draw_survey(
    plot_ui: &mut PlotUi,
    points: &[SurveyPoint],
    field: &str,
    view: ProfileView,
    log_scale: bool,
) {
    let mut detections: Vec<[f64; 2]> = Vec::new();
    let mut limits: Vec<[f64; 2]> = Vec::new();

    for p in points.iter().filter(|p| p.field == field) {
        let x = match view {
            ProfileView::ByRadius => p.radius_kpc,
            // Only points with a published azimuth can join the angle view.
            ProfileView::ByAngle => match p.azimuth_deg {
                Some(a) => a,
                None => continue,
            },
        };
        let y = if log_scale {
            p.log_column_density
        } else {
            10f64.powf(p.log_column_density)
        };
        if p.upper_limit {
            limits.push([x, y]);
        } else {
            detections.push([x, y]);
        }
    }

    if !detections.is_empty() {
        plot_ui.points(
            Points::new(detections)
                .shape(MarkerShape::Circle)
                .radius(3.0)
                .color(Color32::GRAY)
                .name("Observed"),
        );
    }
    if !limits.is_empty() {
        plot_ui.points(
            Points::new(limits)
                .shape(MarkerShape::Down)
                .radius(3.0)
                .color(Color32::GRAY)
                .name("Observed (upper limit)"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gaps_split_a_band_into_runs() {
        let q = Quartiles {
            p25: 1.0,
            median: 2.0,
            p75: 3.0,
        };
        let band = ProfileBand {
            label: "0-50 kpc".into(),
            bins: vec![Some(q), Some(q), None, Some(q)],
        };
        let centers = [1.0, 2.0, 3.0, 4.0];

        let runs = band_runs(&band, &centers, false);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].len(), 2);
        assert_eq!(runs[1], vec![(4.0, q)]);
    }

    #[test]
    fn log_scaling_drops_non_positive_bins() {
        let q = Quartiles {
            p25: 0.0,
            median: 100.0,
            p75: 1000.0,
        };
        assert_eq!(scaled(q, false), Some(q));
        // p25 = 0 has no logarithm, so the whole bin becomes a gap.
        assert_eq!(scaled(q, true), None);

        let q = Quartiles {
            p25: 10.0,
            median: 100.0,
            p75: 1000.0,
        };
        let s = scaled(q, true).unwrap();
        assert_eq!(s.p25, 1.0);
        assert_eq!(s.median, 2.0);
        assert_eq!(s.p75, 3.0);
    }
}
