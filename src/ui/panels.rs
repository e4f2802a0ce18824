use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::{loader, survey};
use crate::state::{AppState, ProfileView};

// ---------------------------------------------------------------------------
// Left side panel – profile controls
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Profiles");
    ui.separator();

    let (field_names, n_sightlines) = match &state.dataset {
        Some(ds) => (ds.field_names(), ds.len()),
        None => {
            ui.label("No data loaded.");
            return;
        }
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Ion field selector ----
            ui.strong("Ion field");
            let current = state.selected_field.clone().unwrap_or_default();
            egui::ComboBox::from_id_salt("ion_field")
                .selected_text(&current)
                .show_ui(ui, |ui: &mut Ui| {
                    for name in &field_names {
                        if ui.selectable_label(current == *name, name).clicked() {
                            state.set_field(name.clone());
                        }
                    }
                });
            ui.separator();

            // ---- Profile axis ----
            ui.strong("View");
            for view in [ProfileView::ByAngle, ProfileView::ByRadius] {
                if ui
                    .selectable_label(state.view == view, view.label())
                    .clicked()
                {
                    state.set_view(view);
                }
            }
            ui.separator();

            // ---- Group visibility ----
            ui.strong(match state.view {
                ProfileView::ByAngle => "Radius shells",
                ProfileView::ByRadius => "Azimuthal wedges",
            });
            let labels: Vec<String> = state.bands.iter().map(|b| b.label.clone()).collect();
            for (i, label) in labels.iter().enumerate() {
                let color = state.band_colors.get(i).copied().unwrap_or(Color32::GRAY);
                let text = RichText::new(label).color(color);
                if let Some(visible) = state.visible_bands.get_mut(i) {
                    ui.checkbox(visible, text);
                }
            }
            ui.separator();

            // ---- Survey overlay ----
            ui.strong("Observations");
            if state.survey.is_empty() {
                ui.label("No survey loaded.");
            } else {
                ui.checkbox(
                    &mut state.show_survey,
                    format!("Overlay {} points", state.survey.len()),
                );
            }
            ui.separator();

            ui.weak(format!(
                "{n_sightlines} sightlines, {} angle bins, {} radius edges",
                state.angle_edges.len(),
                state.radius_edges.len()
            ));
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open data…").clicked() {
                open_data_dialog(state);
                ui.close_menu();
            }
            if ui.button("Open survey…").clicked() {
                open_survey_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} sightlines from {} file(s)",
                ds.len(),
                state.source_files.len()
            ));
        }

        ui.separator();

        if ui
            .selectable_label(state.log_scale, "Log10 Scale")
            .clicked()
        {
            state.log_scale = !state.log_scale;
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_data_dialog(state: &mut AppState) {
    let files = rfd::FileDialog::new()
        .set_title("Open column density tables")
        .add_filter("Supported files", &["parquet", "pq", "json", "csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .pick_files();

    for path in files.unwrap_or_default() {
        match loader::load_file(&path) {
            Ok(set) => {
                log::info!(
                    "Loaded {} sightlines with fields {:?}",
                    set.len(),
                    set.field_names()
                );
                let source = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("<unnamed>")
                    .to_string();
                state.add_dataset(set, source);
            }
            Err(e) => {
                log::error!("Failed to load {}: {e:#}", path.display());
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

pub fn open_survey_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open survey data")
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        match survey::load_survey(&path) {
            Ok(points) => {
                log::info!("Loaded {} survey points", points.len());
                state.set_survey(points);
            }
            Err(e) => {
                log::error!("Failed to load survey {}: {e:#}", path.display());
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
