use std::path::PathBuf;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::{load_pulse_set, AppState};

// ---------------------------------------------------------------------------
// Left side panel – pulse list
// ---------------------------------------------------------------------------

/// Render the left pulse list.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Pulses");
    ui.separator();

    if state.pulses.is_empty() {
        ui.label("No pulses loaded.");
        return;
    }

    let mut clicked = None;
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (idx, pulse) in state.pulses.iter().enumerate() {
                let mut text = RichText::new(format!(
                    "{}  ({} samples)",
                    AppState::label(idx),
                    pulse.len()
                ));
                if state.overlay_all {
                    text = text.color(state.color_for(idx));
                }
                let is_selected = !state.overlay_all && idx == state.selected;
                if ui.selectable_label(is_selected, text).clicked() {
                    clicked = Some(idx);
                }
            }
        });

    // Picking a pulse from the list leaves overlay mode.
    if let Some(idx) = clicked {
        state.select(idx);
        state.overlay_all = false;
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(source) = &state.source {
            ui.label(format!(
                "{}: {} pulses",
                source.display(),
                state.pulses.len()
            ));
            if state.skipped_lines > 0 {
                ui.label(
                    RichText::new(format!("{} lines skipped", state.skipped_lines))
                        .color(Color32::YELLOW),
                );
            }
        }

        ui.separator();

        let single = !state.overlay_all;
        if ui
            .add_enabled(single && state.selected > 0, egui::Button::new("◀ Prev"))
            .clicked()
        {
            state.select_previous();
        }
        if ui
            .add_enabled(
                single && state.selected + 1 < state.pulses.len(),
                egui::Button::new("Next ▶"),
            )
            .clicked()
        {
            state.select_next();
        }

        ui.separator();

        if ui
            .selectable_label(state.overlay_all, "Overlay all")
            .clicked()
        {
            state.overlay_all = !state.overlay_all;
        }
        if ui
            .selectable_label(state.show_voltage, "Show voltage")
            .clicked()
        {
            state.show_voltage = !state.show_voltage;
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let mut dialog = rfd::FileDialog::new()
        .set_title("Open pulses file")
        .add_filter("Pulse files", &["txt", "tsv"]);
    if let Some(dir) = state.source.as_ref().and_then(|p| p.parent()) {
        dialog = dialog.set_directory(dir);
    }

    if let Some(path) = dialog.pick_file() {
        load_into(state, path);
    }
}

fn load_into(state: &mut AppState, path: PathBuf) {
    match load_pulse_set(&path) {
        Ok(set) => state.set_pulses(set, path),
        Err(e) => {
            log::error!("Failed to load file: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
