use eframe::egui::{Color32, Ui};
use egui_plot::{Legend, Line, LineStyle, Plot, PlotPoints, PlotUi};

use rusty_pulse::data::model::PulseTrace;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Pulse plot (central panel)
// ---------------------------------------------------------------------------

/// Render the pulse plot in the central panel.
pub fn pulse_plot(ui: &mut Ui, state: &AppState) {
    if state.pulses.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a pulses file to view pulses  (File → Open…)");
        });
        return;
    }

    let title = if state.overlay_all {
        format!("All pulses ({})", state.pulses.len())
    } else {
        AppState::label(state.selected)
    };
    ui.heading(title);

    let y_label = if state.show_voltage {
        "Current / Voltage"
    } else {
        "Current"
    };

    // Keyed on the view so each pulse gets its own auto-fitted bounds.
    let plot_id = ("pulse_plot", state.overlay_all, state.selected);

    Plot::new(plot_id)
        .legend(Legend::default())
        .x_axis_label("Time")
        .y_axis_label(y_label)
        .show_grid(true)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            if state.overlay_all {
                for (idx, pulse) in state.pulses.iter().enumerate() {
                    draw_pulse(plot_ui, pulse, idx, state.color_for(idx), state.show_voltage);
                }
            } else if let Some(pulse) = state.selected_pulse() {
                draw_pulse(
                    plot_ui,
                    pulse,
                    state.selected,
                    Color32::LIGHT_BLUE,
                    state.show_voltage,
                );
            }
        });
}

fn draw_pulse(plot_ui: &mut PlotUi, pulse: &PulseTrace, idx: usize, color: Color32, voltage: bool) {
    let name = AppState::label(idx);

    let current: PlotPoints = pulse
        .time
        .iter()
        .zip(pulse.current.iter())
        .map(|(&t, &i)| [t, i])
        .collect();
    plot_ui.line(Line::new(current).name(&name).color(color).width(1.5));

    if voltage {
        let points: PlotPoints = pulse
            .time
            .iter()
            .zip(pulse.voltage.iter())
            .map(|(&t, &v)| [t, v])
            .collect();
        plot_ui.line(
            Line::new(points)
                .name(format!("{name} voltage"))
                .color(color.gamma_multiply(0.6))
                .style(LineStyle::dashed_dense())
                .width(1.0),
        );
    }
}
