use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Golden-angle hue step: neighbouring pulses get well separated hues no
/// matter how many pulses there are.
const HUE_STEP: f32 = 137.507_77;

/// Generates `n` distinct colours, one per pulse.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 * HUE_STEP) % 360.0;
            // Alternate lightness so wrapped-around hues stay distinguishable.
            let lightness = if i % 2 == 0 { 0.55 } else { 0.45 };
            let hsl = Hsl::new(hue, 0.75, lightness);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}
