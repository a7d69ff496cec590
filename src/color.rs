use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.65, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: category → Color32
// ---------------------------------------------------------------------------

/// Maps the categories of one column to distinct colours, so a status keeps
/// its colour across the sidebar and the charts.
#[derive(Debug, Clone, Default)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
}

impl ColorMap {
    /// Build a colour map from a column's categories, in display order.
    pub fn new<'a>(categories: impl IntoIterator<Item = &'a str>) -> Self {
        let mut names: Vec<&str> = Vec::new();
        for c in categories {
            if !names.contains(&c) {
                names.push(c);
            }
        }
        let palette = generate_palette(names.len());
        let mapping = names
            .into_iter()
            .zip(palette)
            .map(|(name, color)| (name.to_string(), color))
            .collect();
        ColorMap { mapping }
    }

    /// Look up the colour for a category.
    pub fn color_for(&self, category: &str) -> Color32 {
        self.mapping.get(category).copied().unwrap_or(Color32::GRAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size() {
        assert!(generate_palette(0).is_empty());
        let colors = generate_palette(4);
        assert_eq!(colors.len(), 4);
        assert_ne!(colors[0], colors[2]);
    }

    #[test]
    fn categories_get_stable_distinct_colours() {
        let map = ColorMap::new(["Done", "Active", "Done", "Planned"]);
        assert_ne!(map.color_for("Done"), map.color_for("Active"));
        let deduped = ColorMap::new(["Done", "Active", "Planned"]);
        assert_eq!(map.color_for("Done"), deduped.color_for("Done"));
        assert_eq!(map.color_for("Unknown"), Color32::GRAY);
    }
}
