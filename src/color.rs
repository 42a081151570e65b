use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::NOISE_LABEL;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// How many distinct cluster hues to pre-generate. Labels beyond this wrap
/// around via modulo rather than erroring.
const PALETTE_SIZE: usize = 8;

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
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
// Cluster colors: label → Color32
// ---------------------------------------------------------------------------

/// Deterministic colour assignment for cluster labels.
#[derive(Debug, Clone)]
pub struct ClusterPalette {
    colors: Vec<Color32>,
}

impl Default for ClusterPalette {
    fn default() -> Self {
        ClusterPalette {
            colors: generate_palette(PALETTE_SIZE),
        }
    }
}

impl ClusterPalette {
    /// Colour for a cluster label. Labels exceeding the palette length wrap
    /// via modulo; the noise sentinel gets the dedicated noise colour.
    pub fn color_for(&self, label: i32) -> Color32 {
        if label == NOISE_LABEL || label < 0 {
            return Self::noise();
        }
        self.colors[label as usize % self.colors.len()]
    }

    /// Unassigned points before any run, and the base trace colour.
    pub fn unlabeled() -> Color32 {
        Color32::from_rgb(0xe2, 0xe8, 0xf0)
    }

    /// Points the algorithm marked as noise.
    pub fn noise() -> Color32 {
        Color32::from_rgb(0x64, 0x74, 0x8b)
    }

    /// Centroid markers, distinct from every data series.
    pub fn centroid() -> Color32 {
        Color32::WHITE
    }

    // -- Status feedback ---------------------------------------------------

    pub fn success() -> Color32 {
        Color32::from_rgb(0x4a, 0xde, 0x80)
    }

    pub fn failure() -> Color32 {
        Color32::from_rgb(0xf8, 0x71, 0x71)
    }

    pub fn warning() -> Color32 {
        Color32::from_rgb(0xfb, 0xbf, 0x24)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
