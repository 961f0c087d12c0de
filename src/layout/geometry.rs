use serde::{Deserialize, Serialize};

use crate::foundation::core::Size;

/// Grid line positions for a surface, in logical pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    pub width: f64,
    pub height: f64,
    pub cols: u32,
    pub rows: u32,
    pub col_width: f64,
    pub row_height: f64,
    /// `cols - 1` interior vertical line x positions.
    pub verticals: Vec<f64>,
    /// `rows - 1` interior horizontal line y positions.
    pub horizontals: Vec<f64>,
}

impl GridGeometry {
    /// Cache signature: rounded size plus column/row counts.
    pub fn signature(&self) -> GridSignature {
        GridSignature {
            width: self.width.round() as i64,
            height: self.height.round() as i64,
            cols: self.cols,
            rows: self.rows,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridSignature {
    pub width: i64,
    pub height: i64,
    pub cols: u32,
    pub rows: u32,
}

/// Evenly spaced interior grid lines. Zero counts are treated as one.
pub fn compute_geometry(width: f64, height: f64, cols: u32, rows: u32) -> GridGeometry {
    let cols = cols.max(1);
    let rows = rows.max(1);
    let verticals = (1..cols)
        .map(|i| f64::from(i) * width / f64::from(cols))
        .collect();
    let horizontals = (1..rows)
        .map(|j| f64::from(j) * height / f64::from(rows))
        .collect();
    GridGeometry {
        width,
        height,
        cols,
        rows,
        col_width: width / f64::from(cols),
        row_height: height / f64::from(rows),
        verticals,
        horizontals,
    }
}

/// Column count for a surface width: 4 below 600px, 8 below 1024px, otherwise 12.
pub fn responsive_columns(width: f64) -> u32 {
    if width < 600.0 {
        4
    } else if width < 1024.0 {
        8
    } else {
        12
    }
}

/// Responsive grid: columns by width, then both counts capped by `floor(height / 130)`.
pub fn responsive_grid(width: f64, height: f64) -> GridGeometry {
    let max_by_height = ((height / 130.0).floor() as u32).max(1);
    let cols = responsive_columns(width).min(max_by_height);
    let rows = cols.min(max_by_height).max(1);
    compute_geometry(width, height, cols, rows)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutPreset {
    #[default]
    Landscape,
    Square,
    Portrait,
}

impl LayoutPreset {
    /// Width over height.
    pub fn aspect(self) -> f64 {
        match self {
            Self::Landscape => 16.0 / 9.0,
            Self::Square => 1.0,
            Self::Portrait => 9.0 / 19.5,
        }
    }
}

/// Largest surface of the preset's aspect that fits the stage, leaving room for chrome.
pub fn canvas_size_for_stage(stage_width: f64, stage_height: f64, preset: LayoutPreset) -> Size {
    let max_height = (stage_height * 0.8).min((stage_height - 80.0).max(0.0));
    let max_width = stage_width * 0.98;
    let aspect = preset.aspect();

    let (w, h) = if max_height * aspect <= max_width {
        (max_height * aspect, max_height)
    } else {
        (max_width, max_width / aspect)
    };
    Size::new(w.floor().max(1.0), h.floor().max(1.0))
}

/// Scale `natural` so its longest side is at most `fraction` of the surface's shortest side.
/// Never upscales; each side is at least one pixel.
pub fn fit_within(natural: Size, surface: Size, fraction: f64) -> Size {
    let limit = (surface.width.min(surface.height) * fraction).round().max(1.0);
    let w = if natural.width > 0.0 { natural.width } else { 1.0 };
    let h = if natural.height > 0.0 {
        natural.height
    } else {
        1.0
    };
    let scale = (limit / w.max(h)).min(1.0);
    Size::new((w * scale).round().max(1.0), (h * scale).round().max(1.0))
}

#[cfg(test)]
#[path = "../../tests/unit/layout/geometry.rs"]
mod tests;
