//! Gesture math for resize handles. All functions are pure and work from the bounds captured
//! when the gesture started, so repeated samples never compound.

use crate::{
    config::InteractionTuning,
    foundation::core::{Rect, Vec2, rect_xywh},
    interact::handles::Handle,
};

fn quantize(v: f64, step: f64) -> f64 {
    if step > 1.0 { (v / step).round() * step } else { v }
}

/// Place a `w`x`h` box so the corner opposite `handle` stays where it was in `start`.
fn anchor_opposite(start: Rect, handle: Handle, w: f64, h: f64) -> Rect {
    let x = if handle.sign_x() > 0.0 {
        start.x0
    } else {
        start.x0 + (start.width() - w)
    };
    let y = if handle.sign_y() > 0.0 {
        start.y0
    } else {
        start.y0 + (start.height() - h)
    };
    rect_xywh(x.round(), y.round(), w, h)
}

fn axis_scales(start: Rect, handle: Handle, delta: Vec2) -> (f64, f64) {
    let (w0, h0) = (start.width().max(1.0), start.height().max(1.0));
    (
        (w0 + handle.sign_x() * delta.x) / w0,
        (h0 + handle.sign_y() * delta.y) / h0,
    )
}

/// Aspect-locked corner resize of an image or video box.
///
/// The axis whose drag moved further from the starting size drives the uniform scale, clamped
/// so neither side drops below `min_px`.
pub fn resize_box(start: Rect, handle: Handle, delta: Vec2, min_px: f64) -> Rect {
    let (w0, h0) = (start.width().max(1.0), start.height().max(1.0));
    let ratio = w0 / h0;
    let (sw, sh) = axis_scales(start, handle, delta);

    let s = if (sh - 1.0).abs() > (sw - 1.0).abs() {
        sh
    } else {
        sw
    };
    let s = if s.is_finite() { s } else { 1.0 };
    let s_min = (min_px / w0).max(min_px / h0);
    let s = s.max(s_min);

    let nw = (w0 * s).round().max(min_px);
    let nh = (nw / ratio).round().max(min_px);
    anchor_opposite(start, handle, nw, nh)
}

/// New wrap width from a text side handle: symmetric about the center, damped and quantized.
pub fn text_side_width(base_width: f64, handle: Handle, dx: f64, tuning: &InteractionTuning) -> f64 {
    let base = if base_width > 0.0 { base_width } else { 200.0 };
    let raw = base + 2.0 * dx * handle.sign_x() * tuning.text_side_gain;
    quantize(raw, tuning.size_quantum)
        .round()
        .max(tuning.min_text_width)
}

/// Result of a text corner resize.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextScale {
    pub font_px: f64,
    pub max_width: f64,
}

/// Scale font size and wrap width together from a corner handle.
pub fn text_corner_scale(
    start: Rect,
    handle: Handle,
    delta: Vec2,
    font_px: f64,
    max_width: Option<f64>,
    tuning: &InteractionTuning,
) -> TextScale {
    let (w0, h0) = (start.width().max(1.0), start.height().max(1.0));
    let (sw, sh) = axis_scales(start, handle, delta);
    let s = [sw, sh]
        .into_iter()
        .filter(|v| v.is_finite() && *v > 0.0)
        .reduce(f64::min)
        .unwrap_or(1.0);
    let s = 1.0 + (s - 1.0) * tuning.text_corner_gain;
    let s_min = (tuning.min_asset_px / w0).max(tuning.min_asset_px / h0);
    let s = s.max(s_min);

    let font_px = (font_px * s).round().max(tuning.min_font_px);
    let base_width = max_width.filter(|w| *w > 0.0).unwrap_or(w0);
    let max_width = quantize(base_width * s, tuning.size_quantum)
        .round()
        .max(tuning.min_text_width);

    TextScale { font_px, max_width }
}

#[cfg(test)]
#[path = "../../tests/unit/interact/resize.rs"]
mod tests;
