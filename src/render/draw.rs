use std::sync::Arc;

use kurbo::Shape;

use crate::{
    foundation::{
        color::Color,
        core::{Affine, BezPath, Point, Rect},
        error::{BoardError, BoardResult},
    },
    resources::decode::DecodedImage,
};

pub(crate) fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

pub(crate) fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

/// Pixmap dimensions as `u16`, rejecting anything vello_cpu cannot address.
pub(crate) fn pixmap_dims(width: u32, height: u32) -> BoardResult<(u16, u16)> {
    let w: u16 = width
        .max(1)
        .try_into()
        .map_err(|_| BoardError::render(format!("surface width {width} exceeds u16")))?;
    let h: u16 = height
        .max(1)
        .try_into()
        .map_err(|_| BoardError::render(format!("surface height {height} exceeds u16")))?;
    Ok((w, h))
}

pub(crate) fn fill_rect(ctx: &mut vello_cpu::RenderContext, base: Affine, r: Rect, color: Color) {
    ctx.set_transform(affine_to_cpu(base));
    ctx.set_paint(color.to_cpu());
    ctx.fill_rect(&rect_to_cpu(r));
}

pub(crate) fn fill_path(ctx: &mut vello_cpu::RenderContext, base: Affine, path: &BezPath, color: Color) {
    ctx.set_transform(affine_to_cpu(base));
    ctx.set_paint(color.to_cpu());
    ctx.fill_path(&bezpath_to_cpu(path));
}

pub(crate) fn stroke_path(
    ctx: &mut vello_cpu::RenderContext,
    base: Affine,
    path: &BezPath,
    width: f64,
    color: Color,
) {
    ctx.set_transform(affine_to_cpu(base));
    ctx.set_paint(color.to_cpu());
    ctx.set_stroke(vello_cpu::kurbo::Stroke::new(width));
    ctx.stroke_path(&bezpath_to_cpu(path));
}

pub(crate) fn stroke_rect(
    ctx: &mut vello_cpu::RenderContext,
    base: Affine,
    r: Rect,
    width: f64,
    color: Color,
) {
    stroke_path(ctx, base, &r.to_path(0.1), width, color);
}

/// Dashed outline of `r`; the `[on, off]` pattern starts at the top-left corner.
pub(crate) fn stroke_dashed_rect(
    ctx: &mut vello_cpu::RenderContext,
    base: Affine,
    r: Rect,
    width: f64,
    dashes: [f64; 2],
    color: Color,
) {
    ctx.set_transform(affine_to_cpu(base));
    ctx.set_paint(color.to_cpu());
    ctx.set_stroke(vello_cpu::kurbo::Stroke::new(width).with_dashes(0.0, dashes));
    ctx.stroke_path(&bezpath_to_cpu(&r.to_path(0.1)));
}

pub(crate) fn circle(center: Point, radius: f64) -> BezPath {
    kurbo::Circle::new(center, radius).to_path(0.1)
}

pub(crate) fn rounded_rect(r: Rect, radius: f64) -> BezPath {
    let radius = radius.min(r.width().min(r.height()) / 2.0).max(0.0);
    kurbo::RoundedRect::from_rect(r, radius).to_path(0.1)
}

/// Paint a bitmap stretched over `dest` (logical units under `base`).
pub(crate) fn draw_image(
    ctx: &mut vello_cpu::RenderContext,
    base: Affine,
    image: &DecodedImage,
    dest: Rect,
) {
    draw_pixmap(ctx, base, image.pixmap(), dest);
}

pub(crate) fn draw_pixmap(
    ctx: &mut vello_cpu::RenderContext,
    base: Affine,
    pixmap: &Arc<vello_cpu::Pixmap>,
    dest: Rect,
) {
    let (iw, ih) = (f64::from(pixmap.width()), f64::from(pixmap.height()));
    if iw <= 0.0 || ih <= 0.0 || dest.width() <= 0.0 || dest.height() <= 0.0 {
        return;
    }
    let transform = base
        * Affine::translate((dest.x0, dest.y0))
        * Affine::scale_non_uniform(dest.width() / iw, dest.height() / ih);
    ctx.set_transform(affine_to_cpu(transform));
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(pixmap.clone()),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    });
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, iw, ih));
}

/// Copy a device-resolution cache layer onto the frame one pixel to one pixel.
pub(crate) fn blit(ctx: &mut vello_cpu::RenderContext, pixmap: &Arc<vello_cpu::Pixmap>) {
    let r = Rect::new(0.0, 0.0, f64::from(pixmap.width()), f64::from(pixmap.height()));
    draw_pixmap(ctx, Affine::IDENTITY, pixmap, r);
}

/// Translucent disc with a pause (two bars) or play (triangle) glyph.
pub(crate) fn video_glyph(
    ctx: &mut vello_cpu::RenderContext,
    base: Affine,
    center: Point,
    radius: f64,
    playing: bool,
) {
    let icon = (radius - 6.0).max(4.0);
    ctx.push_opacity_layer(0.9);
    fill_path(ctx, base, &circle(center, radius), Color::rgba8(17, 24, 39, 0.65));
    ctx.pop_layer();

    let (cx, cy) = (center.x, center.y);
    if playing {
        let bw = (icon * 0.35).floor().max(4.0);
        let gap = (icon * 0.25).floor().max(4.0);
        let bh = (icon * 1.2).floor();
        let top = cy - (bh / 2.0).floor();
        fill_rect(ctx, base, Rect::new(cx - gap - bw, top, cx - gap, top + bh), Color::WHITE);
        fill_rect(ctx, base, Rect::new(cx + gap, top, cx + gap + bw, top + bh), Color::WHITE);
    } else {
        let r = (icon * 1.2).floor();
        let left = cx - (r * 0.45).floor();
        let half = (r * 0.65).floor();
        let mut tri = BezPath::new();
        tri.move_to((left, cy - half));
        tri.line_to((left, cy + half));
        tri.line_to((cx + (r * 0.85).floor(), cy));
        tri.close_path();
        fill_path(ctx, base, &tri, Color::WHITE);
    }
}
