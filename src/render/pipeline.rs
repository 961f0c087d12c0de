use crate::{
    config::RenderOpts,
    foundation::{
        color::Color,
        core::{Affine, FrameRGBA, Point, Rect, Size, rect_xywh},
        error::BoardResult,
    },
    interact::handles::{Handle, handle_rects},
    layout::geometry::{GridGeometry, responsive_grid},
    render::{
        caches::{BackgroundCache, DeviceSize, GridCache, VideoSurfaces},
        draw,
    },
    scene::{
        model::{Asset, AssetId, Background, TextAlign, cover_rect},
        store::Scene,
    },
    text::{
        engine::TextEngine,
        font::FontSpec,
        wrap::{TextMeasure, wrap_text},
    },
};

fn hover_color() -> Color {
    Color::rgba8(67, 56, 202, 0.95)
}

fn selection_color() -> Color {
    Color::rgba8(79, 70, 229, 0.95)
}

fn marquee_fill() -> Color {
    Color::rgba8(99, 102, 241, 0.15)
}

fn marquee_stroke() -> Color {
    Color::rgba8(99, 102, 241, 0.9)
}

/// Transient state drawn over the scene.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Overlay {
    /// Marquee rectangle in logical pixels while a marquee drag is active.
    pub marquee: Option<Rect>,
    /// A move or resize gesture is in progress; renders at 1x.
    pub gesture_active: bool,
}

/// Counters for cache behavior, mostly useful in tests and logs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub frames: u64,
    pub grid_rebuilds: u64,
    pub background_rebuilds: u64,
    pub video_repaints: u64,
    pub video_surfaces: usize,
}

/// Composes a [`Scene`] into device-resolution frames.
///
/// The grid and the non-video background are cached as device-resolution layers; videos are
/// drawn through per-asset offscreen surfaces. Everything else is recomposed every frame.
pub struct Renderer {
    opts: RenderOpts,
    video_radius: f64,
    text: TextEngine,
    logical: Size,
    host_dpr: f64,
    dpr: f64,
    device: DeviceSize,
    geometry: GridGeometry,
    low_quality: bool,
    ctx: Option<vello_cpu::RenderContext>,
    grid: GridCache,
    background: BackgroundCache,
    videos: VideoSurfaces,
    frames: u64,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("logical", &self.logical)
            .field("dpr", &self.dpr)
            .field("device", &self.device)
            .field("low_quality", &self.low_quality)
            .finish()
    }
}

impl Renderer {
    pub fn new(opts: RenderOpts, text: TextEngine) -> Self {
        Self {
            opts,
            video_radius: 28.0,
            text,
            logical: Size::new(1.0, 1.0),
            host_dpr: 1.0,
            dpr: 1.0,
            device: DeviceSize {
                width: 1,
                height: 1,
            },
            geometry: responsive_grid(1.0, 1.0),
            low_quality: false,
            ctx: None,
            grid: GridCache::default(),
            background: BackgroundCache::default(),
            videos: VideoSurfaces::default(),
            frames: 0,
        }
    }

    /// Radius of the play/pause disc drawn on videos.
    pub fn with_video_radius(mut self, radius: f64) -> Self {
        self.video_radius = radius.max(8.0);
        self
    }

    pub fn opts(&self) -> &RenderOpts {
        &self.opts
    }

    pub fn logical_size(&self) -> Size {
        self.logical
    }

    /// Effective device pixel ratio of the current frame buffer.
    pub fn dpr(&self) -> f64 {
        self.dpr
    }

    pub fn device_size(&self) -> (u32, u32) {
        (u32::from(self.device.width), u32::from(self.device.height))
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn grid_enabled(&self) -> bool {
        self.opts.grid_enabled
    }

    pub fn set_grid_enabled(&mut self, enabled: bool) {
        self.opts.grid_enabled = enabled;
    }

    pub fn low_quality(&self) -> bool {
        self.low_quality
    }

    pub fn set_low_quality(&mut self, low: bool) {
        if self.low_quality != low {
            self.low_quality = low;
            self.background.invalidate();
        }
    }

    pub fn text_engine_mut(&mut self) -> &mut TextEngine {
        &mut self.text
    }

    pub fn stats(&self) -> RenderStats {
        RenderStats {
            frames: self.frames,
            grid_rebuilds: self.grid.rebuilds,
            background_rebuilds: self.background.rebuilds,
            video_repaints: self.videos.repaints,
            video_surfaces: self.videos.len(),
        }
    }

    /// Ratio the next frame renders at: the host's, clamped, or 1 when quality is traded for speed.
    pub fn target_dpr(&self, gesture_active: bool) -> f64 {
        if self.low_quality || gesture_active {
            return 1.0;
        }
        let host = if self.host_dpr.is_finite() && self.host_dpr > 0.0 {
            self.host_dpr
        } else {
            1.0
        };
        host.min(self.opts.max_dpr)
    }

    /// Adopt a new logical size and host ratio; invalidates the grid and background layers.
    pub fn resize(&mut self, logical: Size, host_dpr: f64, gesture_active: bool) -> BoardResult<()> {
        self.host_dpr = host_dpr;
        let logical = Size::new(
            logical.width.round().max(1.0),
            logical.height.round().max(1.0),
        );
        self.apply_size(logical, self.target_dpr(gesture_active))
    }

    fn apply_size(&mut self, logical: Size, dpr: f64) -> BoardResult<()> {
        let (w, h) = draw::pixmap_dims(
            (logical.width * dpr).floor() as u32,
            (logical.height * dpr).floor() as u32,
        )?;
        self.logical = logical;
        self.dpr = dpr;
        self.device = DeviceSize {
            width: w,
            height: h,
        };
        self.geometry = responsive_grid(logical.width, logical.height);
        self.ctx = None;
        self.grid.invalidate();
        self.background.invalidate();
        tracing::debug!(
            width = logical.width,
            height = logical.height,
            dpr,
            cols = self.geometry.cols,
            rows = self.geometry.rows,
            "surface resized"
        );
        Ok(())
    }

    /// Hit-test and decoration bounds of one asset.
    pub fn asset_bounds(&mut self, asset: &Asset) -> Rect {
        asset.bounds(&mut self.text, self.logical.width)
    }

    /// Topmost asset whose bounds contain `p` (edges inclusive); empty boxes never hit.
    pub fn hit_test(&mut self, scene: &Scene, p: Point) -> Option<AssetId> {
        scene.iter().rev().find_map(|(id, asset)| {
            let b = self.asset_bounds(asset);
            let hit = b.width() > 0.0
                && b.height() > 0.0
                && p.x >= b.x0
                && p.y >= b.y0
                && p.x <= b.x1
                && p.y <= b.y1;
            hit.then_some(id)
        })
    }

    /// Handle of the sole selected asset under `p`.
    pub fn handle_at(&mut self, scene: &Scene, p: Point) -> Option<(AssetId, Handle)> {
        let id = scene.sole_selected()?;
        let asset = scene.get(id)?;
        let bounds = self.asset_bounds(asset);
        let with_sides = asset.is_text();
        crate::interact::handles::handle_at(bounds, self.opts.handle_size, with_sides, p)
            .map(|h| (id, h))
    }

    /// Compose one frame. Idempotent for an unchanged scene and overlay.
    #[tracing::instrument(skip_all, fields(frame = self.frames))]
    pub fn draw(&mut self, scene: &Scene, overlay: &Overlay) -> BoardResult<FrameRGBA> {
        let dpr = self.target_dpr(overlay.gesture_active);
        if (dpr - self.dpr).abs() > f64::EPSILON {
            self.apply_size(self.logical, dpr)?;
        }
        let base = Affine::scale(self.dpr);
        let surface = rect_xywh(0.0, 0.0, self.logical.width, self.logical.height);

        let mut ctx = self
            .ctx
            .take()
            .unwrap_or_else(|| vello_cpu::RenderContext::new(self.device.width, self.device.height));
        ctx.reset();
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        draw::fill_rect(&mut ctx, base, surface, self.opts.canvas_color);
        self.draw_background(&mut ctx, scene, base);
        if self.opts.grid_enabled {
            let layer = self
                .grid
                .layer(&self.geometry, self.device, self.dpr, self.opts.grid_color)
                .clone();
            draw::blit(&mut ctx, &layer);
        }

        self.videos.retain(|id| scene.contains(id));
        for (id, asset) in scene.iter() {
            if let Err(err) = self.draw_asset(&mut ctx, base, id, asset) {
                tracing::warn!(?id, kind = ?asset.kind(), error = %err, "asset draw failed");
            }
        }

        self.draw_decorations(&mut ctx, scene, base, overlay);
        if let Some(m) = overlay.marquee {
            draw::fill_rect(&mut ctx, base, m, marquee_fill());
            draw::stroke_dashed_rect(&mut ctx, base, m, 1.5, [6.0, 4.0], marquee_stroke());
        }
        draw::stroke_rect(
            &mut ctx,
            base,
            surface,
            self.opts.border_width,
            self.opts.border_color,
        );

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(self.device.width, self.device.height);
        ctx.render_to_pixmap(&mut pixmap);
        self.ctx = Some(ctx);
        self.frames += 1;

        Ok(FrameRGBA {
            width: u32::from(self.device.width),
            height: u32::from(self.device.height),
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }

    fn draw_background(&mut self, ctx: &mut vello_cpu::RenderContext, scene: &Scene, base: Affine) {
        let Some(bg) = scene.background() else {
            return;
        };
        if let Background::Video { media, ready, .. } = bg {
            let Some(frame) = media.current_frame().filter(|_| *ready) else {
                tracing::trace!("background video not ready");
                return;
            };
            let Some(dest) = cover_rect(
                Size::new(f64::from(frame.image.width), f64::from(frame.image.height)),
                self.logical,
            ) else {
                return;
            };
            draw::draw_image(ctx, base, &frame.image, dest);
            let center = Point::new(
                (dest.x0 + dest.width() / 2.0).round(),
                (dest.y0 + dest.height() / 2.0).round(),
            );
            draw::video_glyph(ctx, base, center, self.video_radius, media.is_playing());
            return;
        }

        let revision = scene.background_revision();
        if !self.background.is_valid(revision, self.device) {
            let logical = self.logical;
            let text = &mut self.text;
            self.background.store(revision, self.device, |layer| {
                paint_static_background(layer, text, bg, base, logical);
            });
        }
        if let Some(layer) = self.background.layer() {
            draw::blit(ctx, layer);
        }
    }

    fn draw_asset(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        base: Affine,
        id: AssetId,
        asset: &Asset,
    ) -> BoardResult<()> {
        match asset {
            Asset::Image(img) => {
                let Some(bitmap) = img.bitmap.as_ref().filter(|_| img.loaded) else {
                    tracing::trace!(source = %img.source, "image not loaded");
                    return Ok(());
                };
                let dest = rect_xywh(img.x, img.y, img.width, img.height);
                draw::draw_image(ctx, base, bitmap, dest);
            }
            Asset::Video(v) => {
                let Some(frame) = v.media.current_frame().filter(|_| v.ready) else {
                    tracing::trace!(source = %v.source, "video not ready");
                    return Ok(());
                };
                if v.width <= 0.0 || v.height <= 0.0 {
                    return Ok(());
                }
                let dest = rect_xywh(v.x, v.y, v.width, v.height);
                let surface = self.videos.surface(
                    id,
                    frame,
                    (v.width * self.dpr).round() as u32,
                    (v.height * self.dpr).round() as u32,
                )?;
                draw::draw_pixmap(ctx, base, surface, dest);
                let center = Point::new(
                    (v.x + v.width / 2.0).round(),
                    (v.y + v.height / 2.0).round(),
                );
                draw::video_glyph(ctx, base, center, self.video_radius, v.media.is_playing());
            }
            Asset::Text(t) => {
                let wrapped = t.layout(&mut self.text, self.logical.width);
                draw_lines(
                    ctx,
                    &mut self.text,
                    base,
                    &wrapped.lines,
                    &t.font,
                    t.color,
                    t.align,
                    t.x,
                    t.y,
                    wrapped.line_height,
                );
            }
        }
        Ok(())
    }

    fn draw_decorations(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        scene: &Scene,
        base: Affine,
        overlay: &Overlay,
    ) {
        if overlay.marquee.is_none()
            && let Some(id) = scene.hovered().filter(|id| !scene.is_selected(*id))
            && let Some(asset) = scene.get(id)
        {
            let b = self.asset_bounds(asset);
            draw::stroke_dashed_rect(ctx, base, b, 1.75, [4.0, 10.0], hover_color());
        }

        let selected = scene.selected_in_order();
        match selected.as_slice() {
            [] => {}
            [only] => {
                let Some(asset) = scene.get(*only) else {
                    return;
                };
                let b = self.asset_bounds(asset);
                draw::stroke_rect(ctx, base, b, 2.0, selection_color());
                self.draw_handles(ctx, base, b, asset.is_text());
            }
            many => {
                let union = many
                    .iter()
                    .filter_map(|id| scene.get(*id))
                    .map(|a| self.asset_bounds(a))
                    .filter(|b| b.width() > 0.0 && b.height() > 0.0)
                    .reduce(|a, b| a.union(b));
                if let Some(u) = union {
                    draw::stroke_rect(ctx, base, u, 2.0, selection_color());
                }
            }
        }
    }

    fn draw_handles(&self, ctx: &mut vello_cpu::RenderContext, base: Affine, b: Rect, text: bool) {
        let size = self.opts.handle_size;
        let r = (size / 2.0).floor();
        for (handle, rect) in handle_rects(b, size, text) {
            if handle.is_side() {
                let pill = draw::rounded_rect(rect, (rect.width().min(rect.height()) / 2.0).floor());
                draw::fill_path(ctx, base, &pill, selection_color());
                draw::stroke_path(ctx, base, &pill, 2.0, Color::WHITE);
            } else {
                let dot = draw::circle(Point::new(rect.x0 + r, rect.y0 + r), r);
                draw::stroke_path(ctx, base, &dot, 2.0, Color::WHITE);
                draw::fill_path(ctx, base, &dot, selection_color());
            }
        }
    }
}

/// Paint an image or text background into a cache layer.
fn paint_static_background(
    ctx: &mut vello_cpu::RenderContext,
    text: &mut TextEngine,
    bg: &Background,
    base: Affine,
    logical: Size,
) {
    match bg {
        Background::Image { bitmap, source } => {
            let Some(bitmap) = bitmap else {
                tracing::trace!(%source, "background image not loaded");
                return;
            };
            let natural = Size::new(f64::from(bitmap.width), f64::from(bitmap.height));
            if let Some(dest) = cover_rect(natural, logical) {
                draw::draw_image(ctx, base, bitmap, dest);
            }
        }
        Background::Text {
            text: content,
            color,
            font,
        } => {
            let wrapped = wrap_text(text, content, font, Some(logical.width - 32.0), logical.width);
            draw_lines(
                ctx,
                text,
                base,
                &wrapped.lines,
                font,
                *color,
                TextAlign::Left,
                16.0,
                24.0,
                wrapped.line_height,
            );
        }
        Background::Video { .. } => {}
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_lines(
    ctx: &mut vello_cpu::RenderContext,
    text: &mut TextEngine,
    base: Affine,
    lines: &[String],
    font: &FontSpec,
    color: Color,
    align: TextAlign,
    anchor_x: f64,
    top: f64,
    line_height: f64,
) {
    for (i, line) in lines.iter().enumerate() {
        let width = text.line_width(line, font);
        let x = match align {
            TextAlign::Left => anchor_x,
            TextAlign::Center => anchor_x - width / 2.0,
            TextAlign::Right => anchor_x - width,
        };
        let origin = Point::new(x, top + i as f64 * line_height);
        text.draw_line(ctx, base, line, font, color, origin);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
