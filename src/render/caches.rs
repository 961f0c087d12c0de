use std::{collections::HashMap, sync::Arc};

use crate::{
    foundation::{
        color::Color,
        core::{Affine, BezPath, Rect},
        error::BoardResult,
    },
    layout::geometry::{GridGeometry, GridSignature},
    render::draw,
    resources::media::VideoFrame,
    scene::model::AssetId,
};

/// Device-pixel dimensions a cache layer was rendered at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct DeviceSize {
    pub width: u16,
    pub height: u16,
}

impl DeviceSize {
    fn new_pixmap(self) -> vello_cpu::Pixmap {
        vello_cpu::Pixmap::new(self.width, self.height)
    }
}

fn render_layer(
    size: DeviceSize,
    paint: impl FnOnce(&mut vello_cpu::RenderContext),
) -> Arc<vello_cpu::Pixmap> {
    let mut ctx = vello_cpu::RenderContext::new(size.width, size.height);
    paint(&mut ctx);
    ctx.flush();
    let mut pixmap = size.new_pixmap();
    ctx.render_to_pixmap(&mut pixmap);
    Arc::new(pixmap)
}

/// Grid lines rendered once per `(signature, device size)`.
#[derive(Default)]
pub(crate) struct GridCache {
    key: Option<(GridSignature, DeviceSize)>,
    layer: Option<Arc<vello_cpu::Pixmap>>,
    pub(crate) rebuilds: u64,
}

impl GridCache {
    pub(crate) fn invalidate(&mut self) {
        self.key = None;
        self.layer = None;
    }

    pub(crate) fn layer(
        &mut self,
        geometry: &GridGeometry,
        size: DeviceSize,
        dpr: f64,
        color: Color,
    ) -> &Arc<vello_cpu::Pixmap> {
        let key = (geometry.signature(), size);
        if self.key != Some(key) {
            self.layer = None;
            self.key = Some(key);
        }
        let rebuilds = &mut self.rebuilds;
        self.layer.get_or_insert_with(|| {
            tracing::debug!(cols = geometry.cols, rows = geometry.rows, "rebuilding grid cache");
            *rebuilds += 1;
            render_layer(size, |ctx| {
                let mut lines = BezPath::new();
                for &x in &geometry.verticals {
                    lines.move_to((x, 0.0));
                    lines.line_to((x, geometry.height));
                }
                for &y in &geometry.horizontals {
                    lines.move_to((0.0, y));
                    lines.line_to((geometry.width, y));
                }
                draw::stroke_path(ctx, Affine::scale(dpr), &lines, 1.0, color);
            })
        })
    }
}

/// Rendered non-video background, keyed by the scene's background revision.
#[derive(Default)]
pub(crate) struct BackgroundCache {
    key: Option<(u64, DeviceSize)>,
    layer: Option<Arc<vello_cpu::Pixmap>>,
    pub(crate) rebuilds: u64,
}

impl BackgroundCache {
    pub(crate) fn invalidate(&mut self) {
        self.key = None;
        self.layer = None;
    }

    pub(crate) fn is_valid(&self, revision: u64, size: DeviceSize) -> bool {
        self.key == Some((revision, size)) && self.layer.is_some()
    }

    pub(crate) fn store(
        &mut self,
        revision: u64,
        size: DeviceSize,
        paint: impl FnOnce(&mut vello_cpu::RenderContext),
    ) -> &Arc<vello_cpu::Pixmap> {
        tracing::debug!(revision, "rebuilding background cache");
        self.key = Some((revision, size));
        self.rebuilds += 1;
        self.layer.insert(render_layer(size, paint))
    }

    pub(crate) fn layer(&self) -> Option<&Arc<vello_cpu::Pixmap>> {
        self.layer.as_ref()
    }
}

/// Offscreen surface holding one video's latest frame at its on-screen box size.
pub(crate) struct VideoSurface {
    size: DeviceSize,
    seq: Option<u64>,
    pixmap: Arc<vello_cpu::Pixmap>,
}

/// Per-video offscreen surfaces keyed by asset identity.
#[derive(Default)]
pub(crate) struct VideoSurfaces {
    entries: HashMap<AssetId, VideoSurface>,
    pub(crate) repaints: u64,
}

impl VideoSurfaces {
    /// Surface for `id` holding `frame` at `size`, repainted only when either changed.
    pub(crate) fn surface(
        &mut self,
        id: AssetId,
        frame: &VideoFrame,
        width: u32,
        height: u32,
    ) -> BoardResult<&Arc<vello_cpu::Pixmap>> {
        let (w, h) = draw::pixmap_dims(width, height)?;
        let size = DeviceSize {
            width: w,
            height: h,
        };
        let entry = self.entries.entry(id).or_insert_with(|| VideoSurface {
            size,
            seq: None,
            pixmap: Arc::new(size.new_pixmap()),
        });
        if entry.size != size || entry.seq != Some(frame.seq) {
            self.repaints += 1;
            entry.pixmap = render_layer(size, |ctx| {
                let dest = Rect::new(0.0, 0.0, f64::from(w), f64::from(h));
                draw::draw_image(ctx, Affine::IDENTITY, &frame.image, dest);
            });
            entry.size = size;
            entry.seq = Some(frame.seq);
        }
        Ok(&entry.pixmap)
    }

    /// Drop surfaces whose asset is gone.
    pub(crate) fn retain(&mut self, live: impl Fn(AssetId) -> bool) {
        self.entries.retain(|id, _| live(*id));
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
