use std::sync::Arc;

use anyhow::Context;
use image::imageops::FilterType;

use crate::foundation::{
    core::Size,
    error::{BoardError, BoardResult, LoadError},
};

/// Requested decode size. The decoded bitmap fits within this box, aspect preserved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SizeHint {
    pub width: u32,
    pub height: u32,
}

impl SizeHint {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Hint covering `size` at `scale` device pixels per logical pixel.
    pub fn for_display(size: Size, scale: f64) -> Self {
        Self::new(
            (size.width * scale).round().max(1.0) as u32,
            (size.height * scale).round().max(1.0) as u32,
        )
    }
}

/// Immutable decoded bitmap, premultiplied and ready to paint.
///
/// Shared by reference between the cache and any number of assets.
#[derive(Clone, Debug)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Dimensions of the source before any decode-time downscale.
    pub natural_width: u32,
    pub natural_height: u32,
    pixmap: Arc<vello_cpu::Pixmap>,
}

impl PartialEq for DecodedImage {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && Arc::ptr_eq(&self.pixmap, &other.pixmap)
    }
}

impl DecodedImage {
    pub fn from_premul_rgba8(rgba8_premul: &[u8], width: u32, height: u32) -> BoardResult<Self> {
        let pixmap = premul_bytes_to_pixmap(rgba8_premul, width, height)?;
        Ok(Self {
            width,
            height,
            natural_width: width,
            natural_height: height,
            pixmap: Arc::new(pixmap),
        })
    }

    /// Uniformly filled bitmap, used for placeholders and tests.
    pub fn solid(width: u32, height: u32, rgba8_premul: [u8; 4]) -> BoardResult<Self> {
        let bytes = rgba8_premul.repeat(width as usize * height as usize);
        Self::from_premul_rgba8(&bytes, width, height)
    }

    pub fn with_natural_size(mut self, width: u32, height: u32) -> Self {
        self.natural_width = width;
        self.natural_height = height;
        self
    }

    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    pub fn natural_size(&self) -> Size {
        Size::new(f64::from(self.natural_width), f64::from(self.natural_height))
    }

    pub fn rgba8_premul(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    pub(crate) fn pixmap(&self) -> &Arc<vello_cpu::Pixmap> {
        &self.pixmap
    }

    pub(crate) fn paint(&self) -> vello_cpu::Image {
        vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(self.pixmap.clone()),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        }
    }
}

/// Decode raster bytes, falling back to SVG rasterization when the raster decoders reject them.
#[tracing::instrument(skip(bytes), fields(len = bytes.len()))]
pub fn decode_image(
    locator: &str,
    bytes: &[u8],
    hint: Option<SizeHint>,
    max_dim: u32,
) -> Result<DecodedImage, LoadError> {
    match decode_raster(bytes, hint, max_dim) {
        Ok(img) => Ok(img),
        Err(raster_err) => {
            tracing::debug!(%locator, error = %raster_err, "raster decode failed, trying svg");
            decode_svg(bytes, hint, max_dim).map_err(|svg_err| {
                LoadError::decode(locator, format!("{raster_err:#}; svg fallback: {svg_err:#}"))
            })
        }
    }
}

fn decode_raster(bytes: &[u8], hint: Option<SizeHint>, max_dim: u32) -> anyhow::Result<DecodedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let (natural_width, natural_height) = (dyn_img.width(), dyn_img.height());
    let (bw, bh) = target_box(natural_width, natural_height, hint, max_dim);
    let dyn_img = if natural_width > bw || natural_height > bh {
        dyn_img.resize(bw, bh, FilterType::Triangle)
    } else {
        dyn_img
    };

    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(DecodedImage::from_premul_rgba8(&rgba8_premul, width, height)?
        .with_natural_size(natural_width, natural_height))
}

fn decode_svg(bytes: &[u8], hint: Option<SizeHint>, max_dim: u32) -> anyhow::Result<DecodedImage> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;
    let size = tree.size();
    if !size.width().is_finite() || size.width() <= 0.0 || size.height() <= 0.0 {
        anyhow::bail!("svg has invalid width/height");
    }
    let natural_width = (size.width().ceil() as u32).max(1);
    let natural_height = (size.height().ceil() as u32).max(1);

    // Vector sources scale up to the hint as well as down.
    let (bw, bh) = target_box(natural_width, natural_height, hint, max_dim);
    let scale = (f64::from(bw) / f64::from(natural_width))
        .min(f64::from(bh) / f64::from(natural_height));
    let scale = if hint.is_some() { scale } else { scale.min(1.0) };
    let width = ((f64::from(natural_width) * scale).round() as u32).max(1);
    let height = ((f64::from(natural_height) * scale).round() as u32).max(1);

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| anyhow::anyhow!("failed to allocate svg pixmap {width}x{height}"))?;
    let xform = resvg::tiny_skia::Transform::from_scale(
        width as f32 / size.width(),
        height as f32 / size.height(),
    );
    resvg::render(&tree, xform, &mut pixmap.as_mut());

    Ok(DecodedImage::from_premul_rgba8(pixmap.data(), width, height)?
        .with_natural_size(natural_width, natural_height))
}

/// Box the decoded bitmap must fit in: the hint when given, otherwise `max_dim` square.
fn target_box(natural_width: u32, natural_height: u32, hint: Option<SizeHint>, max_dim: u32) -> (u32, u32) {
    let max_dim = max_dim.clamp(1, u32::from(u16::MAX));
    match hint {
        Some(h) => (h.width.min(max_dim), h.height.min(max_dim)),
        None => (natural_width.min(max_dim), natural_height.min(max_dim)),
    }
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

pub(crate) fn premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> BoardResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| BoardError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| BoardError::render("image height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(BoardError::render("image has zero size"));
    }
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(BoardError::render("premultiplied image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/resources/decode.rs"]
mod tests;
