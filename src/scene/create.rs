use std::sync::Arc;

use crate::{
    foundation::{
        color::Color,
        core::{Size, rect_xywh},
    },
    layout::geometry::fit_within,
    resources::{
        decode::{DecodedImage, SizeHint},
        media::VideoSource,
    },
    scene::model::{Asset, ImageAsset, TextAlign, TextAsset, VideoAsset},
    text::font::FontSpec,
};

/// Fraction of the surface's shorter side a newly placed image may span.
pub const PLACE_FRACTION: f64 = 0.35;

const VIDEO_BASE_WIDTH: f64 = 480.0;
const VIDEO_BASE_HEIGHT: f64 = 270.0;

pub fn default_text_color() -> Color {
    Color::rgba8(17, 24, 39, 1.0)
}

/// Decode hint for images about to be placed: twice the placement box of a 1920x1080 source.
pub fn placement_hint(surface: Size) -> SizeHint {
    let fit = fit_within(Size::new(1920.0, 1080.0), surface, PLACE_FRACTION);
    SizeHint::for_display(fit, 2.0)
}

/// An image sized to fit the surface and centered on it.
pub fn image_asset(bitmap: Arc<DecodedImage>, locator: impl Into<String>, surface: Size) -> Asset {
    let placed = fit_within(bitmap.natural_size(), surface, PLACE_FRACTION);
    let x = ((surface.width - placed.width) / 2.0).round();
    let y = ((surface.height - placed.height) / 2.0).round();
    let mut asset = ImageAsset {
        x,
        y,
        width: placed.width,
        height: placed.height,
        bitmap: None,
        loaded: false,
        natural_width: 0,
        natural_height: 0,
        source: locator.into(),
    };
    asset.set_bitmap(bitmap);
    Asset::Image(asset)
}

/// A 480x270 video box centered on the surface; refitted once metadata arrives.
pub fn video_asset(media: Box<dyn VideoSource>, locator: impl Into<String>, surface: Size) -> Asset {
    let mut asset = VideoAsset {
        x: ((surface.width - VIDEO_BASE_WIDTH) / 2.0).round(),
        y: ((surface.height - VIDEO_BASE_HEIGHT) / 2.0).round(),
        width: VIDEO_BASE_WIDTH,
        height: VIDEO_BASE_HEIGHT,
        media,
        ready: false,
        sized_from_metadata: false,
        source: locator.into(),
    };
    apply_video_metadata(&mut asset);
    Asset::Video(asset)
}

/// Refit the box to the clip's aspect at the base width, once. Returns whether it changed.
pub fn apply_video_metadata(asset: &mut VideoAsset) -> bool {
    if asset.sized_from_metadata {
        return false;
    }
    let Some((vw, vh)) = asset.media.natural_size().filter(|(w, h)| *w > 0 && *h > 0) else {
        return false;
    };
    let r = rect_xywh(
        asset.x,
        asset.y,
        VIDEO_BASE_WIDTH,
        (VIDEO_BASE_WIDTH * f64::from(vh) / f64::from(vw)).round(),
    );
    (asset.width, asset.height) = (r.width(), r.height());
    asset.sized_from_metadata = true;
    true
}

/// Centered text block near the top of the surface in the default style.
pub fn text_asset(text: impl Into<String>, surface: Size) -> Asset {
    Asset::Text(TextAsset {
        x: (surface.width / 2.0).round(),
        y: (surface.height * 0.2).round().max(48.0),
        text: text.into(),
        color: default_text_color(),
        font: FontSpec::default(),
        max_width: Some((surface.width * 0.6).floor().max(240.0)),
        align: TextAlign::Center,
    })
}
