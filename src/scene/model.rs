use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    foundation::{
        color::Color,
        core::{Point, Rect, Size, Vec2, rect_xywh},
    },
    resources::{decode::DecodedImage, media::VideoSource},
    text::{
        font::FontSpec,
        wrap::{TextMeasure, WrappedText, wrap_text},
    },
};

slotmap::new_key_type! {
    /// Stable identity of an asset; survives reordering.
    pub struct AssetId;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Image,
    Video,
    Text,
}

#[derive(Clone, Debug)]
pub struct ImageAsset {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Shared with the resource cache; never mutated.
    pub bitmap: Option<Arc<DecodedImage>>,
    pub loaded: bool,
    pub natural_width: u32,
    pub natural_height: u32,
    pub source: String,
}

impl ImageAsset {
    pub fn set_bitmap(&mut self, bitmap: Arc<DecodedImage>) {
        self.natural_width = bitmap.natural_width;
        self.natural_height = bitmap.natural_height;
        self.bitmap = Some(bitmap);
        self.loaded = true;
    }
}

#[derive(Debug)]
pub struct VideoAsset {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Exclusively owned; duplicates open their own handle.
    pub media: Box<dyn VideoSource>,
    /// Set once the first frame has been decoded.
    pub ready: bool,
    /// Whether the box has been fitted to the clip's aspect ratio.
    pub sized_from_metadata: bool,
    pub source: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextAsset {
    /// Anchor: left edge, center or right edge depending on `align`; `y` is the top.
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub color: Color,
    pub font: FontSpec,
    pub max_width: Option<f64>,
    pub align: TextAlign,
}

impl TextAsset {
    pub fn layout(&self, measure: &mut dyn TextMeasure, surface_width: f64) -> WrappedText {
        wrap_text(measure, &self.text, &self.font, self.max_width, surface_width)
    }

    /// Left edge of a block of width `w` for this anchor and alignment.
    pub fn left_for_width(&self, w: f64) -> f64 {
        match self.align {
            TextAlign::Left => self.x,
            TextAlign::Center => (self.x - w / 2.0).round(),
            TextAlign::Right => self.x - w,
        }
    }

    /// Anchor x that puts a block of width `w` at left edge `left`.
    pub fn anchor_for_left(&self, left: f64, w: f64) -> f64 {
        match self.align {
            TextAlign::Left => left,
            TextAlign::Center => left + w / 2.0,
            TextAlign::Right => left + w,
        }
    }

    pub fn bounds(&self, measure: &mut dyn TextMeasure, surface_width: f64) -> Rect {
        let wrapped = self.layout(measure, surface_width);
        rect_xywh(
            self.left_for_width(wrapped.width),
            self.y,
            wrapped.width,
            wrapped.height,
        )
    }
}

/// A positioned scene item. Vector order is z-order.
#[derive(Debug)]
pub enum Asset {
    Image(ImageAsset),
    Video(VideoAsset),
    Text(TextAsset),
}

impl Asset {
    pub fn kind(&self) -> AssetKind {
        match self {
            Self::Image(_) => AssetKind::Image,
            Self::Video(_) => AssetKind::Video,
            Self::Text(_) => AssetKind::Text,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    pub fn origin(&self) -> Point {
        match self {
            Self::Image(a) => Point::new(a.x, a.y),
            Self::Video(a) => Point::new(a.x, a.y),
            Self::Text(a) => Point::new(a.x, a.y),
        }
    }

    pub fn translate(&mut self, d: Vec2) {
        let (x, y) = match self {
            Self::Image(a) => (&mut a.x, &mut a.y),
            Self::Video(a) => (&mut a.x, &mut a.y),
            Self::Text(a) => (&mut a.x, &mut a.y),
        };
        *x += d.x;
        *y += d.y;
    }

    /// Stored box for image and video assets.
    pub fn box_bounds(&self) -> Option<Rect> {
        match self {
            Self::Image(a) => Some(rect_xywh(a.x, a.y, a.width, a.height)),
            Self::Video(a) => Some(rect_xywh(a.x, a.y, a.width, a.height)),
            Self::Text(_) => None,
        }
    }

    pub fn set_box(&mut self, r: Rect) {
        match self {
            Self::Image(a) => (a.x, a.y, a.width, a.height) = (r.x0, r.y0, r.width(), r.height()),
            Self::Video(a) => (a.x, a.y, a.width, a.height) = (r.x0, r.y0, r.width(), r.height()),
            Self::Text(_) => {}
        }
    }

    /// Hit-test and decoration bounds; text is measured against the surface width.
    pub fn bounds(&self, measure: &mut dyn TextMeasure, surface_width: f64) -> Rect {
        match self {
            Self::Text(t) => t.bounds(measure, surface_width),
            other => other.box_bounds().unwrap_or(Rect::ZERO),
        }
    }

    pub fn as_video_mut(&mut self) -> Option<&mut VideoAsset> {
        match self {
            Self::Video(v) => Some(v),
            _ => None,
        }
    }
}

/// Full-surface layer beneath all assets; images and videos are cropped to cover.
#[derive(Debug)]
pub enum Background {
    Image {
        bitmap: Option<Arc<DecodedImage>>,
        source: String,
    },
    Video {
        media: Box<dyn VideoSource>,
        ready: bool,
        source: String,
    },
    Text {
        text: String,
        color: Color,
        font: FontSpec,
    },
}

impl Background {
    pub fn is_video(&self) -> bool {
        matches!(self, Self::Video { .. })
    }

    pub fn video_mut(&mut self) -> Option<&mut Box<dyn VideoSource>> {
        match self {
            Self::Video { media, .. } => Some(media),
            _ => None,
        }
    }

    /// Release exclusive resources before the layer is dropped or replaced.
    pub(crate) fn release(&mut self) {
        if let Some(media) = self.video_mut() {
            media.pause();
        }
    }
}

/// Destination rectangle that scales `content` to cover `surface`, centered.
pub fn cover_rect(content: Size, surface: Size) -> Option<Rect> {
    if content.width <= 0.0 || content.height <= 0.0 {
        return None;
    }
    let scale = (surface.width / content.width).max(surface.height / content.height);
    let w = (content.width * scale).round();
    let h = (content.height * scale).round();
    let x = ((surface.width - w) / 2.0).round();
    let y = ((surface.height - h) / 2.0).round();
    Some(rect_xywh(x, y, w, h))
}
