use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    foundation::{color::Color, core::Vec2},
    resources::{
        decode::DecodedImage,
        media::{FrameSequenceSource, MediaOpener, VideoSource},
    },
    scene::model::{Asset, Background, ImageAsset, TextAlign, TextAsset, VideoAsset},
    text::font::FontSpec,
};

/// Geometry and content of one asset, without live media handles.
///
/// Image bitmaps ride along in memory so restored images draw immediately; they are not
/// serialized.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AssetSnapshot {
    Image {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        source: String,
        #[serde(skip)]
        bitmap: Option<Arc<DecodedImage>>,
    },
    Video {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        source: String,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
        color: Color,
        font: FontSpec,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_width: Option<f64>,
        #[serde(default)]
        align: TextAlign,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackgroundSnapshot {
    Image {
        source: String,
        #[serde(skip)]
        bitmap: Option<Arc<DecodedImage>>,
    },
    Video {
        source: String,
    },
    Text {
        text: String,
        color: Color,
        font: FontSpec,
    },
}

/// Visual state of a scene: assets back to front plus the background.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    #[serde(default)]
    pub assets: Vec<AssetSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<BackgroundSnapshot>,
}

impl AssetSnapshot {
    pub fn capture(asset: &Asset) -> Self {
        match asset {
            Asset::Image(a) => Self::Image {
                x: a.x,
                y: a.y,
                width: a.width,
                height: a.height,
                source: a.source.clone(),
                bitmap: a.bitmap.clone(),
            },
            Asset::Video(a) => Self::Video {
                x: a.x,
                y: a.y,
                width: a.width,
                height: a.height,
                source: a.source.clone(),
            },
            Asset::Text(a) => Self::Text {
                x: a.x,
                y: a.y,
                text: a.text.clone(),
                color: a.color,
                font: a.font.clone(),
                max_width: a.max_width,
                align: a.align,
            },
        }
    }

    pub fn translated(mut self, d: Vec2) -> Self {
        let (x, y) = match &mut self {
            Self::Image { x, y, .. } | Self::Video { x, y, .. } | Self::Text { x, y, .. } => (x, y),
        };
        *x += d.x;
        *y += d.y;
        self
    }

    /// Rebuild a live asset. Videos get a fresh paused handle that is not yet ready.
    pub fn instantiate(&self, media: &dyn MediaOpener) -> Asset {
        match self {
            Self::Image {
                x,
                y,
                width,
                height,
                source,
                bitmap,
            } => Asset::Image(ImageAsset {
                x: *x,
                y: *y,
                width: *width,
                height: *height,
                loaded: bitmap.is_some(),
                natural_width: bitmap.as_ref().map_or(0, |b| b.natural_width),
                natural_height: bitmap.as_ref().map_or(0, |b| b.natural_height),
                bitmap: bitmap.clone(),
                source: source.clone(),
            }),
            Self::Video {
                x,
                y,
                width,
                height,
                source,
            } => Asset::Video(VideoAsset {
                x: *x,
                y: *y,
                width: *width,
                height: *height,
                media: open_paused(media, source),
                ready: false,
                sized_from_metadata: true,
                source: source.clone(),
            }),
            Self::Text {
                x,
                y,
                text,
                color,
                font,
                max_width,
                align,
            } => Asset::Text(TextAsset {
                x: *x,
                y: *y,
                text: text.clone(),
                color: *color,
                font: font.clone(),
                max_width: *max_width,
                align: *align,
            }),
        }
    }
}

impl BackgroundSnapshot {
    pub fn capture(bg: &Background) -> Self {
        match bg {
            Background::Image { bitmap, source } => Self::Image {
                source: source.clone(),
                bitmap: bitmap.clone(),
            },
            Background::Video { source, .. } => Self::Video {
                source: source.clone(),
            },
            Background::Text { text, color, font } => Self::Text {
                text: text.clone(),
                color: *color,
                font: font.clone(),
            },
        }
    }

    pub fn instantiate(&self, media: &dyn MediaOpener) -> Background {
        match self {
            Self::Image { source, bitmap } => Background::Image {
                bitmap: bitmap.clone(),
                source: source.clone(),
            },
            Self::Video { source } => Background::Video {
                media: open_paused(media, source),
                ready: false,
                source: source.clone(),
            },
            Self::Text { text, color, font } => Background::Text {
                text: text.clone(),
                color: *color,
                font: font.clone(),
            },
        }
    }
}

/// Open a paused handle; restoration never fails, so open errors yield a never-ready source.
pub(crate) fn open_paused(media: &dyn MediaOpener, source: &str) -> Box<dyn VideoSource> {
    let mut handle = media.open_video(source).unwrap_or_else(|err| {
        tracing::warn!(%source, error = %err, "could not reopen video");
        Box::new(FrameSequenceSource::pending(source))
    });
    handle.pause();
    handle
}
