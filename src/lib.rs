#![forbid(unsafe_code)]

pub mod composer;
pub mod config;
pub mod foundation;
pub mod history;
pub mod interact;
pub mod layout;
pub mod render;
pub mod resources;
pub mod scene;
pub mod text;

pub use composer::{Composer, ComposerMessage, Key, LoadTarget};
pub use config::{BoardOpts, CacheOpts, HistoryOpts, InteractionTuning, RenderOpts};
pub use foundation::{
    color::Color,
    core::{FrameRGBA, Point, Rect, Size, Vec2, rect_xywh},
    error::{BoardError, BoardResult, LoadError},
};
pub use history::History;
pub use interact::{Board, Cursor, GestureKind, Handle, Interaction, Modifiers, Response};
pub use layout::geometry::{
    GridGeometry, GridSignature, LayoutPreset, canvas_size_for_stage, compute_geometry,
    responsive_grid,
};
pub use render::{OffscreenSurface, Overlay, RenderStats, Renderer, Surface};
pub use resources::{
    cache::{CacheKey, CacheStats, ImageCache},
    decode::{DecodedImage, SizeHint},
    fetch::{Fetch, FnFetcher, FsFetcher},
    media::{
        FrameSequenceSource, MediaOpener, SequenceMediaOpener, VideoFrame, VideoSource,
    },
};
pub use scene::{
    model::{Asset, AssetId, AssetKind, Background, ImageAsset, TextAlign, TextAsset, VideoAsset},
    snapshot::{AssetSnapshot, BackgroundSnapshot, SceneSnapshot},
    store::{Scene, SceneEvent, VideoPoll},
};
pub use text::{engine::TextEngine, font::FontSpec};
