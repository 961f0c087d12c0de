use serde::{Deserialize, Serialize};

use crate::foundation::color::Color;

/// Resource cache limits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheOpts {
    /// Simultaneous fetch+decode operations; further loads queue FIFO.
    pub max_concurrent: usize,
    pub max_items: usize,
    /// Budget over the sum of `width * height` of all cached bitmaps.
    pub max_pixels: u64,
    /// Longest decoded side when no size hint is given.
    pub max_decode_dim: u32,
}

impl Default for CacheOpts {
    fn default() -> Self {
        Self {
            max_concurrent: 6,
            max_items: 64,
            max_pixels: 200 * 1024 * 1024,
            max_decode_dim: 2560,
        }
    }
}

impl CacheOpts {
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n.max(1);
        self
    }

    pub fn with_max_items(mut self, n: usize) -> Self {
        self.max_items = n.max(1);
        self
    }

    pub fn with_max_pixels(mut self, n: u64) -> Self {
        self.max_pixels = n;
        self
    }

    pub fn with_max_decode_dim(mut self, n: u32) -> Self {
        self.max_decode_dim = n.max(1);
        self
    }
}

/// Render pipeline settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOpts {
    /// Upper clamp on the device pixel ratio.
    pub max_dpr: f64,
    pub canvas_color: Color,
    pub grid_color: Color,
    pub grid_enabled: bool,
    pub border_color: Color,
    pub border_width: f64,
    /// Side of the square corner handles, in logical pixels.
    pub handle_size: f64,
    /// Minimum spacing between video-driven redraws.
    pub video_frame_interval_ms: u64,
}

impl Default for RenderOpts {
    fn default() -> Self {
        Self {
            max_dpr: 2.0,
            canvas_color: Color::WHITE,
            grid_color: Color::rgba8(17, 24, 39, 0.22),
            grid_enabled: false,
            border_color: Color::rgba8(255, 255, 255, 0.5),
            border_width: 1.25,
            handle_size: 10.0,
            video_frame_interval_ms: 33,
        }
    }
}

impl RenderOpts {
    pub fn with_max_dpr(mut self, dpr: f64) -> Self {
        self.max_dpr = dpr.max(1.0);
        self
    }

    pub fn with_grid_enabled(mut self, enabled: bool) -> Self {
        self.grid_enabled = enabled;
        self
    }

    pub fn with_canvas_color(mut self, color: Color) -> Self {
        self.canvas_color = color;
        self
    }
}

/// Gesture tuning constants. The text gains and quantum are empirical.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionTuning {
    /// Damping applied to text wrap-width changes from side handles.
    pub text_side_gain: f64,
    /// Damping applied to text corner scaling.
    pub text_corner_gain: f64,
    /// Wrap widths snap to multiples of this.
    pub size_quantum: f64,
    pub min_asset_px: f64,
    pub min_text_width: f64,
    pub min_font_px: f64,
    /// Marquee drags smaller than this on both axes count as a click.
    pub click_threshold_px: f64,
    /// Hit radius of the play/pause overlay.
    pub video_toggle_radius: f64,
    /// Offset applied to duplicated and pasted assets.
    pub duplicate_offset: f64,
}

impl Default for InteractionTuning {
    fn default() -> Self {
        Self {
            text_side_gain: 0.75,
            text_corner_gain: 0.65,
            size_quantum: 2.0,
            min_asset_px: 16.0,
            min_text_width: 120.0,
            min_font_px: 8.0,
            click_threshold_px: 3.0,
            video_toggle_radius: 28.0,
            duplicate_offset: 12.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryOpts {
    pub limit: usize,
}

impl Default for HistoryOpts {
    fn default() -> Self {
        Self { limit: 50 }
    }
}

/// All tunables for a [`crate::Composer`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardOpts {
    pub cache: CacheOpts,
    pub render: RenderOpts,
    pub interaction: InteractionTuning,
    pub history: HistoryOpts,
}

impl BoardOpts {
    /// Defaults overlaid with `LAYERBOARD_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Some(n) = env_positive::<usize>("LAYERBOARD_CACHE_CONCURRENCY") {
            self.cache.max_concurrent = n;
        }
        if let Some(n) = env_positive::<usize>("LAYERBOARD_CACHE_MAX_ITEMS") {
            self.cache.max_items = n;
        }
        if let Some(n) = env_positive::<u64>("LAYERBOARD_CACHE_MAX_PIXELS") {
            self.cache.max_pixels = n;
        }
        if let Some(n) = env_positive::<usize>("LAYERBOARD_HISTORY_LIMIT") {
            self.history.limit = n;
        }
        self
    }

    pub fn with_cache(mut self, cache: CacheOpts) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_render(mut self, render: RenderOpts) -> Self {
        self.render = render;
        self
    }

    pub fn with_interaction(mut self, interaction: InteractionTuning) -> Self {
        self.interaction = interaction;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history.limit = limit.max(1);
        self
    }
}

fn env_positive<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .filter(|n| *n > T::default())
}
