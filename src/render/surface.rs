use crate::foundation::{
    core::{FrameRGBA, Size},
    error::BoardResult,
};

/// Where composed frames go: a window, a canvas element or memory.
pub trait Surface {
    /// Size in logical (CSS-like) pixels.
    fn logical_size(&self) -> Size;

    /// Ratio of device pixels to logical pixels reported by the host.
    fn device_pixel_ratio(&self) -> f64;

    /// Take ownership of one composed frame at device resolution.
    fn present(&mut self, frame: FrameRGBA) -> BoardResult<()>;
}

/// In-memory surface keeping the most recent frame.
#[derive(Clone, Debug)]
pub struct OffscreenSurface {
    size: Size,
    dpr: f64,
    last: Option<FrameRGBA>,
    presents: u64,
}

impl OffscreenSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            size: Size::new(width, height),
            dpr: 1.0,
            last: None,
            presents: 0,
        }
    }

    pub fn with_dpr(mut self, dpr: f64) -> Self {
        self.dpr = dpr;
        self
    }

    pub fn set_logical_size(&mut self, width: f64, height: f64) {
        self.size = Size::new(width, height);
    }

    pub fn set_dpr(&mut self, dpr: f64) {
        self.dpr = dpr;
    }

    pub fn last_frame(&self) -> Option<&FrameRGBA> {
        self.last.as_ref()
    }

    pub fn take_frame(&mut self) -> Option<FrameRGBA> {
        self.last.take()
    }

    pub fn present_count(&self) -> u64 {
        self.presents
    }
}

impl Surface for OffscreenSurface {
    fn logical_size(&self) -> Size {
        self.size
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.dpr
    }

    fn present(&mut self, frame: FrameRGBA) -> BoardResult<()> {
        self.presents += 1;
        self.last = Some(frame);
        Ok(())
    }
}
