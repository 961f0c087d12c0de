use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, RwLock},
    time::Duration,
};

use crate::{
    foundation::error::{BoardError, BoardResult},
    resources::decode::DecodedImage,
};

/// A decoded video frame. `seq` increases whenever the displayed picture changes.
#[derive(Clone, Debug)]
pub struct VideoFrame {
    pub seq: u64,
    pub image: Arc<DecodedImage>,
}

/// Result of advancing a video source's clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FramePoll {
    /// A new picture is ready since the previous poll.
    NewFrame,
    Unchanged,
    /// The source has no frame-ready signal; callers redraw on a fixed interval instead.
    Unsupported,
}

/// A live, exclusively owned video playback handle.
pub trait VideoSource: Send {
    fn locator(&self) -> &str;

    /// Intrinsic size once metadata is known.
    fn natural_size(&self) -> Option<(u32, u32)>;

    fn is_playing(&self) -> bool;

    fn play(&mut self);

    fn pause(&mut self);

    /// Seek back to the start without changing play state.
    fn rewind(&mut self);

    /// Advance the source to monotonic time `now`.
    fn poll_frame(&mut self, now: Duration) -> FramePoll;

    fn current_frame(&self) -> Option<&VideoFrame>;
}

impl fmt::Debug for dyn VideoSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoSource")
            .field("locator", &self.locator())
            .field("playing", &self.is_playing())
            .field("frame", &self.current_frame().map(|fr| fr.seq))
            .finish()
    }
}

/// Creates video handles. Every call returns a new, paused handle.
pub trait MediaOpener: Send + Sync {
    fn open_video(&self, locator: &str) -> BoardResult<Box<dyn VideoSource>>;
}

/// Plays a fixed list of frames at a constant rate, looping.
///
/// The first frame becomes available on the first poll after opening.
pub struct FrameSequenceSource {
    locator: String,
    frames: Arc<[Arc<DecodedImage>]>,
    fps: f64,
    playing: bool,
    /// Playback position accumulated before the current play span.
    offset: Duration,
    anchor: Option<Duration>,
    last_now: Duration,
    current: Option<(usize, VideoFrame)>,
    next_seq: u64,
}

impl FrameSequenceSource {
    pub fn new(locator: impl Into<String>, frames: Vec<Arc<DecodedImage>>, fps: f64) -> Self {
        Self::from_shared(locator.into(), frames.into(), fps)
    }

    fn from_shared(locator: String, frames: Arc<[Arc<DecodedImage>]>, fps: f64) -> Self {
        Self {
            locator,
            frames,
            fps: if fps.is_finite() && fps > 0.0 { fps } else { 30.0 },
            playing: false,
            offset: Duration::ZERO,
            anchor: None,
            last_now: Duration::ZERO,
            current: None,
            next_seq: 0,
        }
    }

    /// A source that never produces a frame.
    pub fn pending(locator: impl Into<String>) -> Self {
        Self::new(locator, Vec::new(), 30.0)
    }

    fn position(&self) -> Duration {
        match self.anchor {
            Some(anchor) => self.offset + self.last_now.saturating_sub(anchor),
            None => self.offset,
        }
    }
}

impl VideoSource for FrameSequenceSource {
    fn locator(&self) -> &str {
        &self.locator
    }

    fn natural_size(&self) -> Option<(u32, u32)> {
        self.frames.first().map(|f| (f.width, f.height))
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn play(&mut self) {
        self.playing = true;
    }

    fn pause(&mut self) {
        self.offset = self.position();
        self.anchor = None;
        self.playing = false;
    }

    fn rewind(&mut self) {
        self.offset = Duration::ZERO;
        if self.anchor.is_some() {
            self.anchor = Some(self.last_now);
        }
    }

    fn poll_frame(&mut self, now: Duration) -> FramePoll {
        self.last_now = now;
        if self.frames.is_empty() {
            return FramePoll::Unchanged;
        }
        if self.playing && self.anchor.is_none() {
            self.anchor = Some(now);
        }

        let idx = (self.position().as_secs_f64() * self.fps).floor() as usize % self.frames.len();
        if self.current.as_ref().is_some_and(|(i, _)| *i == idx) {
            return FramePoll::Unchanged;
        }
        let frame = VideoFrame {
            seq: self.next_seq,
            image: self.frames[idx].clone(),
        };
        self.next_seq += 1;
        self.current = Some((idx, frame));
        FramePoll::NewFrame
    }

    fn current_frame(&self) -> Option<&VideoFrame> {
        self.current.as_ref().map(|(_, f)| f)
    }
}

/// Opens [`FrameSequenceSource`]s from registered frame lists.
///
/// Unregistered locators open as pending sources that never become ready.
#[derive(Default)]
pub struct SequenceMediaOpener {
    clips: RwLock<HashMap<String, (Arc<[Arc<DecodedImage>]>, f64)>>,
}

impl SequenceMediaOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        locator: impl Into<String>,
        frames: Vec<Arc<DecodedImage>>,
        fps: f64,
    ) -> BoardResult<()> {
        if frames.is_empty() {
            return Err(BoardError::validation("video clip needs at least one frame"));
        }
        let mut clips = self
            .clips
            .write()
            .map_err(|_| BoardError::validation("media registry lock poisoned"))?;
        clips.insert(locator.into(), (frames.into(), fps));
        Ok(())
    }
}

impl MediaOpener for SequenceMediaOpener {
    fn open_video(&self, locator: &str) -> BoardResult<Box<dyn VideoSource>> {
        let clips = self
            .clips
            .read()
            .map_err(|_| BoardError::validation("media registry lock poisoned"))?;
        let source = match clips.get(locator) {
            Some((frames, fps)) => {
                FrameSequenceSource::from_shared(locator.to_owned(), frames.clone(), *fps)
            }
            None => {
                tracing::debug!(%locator, "no clip registered, opening pending video");
                FrameSequenceSource::pending(locator)
            }
        };
        Ok(Box::new(source))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/resources/media.rs"]
mod tests;
