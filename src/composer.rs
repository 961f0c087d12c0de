//! The single owned context tying scene, renderer, gestures, history and image loading together.

use std::{future::Future, sync::Arc, time::Duration};

use tokio::sync::{broadcast, mpsc};

use crate::{
    config::BoardOpts,
    foundation::{
        core::{FrameRGBA, Point, Size},
        error::{BoardError, BoardResult},
    },
    history::History,
    interact::{Board, Interaction, Modifiers, Response},
    render::{Renderer, Surface},
    resources::{
        cache::ImageCache,
        decode::{DecodedImage, SizeHint},
        fetch::Fetch,
        media::MediaOpener,
    },
    scene::{
        create,
        model::{AssetId, Background},
        snapshot::SceneSnapshot,
        store::{Scene, SceneEvent},
    },
    text::engine::TextEngine,
};

/// Where a loaded image goes once it arrives on the control thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadTarget {
    /// A new asset placed at the surface center.
    NewAsset,
    /// Existing images (and an image background) with the same source.
    Rehydrate,
    /// Replaces the background layer.
    Background,
}

/// Results posted back by load tasks; applied in [`Composer::tick`].
#[derive(Debug)]
pub enum ComposerMessage {
    ImageLoaded {
        locator: String,
        target: LoadTarget,
        result: BoardResult<Arc<DecodedImage>>,
    },
}

/// Keys the composer reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Delete,
    Backspace,
    Escape,
    Char(char),
}

/// Owns the scene and everything that reads or mutates it.
///
/// All mutation happens on the thread that calls into the composer. Image loads run as futures
/// the host spawns; their results queue on a channel until the next [`Composer::tick`].
pub struct Composer {
    opts: BoardOpts,
    scene: Scene,
    renderer: Renderer,
    interaction: Interaction,
    history: History,
    cache: ImageCache,
    media: Arc<dyn MediaOpener>,
    surface: Option<Box<dyn Surface>>,
    tx: mpsc::UnboundedSender<ComposerMessage>,
    rx: mpsc::UnboundedReceiver<ComposerMessage>,
    redraw_requested: bool,
    visible: bool,
    last_video_poll: Option<Duration>,
}

impl std::fmt::Debug for Composer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composer")
            .field("scene", &self.scene)
            .field("renderer", &self.renderer)
            .field("gesture", &self.interaction.kind())
            .field("redraw_requested", &self.redraw_requested)
            .field("visible", &self.visible)
            .finish()
    }
}

impl Composer {
    pub fn new(opts: BoardOpts, fetcher: Arc<dyn Fetch>, media: Arc<dyn MediaOpener>) -> Self {
        Self::with_text_engine(opts, fetcher, media, TextEngine::new())
    }

    pub fn with_text_engine(
        opts: BoardOpts,
        fetcher: Arc<dyn Fetch>,
        media: Arc<dyn MediaOpener>,
        text: TextEngine,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            scene: Scene::new(),
            renderer: Renderer::new(opts.render.clone(), text)
                .with_video_radius(opts.interaction.video_toggle_radius),
            interaction: Interaction::new(opts.interaction.clone()),
            history: History::new(opts.history.limit),
            cache: ImageCache::with_shared_fetcher(fetcher, opts.cache.clone()),
            media,
            surface: None,
            tx,
            rx,
            redraw_requested: false,
            visible: true,
            last_video_poll: None,
            opts,
        }
    }

    pub fn opts(&self) -> &BoardOpts {
        &self.opts
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Direct scene access for host glue; call [`Composer::push_history`] first to make the
    /// change undoable.
    pub fn scene_mut(&mut self) -> &mut Scene {
        self.schedule_redraw();
        &mut self.scene
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn text_engine_mut(&mut self) -> &mut TextEngine {
        self.renderer.text_engine_mut()
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SceneEvent> {
        self.scene.subscribe()
    }

    // ---- surface and rendering ----

    /// Attach the presentation surface, size the frame buffer to it and draw once.
    pub fn init_surface(&mut self, surface: Box<dyn Surface>) -> BoardResult<()> {
        self.surface = Some(surface);
        self.resize()
    }

    pub fn surface(&self) -> Option<&dyn Surface> {
        self.surface.as_deref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut (dyn Surface + 'static)> {
        self.surface.as_deref_mut()
    }

    /// Re-read the surface's size and pixel ratio, then redraw synchronously.
    pub fn resize(&mut self) -> BoardResult<()> {
        let surface = self
            .surface
            .as_ref()
            .ok_or_else(|| BoardError::validation("no surface attached"))?;
        let (size, dpr) = (surface.logical_size(), surface.device_pixel_ratio());
        self.renderer
            .resize(size, dpr, self.interaction.gesture_active())?;
        self.draw()
    }

    /// Logical size frames are composed at.
    pub fn logical_size(&self) -> Size {
        self.renderer.logical_size()
    }

    /// Compose one frame without presenting it.
    pub fn render_frame(&mut self) -> BoardResult<FrameRGBA> {
        let overlay = self.interaction.overlay();
        self.renderer.draw(&self.scene, &overlay)
    }

    /// Compose and present a frame now; clears any pending redraw.
    pub fn draw(&mut self) -> BoardResult<()> {
        self.redraw_requested = false;
        let frame = self.render_frame()?;
        let surface = self
            .surface
            .as_mut()
            .ok_or_else(|| BoardError::validation("no surface attached"))?;
        surface.present(frame)
    }

    /// Request a redraw on the next tick. Returns false when one was already pending.
    pub fn schedule_redraw(&mut self) -> bool {
        !std::mem::replace(&mut self.redraw_requested, true)
    }

    pub fn redraw_pending(&self) -> bool {
        self.redraw_requested
    }

    pub fn set_low_quality_mode(&mut self, low: bool) {
        self.renderer.set_low_quality(low);
        self.schedule_redraw();
    }

    pub fn low_quality_mode(&self) -> bool {
        self.renderer.low_quality()
    }

    /// Hidden composers neither draw nor advance videos; pending redraws wait.
    pub fn set_visibility(&mut self, visible: bool) {
        self.visible = visible;
        if visible {
            self.schedule_redraw();
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_grid_enabled(&mut self, enabled: bool) {
        self.renderer.set_grid_enabled(enabled);
        self.schedule_redraw();
    }

    pub fn grid_enabled(&self) -> bool {
        self.renderer.grid_enabled()
    }

    /// A video is playing, so the host should keep calling [`Composer::tick`] every frame.
    pub fn is_animating(&self) -> bool {
        self.visible && self.scene.any_video_playing()
    }

    /// One turn of the control loop at monotonic time `now`.
    ///
    /// Applies finished loads, advances videos at most once per frame interval and runs the
    /// pending redraw. Returns whether a frame was presented.
    pub fn tick(&mut self, now: Duration) -> BoardResult<bool> {
        while let Ok(msg) = self.rx.try_recv() {
            self.apply_message(msg);
        }
        if !self.visible {
            return Ok(false);
        }

        let interval = Duration::from_millis(self.opts.render.video_frame_interval_ms);
        let due = self
            .last_video_poll
            .is_none_or(|last| now.saturating_sub(last) >= interval);
        if due && self.scene.has_videos() {
            self.last_video_poll = Some(now);
            if self.scene.poll_videos(now).needs_redraw() {
                self.schedule_redraw();
            }
        }

        if self.redraw_requested && self.surface.is_some() {
            self.draw()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn apply_message(&mut self, msg: ComposerMessage) {
        let ComposerMessage::ImageLoaded {
            locator,
            target,
            result,
        } = msg;
        let bitmap = match result {
            Ok(bitmap) => bitmap,
            Err(err) => {
                tracing::warn!(%locator, error = %err, "image load failed");
                self.scene.emit(SceneEvent::LoadFailed {
                    locator,
                    reason: err.to_string(),
                });
                return;
            }
        };
        match target {
            LoadTarget::NewAsset => {
                self.history.push(&self.scene);
                let asset = create::image_asset(bitmap, locator, self.logical_size());
                let id = self.scene.add_asset(asset);
                tracing::debug!(?id, "image asset added");
            }
            LoadTarget::Rehydrate => {
                let attached = self.scene.attach_bitmap(&locator, &bitmap);
                tracing::debug!(%locator, attached, "bitmap attached");
            }
            LoadTarget::Background => {
                self.history.push(&self.scene);
                self.scene.set_background(Some(Background::Image {
                    bitmap: Some(bitmap),
                    source: locator,
                }));
            }
        }
        self.schedule_redraw();
    }

    // ---- asynchronous loading ----

    fn load_task(
        &self,
        locator: String,
        hint: Option<SizeHint>,
        target: LoadTarget,
    ) -> impl Future<Output = ()> + Send + use<> {
        let pending = self.cache.load(&locator, hint);
        let tx = self.tx.clone();
        async move {
            let result = pending.await;
            if tx
                .send(ComposerMessage::ImageLoaded {
                    locator,
                    target,
                    result,
                })
                .is_err()
            {
                tracing::debug!("composer dropped before load finished");
            }
        }
    }

    /// Load an image and add it as a new asset, sized to the surface. Spawn the returned future.
    pub fn load_image(&self, locator: &str) -> impl Future<Output = ()> + Send + use<> {
        let hint = create::placement_hint(self.logical_size());
        self.load_task(locator.to_owned(), Some(hint), LoadTarget::NewAsset)
    }

    pub fn load_background_image(
        &self,
        locator: &str,
    ) -> impl Future<Output = ()> + Send + use<> {
        self.load_task(locator.to_owned(), None, LoadTarget::Background)
    }

    /// Load bitmaps for every image that has none, e.g. after loading a scene document.
    pub fn rehydrate_images(&self) -> impl Future<Output = ()> + Send + use<> {
        let tasks: Vec<_> = self
            .scene
            .unloaded_image_sources()
            .into_iter()
            .map(|source| self.load_task(source, None, LoadTarget::Rehydrate))
            .collect();
        async move {
            futures_util::future::join_all(tasks).await;
        }
    }

    // ---- scene mutators ----

    /// Record the current scene as an undo point.
    pub fn push_history(&mut self) {
        self.history.push(&self.scene);
    }

    pub fn undo(&mut self) -> bool {
        self.interaction.cancel();
        let done = self.history.undo(&mut self.scene, self.media.as_ref());
        if done {
            self.schedule_redraw();
        }
        done
    }

    pub fn redo(&mut self) -> bool {
        self.interaction.cancel();
        let done = self.history.redo(&mut self.scene, self.media.as_ref());
        if done {
            self.schedule_redraw();
        }
        done
    }

    /// Replace the whole scene with a document; undoable.
    pub fn load_scene(&mut self, snapshot: &SceneSnapshot) {
        self.interaction.cancel();
        self.history.push(&self.scene);
        self.scene.restore(snapshot, self.media.as_ref());
        self.schedule_redraw();
    }

    pub fn add_asset(&mut self, asset: crate::scene::model::Asset) -> AssetId {
        self.history.push(&self.scene);
        self.schedule_redraw();
        self.scene.add_asset(asset)
    }

    pub fn add_assets(
        &mut self,
        assets: impl IntoIterator<Item = crate::scene::model::Asset>,
    ) -> Vec<AssetId> {
        self.history.push(&self.scene);
        self.schedule_redraw();
        self.scene.add_assets(assets)
    }

    /// Add a video asset with a fresh, paused handle.
    pub fn add_video(&mut self, locator: &str) -> BoardResult<AssetId> {
        let media = self.media.open_video(locator)?;
        let asset = create::video_asset(media, locator, self.logical_size());
        Ok(self.add_asset(asset))
    }

    pub fn add_text(&mut self, text: &str) -> AssetId {
        let asset = create::text_asset(text, self.logical_size());
        self.add_asset(asset)
    }

    pub fn set_background(&mut self, background: Option<Background>) {
        self.history.push(&self.scene);
        self.scene.set_background(background);
        self.schedule_redraw();
    }

    pub fn set_background_video(&mut self, locator: &str) -> BoardResult<()> {
        let media = self.media.open_video(locator)?;
        self.set_background(Some(Background::Video {
            media,
            ready: false,
            source: locator.to_owned(),
        }));
        Ok(())
    }

    pub fn clear_background(&mut self) -> bool {
        self.checkpointed(|scene, _| scene.background().is_some(), |scene, _| {
            scene.clear_background()
        })
    }

    pub fn detach_background(&mut self) -> bool {
        let size = self.logical_size();
        self.checkpointed(|scene, _| scene.background().is_some(), |scene, _| {
            scene.detach_background(size)
        })
    }

    pub fn set_selected_as_background(&mut self) -> bool {
        let size = self.logical_size();
        self.checkpointed(has_selection, |scene, _| scene.set_selected_as_background(size))
    }

    pub fn delete_selected(&mut self) -> usize {
        self.checkpointed(has_selection, |scene, _| scene.delete_selected())
    }

    pub fn duplicate_selected(&mut self) -> usize {
        let offset = self.opts.interaction.duplicate_offset;
        self.checkpointed(has_selection, |scene, media| {
            scene.duplicate_selected(media, offset)
        })
    }

    pub fn cut_selected(&mut self) -> usize {
        self.checkpointed(has_selection, |scene, _| scene.cut_selected())
    }

    pub fn copy_selected(&mut self) -> usize {
        self.scene.copy_selected()
    }

    pub fn paste(&mut self) -> usize {
        let offset = self.opts.interaction.duplicate_offset;
        self.checkpointed(
            |scene, _| scene.clipboard_len() > 0,
            |scene, media| scene.paste(media, offset),
        )
    }

    pub fn bring_to_front(&mut self) -> bool {
        self.checkpointed(has_selection, |scene, _| scene.bring_to_front())
    }

    pub fn bring_forward(&mut self) -> bool {
        self.checkpointed(has_selection, |scene, _| scene.bring_forward())
    }

    pub fn send_backward(&mut self) -> bool {
        self.checkpointed(has_selection, |scene, _| scene.send_backward())
    }

    pub fn send_to_back(&mut self) -> bool {
        self.checkpointed(has_selection, |scene, _| scene.send_to_back())
    }

    pub fn play_all_videos(&mut self) -> usize {
        self.schedule_redraw();
        self.scene.play_all_videos()
    }

    pub fn pause_all_videos(&mut self) -> usize {
        self.schedule_redraw();
        self.scene.pause_all_videos()
    }

    /// Returns whether videos are now playing.
    pub fn toggle_all_videos(&mut self) -> bool {
        self.schedule_redraw();
        self.scene.toggle_all_videos()
    }

    /// Run `apply` when `ready` holds. The pre-change state becomes an undo point only when
    /// `apply` reports a change, so no-op actions keep the redo stack.
    fn checkpointed<T: Default + PartialEq>(
        &mut self,
        ready: impl FnOnce(&Scene, &dyn MediaOpener) -> bool,
        apply: impl FnOnce(&mut Scene, &dyn MediaOpener) -> T,
    ) -> T {
        if !ready(&self.scene, self.media.as_ref()) {
            return T::default();
        }
        self.interaction.cancel();
        let before = self.scene.snapshot();
        let out = apply(&mut self.scene, self.media.as_ref());
        if out != T::default() {
            self.history.push_snapshot(before);
            self.schedule_redraw();
        }
        out
    }

    // ---- input ----

    fn with_board<R>(&mut self, f: impl FnOnce(&mut Interaction, &mut Board<'_>) -> R) -> R {
        let mut board = Board {
            scene: &mut self.scene,
            renderer: &mut self.renderer,
            history: &mut self.history,
        };
        f(&mut self.interaction, &mut board)
    }

    fn after_pointer(&mut self, response: Response) -> Response {
        if response.redraw {
            self.schedule_redraw();
        }
        response
    }

    pub fn pointer_down(&mut self, x: f64, y: f64, mods: Modifiers) -> Response {
        let r = self.with_board(|fsm, board| fsm.pointer_down(board, Point::new(x, y), mods));
        self.after_pointer(r)
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) -> Response {
        let r = self.with_board(|fsm, board| fsm.pointer_move(board, Point::new(x, y)));
        self.after_pointer(r)
    }

    pub fn pointer_up(&mut self) -> Response {
        let r = self.with_board(|fsm, board| fsm.pointer_up(board));
        self.after_pointer(r)
    }

    /// Keyboard shortcuts. Returns whether the key was consumed.
    pub fn key_down(&mut self, key: Key, mods: Modifiers) -> bool {
        match key {
            Key::Delete | Key::Backspace => self.delete_selected() > 0,
            Key::Escape => {
                self.interaction.cancel();
                self.scene.clear_selection();
                self.schedule_redraw();
                true
            }
            Key::Char(c) if mods.command() => match c.to_ascii_lowercase() {
                'x' => self.cut_selected() > 0,
                'c' => self.copy_selected() > 0,
                'v' => self.paste() > 0,
                'd' => self.duplicate_selected() > 0,
                'z' if mods.shift => self.redo(),
                'z' => self.undo(),
                'y' => self.redo(),
                'l' => {
                    self.set_low_quality_mode(true);
                    true
                }
                _ => false,
            },
            Key::Char(_) => false,
        }
    }
}

fn has_selection(scene: &Scene, _: &dyn MediaOpener) -> bool {
    !scene.selection().is_empty()
}

#[cfg(test)]
#[path = "../tests/unit/composer.rs"]
mod tests;
