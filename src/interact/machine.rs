use std::collections::HashSet;

use crate::{
    config::InteractionTuning,
    foundation::core::{Point, Rect, rects_overlap},
    history::History,
    interact::{
        handles::{Cursor, Handle},
        resize::{resize_box, text_corner_scale, text_side_width},
    },
    render::{Overlay, Renderer},
    scene::{
        model::{Asset, AssetId, Background, TextAlign},
        store::Scene,
    },
};

/// Keyboard modifiers held during a pointer event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub meta: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        meta: false,
        alt: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    /// Any modifier extends the selection instead of replacing it.
    pub fn additive(self) -> bool {
        self.shift || self.toggles()
    }

    /// Modifiers that add or remove; shift alone only adds.
    pub fn toggles(self) -> bool {
        self.ctrl || self.meta || self.alt
    }

    /// The platform command key: Ctrl or Meta.
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// What the host should do after an event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Response {
    pub cursor: Cursor,
    /// Visible state changed; schedule a redraw.
    pub redraw: bool,
    /// A history checkpoint was pushed by this event.
    pub checkpoint: bool,
    /// A play/pause overlay was clicked.
    pub toggled_video: bool,
}

impl Response {
    fn cursor(cursor: Cursor) -> Self {
        Self {
            cursor,
            ..Self::default()
        }
    }

    fn redraw(mut self) -> Self {
        self.redraw = true;
        self
    }
}

/// Values captured when a resize starts; every sample is computed from these.
#[derive(Clone, Debug, PartialEq)]
enum ResizeBase {
    Box,
    Text {
        font_px: f64,
        max_width: Option<f64>,
        /// Horizontal center of the block at gesture start.
        center_x: f64,
    },
}

#[derive(Clone, Debug, PartialEq)]
struct ResizeGesture {
    target: AssetId,
    handle: Handle,
    start_bounds: Rect,
    start_pointer: Point,
    base: ResizeBase,
    checkpointed: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
enum Gesture {
    #[default]
    Idle,
    Moving {
        last: Point,
        checkpointed: bool,
    },
    Resizing(ResizeGesture),
    MarqueeSelecting {
        start: Point,
        end: Point,
        additive: bool,
        base: HashSet<AssetId>,
    },
}

/// Coarse gesture state, for hosts and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureKind {
    Idle,
    Moving,
    Resizing,
    MarqueeSelecting,
}

/// Everything a pointer event may touch.
pub struct Board<'a> {
    pub scene: &'a mut Scene,
    pub renderer: &'a mut Renderer,
    pub history: &'a mut History,
}

/// Turns pointer samples into hover, selection, move, resize and marquee gestures.
///
/// Coordinates are logical pixels. A move or resize pushes exactly one history checkpoint, on
/// its first pointer-move sample.
#[derive(Debug, Default)]
pub struct Interaction {
    tuning: InteractionTuning,
    gesture: Gesture,
    hovered_handle: Option<Handle>,
}

impl Interaction {
    pub fn new(tuning: InteractionTuning) -> Self {
        Self {
            tuning,
            gesture: Gesture::Idle,
            hovered_handle: None,
        }
    }

    pub fn tuning(&self) -> &InteractionTuning {
        &self.tuning
    }

    pub fn kind(&self) -> GestureKind {
        match self.gesture {
            Gesture::Idle => GestureKind::Idle,
            Gesture::Moving { .. } => GestureKind::Moving,
            Gesture::Resizing(_) => GestureKind::Resizing,
            Gesture::MarqueeSelecting { .. } => GestureKind::MarqueeSelecting,
        }
    }

    /// A move or resize is in progress.
    pub fn gesture_active(&self) -> bool {
        matches!(self.gesture, Gesture::Moving { .. } | Gesture::Resizing(_))
    }

    pub fn hovered_handle(&self) -> Option<Handle> {
        self.hovered_handle
    }

    /// Normalized marquee rectangle while a marquee drag is active.
    pub fn marquee(&self) -> Option<Rect> {
        match &self.gesture {
            Gesture::MarqueeSelecting { start, end, .. } => Some(Rect::from_points(*start, *end)),
            _ => None,
        }
    }

    pub fn overlay(&self) -> Overlay {
        Overlay {
            marquee: self.marquee(),
            gesture_active: self.gesture_active(),
        }
    }

    /// Abandon the current gesture without touching the scene.
    pub fn cancel(&mut self) {
        if self.gesture != Gesture::Idle {
            tracing::debug!(gesture = ?self.kind(), "gesture cancelled");
        }
        self.gesture = Gesture::Idle;
        self.hovered_handle = None;
    }

    pub fn pointer_down(&mut self, board: &mut Board<'_>, p: Point, mods: Modifiers) -> Response {
        if self.gesture != Gesture::Idle {
            self.cancel();
        }

        if let Some(id) = board.renderer.hit_test(board.scene, p) {
            if self.toggle_asset_video(board.scene, id, p) {
                return Response {
                    cursor: Cursor::Pointer,
                    redraw: true,
                    checkpoint: false,
                    toggled_video: true,
                };
            }

            if !mods.additive() {
                board.scene.select_only(id);
            } else if mods.toggles() {
                board.scene.toggle_selected(id);
            } else {
                board.scene.add_to_selection(id);
            }

            if board.scene.is_selected(id)
                && let Some(asset) = board.scene.get(id)
            {
                let bounds = board.renderer.asset_bounds(asset);
                let size = board.renderer.opts().handle_size;
                let with_sides = asset.is_text();
                if let Some(handle) =
                    crate::interact::handles::handle_at(bounds, size, with_sides, p)
                {
                    return self.begin_resize(board, id, handle, p);
                }
            }

            if board.scene.selection().is_empty() {
                // Toggled the only selected asset off; nothing to drag.
                return Response::cursor(Cursor::Pointer).redraw();
            }

            self.gesture = Gesture::Moving {
                last: p,
                checkpointed: false,
            };
            tracing::debug!(?id, "move started");
            return Response::cursor(Cursor::Move).redraw();
        }

        if self.toggle_background_video(board.scene, board.renderer, p) {
            return Response {
                cursor: Cursor::Pointer,
                redraw: true,
                checkpoint: false,
                toggled_video: true,
            };
        }

        if let Some((id, handle)) = board.renderer.handle_at(board.scene, p) {
            return self.begin_resize(board, id, handle, p);
        }

        self.gesture = Gesture::MarqueeSelecting {
            start: p,
            end: p,
            additive: mods.additive(),
            base: board.scene.selection().clone(),
        };
        Response::cursor(Cursor::Default).redraw()
    }

    pub fn pointer_move(&mut self, board: &mut Board<'_>, p: Point) -> Response {
        if let Gesture::MarqueeSelecting { .. } = self.gesture {
            return self.update_marquee(board, p);
        }

        let hovered = board.renderer.hit_test(board.scene, p);
        let mut redraw = false;
        if hovered != board.scene.hovered() {
            board.scene.set_hovered(hovered);
            redraw = true;
        }

        if self.gesture == Gesture::Idle {
            let cursor = self.idle_cursor(board, hovered, p);
            return Response {
                cursor,
                redraw,
                ..Response::default()
            };
        }

        match &mut self.gesture {
            Gesture::Moving { last, checkpointed } => {
                let mut response = Response::cursor(Cursor::Move).redraw();
                if !*checkpointed {
                    board.history.push(board.scene);
                    *checkpointed = true;
                    response.checkpoint = true;
                }
                let delta = p - *last;
                *last = p;
                for id in board.scene.selected_in_order() {
                    if let Some(asset) = board.scene.get_mut(id) {
                        asset.translate(delta);
                    }
                }
                response
            }
            Gesture::Resizing(resize) => {
                let mut response = Response::cursor(resize.handle.cursor()).redraw();
                if !resize.checkpointed {
                    board.history.push(board.scene);
                    resize.checkpointed = true;
                    response.checkpoint = true;
                }
                apply_resize(resize, board, p, &self.tuning);
                response
            }
            Gesture::Idle | Gesture::MarqueeSelecting { .. } => Response::default(),
        }
    }

    pub fn pointer_up(&mut self, board: &mut Board<'_>) -> Response {
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle => Response::default(),
            Gesture::Moving { .. } | Gesture::Resizing(_) => {
                tracing::debug!("gesture finished");
                self.hovered_handle = None;
                Response::cursor(Cursor::Move).redraw()
            }
            Gesture::MarqueeSelecting {
                start,
                end,
                additive,
                ..
            } => {
                let r = Rect::from_points(start, end);
                let small = r.width() < self.tuning.click_threshold_px
                    && r.height() < self.tuning.click_threshold_px;
                if small && !additive {
                    board.scene.clear_selection();
                }
                tracing::debug!(
                    selected = board.scene.selection().len(),
                    small,
                    "marquee finished"
                );
                Response::cursor(Cursor::Default).redraw()
            }
        }
    }

    fn begin_resize(&mut self, board: &mut Board<'_>, id: AssetId, handle: Handle, p: Point) -> Response {
        let Some(asset) = board.scene.get(id) else {
            return Response::default();
        };
        let start_bounds = board.renderer.asset_bounds(asset);
        let base = match asset {
            Asset::Text(t) => ResizeBase::Text {
                font_px: t.font.size_px,
                max_width: t.max_width,
                center_x: start_bounds.x0 + start_bounds.width() / 2.0,
            },
            _ => ResizeBase::Box,
        };
        self.gesture = Gesture::Resizing(ResizeGesture {
            target: id,
            handle,
            start_bounds,
            start_pointer: p,
            base,
            checkpointed: false,
        });
        tracing::debug!(?id, ?handle, "resize started");
        Response::cursor(handle.cursor()).redraw()
    }

    fn update_marquee(&mut self, board: &mut Board<'_>, p: Point) -> Response {
        let Gesture::MarqueeSelecting {
            start,
            end,
            additive,
            base,
        } = &mut self.gesture
        else {
            return Response::default();
        };
        *end = p;
        let r = Rect::from_points(*start, *end);

        let mut selection: HashSet<AssetId> = if *additive {
            base.clone()
        } else {
            HashSet::new()
        };
        for (id, asset) in board.scene.iter() {
            let b = board.renderer.asset_bounds(asset);
            if b.width() <= 0.0 || b.height() <= 0.0 {
                continue;
            }
            if rects_overlap(r, b) {
                selection.insert(id);
            }
        }
        board.scene.set_selection(selection);
        board.scene.set_hovered(None);
        Response::cursor(Cursor::Default).redraw()
    }

    fn idle_cursor(&mut self, board: &mut Board<'_>, hovered: Option<AssetId>, p: Point) -> Cursor {
        self.hovered_handle = board
            .renderer
            .handle_at(board.scene, p)
            .map(|(_, handle)| handle);
        if let Some(handle) = self.hovered_handle {
            return handle.cursor();
        }
        match hovered.and_then(|id| board.scene.get(id)) {
            Some(Asset::Video(v)) if v.ready && self.in_toggle(video_center(v.x, v.y, v.width, v.height), p) => {
                Cursor::Pointer
            }
            Some(_) => Cursor::Move,
            None => Cursor::Default,
        }
    }

    fn in_toggle(&self, center: Point, p: Point) -> bool {
        let r = self.tuning.video_toggle_radius;
        (p - center).hypot2() <= r * r
    }

    fn toggle_asset_video(&self, scene: &mut Scene, id: AssetId, p: Point) -> bool {
        let Some(Asset::Video(v)) = scene.get_mut(id) else {
            return false;
        };
        if !v.ready || !self.in_toggle(video_center(v.x, v.y, v.width, v.height), p) {
            return false;
        }
        toggle(v.media.as_mut());
        tracing::debug!(?id, playing = v.media.is_playing(), "video toggled");
        true
    }

    fn toggle_background_video(&self, scene: &mut Scene, renderer: &Renderer, p: Point) -> bool {
        let size = renderer.logical_size();
        let center = Point::new((size.width / 2.0).round(), (size.height / 2.0).round());
        if !self.in_toggle(center, p) {
            return false;
        }
        let Some(Background::Video { media, ready, .. }) = scene.background_mut() else {
            return false;
        };
        if !*ready {
            return false;
        }
        toggle(media.as_mut());
        tracing::debug!(playing = media.is_playing(), "background video toggled");
        true
    }
}

fn toggle(media: &mut dyn crate::resources::media::VideoSource) {
    if media.is_playing() {
        media.pause();
    } else {
        media.play();
    }
}

fn video_center(x: f64, y: f64, w: f64, h: f64) -> Point {
    Point::new((x + w / 2.0).round(), (y + h / 2.0).round())
}

/// Reshape the resize target from its gesture-start geometry.
fn apply_resize(resize: &ResizeGesture, board: &mut Board<'_>, p: Point, tuning: &InteractionTuning) {
    let delta = p - resize.start_pointer;
    let surface_width = board.renderer.logical_size().width;
    let Some(asset) = board.scene.get_mut(resize.target) else {
        return;
    };
    match (asset, &resize.base) {
        (
            Asset::Text(t),
            ResizeBase::Text {
                font_px,
                max_width,
                center_x,
            },
        ) => {
            let start = resize.start_bounds;
            if resize.handle.is_side() {
                let base_width = max_width.unwrap_or(start.width());
                t.max_width = Some(text_side_width(base_width, resize.handle, delta.x, tuning));
                if t.align != TextAlign::Center {
                    let w = t.layout(board.renderer.text_engine_mut(), surface_width).width;
                    t.x = t.anchor_for_left((center_x - w / 2.0).round(), w);
                }
                return;
            }

            let scale = text_corner_scale(start, resize.handle, delta, *font_px, *max_width, tuning);
            t.font = t.font.with_size_px(scale.font_px);
            t.max_width = Some(scale.max_width);
            let laid = t.layout(board.renderer.text_engine_mut(), surface_width);
            let left = if resize.handle.sign_x() > 0.0 {
                start.x0
            } else {
                start.x1 - laid.width
            };
            let top = if resize.handle.sign_y() > 0.0 {
                start.y0
            } else {
                start.y1 - laid.height
            };
            t.x = t.anchor_for_left(left.round(), laid.width);
            t.y = top.round();
        }
        (asset, _) => {
            let r = resize_box(resize.start_bounds, resize.handle, delta, tuning.min_asset_px);
            asset.set_box(r);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/interact/machine.rs"]
mod tests;
