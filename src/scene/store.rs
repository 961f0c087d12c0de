use std::{collections::HashSet, sync::Arc, time::Duration};

use slotmap::SlotMap;
use tokio::sync::broadcast;

use crate::{
    foundation::core::{Size, Vec2},
    resources::{
        decode::DecodedImage,
        media::{FramePoll, MediaOpener, VideoSource},
    },
    scene::{
        create::apply_video_metadata,
        model::{Asset, AssetId, Background, ImageAsset, TextAlign, TextAsset, VideoAsset},
        snapshot::{AssetSnapshot, BackgroundSnapshot, SceneSnapshot},
    },
};

/// Notifications for panels that mirror the scene.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SceneEvent {
    /// The asset list or the background changed.
    Changed { revision: u64 },
    /// An asynchronous image load failed; no asset was created.
    LoadFailed { locator: String, reason: String },
}

/// Outcome of advancing every video clock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VideoPoll {
    /// Displayed pictures that changed, including first frames.
    pub new_frames: usize,
    /// Videos that became ready during this poll.
    pub became_ready: usize,
    /// Boxes refitted to newly known clip dimensions.
    pub resized: usize,
    /// Some source cannot signal new frames; redraw on the fixed interval.
    pub unsupported: bool,
}

impl VideoPoll {
    pub fn needs_redraw(&self) -> bool {
        self.new_frames > 0 || self.resized > 0 || self.unsupported
    }
}

/// Assets in z-order, the optional background, and selection/hover state.
pub struct Scene {
    assets: SlotMap<AssetId, Asset>,
    order: Vec<AssetId>,
    background: Option<Background>,
    selection: HashSet<AssetId>,
    hovered: Option<AssetId>,
    clipboard: Vec<AssetSnapshot>,
    revision: u64,
    background_revision: u64,
    events: broadcast::Sender<SceneEvent>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("assets", &self.order.len())
            .field("background", &self.background.is_some())
            .field("selected", &self.selection.len())
            .field("revision", &self.revision)
            .finish()
    }
}

impl Scene {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            assets: SlotMap::with_key(),
            order: Vec::new(),
            background: None,
            selection: HashSet::new(),
            hovered: None,
            clipboard: Vec::new(),
            revision: 0,
            background_revision: 0,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SceneEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: SceneEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn changed(&mut self) {
        self.revision += 1;
        self.emit(SceneEvent::Changed {
            revision: self.revision,
        });
    }

    fn background_changed(&mut self) {
        self.background_revision += 1;
        self.changed();
    }

    /// Bumped on every asset-list or background change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Bumped only when the background layer is replaced.
    pub fn background_revision(&self) -> u64 {
        self.background_revision
    }

    // ---- assets ----

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Ids back to front.
    pub fn order(&self) -> &[AssetId] {
        &self.order
    }

    pub fn index_of(&self, id: AssetId) -> Option<usize> {
        self.order.iter().position(|&o| o == id)
    }

    pub fn get(&self, id: AssetId) -> Option<&Asset> {
        self.assets.get(id)
    }

    pub fn get_mut(&mut self, id: AssetId) -> Option<&mut Asset> {
        self.assets.get_mut(id)
    }

    pub fn contains(&self, id: AssetId) -> bool {
        self.assets.contains_key(id)
    }

    /// Assets back to front.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (AssetId, &Asset)> + '_ {
        self.order
            .iter()
            .filter_map(|&id| self.assets.get(id).map(|a| (id, a)))
    }

    pub fn add_asset(&mut self, asset: Asset) -> AssetId {
        let id = self.insert_at(self.order.len(), asset);
        self.changed();
        id
    }

    pub fn add_assets(&mut self, assets: impl IntoIterator<Item = Asset>) -> Vec<AssetId> {
        let ids: Vec<AssetId> = assets
            .into_iter()
            .map(|a| self.insert_at(self.order.len(), a))
            .collect();
        if !ids.is_empty() {
            self.changed();
        }
        ids
    }

    fn insert_at(&mut self, index: usize, asset: Asset) -> AssetId {
        let id = self.assets.insert(asset);
        self.order.insert(index.min(self.order.len()), id);
        id
    }

    fn remove(&mut self, id: AssetId) -> Option<Asset> {
        let mut asset = self.assets.remove(id)?;
        self.order.retain(|&o| o != id);
        self.selection.remove(&id);
        if self.hovered == Some(id) {
            self.hovered = None;
        }
        if let Some(v) = asset.as_video_mut() {
            v.media.pause();
        }
        Some(asset)
    }

    // ---- selection / hover ----

    pub fn selection(&self) -> &HashSet<AssetId> {
        &self.selection
    }

    pub fn is_selected(&self, id: AssetId) -> bool {
        self.selection.contains(&id)
    }

    /// Selected ids back to front.
    pub fn selected_in_order(&self) -> Vec<AssetId> {
        self.order
            .iter()
            .copied()
            .filter(|id| self.selection.contains(id))
            .collect()
    }

    pub fn sole_selected(&self) -> Option<AssetId> {
        if self.selection.len() == 1 {
            self.selection.iter().next().copied()
        } else {
            None
        }
    }

    pub fn select_only(&mut self, id: AssetId) {
        self.selection.clear();
        if self.contains(id) {
            self.selection.insert(id);
        }
    }

    pub fn add_to_selection(&mut self, id: AssetId) {
        if self.contains(id) {
            self.selection.insert(id);
        }
    }

    pub fn toggle_selected(&mut self, id: AssetId) {
        if !self.selection.remove(&id) && self.contains(id) {
            self.selection.insert(id);
        }
    }

    pub fn set_selection(&mut self, ids: impl IntoIterator<Item = AssetId>) {
        self.selection = ids.into_iter().filter(|&id| self.contains(id)).collect();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn select_all(&mut self) {
        self.selection = self.order.iter().copied().collect();
    }

    pub fn hovered(&self) -> Option<AssetId> {
        self.hovered.filter(|&id| self.contains(id))
    }

    pub fn set_hovered(&mut self, id: Option<AssetId>) {
        self.hovered = id.filter(|&id| self.contains(id));
    }

    // ---- mutators ----

    /// Remove every selected asset; videos are paused first.
    pub fn delete_selected(&mut self) -> usize {
        let ids = self.selected_in_order();
        let removed = ids.iter().filter(|&&id| self.remove(id).is_some()).count();
        self.selection.clear();
        self.hovered = None;
        if removed > 0 {
            tracing::debug!(removed, "deleted selected assets");
            self.changed();
        }
        removed
    }

    /// Insert an offset copy directly above each selected asset and select the copies.
    pub fn duplicate_selected(&mut self, media: &dyn MediaOpener, offset: f64) -> usize {
        let ids = self.selected_in_order();
        let mut copies = Vec::with_capacity(ids.len());
        for id in ids {
            let (Some(index), Some(asset)) = (self.index_of(id), self.assets.get(id)) else {
                continue;
            };
            let copy = AssetSnapshot::capture(asset)
                .translated(Vec2::new(offset, offset))
                .instantiate(media);
            copies.push(self.insert_at(index + 1, copy));
        }
        if copies.is_empty() {
            return 0;
        }
        self.selection = copies.iter().copied().collect();
        self.changed();
        copies.len()
    }

    pub fn bring_to_front(&mut self) -> bool {
        let (selected, rest): (Vec<AssetId>, Vec<AssetId>) =
            self.order.iter().copied().partition(|id| self.selection.contains(id));
        self.reorder(rest.into_iter().chain(selected).collect())
    }

    pub fn send_to_back(&mut self) -> bool {
        let (selected, rest): (Vec<AssetId>, Vec<AssetId>) =
            self.order.iter().copied().partition(|id| self.selection.contains(id));
        self.reorder(selected.into_iter().chain(rest).collect())
    }

    /// Move each selected asset one step up, past the nearest unselected neighbor.
    pub fn bring_forward(&mut self) -> bool {
        let mut order = self.order.clone();
        for i in (0..order.len().saturating_sub(1)).rev() {
            if self.selection.contains(&order[i]) && !self.selection.contains(&order[i + 1]) {
                order.swap(i, i + 1);
            }
        }
        self.reorder(order)
    }

    pub fn send_backward(&mut self) -> bool {
        let mut order = self.order.clone();
        for i in 1..order.len() {
            if self.selection.contains(&order[i]) && !self.selection.contains(&order[i - 1]) {
                order.swap(i, i - 1);
            }
        }
        self.reorder(order)
    }

    fn reorder(&mut self, order: Vec<AssetId>) -> bool {
        if order == self.order {
            return false;
        }
        self.order = order;
        self.changed();
        true
    }

    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    pub fn background_mut(&mut self) -> Option<&mut Background> {
        self.background.as_mut()
    }

    /// Replace the background, releasing the previous layer's resources.
    pub fn set_background(&mut self, background: Option<Background>) {
        if let Some(mut old) = std::mem::replace(&mut self.background, background) {
            old.release();
        }
        self.background_changed();
    }

    pub fn clear_background(&mut self) -> bool {
        if self.background.is_none() {
            return false;
        }
        self.set_background(None);
        true
    }

    /// Turn the background back into a regular asset placed at the surface center.
    pub fn detach_background(&mut self, surface: Size) -> bool {
        let Some(bg) = self.background.take() else {
            return false;
        };
        let asset = detached_asset(bg, surface);
        let id = self.insert_at(self.order.len(), asset);
        self.selection.clear();
        self.selection.insert(id);
        self.background_changed();
        true
    }

    /// Promote the topmost selected asset to the background, detaching any existing one first.
    pub fn set_selected_as_background(&mut self, surface: Size) -> bool {
        let Some(&id) = self.selected_in_order().last() else {
            return false;
        };
        if let Some(old) = self.background.take() {
            let placed = detached_asset(old, surface);
            self.insert_at(self.order.len(), placed);
        }
        let Some(asset) = self.remove(id) else {
            return false;
        };
        self.background = Some(match asset {
            Asset::Image(a) => Background::Image {
                bitmap: a.bitmap,
                source: a.source,
            },
            Asset::Video(a) => Background::Video {
                media: a.media,
                ready: a.ready,
                source: a.source,
            },
            Asset::Text(a) => Background::Text {
                text: a.text,
                color: a.color,
                font: a.font,
            },
        });
        self.selection.clear();
        self.background_changed();
        true
    }

    /// Copy the selection to the clipboard and remove it.
    pub fn cut_selected(&mut self) -> usize {
        let ids = self.selected_in_order();
        if ids.is_empty() {
            return 0;
        }
        self.clipboard = ids
            .iter()
            .filter_map(|&id| self.assets.get(id).map(AssetSnapshot::capture))
            .collect();
        self.delete_selected()
    }

    /// Copy the selection to the clipboard without removing it.
    pub fn copy_selected(&mut self) -> usize {
        self.clipboard = self
            .selected_in_order()
            .iter()
            .filter_map(|&id| self.assets.get(id).map(AssetSnapshot::capture))
            .collect();
        self.clipboard.len()
    }

    /// Append offset copies of the clipboard on top and select them.
    pub fn paste(&mut self, media: &dyn MediaOpener, offset: f64) -> usize {
        if self.clipboard.is_empty() {
            return 0;
        }
        let copies: Vec<Asset> = self
            .clipboard
            .iter()
            .map(|s| {
                s.clone()
                    .translated(Vec2::new(offset, offset))
                    .instantiate(media)
            })
            .collect();
        let ids = self.add_assets(copies);
        self.selection = ids.iter().copied().collect();
        ids.len()
    }

    pub fn clipboard_len(&self) -> usize {
        self.clipboard.len()
    }

    // ---- videos ----

    fn videos_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn VideoSource>> {
        self.assets
            .values_mut()
            .filter_map(|a| a.as_video_mut().map(|v| &mut v.media))
            .chain(self.background.as_mut().and_then(Background::video_mut))
    }

    pub fn has_videos(&self) -> bool {
        self.assets.values().any(|a| matches!(a, Asset::Video(_)))
            || self.background.as_ref().is_some_and(Background::is_video)
    }

    pub fn any_video_playing(&self) -> bool {
        let assets = self.assets.values().any(|a| match a {
            Asset::Video(v) => v.media.is_playing(),
            _ => false,
        });
        let bg = match &self.background {
            Some(Background::Video { media, .. }) => media.is_playing(),
            _ => false,
        };
        assets || bg
    }

    /// Rewind and play every video; returns how many were started.
    pub fn play_all_videos(&mut self) -> usize {
        let mut started = 0;
        for media in self.videos_mut() {
            media.rewind();
            media.play();
            started += 1;
        }
        started
    }

    pub fn pause_all_videos(&mut self) -> usize {
        let mut paused = 0;
        for media in self.videos_mut() {
            media.pause();
            paused += 1;
        }
        paused
    }

    /// Pause everything when anything plays, otherwise play everything from the start.
    pub fn toggle_all_videos(&mut self) -> bool {
        if self.any_video_playing() {
            self.pause_all_videos();
            false
        } else {
            self.play_all_videos() > 0
        }
    }

    /// Advance every video to `now`, marking first frames ready and fitting boxes to metadata.
    pub fn poll_videos(&mut self, now: Duration) -> VideoPoll {
        let mut out = VideoPoll::default();
        let track = |media: &mut Box<dyn VideoSource>, ready: &mut bool, out: &mut VideoPoll| {
            match media.poll_frame(now) {
                FramePoll::NewFrame => out.new_frames += 1,
                FramePoll::Unsupported => out.unsupported = true,
                FramePoll::Unchanged => {}
            }
            if !*ready && media.current_frame().is_some() {
                *ready = true;
                out.became_ready += 1;
            }
        };
        for asset in self.assets.values_mut() {
            let Some(v) = asset.as_video_mut() else {
                continue;
            };
            track(&mut v.media, &mut v.ready, &mut out);
            if apply_video_metadata(v) {
                out.resized += 1;
            }
        }
        if let Some(Background::Video { media, ready, .. }) = self.background.as_mut() {
            track(media, ready, &mut out);
        }
        if out.became_ready > 0 {
            tracing::debug!(count = out.became_ready, "videos ready");
        }
        out
    }

    // ---- images ----

    /// Give every unloaded image with this source (and an image background) its bitmap.
    pub fn attach_bitmap(&mut self, locator: &str, bitmap: &Arc<DecodedImage>) -> usize {
        let mut attached = 0;
        for asset in self.assets.values_mut() {
            if let Asset::Image(img) = asset
                && img.source == locator
                && img.bitmap.is_none()
            {
                img.set_bitmap(bitmap.clone());
                attached += 1;
            }
        }
        let mut background = false;
        if let Some(Background::Image {
            bitmap: slot,
            source,
        }) = self.background.as_mut()
            && source.as_str() == locator
            && slot.is_none()
        {
            *slot = Some(bitmap.clone());
            background = true;
        }
        if background {
            self.background_changed();
            attached += 1;
        } else if attached > 0 {
            self.changed();
        }
        attached
    }

    /// Sources of images still waiting for a bitmap, background included, without duplicates.
    pub fn unloaded_image_sources(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let assets = self.iter().filter_map(|(_, a)| match a {
            Asset::Image(img) if img.bitmap.is_none() => Some(img.source.as_str()),
            _ => None,
        });
        let background = match &self.background {
            Some(Background::Image { bitmap: None, source }) => Some(source.as_str()),
            _ => None,
        };
        for source in assets.chain(background) {
            if !out.iter().any(|s| s == source) {
                out.push(source.to_owned());
            }
        }
        out
    }

    // ---- snapshots ----

    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            assets: self.iter().map(|(_, a)| AssetSnapshot::capture(a)).collect(),
            background: self.background.as_ref().map(BackgroundSnapshot::capture),
        }
    }

    /// Replace all assets and the background; selection and hover are cleared.
    pub fn restore(&mut self, snapshot: &SceneSnapshot, media: &dyn MediaOpener) {
        for mut asset in self.assets.drain().map(|(_, a)| a) {
            if let Some(v) = asset.as_video_mut() {
                v.media.pause();
            }
        }
        self.order.clear();
        self.selection.clear();
        self.hovered = None;
        for s in &snapshot.assets {
            let asset = s.instantiate(media);
            self.insert_at(self.order.len(), asset);
        }
        if let Some(mut old) = self.background.take() {
            old.release();
        }
        self.background = snapshot.background.as_ref().map(|b| b.instantiate(media));
        self.background_changed();
    }
}

fn detached_asset(bg: Background, surface: Size) -> Asset {
    let (cw, ch) = (surface.width.round(), surface.height.round());
    let (cx, cy) = ((cw / 2.0).round(), (ch / 2.0).round());
    match bg {
        Background::Image { bitmap, source } => {
            let (iw, ih) = bitmap
                .as_ref()
                .map(|b| (f64::from(b.natural_width), f64::from(b.natural_height)))
                .filter(|(w, h)| *w > 0.0 && *h > 0.0)
                .unwrap_or((400.0, 300.0));
            let limit = (cw.min(ch) * 0.4).round().max(40.0);
            let scale = (limit / iw.max(ih)).min(1.0);
            let w = (iw * scale).round().max(40.0);
            let h = (w * ih / iw).round().max(40.0);
            let mut img = ImageAsset {
                x: cx - (w / 2.0).round(),
                y: cy - (h / 2.0).round(),
                width: w,
                height: h,
                bitmap: None,
                loaded: false,
                natural_width: iw as u32,
                natural_height: ih as u32,
                source,
            };
            if let Some(b) = bitmap {
                img.set_bitmap(b);
            }
            Asset::Image(img)
        }
        Background::Video {
            mut media,
            ready,
            source,
        } => {
            media.pause();
            let (vw, vh) = media
                .natural_size()
                .filter(|(w, h)| *w > 0 && *h > 0)
                .map(|(w, h)| (f64::from(w), f64::from(h)))
                .unwrap_or((480.0, 270.0));
            let w = (cw * 0.6).min(520.0).round().max(60.0);
            let h = (w * vh / vw).round().max(60.0);
            Asset::Video(VideoAsset {
                x: cx - (w / 2.0).round(),
                y: cy - (h / 2.0).round(),
                width: w,
                height: h,
                media,
                ready,
                sized_from_metadata: true,
                source,
            })
        }
        Background::Text { text, color, font } => {
            let max_width = (cw * 0.6).floor().max(120.0);
            Asset::Text(TextAsset {
                x: cx - (max_width / 2.0).round(),
                y: (ch * 0.25).round(),
                text,
                color,
                font,
                max_width: Some(max_width),
                align: TextAlign::Left,
            })
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/store.rs"]
mod tests;
