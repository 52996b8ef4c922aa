use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::Serialize;
use zvision_formats::{Projection, Rect};

use crate::audio_bridge::RecordingAudioMixer;

pub type AudioHandle = u32;

/// Background and overlay drawing the scripts can steer.
pub trait Renderer {
    fn set_background_position(&mut self, offset: u32);
    fn set_background_velocity(&mut self, velocity: i32);
    fn clear_overlay_areas(&mut self);
    fn current_background_offset(&self) -> u32;

    /// Width of the loaded background in pixels, 0 when none is loaded.
    fn background_width(&self) -> u32 {
        0
    }

    fn set_background_image(&mut self, _file: &str) {}
    fn set_projection(&mut self, _projection: Projection) {}

    fn create_subtitle_area(&mut self, _area: Rect) -> u32 {
        0
    }
    fn update_subtitle_area(&mut self, _id: u32, _text: &str) {}
    fn delete_subtitle_area(&mut self, _id: u32) {}
}

pub trait AudioMixer {
    fn play(&mut self, file: &str, looping: bool, volume: u8) -> AudioHandle;
    fn stop(&mut self, handle: AudioHandle);
    fn is_active(&self, handle: AudioHandle) -> bool;
    fn set_volume(&mut self, handle: AudioHandle, volume: u8);
    fn set_balance(&mut self, handle: AudioHandle, balance: i8);
}

pub trait Cursor {
    fn revert_to_idle(&mut self);
    fn set_cursor(&mut self, name: &str);
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RendererState {
    pub background_image: Option<String>,
    pub background_offset: u32,
    pub background_velocity: i32,
    pub background_width: u32,
    pub projection: Option<Projection>,
    pub overlay_clears: u32,
    pub subtitles: BTreeMap<u32, String>,
    next_subtitle: u32,
}

/// Renderer that only tracks what it was asked to draw. Clones share state,
/// so a caller can keep a handle after boxing one into the engine.
#[derive(Debug, Clone, Default)]
pub struct HeadlessRenderer {
    state: Rc<RefCell<RendererState>>,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_background_width(width: u32) -> Self {
        let renderer = Self::default();
        renderer.state.borrow_mut().background_width = width;
        renderer
    }

    pub fn snapshot(&self) -> RendererState {
        self.state.borrow().clone()
    }
}

impl Renderer for HeadlessRenderer {
    fn set_background_position(&mut self, offset: u32) {
        self.state.borrow_mut().background_offset = offset;
    }

    fn set_background_velocity(&mut self, velocity: i32) {
        self.state.borrow_mut().background_velocity = velocity;
    }

    fn clear_overlay_areas(&mut self) {
        self.state.borrow_mut().overlay_clears += 1;
    }

    fn current_background_offset(&self) -> u32 {
        self.state.borrow().background_offset
    }

    fn background_width(&self) -> u32 {
        self.state.borrow().background_width
    }

    fn set_background_image(&mut self, file: &str) {
        self.state.borrow_mut().background_image = Some(file.to_string());
    }

    fn set_projection(&mut self, projection: Projection) {
        self.state.borrow_mut().projection = Some(projection);
    }

    fn create_subtitle_area(&mut self, _area: Rect) -> u32 {
        let mut state = self.state.borrow_mut();
        state.next_subtitle += 1;
        let id = state.next_subtitle;
        state.subtitles.insert(id, String::new());
        id
    }

    fn update_subtitle_area(&mut self, id: u32, text: &str) {
        if let Some(entry) = self.state.borrow_mut().subtitles.get_mut(&id) {
            *entry = text.to_string();
        }
    }

    fn delete_subtitle_area(&mut self, id: u32) {
        self.state.borrow_mut().subtitles.remove(&id);
    }
}

pub const IDLE_CURSOR: &str = "idle";

#[derive(Debug, Clone, Default)]
pub struct HeadlessCursor {
    current: Rc<RefCell<Option<String>>>,
}

impl HeadlessCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> String {
        self.current
            .borrow()
            .clone()
            .unwrap_or_else(|| IDLE_CURSOR.to_string())
    }
}

impl Cursor for HeadlessCursor {
    fn revert_to_idle(&mut self) {
        *self.current.borrow_mut() = None;
    }

    fn set_cursor(&mut self, name: &str) {
        *self.current.borrow_mut() = Some(name.to_string());
    }
}

/// The collaborators the engine drives but does not own the behaviour of.
pub struct Services {
    pub renderer: Box<dyn Renderer>,
    pub audio: Box<dyn AudioMixer>,
    pub cursor: Box<dyn Cursor>,
}

impl Services {
    pub fn new(
        renderer: Box<dyn Renderer>,
        audio: Box<dyn AudioMixer>,
        cursor: Box<dyn Cursor>,
    ) -> Self {
        Self {
            renderer,
            audio,
            cursor,
        }
    }

    pub fn headless() -> Self {
        Self::new(
            Box::new(HeadlessRenderer::new()),
            Box::new(RecordingAudioMixer::new()),
            Box::new(HeadlessCursor::new()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_renderer_clones_share_state() {
        let renderer = HeadlessRenderer::with_background_width(1440);
        let mut boxed: Box<dyn Renderer> = Box::new(renderer.clone());
        boxed.set_background_position(320);
        boxed.set_background_image("tr1ga.tga");
        boxed.clear_overlay_areas();

        let snapshot = renderer.snapshot();
        assert_eq!(snapshot.background_offset, 320);
        assert_eq!(snapshot.background_width, 1440);
        assert_eq!(snapshot.background_image.as_deref(), Some("tr1ga.tga"));
        assert_eq!(snapshot.overlay_clears, 1);
    }

    #[test]
    fn subtitle_areas_are_tracked_until_deleted() {
        let mut renderer = HeadlessRenderer::new();
        let area = Rect {
            left: 0,
            top: 400,
            right: 640,
            bottom: 480,
        };
        let id = renderer.create_subtitle_area(area);
        renderer.update_subtitle_area(id, "Hello");
        assert_eq!(renderer.snapshot().subtitles.get(&id).map(String::as_str), Some("Hello"));
        renderer.delete_subtitle_area(id);
        assert!(renderer.snapshot().subtitles.is_empty());
    }

    #[test]
    fn cursor_reverts_to_idle() {
        let cursor = HeadlessCursor::new();
        let mut boxed: Box<dyn Cursor> = Box::new(cursor.clone());
        boxed.set_cursor("handpt");
        assert_eq!(cursor.current(), "handpt");
        boxed.revert_to_idle();
        assert_eq!(cursor.current(), IDLE_CURSOR);
    }
}
