use serde::Serialize;
use zvision_formats::{flags, ControlDef, ControlKind, Rect};

use crate::context::EngineContext;

/// A position in background coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum ToggleEvent {
    Down,
    Up,
}

/// Runtime widget for an interactive control block.
#[derive(Debug, Clone, Serialize)]
pub struct Control {
    key: u32,
    kind: ControlKind,
    hotspot: Option<Rect>,
    cursor: Option<String>,
    count_to: i32,
    toggle_on: ToggleEvent,
    pressed: bool,
    focused: bool,
}

impl Control {
    /// Projection blocks (flat, pana, tilt) are not controls and yield `None`.
    pub fn from_def(def: &ControlDef) -> Option<Self> {
        if def.kind.is_projection() {
            return None;
        }
        let toggle_on = match def.property("mouse_event") {
            Some(event) if event.eq_ignore_ascii_case("down") => ToggleEvent::Down,
            _ => ToggleEvent::Up,
        };
        Some(Self {
            key: def.key,
            kind: def.kind,
            hotspot: def.hotspot(),
            cursor: def.cursor().map(str::to_string),
            count_to: def.int_property("count_to").filter(|&count| count > 0).unwrap_or(2),
            toggle_on,
            pressed: false,
            focused: false,
        })
    }

    pub fn key(&self) -> u32 {
        self.key
    }

    pub fn kind(&self) -> ControlKind {
        self.kind
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    fn enabled(&self, ctx: &EngineContext) -> bool {
        ctx.state_flags(self.key) & flags::DISABLED == 0
    }

    fn hit(&self, point: Point) -> bool {
        self.hotspot
            .map(|rect| rect.contains(point.x, point.y))
            .unwrap_or(false)
    }

    pub(crate) fn set_focus(&mut self, focused: bool) {
        self.focused = focused;
    }

    /// Per-frame tick. A control disabled while held lets go.
    pub(crate) fn process(&mut self, _delta_ms: u32, ctx: &EngineContext) {
        if self.pressed && !self.enabled(ctx) {
            self.pressed = false;
        }
    }

    pub(crate) fn on_mouse_down(&mut self, point: Point, ctx: &mut EngineContext) -> bool {
        if !self.enabled(ctx) || !self.hit(point) {
            return false;
        }
        match self.kind {
            ControlKind::PushToggle if self.toggle_on == ToggleEvent::Down => self.advance(ctx),
            _ => self.pressed = true,
        }
        true
    }

    pub(crate) fn on_mouse_up(&mut self, point: Point, ctx: &mut EngineContext) -> bool {
        if !self.enabled(ctx) {
            return false;
        }
        let was_pressed = std::mem::replace(&mut self.pressed, false);
        match self.kind {
            ControlKind::PushToggle if self.hit(point) => {
                if self.toggle_on == ToggleEvent::Up {
                    self.advance(ctx);
                }
                true
            }
            ControlKind::Lever => was_pressed,
            _ => false,
        }
    }

    pub(crate) fn on_mouse_move(&mut self, point: Point, ctx: &mut EngineContext) -> bool {
        if !self.enabled(ctx) {
            return false;
        }
        if !(self.hit(point) || (self.kind == ControlKind::Lever && self.pressed)) {
            return false;
        }
        if let Some(cursor) = self.cursor.as_deref() {
            ctx.services_mut().cursor.set_cursor(cursor);
        }
        true
    }

    fn advance(&self, ctx: &mut EngineContext) {
        let next = ctx.state_value(self.key).wrapping_add(1).rem_euclid(self.count_to);
        ctx.set_state_value(self.key, next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{HeadlessCursor, HeadlessRenderer, Services};
    use crate::audio_bridge::RecordingAudioMixer;
    use zvision_formats::ScrFile;

    fn controls(text: &str) -> Vec<Control> {
        ScrFile::parse(text)
            .controls
            .iter()
            .filter_map(Control::from_def)
            .collect()
    }

    fn context_with_cursor() -> (EngineContext, HeadlessCursor) {
        let cursor = HeadlessCursor::new();
        let services = Services::new(
            Box::new(HeadlessRenderer::new()),
            Box::new(RecordingAudioMixer::new()),
            Box::new(cursor.clone()),
        );
        (EngineContext::new(services, 100, Some(1)), cursor)
    }

    const TOGGLE: &str = "\
control:300 push_toggle {
    flat_hotspot(10, 10, 50, 50)
    cursor(handpt)
    count_to(3)
}
";

    #[test]
    fn push_toggle_cycles_its_key_on_mouse_up() {
        let (mut ctx, _) = context_with_cursor();
        let mut toggle = controls(TOGGLE).remove(0);
        let inside = Point::new(20, 20);

        for expected in [1, 2, 0, 1] {
            assert!(toggle.on_mouse_down(inside, &mut ctx));
            assert!(toggle.on_mouse_up(inside, &mut ctx));
            assert_eq!(ctx.state_value(300), expected);
        }
        assert!(!toggle.on_mouse_up(Point::new(60, 60), &mut ctx));
        assert_eq!(ctx.state_value(300), 1);
    }

    #[test]
    fn push_toggle_wraps_out_of_range_values() {
        let (mut ctx, _) = context_with_cursor();
        let mut toggle = controls(TOGGLE).remove(0);
        ctx.set_state_value(300, i32::MAX);

        let inside = Point::new(20, 20);
        assert!(toggle.on_mouse_down(inside, &mut ctx));
        assert!(toggle.on_mouse_up(inside, &mut ctx));
        assert_eq!(ctx.state_value(300), i32::MIN.rem_euclid(3));
    }

    #[test]
    fn disabled_controls_never_claim() {
        let (mut ctx, _) = context_with_cursor();
        let mut toggle = controls(TOGGLE).remove(0);
        ctx.set_state_flag(300, flags::DISABLED);

        let inside = Point::new(20, 20);
        assert!(!toggle.on_mouse_down(inside, &mut ctx));
        assert!(!toggle.on_mouse_up(inside, &mut ctx));
        assert!(!toggle.on_mouse_move(inside, &mut ctx));
        assert_eq!(ctx.state_value(300), 0);
    }

    #[test]
    fn hovering_sets_the_control_cursor() {
        let (mut ctx, cursor) = context_with_cursor();
        let mut toggle = controls(TOGGLE).remove(0);
        assert!(toggle.on_mouse_move(Point::new(11, 49), &mut ctx));
        assert_eq!(cursor.current(), "handpt");
    }

    #[test]
    fn levers_hold_presses_until_release() {
        let (mut ctx, _) = context_with_cursor();
        let mut lever = controls(
            "control:301 lever {\n    hotspot(0, 0, 100, 100)\n}\n",
        )
        .remove(0);

        assert!(!lever.on_mouse_up(Point::new(5, 5), &mut ctx));
        assert!(lever.on_mouse_down(Point::new(5, 5), &mut ctx));
        assert!(lever.on_mouse_move(Point::new(400, 5), &mut ctx), "drags are claimed");
        ctx.set_state_flag(301, flags::DISABLED);
        lever.process(16, &ctx);
        assert!(!lever.is_pressed());
    }

    #[test]
    fn projection_blocks_do_not_become_controls() {
        assert!(controls("control:1 pana {\n    angle(30)\n}\n").is_empty());
    }

    #[test]
    fn toggle_can_fire_on_mouse_down() {
        let (mut ctx, _) = context_with_cursor();
        let mut toggle = controls(
            "control:302 push_toggle {\n    hotspot(0, 0, 10, 10)\n    mouse_event(down)\n}\n",
        )
        .remove(0);
        assert!(toggle.on_mouse_down(Point::new(1, 1), &mut ctx));
        assert_eq!(ctx.state_value(302), 1);
        assert!(toggle.on_mouse_up(Point::new(1, 1), &mut ctx));
        assert_eq!(ctx.state_value(302), 1);
    }
}
