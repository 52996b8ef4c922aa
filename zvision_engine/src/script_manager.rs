use std::io::{Read, Write};

use log::{debug, info, warn};
use thiserror::Error;
use zvision_formats::{flags, Puzzle, SaveError, ScrFile};

use crate::actions;
use crate::config::EngineConfig;
use crate::context::EngineContext;
use crate::controls::{Control, Point};
use crate::location::{is_menu, keys, Location, LocationKeys, NOWHERE};
use crate::scope::ScopeLevel;
use crate::services::Services;
use crate::source::ScriptSource;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("location change to undefined location {0}; no previous location was stashed")]
    UndefinedLocation(Location),
    #[error("state table error: {0}")]
    Save(#[from] SaveError),
}

/// Owns the scopes and drives one frame of rule evaluation at a time.
pub struct ScriptManager {
    ctx: EngineContext,
    source: Box<dyn ScriptSource>,
    universe_script: String,
    current_location: Location,
    focused_control: Option<u32>,
}

impl ScriptManager {
    pub fn new(source: Box<dyn ScriptSource>, services: Services, config: &EngineConfig) -> Self {
        Self {
            ctx: EngineContext::new(services, config.timer_unit_ms, config.rng_seed),
            source,
            universe_script: config.universe_script.clone(),
            current_location: NOWHERE,
            focused_control: None,
        }
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut EngineContext {
        &mut self.ctx
    }

    /// Loads the universe script and schedules `start` for the first frame.
    pub fn initialize(&mut self, start: Location) {
        for level in ScopeLevel::ALL {
            self.ctx.scopes.get_mut(level).clear();
        }
        self.ctx.references.clear();
        self.current_location = NOWHERE;
        self.focused_control = None;

        let universe = self.universe_script.clone();
        self.load_scope(ScopeLevel::Universe, &universe);
        self.ctx.request_location_change(start);
    }

    /// Runs one frame: a pending location change, side effects, every scope
    /// from node-view out to universe, then the active controls.
    pub fn update(&mut self, delta_ms: u32) -> Result<(), ScriptError> {
        if !self.ctx.pending_location().same_screen(&self.current_location) {
            self.change_location()?;
        }

        self.ctx.process_side_fx(delta_ms);

        for level in ScopeLevel::FRAME_ORDER {
            self.exec_scope(level);
        }

        self.update_controls(delta_ms);
        Ok(())
    }

    pub fn request_location_change(&mut self, target: Location) {
        self.ctx.request_location_change(target);
    }

    /// The loaded location, with the offset the renderer is scrolled to.
    pub fn current_location(&self) -> Location {
        let mut location = self.current_location;
        location.offset = self.ctx.services().renderer.current_background_offset();
        location
    }

    pub fn quit_requested(&self) -> bool {
        self.ctx.quit_requested()
    }

    pub fn focused_control(&self) -> Option<u32> {
        self.focused_control
    }

    fn exec_scope(&mut self, level: ScopeLevel) {
        let evaluate_all = self.ctx.state_value(keys::EXEC_SCOPE_STYLE) != 0;
        let pass = self.ctx.scopes.get_mut(level).begin_pass(evaluate_all);
        for index in pass.rules {
            if let Some(puzzle) = self.ctx.scopes.get(level).puzzle(index) {
                self.check_puzzle_criteria(&puzzle, pass.counter);
            }
        }
        self.ctx.scopes.get_mut(level).finish_pass();
    }

    fn check_puzzle_criteria(&mut self, puzzle: &Puzzle, counter: u8) {
        let puzzle_flags = self.ctx.state_flags(puzzle.key);
        if self.ctx.state_value(puzzle.key) == 1 && puzzle_flags & flags::DISABLED == 0 {
            return;
        }
        if counter == 0 && puzzle_flags & flags::DO_ME_NOW == 0 {
            return;
        }
        if !puzzle.criteria_met(|key| self.ctx.state_value(key)) {
            return;
        }

        debug!("puzzle {} fired", puzzle.key);
        self.ctx.set_state_value(puzzle.key, 1);
        for action in &puzzle.results {
            if !actions::execute(action, &mut self.ctx) {
                break;
            }
        }
    }

    fn change_location(&mut self) -> Result<(), ScriptError> {
        let next = self.ctx.pending_location();
        if next.world == 0 {
            return Err(ScriptError::UndefinedLocation(next));
        }
        info!("changing location {} -> {}", self.current_location, next);

        if self.current_location.world != 0 {
            let current = LocationKeys::CURRENT.read(&self.ctx.state);
            if !is_menu(&current) {
                let stash = if is_menu(&next) {
                    LocationKeys::MENU_LAST
                } else {
                    LocationKeys::LAST
                };
                for (key, value) in stash.entries(&current) {
                    self.ctx.set_state_value(key, value);
                }
            }
        }

        for (key, value) in LocationKeys::CURRENT.entries(&next) {
            self.ctx.set_state_value(key, value);
        }

        self.ctx.references.clear();
        for level in [ScopeLevel::NodeView, ScopeLevel::Room, ScopeLevel::World] {
            self.ctx.scopes.get_mut(level).clear();
        }
        self.ctx
            .references
            .add_scope(self.ctx.scopes.get(ScopeLevel::Universe));

        self.load_scope(ScopeLevel::World, &next.world_script());
        self.load_scope(ScopeLevel::Room, &next.room_script());
        self.load_scope(ScopeLevel::NodeView, &next.nodeview_script());

        self.focused_control = None;
        let services = self.ctx.services_mut();
        services.cursor.revert_to_idle();
        services.renderer.set_background_velocity(0);
        services.renderer.clear_overlay_areas();
        services.renderer.set_background_position(next.offset);

        self.current_location = next;

        self.exec_scope(ScopeLevel::Room);
        self.exec_scope(ScopeLevel::NodeView);
        Ok(())
    }

    fn load_scope(&mut self, level: ScopeLevel, name: &str) {
        let file = match self.source.read_script(name) {
            Some(text) => ScrFile::parse(&text),
            None => {
                warn!("script {name} not found; {} scope is empty", level.name());
                ScrFile::default()
            }
        };

        for puzzle in &file.puzzles {
            if self.ctx.state_flags(puzzle.key) & flags::ONCE_PER_INST != 0 {
                self.ctx.set_state_value(puzzle.key, 0);
            }
            if puzzle.flags != 0 {
                self.ctx.set_state_flag(puzzle.key, puzzle.flags);
            }
        }

        let mut controls = Vec::new();
        for def in &file.controls {
            match def.projection() {
                Some(projection) => self
                    .ctx
                    .services_mut()
                    .renderer
                    .set_projection(projection),
                None => controls.extend(Control::from_def(def)),
            }
        }

        debug!(
            "loaded {name} into {} scope: {} puzzles, {} controls",
            level.name(),
            file.puzzles.len(),
            controls.len()
        );
        let scope = self.ctx.scopes.get_mut(level);
        scope.load(name, file.puzzles, controls);
        self.ctx.references.add_scope(self.ctx.scopes.get(level));
    }

    fn update_controls(&mut self, delta_ms: u32) {
        let mut controls = std::mem::take(&mut self.ctx.scopes.get_mut(ScopeLevel::NodeView).controls);
        for control in controls.iter_mut() {
            control.process(delta_ms, &self.ctx);
        }
        self.ctx.scopes.get_mut(ScopeLevel::NodeView).controls = controls;
    }

    /// Offers an event to the active controls, last loaded first, until one
    /// claims it.
    fn route_to_controls(
        &mut self,
        mut handler: impl FnMut(&mut Control, &mut EngineContext) -> bool,
    ) -> bool {
        let mut controls = std::mem::take(&mut self.ctx.scopes.get_mut(ScopeLevel::NodeView).controls);
        let claimed = controls
            .iter_mut()
            .rev()
            .any(|control| handler(control, &mut self.ctx));
        self.ctx.scopes.get_mut(ScopeLevel::NodeView).controls = controls;
        claimed
    }

    pub fn on_mouse_down(&mut self, point: Point) -> bool {
        self.route_to_controls(|control, ctx| control.on_mouse_down(point, ctx))
    }

    pub fn on_mouse_up(&mut self, point: Point) -> bool {
        self.route_to_controls(|control, ctx| control.on_mouse_up(point, ctx))
    }

    /// Returns whether a control claimed the move; the cursor goes back to
    /// idle when none did.
    pub fn on_mouse_move(&mut self, point: Point) -> bool {
        let claimed = self.route_to_controls(|control, ctx| control.on_mouse_move(point, ctx));
        if !claimed {
            self.ctx.services_mut().cursor.revert_to_idle();
        }
        claimed
    }

    /// Publishes a key press to scripts through the key-press slot.
    pub fn on_key_down(&mut self, code: i32) {
        self.ctx.set_state_value(keys::KEY_PRESS, code);
    }

    pub fn focus_control(&mut self, key: u32) {
        for control in self.ctx.scopes.get_mut(ScopeLevel::NodeView).controls.iter_mut() {
            control.set_focus(control.key() == key);
        }
        self.focused_control = Some(key);
    }

    pub fn serialize_state<W: Write>(&self, writer: &mut W) -> Result<(), ScriptError> {
        self.ctx.state.write_to(writer)?;
        Ok(())
    }

    /// Replaces the state table without notifying rules and schedules a
    /// reload of the saved location.
    pub fn deserialize_state<R: Read>(&mut self, reader: &mut R) -> Result<(), ScriptError> {
        self.ctx.state.read_from(reader)?;
        let saved = LocationKeys::CURRENT.read(&self.ctx.state);
        self.current_location = NOWHERE;
        if saved.world != 0 {
            self.ctx.set_pending_location(saved);
        }
        Ok(())
    }
}
