use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::location::{is_menu, keys, Location, LocationKeys, NOWHERE};
use crate::reference::ReferenceIndex;
use crate::scope::ScopeSet;
use crate::services::Services;
use crate::sidefx::{MusicNode, NodeEnv, SideFx, SideFxArena, TimerNode};
use crate::state::StateTable;

/// Everything a rule's actions may read or change.
pub struct EngineContext {
    pub(crate) state: StateTable,
    pub(crate) references: ReferenceIndex,
    pub(crate) scopes: ScopeSet,
    side_fx: SideFxArena,
    services: Services,
    rng: ChaCha8Rng,
    next_location: Location,
    timer_unit_ms: u32,
    quit_requested: bool,
}

impl EngineContext {
    pub fn new(services: Services, timer_unit_ms: u32, rng_seed: Option<u64>) -> Self {
        let rng = match rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            state: StateTable::new(),
            references: ReferenceIndex::new(),
            scopes: ScopeSet::default(),
            side_fx: SideFxArena::new(),
            services,
            rng,
            next_location: NOWHERE,
            timer_unit_ms,
            quit_requested: false,
        }
    }

    pub fn state(&self) -> &StateTable {
        &self.state
    }

    pub fn references(&self) -> &ReferenceIndex {
        &self.references
    }

    pub fn scopes(&self) -> &ScopeSet {
        &self.scopes
    }

    pub fn side_fx(&self) -> &SideFxArena {
        &self.side_fx
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn services_mut(&mut self) -> &mut Services {
        &mut self.services
    }

    pub fn state_value(&self, key: u32) -> i32 {
        self.state.value(key)
    }

    pub fn state_flags(&self, key: u32) -> u32 {
        self.state.flags(key)
    }

    /// Stores `value` and queues every rule that depends on `key`.
    pub fn set_state_value(&mut self, key: u32, value: i32) {
        self.state.store_value(key, value);
        self.queue_puzzles(key);
    }

    pub fn set_state_flag(&mut self, key: u32, mask: u32) {
        self.state.insert_flags(key, mask);
        self.queue_puzzles(key);
    }

    pub fn unset_state_flag(&mut self, key: u32, mask: u32) {
        self.state.remove_flags(key, mask);
        self.queue_puzzles(key);
    }

    /// Walks the registrations for `key` newest first and queues each rule
    /// in its own scope.
    pub fn queue_puzzles(&mut self, key: u32) {
        for puzzle in self.references.dependents(key).iter().rev() {
            self.scopes.get_mut(puzzle.scope).queue(puzzle.index);
        }
    }

    pub fn pending_location(&self) -> Location {
        self.next_location
    }

    /// Records the location to switch to at the top of the next frame. The
    /// `0000` marker resolves to the stashed previous location.
    pub fn request_location_change(&mut self, target: Location) {
        self.next_location = if target.is_return_marker() {
            let current = LocationKeys::CURRENT.read(&self.state);
            let stash = if is_menu(&current) {
                LocationKeys::MENU_LAST
            } else {
                LocationKeys::LAST
            };
            stash.read(&self.state)
        } else {
            target
        };
        debug!("location change requested: {}", self.next_location);
    }

    pub(crate) fn set_pending_location(&mut self, location: Location) {
        self.next_location = location;
    }

    pub fn random(&mut self, max: i32) -> i32 {
        if max <= 0 {
            return 0;
        }
        self.rng.gen_range(0..=max)
    }

    pub fn request_quit(&mut self) {
        self.quit_requested = true;
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Starts a timer on `slot` unless one is already running there.
    pub fn start_timer(&mut self, slot: u32, units: i32) {
        if self.side_fx.contains(slot) {
            return;
        }
        self.side_fx
            .add(SideFx::timer(slot, TimerNode::new(units, self.timer_unit_ms)));
        if slot != keys::NOT_SET {
            self.set_state_value(slot, 1);
        }
    }

    /// Starts music on `slot` unless a node is already running there.
    pub fn start_music(&mut self, slot: u32, file: &str, looping: bool, volume: u8) {
        if self.side_fx.contains(slot) {
            return;
        }
        let music = MusicNode::start(self.services.audio.as_mut(), file, looping, volume);
        self.side_fx.add(SideFx::music(slot, music));
        if slot != keys::NOT_SET {
            self.set_state_value(slot, 1);
        }
    }

    pub fn start_pan_track(&mut self, slot: u32, music_slot: u32, position: i32) {
        if self.side_fx.contains(slot) {
            return;
        }
        self.side_fx.add(SideFx::pan_track(slot, music_slot));
        self.set_music_pan_track(music_slot, Some(position));
    }

    pub fn set_music_volume(&mut self, slot: u32, volume: u8) {
        let mut env = NodeEnv {
            background_width: self.services.renderer.background_width(),
            view_pos: self.state.value(keys::VIEW_POS),
            audio: self.services.audio.as_mut(),
        };
        if let Some(music) = self.side_fx.music_mut(slot) {
            music.set_volume(volume, &mut env);
        }
    }

    pub(crate) fn set_music_pan_track(&mut self, slot: u32, position: Option<i32>) {
        let mut env = NodeEnv {
            background_width: self.services.renderer.background_width(),
            view_pos: self.state.value(keys::VIEW_POS),
            audio: self.services.audio.as_mut(),
        };
        if let Some(music) = self.side_fx.music_mut(slot) {
            music.set_pan_track(position, &mut env);
        }
    }

    /// Removes the node on `key`, running its teardown.
    pub fn remove_side_fx(&mut self, key: u32) -> bool {
        match self.side_fx.take(key) {
            Some(fx) => {
                fx.teardown(self);
                true
            }
            None => false,
        }
    }

    /// Removes every node whose type bit is in `mask`.
    pub fn remove_side_fx_types(&mut self, mask: u32) -> usize {
        let taken = self.side_fx.take_types(mask);
        let count = taken.len();
        for fx in taken {
            fx.teardown(self);
        }
        count
    }

    pub fn process_side_fx(&mut self, delta_ms: u32) {
        let mut env = NodeEnv {
            background_width: self.services.renderer.background_width(),
            view_pos: self.state.value(keys::VIEW_POS),
            audio: self.services.audio.as_mut(),
        };
        let finished = self.side_fx.process(delta_ms, &mut env);
        for fx in finished {
            debug!("side effect on key {} finished", fx.key());
            fx.teardown(self);
        }
    }
}
