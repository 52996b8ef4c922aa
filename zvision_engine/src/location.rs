pub use zvision_formats::Location;

use crate::state::StateTable;

/// Named slots in the global table the engine itself reads or writes.
pub mod keys {
    pub const WORLD: u32 = 3;
    pub const ROOM: u32 = 4;
    pub const NODE: u32 = 5;
    pub const VIEW: u32 = 6;
    pub const VIEW_POS: u32 = 7;
    pub const KEY_PRESS: u32 = 8;
    /// Placeholder slot for side effects that report to no key.
    pub const NOT_SET: u32 = 11;
    pub const QUITTING: u32 = 39;
    pub const LAST_WORLD: u32 = 40;
    pub const LAST_ROOM: u32 = 41;
    pub const LAST_NODE: u32 = 42;
    pub const LAST_VIEW: u32 = 43;
    pub const LAST_VIEW_POS: u32 = 44;
    pub const MENU_LAST_WORLD: u32 = 45;
    pub const MENU_LAST_ROOM: u32 = 46;
    pub const MENU_LAST_NODE: u32 = 47;
    pub const MENU_LAST_VIEW: u32 = 48;
    pub const MENU_LAST_VIEW_POS: u32 = 49;
    /// Non-zero forces every scope to evaluate all of its rules each pass.
    pub const EXEC_SCOPE_STYLE: u32 = 76;
}

/// Where the engine is before the first location loads.
pub const NOWHERE: Location = Location::new(0, 0, 0, 0, 0);

pub const MENU_WORLD: u8 = b'g';
pub const MENU_ROOM: u8 = b'j';

pub fn is_menu(location: &Location) -> bool {
    location.world == MENU_WORLD && location.room == MENU_ROOM
}

/// Five consecutive state keys holding a location tuple and its offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationKeys {
    pub world: u32,
    pub room: u32,
    pub node: u32,
    pub view: u32,
    pub view_pos: u32,
}

impl LocationKeys {
    pub const CURRENT: LocationKeys = LocationKeys::starting_at(keys::WORLD);
    pub const LAST: LocationKeys = LocationKeys::starting_at(keys::LAST_WORLD);
    pub const MENU_LAST: LocationKeys = LocationKeys::starting_at(keys::MENU_LAST_WORLD);

    const fn starting_at(world: u32) -> Self {
        LocationKeys {
            world,
            room: world + 1,
            node: world + 2,
            view: world + 3,
            view_pos: world + 4,
        }
    }

    pub fn read(&self, state: &StateTable) -> Location {
        Location::new(
            state.value(self.world) as u8,
            state.value(self.room) as u8,
            state.value(self.node) as u8,
            state.value(self.view) as u8,
            u32::try_from(state.value(self.view_pos)).unwrap_or(0),
        )
    }

    /// Pairs each key with the component of `location` it stores.
    pub fn entries(&self, location: &Location) -> [(u32, i32); 5] {
        [
            (self.world, i32::from(location.world)),
            (self.room, i32::from(location.room)),
            (self.node, i32::from(location.node)),
            (self.view, i32::from(location.view)),
            (
                self.view_pos,
                i32::try_from(location.offset).unwrap_or(i32::MAX),
            ),
        ]
    }
}
