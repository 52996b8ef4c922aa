use std::fmt;

use serde::{Deserialize, Serialize};

use crate::text::{parse_leading_int, split_arguments};

/// A screen position: world, room, node and view letters plus the scroll
/// offset of the background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub world: u8,
    pub room: u8,
    pub node: u8,
    pub view: u8,
    pub offset: u32,
}

impl Location {
    /// The `0000` location scripts use to mean "go back where you came from".
    pub const RETURN: Location = Location {
        world: b'0',
        room: b'0',
        node: b'0',
        view: b'0',
        offset: 0,
    };

    pub const fn new(world: u8, room: u8, node: u8, view: u8, offset: u32) -> Self {
        Location {
            world,
            room,
            node,
            view,
            offset,
        }
    }

    /// Parses a four-letter code such as `gary`, optionally followed by
    /// `@offset`.
    pub fn from_code(code: &str) -> Option<Self> {
        let (letters, offset) = match code.split_once('@') {
            Some((letters, offset)) => (letters, offset.trim().parse().ok()?),
            None => (code, 0),
        };
        let bytes = letters.trim().as_bytes();
        if bytes.len() != 4 || !bytes.iter().all(|byte| byte.is_ascii_alphanumeric()) {
            return None;
        }
        Some(Location::new(bytes[0], bytes[1], bytes[2], bytes[3], offset))
    }

    /// Parses `change_location` arguments. Both `(w, r, n, v, offset)` and the
    /// packed `(w, r, nv, offset)` layouts are accepted.
    pub fn from_arguments(args: &str) -> Option<Self> {
        let tokens = split_arguments(args);
        if let Some((last, rest)) = tokens.split_last() {
            if !rest.is_empty() && last.bytes().all(|byte| byte.is_ascii_digit()) {
                let offset = u32::try_from(parse_leading_int(last)?).ok()?;
                if let Some(location) = Self::from_letters(rest, offset) {
                    return Some(location);
                }
            }
        }
        Self::from_letters(&tokens, 0)
    }

    fn from_letters(tokens: &[&str], offset: u32) -> Option<Self> {
        let letters: Vec<u8> = tokens.iter().flat_map(|token| token.bytes()).collect();
        if letters.len() != 4 {
            return None;
        }
        Some(Location::new(
            letters[0], letters[1], letters[2], letters[3], offset,
        ))
    }

    /// Compares world, room, node and view; the offset is ignored.
    pub fn same_screen(&self, other: &Location) -> bool {
        self.world == other.world
            && self.room == other.room
            && self.node == other.node
            && self.view == other.view
    }

    pub fn is_return_marker(&self) -> bool {
        self.same_screen(&Location::RETURN)
    }

    pub fn code(&self) -> String {
        [self.world, self.room, self.node, self.view]
            .iter()
            .map(|&byte| display_byte(byte))
            .collect()
    }

    /// Script file for the node-view scope, e.g. `gary.scr`.
    pub fn nodeview_script(&self) -> String {
        format!("{}.scr", self.code())
    }

    /// Script file for the room scope, e.g. `ga.scr`.
    pub fn room_script(&self) -> String {
        format!(
            "{}{}.scr",
            display_byte(self.world),
            display_byte(self.room)
        )
    }

    /// Script file for the world scope, e.g. `g.scr`.
    pub fn world_script(&self) -> String {
        format!("{}.scr", display_byte(self.world))
    }
}

fn display_byte(byte: u8) -> char {
    if byte.is_ascii_graphic() {
        byte as char
    } else {
        '?'
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.code(), self.offset)
    }
}
