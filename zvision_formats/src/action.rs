use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::location::Location;
use crate::puzzle::ValueSlot;
use crate::text::{parse_leading_int, split_arguments};

/// Side-effect node type bits, shared by `kill` arguments and the runtime.
pub mod node_type {
    pub const ANIM: u32 = 1;
    pub const AUDIO: u32 = 2;
    pub const DISTORT: u32 = 4;
    pub const PANTRACK: u32 = 8;
    pub const REGION: u32 = 16;
    pub const TIMER: u32 = 32;
    pub const TTYTEXT: u32 = 64;
    pub const UNKNOWN: u32 = 128;
    pub const ALL: u32 = 255;

    pub fn from_name(name: &str) -> Option<u32> {
        let mask = match name.to_ascii_lowercase().as_str() {
            "all" => ALL,
            "anim" => ANIM,
            "audio" => AUDIO,
            "distort" => DISTORT,
            "pantrack" => PANTRACK,
            "region" => REGION,
            "timer" => TIMER,
            "ttytext" => TTYTEXT,
            _ => return None,
        };
        Some(mask)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum KillTarget {
    Types(u32),
    Key(u32),
}

/// Result keywords the engine recognizes but leaves to subsystems that live
/// outside the script core (animation, video, menus, text).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalAction {
    AnimPlay,
    AnimPreload,
    AnimUnload,
    PlayPreload,
    StreamVideo,
    SetPartialScreen,
    DelayRender,
    Debug,
    DisableVenus,
    DisplayMessage,
    Dissolve,
    Distort,
    FlushMouseEvents,
    MenuBarEnable,
    Preferences,
    RotateTo,
    SetVenus,
    SyncSound,
    TtyText,
}

impl ExternalAction {
    const KEYWORDS: [(&'static str, ExternalAction); 19] = [
        ("animplay", ExternalAction::AnimPlay),
        ("animpreload", ExternalAction::AnimPreload),
        ("animunload", ExternalAction::AnimUnload),
        ("playpreload", ExternalAction::PlayPreload),
        ("streamvideo", ExternalAction::StreamVideo),
        ("set_partial_screen", ExternalAction::SetPartialScreen),
        ("delay_render", ExternalAction::DelayRender),
        ("debug", ExternalAction::Debug),
        ("disable_venus", ExternalAction::DisableVenus),
        ("display_message", ExternalAction::DisplayMessage),
        ("dissolve", ExternalAction::Dissolve),
        ("distort", ExternalAction::Distort),
        ("flush_mouse_events", ExternalAction::FlushMouseEvents),
        ("menu_bar_enable", ExternalAction::MenuBarEnable),
        ("preferences", ExternalAction::Preferences),
        ("rotate_to", ExternalAction::RotateTo),
        ("set_venus", ExternalAction::SetVenus),
        ("syncsound", ExternalAction::SyncSound),
        ("ttytext", ExternalAction::TtyText),
    ];

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::KEYWORDS
            .iter()
            .find(|(name, _)| *name == keyword)
            .map(|(_, action)| *action)
    }

    pub fn keyword(self) -> &'static str {
        Self::KEYWORDS
            .iter()
            .find(|(_, action)| *action == self)
            .map(|(name, _)| *name)
            .unwrap_or("external")
    }
}

/// Result kinds the original engine never gave semantics to. They keep their
/// own variants so saved scripts round-trip, but executing them is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservedAction {
    Crossfade,
    Inventory,
    Region,
    SaveGame,
    RestoreGame,
}

impl ReservedAction {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let action = match keyword {
            "crossfade" => ReservedAction::Crossfade,
            "inventory" => ReservedAction::Inventory,
            "region" => ReservedAction::Region,
            "save_game" => ReservedAction::SaveGame,
            "restore_game" => ReservedAction::RestoreGame,
            _ => return None,
        };
        Some(action)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            ReservedAction::Crossfade => "crossfade",
            ReservedAction::Inventory => "inventory",
            ReservedAction::Region => "region",
            ReservedAction::SaveGame => "save_game",
            ReservedAction::RestoreGame => "restore_game",
        }
    }
}

/// Everything a `results { }` line can ask the engine to do.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ResultAction {
    Add {
        key: u32,
        value: i32,
    },
    Assign {
        key: u32,
        value: ValueSlot,
    },
    Attenuate {
        key: u32,
        attenuation: i32,
    },
    ChangeLocation {
        target: Location,
    },
    DisableControl {
        key: u32,
    },
    EnableControl {
        key: u32,
    },
    Kill {
        target: KillTarget,
    },
    Music {
        slot: u32,
        kind: u32,
        file: String,
        looping: bool,
        volume: u8,
        universe: bool,
    },
    PanTrack {
        slot: u32,
        music_slot: u32,
        position: i32,
    },
    Random {
        slot: u32,
        max: ValueSlot,
    },
    Quit,
    SetScreen {
        file: String,
    },
    Stop {
        key: u32,
    },
    Timer {
        slot: u32,
        duration: ValueSlot,
    },
    Reserved {
        kind: ReservedAction,
        args: String,
    },
    External {
        kind: ExternalAction,
        args: String,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionParseError {
    #[error("not a result line: {0}")]
    NotAnAction(String),
    #[error("unhandled result action type: {0}")]
    UnknownKeyword(String),
    #[error("malformed {keyword} arguments: {line}")]
    Malformed { keyword: String, line: String },
    #[error("building result line pattern: {0}")]
    Pattern(String),
}

fn result_line_pattern() -> Result<&'static Regex, ActionParseError> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"^[^:(]*:\s*(?P<keyword>[A-Za-z_]+)\s*(?::\s*(?P<slot>-?\d+))?\s*(?:\((?P<args>.*)\))?")
        })
        .as_ref()
        .map_err(|err| ActionParseError::Pattern(err.to_string()))
}

impl ResultAction {
    /// Parses one results line, e.g. `background:music:13000(0 a000h2tc.raw 1 100)`.
    ///
    /// `Ok(None)` is returned for keywords that are deliberately ignored.
    pub fn parse(line: &str) -> Result<Option<Self>, ActionParseError> {
        let captures = result_line_pattern()?
            .captures(line)
            .ok_or_else(|| ActionParseError::NotAnAction(line.to_string()))?;
        let keyword = captures["keyword"].to_ascii_lowercase();
        let slot = captures
            .name("slot")
            .and_then(|slot| parse_leading_int(slot.as_str()))
            .and_then(|slot| u32::try_from(slot).ok());
        let args = captures
            .name("args")
            .map(|args| args.as_str().trim())
            .unwrap_or("");

        let malformed = || ActionParseError::Malformed {
            keyword: keyword.clone(),
            line: line.to_string(),
        };
        let tokens = split_arguments(args);
        let key_at = |index: usize| {
            tokens
                .get(index)
                .and_then(|token| parse_leading_int(token))
                .and_then(|value| u32::try_from(value).ok())
        };
        let int_at = |index: usize| {
            tokens
                .get(index)
                .and_then(|token| parse_leading_int(token))
                .map(|value| value as i32)
        };
        let slot_at = |index: usize| tokens.get(index).and_then(|token| ValueSlot::parse(token));

        let action = match keyword.as_str() {
            "add" => ResultAction::Add {
                key: key_at(0).ok_or_else(malformed)?,
                value: int_at(1).ok_or_else(malformed)?,
            },
            "assign" => ResultAction::Assign {
                key: key_at(0).ok_or_else(malformed)?,
                value: slot_at(1).ok_or_else(malformed)?,
            },
            "attenuate" => ResultAction::Attenuate {
                key: key_at(0).ok_or_else(malformed)?,
                attenuation: int_at(1).ok_or_else(malformed)?,
            },
            "change_location" => ResultAction::ChangeLocation {
                target: Location::from_arguments(args).ok_or_else(malformed)?,
            },
            "disable_control" => ResultAction::DisableControl {
                key: key_at(0).ok_or_else(malformed)?,
            },
            "enable_control" => ResultAction::EnableControl {
                key: key_at(0).ok_or_else(malformed)?,
            },
            "kill" => {
                let token = tokens.first().ok_or_else(malformed)?;
                let target = match crate::action::node_type::from_name(token) {
                    Some(mask) => KillTarget::Types(mask),
                    None => KillTarget::Key(key_at(0).ok_or_else(malformed)?),
                };
                ResultAction::Kill { target }
            }
            "music" | "universe_music" => ResultAction::Music {
                slot: slot.ok_or_else(malformed)?,
                kind: key_at(0).ok_or_else(malformed)?,
                file: tokens.get(1).ok_or_else(malformed)?.to_string(),
                looping: int_at(2).unwrap_or(0) != 0,
                volume: int_at(3).unwrap_or(255).clamp(0, 255) as u8,
                universe: keyword == "universe_music",
            },
            "pan_track" => ResultAction::PanTrack {
                slot: slot.ok_or_else(malformed)?,
                music_slot: key_at(0).ok_or_else(malformed)?,
                position: int_at(1).unwrap_or(0),
            },
            "random" => ResultAction::Random {
                slot: slot.ok_or_else(malformed)?,
                max: slot_at(0).ok_or_else(malformed)?,
            },
            "quit" => ResultAction::Quit,
            "set_screen" => ResultAction::SetScreen {
                file: tokens.first().ok_or_else(malformed)?.to_string(),
            },
            "stop" => ResultAction::Stop {
                key: key_at(0).ok_or_else(malformed)?,
            },
            "timer" => ResultAction::Timer {
                slot: slot.ok_or_else(malformed)?,
                duration: slot_at(0).ok_or_else(malformed)?,
            },
            "copy_file" => return Ok(None),
            other => {
                if let Some(kind) = ReservedAction::from_keyword(other) {
                    ResultAction::Reserved {
                        kind,
                        args: args.to_string(),
                    }
                } else if let Some(kind) = ExternalAction::from_keyword(other) {
                    ResultAction::External {
                        kind,
                        args: args.to_string(),
                    }
                } else {
                    return Err(ActionParseError::UnknownKeyword(line.to_string()));
                }
            }
        };

        Ok(Some(action))
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            ResultAction::Add { .. } => "add",
            ResultAction::Assign { .. } => "assign",
            ResultAction::Attenuate { .. } => "attenuate",
            ResultAction::ChangeLocation { .. } => "change_location",
            ResultAction::DisableControl { .. } => "disable_control",
            ResultAction::EnableControl { .. } => "enable_control",
            ResultAction::Kill { .. } => "kill",
            ResultAction::Music { universe: true, .. } => "universe_music",
            ResultAction::Music { .. } => "music",
            ResultAction::PanTrack { .. } => "pan_track",
            ResultAction::Random { .. } => "random",
            ResultAction::Quit => "quit",
            ResultAction::SetScreen { .. } => "set_screen",
            ResultAction::Stop { .. } => "stop",
            ResultAction::Timer { .. } => "timer",
            ResultAction::Reserved { kind, .. } => kind.keyword(),
            ResultAction::External { kind, .. } => kind.keyword(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> ResultAction {
        ResultAction::parse(line)
            .expect("line should parse")
            .expect("line should produce an action")
    }

    #[test]
    fn state_actions_parse_keys_and_values() {
        assert_eq!(
            parse("action:assign(20, 5)"),
            ResultAction::Assign {
                key: 20,
                value: ValueSlot::Literal(5)
            }
        );
        assert_eq!(
            parse("action:assign(20, [21])"),
            ResultAction::Assign {
                key: 20,
                value: ValueSlot::Key(21)
            }
        );
        assert_eq!(
            parse("action:add(4011,-1)"),
            ResultAction::Add {
                key: 4011,
                value: -1
            }
        );
    }

    #[test]
    fn slot_actions_read_the_key_after_the_keyword() {
        assert_eq!(
            parse("background:music:13000(0 a000h2tc.raw 1 100)"),
            ResultAction::Music {
                slot: 13000,
                kind: 0,
                file: "a000h2tc.raw".to_string(),
                looping: true,
                volume: 100,
                universe: false,
            }
        );
        assert_eq!(
            parse("action:timer:3212(30)"),
            ResultAction::Timer {
                slot: 3212,
                duration: ValueSlot::Literal(30)
            }
        );
        assert_eq!(
            parse("action:random:77([78])"),
            ResultAction::Random {
                slot: 77,
                max: ValueSlot::Key(78)
            }
        );
    }

    #[test]
    fn kill_accepts_type_names_and_keys() {
        assert_eq!(
            parse("action:kill(audio)"),
            ResultAction::Kill {
                target: KillTarget::Types(node_type::AUDIO)
            }
        );
        assert_eq!(
            parse("action:kill(13000)"),
            ResultAction::Kill {
                target: KillTarget::Key(13000)
            }
        );
    }

    #[test]
    fn keywords_match_case_insensitively() {
        assert_eq!(parse("event:QUIT"), ResultAction::Quit);
        assert_eq!(
            parse("event:Change_Location(g, a, ry, 0)").keyword(),
            "change_location"
        );
    }

    #[test]
    fn unimplemented_kinds_keep_their_arguments() {
        assert_eq!(
            parse("action:crossfade(1 2 3)"),
            ResultAction::Reserved {
                kind: ReservedAction::Crossfade,
                args: "1 2 3".to_string()
            }
        );
        assert_eq!(
            parse("action:streamvideo(intro.avi 0 0 640 480 0 1)").keyword(),
            "streamvideo"
        );
        assert_eq!(ResultAction::parse("action:copy_file(a b)"), Ok(None));
    }

    #[test]
    fn result_pattern_builds() {
        assert!(result_line_pattern().is_ok());
    }

    #[test]
    fn unknown_and_broken_lines_are_reported() {
        assert!(matches!(
            ResultAction::parse("action:teleport(1)"),
            Err(ActionParseError::UnknownKeyword(_))
        ));
        assert!(matches!(
            ResultAction::parse("action:assign()"),
            Err(ActionParseError::Malformed { .. })
        ));
        assert!(matches!(
            ResultAction::parse("no colon here"),
            Err(ActionParseError::NotAnAction(_))
        ));
    }
}
