pub mod actions;
pub mod audio_bridge;
pub mod config;
pub mod context;
pub mod controls;
pub mod location;
pub mod reference;
pub mod scope;
pub mod script_manager;
pub mod services;
pub mod sidefx;
pub mod source;
pub mod state;

pub use audio_bridge::{AudioEvent, RecordingAudioMixer};
pub use config::EngineConfig;
pub use context::EngineContext;
pub use controls::{Control, Point};
pub use location::{keys, Location, LocationKeys};
pub use reference::{PuzzleRef, ReferenceIndex};
pub use scope::{ScopeLevel, ScriptScope};
pub use script_manager::{ScriptError, ScriptManager};
pub use services::{AudioHandle, AudioMixer, Cursor, HeadlessCursor, HeadlessRenderer, Renderer, Services};
pub use sidefx::{SideFx, SideFxArena, SideFxNode};
pub use source::{DirectorySource, MemorySource, ScriptSource};
pub use state::StateTable;
