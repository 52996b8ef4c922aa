pub mod action;
pub mod control;
pub mod location;
pub mod puzzle;
pub mod save;
pub mod scr;
pub mod text;

pub use action::{ActionParseError, ExternalAction, KillTarget, ReservedAction, ResultAction, node_type};
pub use control::{ControlDef, ControlKind, ControlProperty, Projection, Rect};
pub use location::Location;
pub use puzzle::{CriteriaEntry, CriteriaOperator, Puzzle, ValueSlot, flags};
pub use save::{SaveError, read_state_table, write_state_table};
pub use scr::{Diagnostic, ScrFile};
