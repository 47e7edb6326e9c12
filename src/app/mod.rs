//! Application module
//!
//! Shortcut configuration, the capture session controller and the state
//! shared with the GTK callbacks.

pub mod config;
pub mod session;
mod state;

pub use config::{Action, EditorDefaults, ShortcutConfig};
pub use session::{Session, ToolkitCommand, ToolkitOrientation, UiEvent};
pub use state::{AppState, ViewTransform};
