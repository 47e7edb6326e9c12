//! Selection, annotation and export.
//!
//! Everything here works on `image::RgbaImage` and canvas-local coordinates
//! and needs no display, apart from [`clipboard`].

pub mod clipboard;
pub mod drawing;
pub mod effects;
pub mod export;
pub mod history;
pub mod palette;
pub mod render;
pub mod selection;
pub mod tools;

pub use clipboard::ClipboardManager;
pub use drawing::{Drawing, DrawingEngine};
pub use effects::{FlipAxis, PostEffects};
pub use export::{final_image, FileSaver};
pub use selection::{AreaSelection, Handle, SelectionEvent};
pub use tools::{Pen, ToolKind};
