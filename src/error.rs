//! Error types for the capture and annotation core.
//!
//! Everything here is recoverable: callers log and keep the session open.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Failed to enumerate monitors: {0}")]
    MonitorEnumeration(String),

    #[error("No monitors found")]
    NoMonitors,

    #[error("Failed to capture monitor '{name}': {reason}")]
    CaptureFailed { name: String, reason: String },

    #[error("Displays span an empty {width}x{height} canvas")]
    EmptyCanvas { width: i32, height: i32 },
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Cairo error: {0}")]
    Cairo(#[from] gtk4::cairo::Error),

    #[error("Cairo surface is still borrowed: {0}")]
    SurfaceBorrowed(#[from] gtk4::cairo::BorrowError),

    #[error("Cannot render into an empty {width}x{height} area")]
    EmptyArea { width: i32, height: i32 },
}

#[derive(Debug, Error)]
pub enum EffectsError {
    #[error("Rotation by {0} degrees is not implemented")]
    RotationUnsupported(f64),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Selection does not overlap the captured canvas")]
    EmptySelection,

    #[error(transparent)]
    Effects(#[from] EffectsError),
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Failed to write {path}: {source}")]
    Encode {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("No display available for the clipboard")]
    NoDisplay,

    #[error("Image of {width}x{height} is too large for a texture")]
    TooLarge { width: u32, height: u32 },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Effects(#[from] EffectsError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Save(#[from] SaveError),

    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
}

pub type Result<T> = std::result::Result<T, Error>;
