//! Capture module: display enumeration, per-display grabs and the merged canvas.
//!
//! The platform side lives behind [`CaptureSource`] so the compositor and the
//! session can run against synthetic displays in tests.

pub mod compositor;
pub mod screen;

pub use compositor::{merge, MergedCanvas};
pub use screen::XcapSource;

use image::RgbaImage;

use crate::error::CaptureError;
use crate::geometry::Rect;

/// One attached display in virtual-desktop coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayInfo {
    pub id: u32,
    pub name: String,
    pub geometry: Rect,
}

/// A raw grab of one display together with where it sits on the desktop.
#[derive(Debug, Clone)]
pub struct Capture {
    pub geometry: Rect,
    pub image: RgbaImage,
}

pub trait CaptureSource {
    fn list_displays(&self) -> Result<Vec<DisplayInfo>, CaptureError>;

    fn grab(&self, display: &DisplayInfo) -> Result<RgbaImage, CaptureError>;

    /// Grabs every display; a display that fails to grab is skipped.
    fn capture_all(&self) -> Result<Vec<Capture>, CaptureError> {
        let displays = self.list_displays()?;
        let mut captures = Vec::with_capacity(displays.len());

        for display in &displays {
            match self.grab(display) {
                Ok(image) => captures.push(Capture {
                    geometry: display.geometry,
                    image,
                }),
                Err(e) => log::warn!("Skipping display {}: {}", display.name, e),
            }
        }

        if captures.is_empty() {
            Err(CaptureError::NoMonitors)
        } else {
            Ok(captures)
        }
    }
}
