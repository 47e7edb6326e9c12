//! Screen capture backed by the xcap library.

use image::RgbaImage;
use log::debug;
use xcap::Monitor;

use super::{CaptureSource, DisplayInfo};
use crate::error::CaptureError;
use crate::geometry::Rect;

/// Captures every attached monitor through xcap.
#[derive(Debug, Default, Clone, Copy)]
pub struct XcapSource;

impl XcapSource {
    pub fn new() -> Self {
        Self
    }

    fn monitors() -> Result<Vec<Monitor>, CaptureError> {
        Monitor::all().map_err(|e| CaptureError::MonitorEnumeration(e.to_string()))
    }
}

fn display_from_xcap(monitor: &Monitor) -> Result<DisplayInfo, CaptureError> {
    let enumeration = |e: xcap::XCapError| CaptureError::MonitorEnumeration(e.to_string());

    Ok(DisplayInfo {
        id: monitor.id().map_err(enumeration)?,
        name: monitor.name().map_err(enumeration)?,
        geometry: Rect::new(
            monitor.x().map_err(enumeration)?,
            monitor.y().map_err(enumeration)?,
            monitor.width().map_err(enumeration)? as i32,
            monitor.height().map_err(enumeration)? as i32,
        ),
    })
}

impl CaptureSource for XcapSource {
    fn list_displays(&self) -> Result<Vec<DisplayInfo>, CaptureError> {
        let displays = Self::monitors()?
            .iter()
            .map(display_from_xcap)
            .collect::<Result<Vec<_>, _>>()?;

        if displays.is_empty() {
            return Err(CaptureError::NoMonitors);
        }

        for display in &displays {
            debug!(
                "Monitor {} '{}' at ({}, {}) {}x{}",
                display.id,
                display.name,
                display.geometry.x,
                display.geometry.y,
                display.geometry.width,
                display.geometry.height
            );
        }

        Ok(displays)
    }

    fn grab(&self, display: &DisplayInfo) -> Result<RgbaImage, CaptureError> {
        let failed = |reason: String| CaptureError::CaptureFailed {
            name: display.name.clone(),
            reason,
        };

        let monitor = Self::monitors()?
            .into_iter()
            .find(|m| m.id().ok() == Some(display.id))
            .ok_or_else(|| failed("monitor disappeared".to_string()))?;

        monitor.capture_image().map_err(|e| failed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_displays() {
        // Enumeration needs a running display server; skip quietly without one.
        if let Ok(displays) = XcapSource::new().list_displays() {
            assert!(!displays.is_empty());
            for display in &displays {
                assert!(display.geometry.width > 0);
                assert!(display.geometry.height > 0);
            }
        }
    }
}
