//! Merges per-display captures into one virtual-desktop canvas.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use log::{debug, info};

use super::Capture;
use crate::error::CaptureError;
use crate::geometry::{bounding_rect, to_local, Point, Rect};

/// The merged bitmap plus where its top-left sits on the virtual desktop.
#[derive(Debug, Clone)]
pub struct MergedCanvas {
    pub image: RgbaImage,
    pub origin: Point,
    /// Display geometries in canvas-local coordinates.
    pub screens: Vec<Rect>,
}

impl MergedCanvas {
    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.image.width(), self.image.height())
    }
}

pub fn merge(captures: &[Capture]) -> Result<MergedCanvas, CaptureError> {
    let geometries: Vec<Rect> = captures.iter().map(|c| c.geometry).collect();
    let bounds = bounding_rect(&geometries).ok_or(CaptureError::NoMonitors)?;

    if bounds.is_empty() {
        return Err(CaptureError::EmptyCanvas {
            width: bounds.width,
            height: bounds.height,
        });
    }

    let origin = bounds.top_left();
    let mut image = RgbaImage::from_pixel(
        bounds.width as u32,
        bounds.height as u32,
        Rgba([0, 0, 0, 0]),
    );

    let mut screens = Vec::with_capacity(captures.len());
    for capture in captures {
        let geometry = capture.geometry.normalized();
        let local = to_local(geometry.top_left(), origin);
        screens.push(Rect::new(local.x, local.y, geometry.width, geometry.height));

        let (w, h) = (geometry.width as u32, geometry.height as u32);
        if capture.image.dimensions() != (w, h) && w > 0 && h > 0 {
            debug!(
                "Scaling {}x{} grab to {}x{} logical geometry",
                capture.image.width(),
                capture.image.height(),
                w,
                h
            );
            let scaled = imageops::resize(&capture.image, w, h, FilterType::Triangle);
            imageops::replace(&mut image, &scaled, local.x as i64, local.y as i64);
        } else {
            imageops::replace(&mut image, &capture.image, local.x as i64, local.y as i64);
        }
    }

    info!(
        "Merged {} capture(s) into {}x{} canvas at ({}, {})",
        captures.len(),
        bounds.width,
        bounds.height,
        origin.x,
        origin.y
    );

    Ok(MergedCanvas {
        image,
        origin,
        screens,
    })
}
