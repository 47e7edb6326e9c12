use gtk4::gdk::{self, MemoryFormat, MemoryTexture};
use gtk4::glib;
use gtk4::prelude::*;
use image::RgbaImage;
use log::info;

use super::export::ClipboardTarget;
use crate::error::ClipboardError;

pub type ClipboardResult<T> = Result<T, ClipboardError>;

/// Wraps straight RGBA pixels in a texture GDK can hand to other apps.
pub fn texture_from_image(image: &RgbaImage) -> ClipboardResult<MemoryTexture> {
    let (width, height) = image.dimensions();
    let too_large = || ClipboardError::TooLarge { width, height };

    let w = i32::try_from(width).map_err(|_| too_large())?;
    let h = i32::try_from(height).map_err(|_| too_large())?;
    let stride = width
        .checked_mul(4)
        .map(|s| s as usize)
        .ok_or_else(too_large)?;

    let bytes = glib::Bytes::from(image.as_raw().as_slice());
    Ok(MemoryTexture::new(w, h, MemoryFormat::R8g8b8a8, &bytes, stride))
}

pub fn copy_image_to_clipboard(image: &RgbaImage, display: &gdk::Display) -> ClipboardResult<()> {
    let texture = texture_from_image(image)?;
    display.clipboard().set_texture(&texture);
    info!(
        "Image copied to clipboard ({}x{})",
        image.width(),
        image.height()
    );
    Ok(())
}

pub struct ClipboardManager {
    display: Option<gdk::Display>,
}

impl ClipboardManager {
    pub fn from_default_display() -> Self {
        Self {
            display: gdk::Display::default(),
        }
    }

    pub fn copy_image(&self, image: &RgbaImage) -> ClipboardResult<()> {
        let display = self.display.as_ref().ok_or(ClipboardError::NoDisplay)?;
        copy_image_to_clipboard(image, display)
    }
}

impl ClipboardTarget for ClipboardManager {
    fn set_image(&self, image: &RgbaImage) -> ClipboardResult<()> {
        self.copy_image(image)
    }
}
