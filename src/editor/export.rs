//! Flattens the selection, post-effects and drawings into the output image.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use image::{imageops, DynamicImage, ImageFormat, RgbaImage};
use log::{debug, info};

use super::effects::PostEffects;
use crate::error::{ClipboardError, ExportError, SaveError};
use crate::geometry::Rect;

/// Where a finished image goes when the user saves it.
pub trait SaveTarget {
    fn save(&self, image: &RgbaImage, path: &Path) -> Result<(), SaveError>;
}

pub trait ClipboardTarget {
    fn set_image(&self, image: &RgbaImage) -> Result<(), ClipboardError>;
}

/// Writes to the local filesystem, encoder picked by extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSaver;

impl SaveTarget for FileSaver {
    fn save(&self, image: &RgbaImage, path: &Path) -> Result<(), SaveError> {
        save_image(image, path).map(|_| ())
    }
}

/// Crops `canvas` to `selection`, applies `effects` to the crop only and
/// paints the matching crop of `overlay` on top. Drawings stay anchored to
/// content position, so they are never flipped.
pub fn final_image(
    canvas: &RgbaImage,
    selection: Rect,
    effects: &PostEffects,
    overlay: &RgbaImage,
) -> Result<RgbaImage, ExportError> {
    let bounds = Rect::from_size(canvas.width(), canvas.height());
    let area = selection
        .normalized()
        .intersection(&bounds)
        .ok_or(ExportError::EmptySelection)?;

    let (x, y, w, h) = (
        area.x as u32,
        area.y as u32,
        area.width as u32,
        area.height as u32,
    );

    let crop = imageops::crop_imm(canvas, x, y, w, h).to_image();
    let mut output = effects.apply(&crop)?;

    if x < overlay.width() && y < overlay.height() {
        let drawings = imageops::crop_imm(overlay, x, y, w, h).to_image();
        imageops::overlay(&mut output, &drawings, 0, 0);
    }

    debug!("Final image assembled: {}x{} at ({}, {})", w, h, x, y);
    Ok(output)
}

/// Picks the encoder from the file extension, falling back to PNG.
pub fn format_for_path(path: &Path) -> ImageFormat {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => ImageFormat::Jpeg,
        Some("bmp") => ImageFormat::Bmp,
        _ => ImageFormat::Png,
    }
}

pub fn save_image(image: &RgbaImage, path: &Path) -> Result<ImageFormat, SaveError> {
    let format = format_for_path(path);

    // JPEG has no alpha channel.
    let result = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgba8(image.clone())
            .to_rgb8()
            .save_with_format(path, format),
        _ => image.save_with_format(path, format),
    };

    result.map_err(|source| SaveError::Encode {
        path: path.display().to_string(),
        source,
    })?;

    info!("Image saved to {:?} as {:?}", path, format);
    Ok(format)
}

pub fn default_file_name(now: SystemTime) -> String {
    let secs = match now.duration_since(UNIX_EPOCH) {
        Ok(dur) => dur.as_secs(),
        Err(_) => 0,
    };
    format!("screenshot_{}.png", secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::effects::FlipAxis;
    use image::Rgba;
    use std::time::Duration;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 0, 255]))
    }

    #[test]
    fn test_final_image_crops_selection() {
        let canvas = gradient(50, 50);
        let overlay = RgbaImage::new(50, 50);

        let output = final_image(
            &canvas,
            Rect::new(10, 20, 5, 6),
            &PostEffects::new(),
            &overlay,
        )
        .unwrap();

        assert_eq!(output.dimensions(), (5, 6));
        assert_eq!(output.get_pixel(0, 0).0, [10, 20, 0, 255]);
        assert_eq!(output.get_pixel(4, 5).0, [14, 25, 0, 255]);
    }

    #[test]
    fn test_drawings_are_not_flipped() {
        let canvas = gradient(20, 20);
        let mut overlay = RgbaImage::new(20, 20);
        overlay.put_pixel(10, 10, Rgba([255, 255, 255, 255]));

        let mut effects = PostEffects::new();
        effects.toggle_flip(FlipAxis::Horizontal);

        let output = final_image(&canvas, Rect::new(10, 10, 4, 4), &effects, &overlay).unwrap();

        // Base is mirrored, the drawing stays at its content position.
        assert_eq!(output.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(output.get_pixel(0, 1).0, [13, 11, 0, 255]);
        assert_eq!(output.get_pixel(3, 0).0, [10, 10, 0, 255]);
    }

    #[test]
    fn test_unnormalized_selection_is_accepted() {
        let canvas = gradient(20, 20);
        let overlay = RgbaImage::new(20, 20);

        let output = final_image(&canvas, Rect::new(8, 8, -4, -4), &PostEffects::new(), &overlay)
            .unwrap();

        assert_eq!(output.dimensions(), (4, 4));
        assert_eq!(output.get_pixel(0, 0).0, [4, 4, 0, 255]);
    }

    #[test]
    fn test_selection_outside_canvas_is_an_error() {
        let canvas = gradient(20, 20);
        let overlay = RgbaImage::new(20, 20);

        let result = final_image(&canvas, Rect::new(30, 30, 5, 5), &PostEffects::new(), &overlay);
        assert!(matches!(result, Err(ExportError::EmptySelection)));
    }

    #[test]
    fn test_rotation_fails_export() {
        let canvas = gradient(20, 20);
        let overlay = RgbaImage::new(20, 20);
        let mut effects = PostEffects::new();
        effects.set_angle(90.0);

        let result = final_image(&canvas, Rect::new(0, 0, 5, 5), &effects, &overlay);
        assert!(matches!(result, Err(ExportError::Effects(_))));
    }

    #[test]
    fn test_format_for_path() {
        assert_eq!(format_for_path(Path::new("a.PNG")), ImageFormat::Png);
        assert_eq!(format_for_path(Path::new("a.jpeg")), ImageFormat::Jpeg);
        assert_eq!(format_for_path(Path::new("a.JPG")), ImageFormat::Jpeg);
        assert_eq!(format_for_path(Path::new("a.bmp")), ImageFormat::Bmp);
        assert_eq!(format_for_path(Path::new("a.tiff")), ImageFormat::Png);
        assert_eq!(format_for_path(Path::new("noext")), ImageFormat::Png);
    }

    #[test]
    fn test_save_image_round_trip_png() {
        let path = std::env::temp_dir().join(format!(
            "screenshooter_test_{}.png",
            std::process::id()
        ));
        let image = gradient(8, 8);

        assert_eq!(save_image(&image, &path).unwrap(), ImageFormat::Png);
        let loaded = image::open(&path).unwrap().to_rgba8();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, image);
    }

    #[test]
    fn test_default_file_name() {
        let now = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        assert_eq!(default_file_name(now), "screenshot_1700000000.png");
    }
}
