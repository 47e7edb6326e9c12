//! Rasterises annotation shapes into standalone RGBA bitmaps with cairo.
//!
//! Shapes are given in canvas coordinates; the bitmap covers `area` and
//! everything is drawn relative to its top-left corner.

use std::f64::consts::{FRAC_PI_4, PI};

use gtk4::cairo::{self, Antialias, Context, Format, ImageSurface, LineCap, LineJoin};
use image::{Rgba, RgbaImage};

use super::tools::Pen;
use crate::error::RenderError;
use crate::geometry::{Point, Rect};

const FONT_FAMILY: &str = "Sans";
const ARROW_HEAD_RATIO: f64 = 2.25;
const TEXT_PADDING: i32 = 2;

#[derive(Clone, Copy, Debug)]
pub enum Shape<'a> {
    Path(&'a [Point]),
    Line { start: Point, end: Point },
    Arrow { start: Point, end: Point },
    Rectangle(Rect),
    Ellipse(Rect),
    Text { origin: Point, text: &'a str },
}

pub fn render(shape: &Shape<'_>, pen: &Pen, area: Rect) -> Result<RgbaImage, RenderError> {
    if area.is_empty() {
        return Err(RenderError::EmptyArea {
            width: area.width,
            height: area.height,
        });
    }

    let surface = ImageSurface::create(Format::ARgb32, area.width, area.height)?;
    {
        let cr = Context::new(&surface)?;
        cr.translate(-area.x as f64, -area.y as f64);
        cr.set_antialias(Antialias::Best);
        cr.set_source_rgba(
            pen.color.red() as f64,
            pen.color.green() as f64,
            pen.color.blue() as f64,
            pen.color.alpha() as f64,
        );
        cr.set_line_width(pen.width);
        cr.set_line_cap(LineCap::Round);
        cr.set_line_join(LineJoin::Round);

        draw_shape(&cr, shape, pen)?;
    }

    surface_to_image(surface)
}

fn draw_shape(cr: &Context, shape: &Shape<'_>, pen: &Pen) -> Result<(), cairo::Error> {
    match *shape {
        Shape::Path(points) => {
            let Some(first) = points.first() else {
                return Ok(());
            };
            cr.move_to(first.x as f64, first.y as f64);
            if points.len() == 1 {
                // A click without motion still leaves a dot.
                cr.line_to(first.x as f64, first.y as f64);
            }
            for p in points.iter().skip(1) {
                cr.line_to(p.x as f64, p.y as f64);
            }
            cr.stroke()
        }
        Shape::Line { start, end } => {
            cr.move_to(start.x as f64, start.y as f64);
            cr.line_to(end.x as f64, end.y as f64);
            cr.stroke()
        }
        Shape::Arrow { start, end } => draw_arrow(cr, start, end, pen.width),
        Shape::Rectangle(rect) => {
            let r = rect.normalized();
            cr.rectangle(r.x as f64, r.y as f64, r.width as f64, r.height as f64);
            cr.stroke()
        }
        Shape::Ellipse(rect) => {
            let r = rect.normalized();
            if r.width == 0 || r.height == 0 {
                cr.move_to(r.x as f64, r.y as f64);
                cr.line_to(r.right() as f64, r.bottom() as f64);
                return cr.stroke();
            }
            cr.save()?;
            cr.translate(
                r.x as f64 + r.width as f64 / 2.0,
                r.y as f64 + r.height as f64 / 2.0,
            );
            cr.scale(r.width as f64 / 2.0, r.height as f64 / 2.0);
            cr.arc(0.0, 0.0, 1.0, 0.0, 2.0 * PI);
            cr.restore()?;
            cr.stroke()
        }
        Shape::Text { origin, text } => {
            cr.select_font_face(
                FONT_FAMILY,
                cairo::FontSlant::Normal,
                cairo::FontWeight::Normal,
            );
            cr.set_font_size(pen.font_size);
            let font = cr.font_extents()?;
            cr.move_to(
                (origin.x + TEXT_PADDING) as f64,
                origin.y as f64 + font.ascent(),
            );
            cr.show_text(text)
        }
    }
}

fn draw_arrow(cr: &Context, start: Point, end: Point, width: f64) -> Result<(), cairo::Error> {
    let (sx, sy) = (start.x as f64, start.y as f64);
    let (ex, ey) = (end.x as f64, end.y as f64);
    let angle = (ey - sy).atan2(ex - sx);
    let length = (ex - sx).hypot(ey - sy);

    // Leave room at the tip for the head.
    let shaft = (length - width).max(0.0);
    cr.move_to(sx, sy);
    cr.line_to(sx + shaft * angle.cos(), sy + shaft * angle.sin());
    cr.stroke()?;

    let head = width * ARROW_HEAD_RATIO;
    for side in [-FRAC_PI_4, FRAC_PI_4] {
        cr.move_to(ex, ey);
        cr.line_to(
            ex - head * (angle + side).cos(),
            ey - head * (angle + side).sin(),
        );
    }
    cr.stroke()
}

/// Size of the bitmap needed to hold `text` drawn at `font_size`.
pub fn measure_text(text: &str, font_size: f64) -> Result<(i32, i32), RenderError> {
    let scratch = ImageSurface::create(Format::ARgb32, 1, 1)?;
    let cr = Context::new(&scratch)?;
    cr.select_font_face(
        FONT_FAMILY,
        cairo::FontSlant::Normal,
        cairo::FontWeight::Normal,
    );
    cr.set_font_size(font_size);

    let extents = cr.text_extents(text)?;
    let font = cr.font_extents()?;

    let width = extents.x_advance().max(extents.x_bearing() + extents.width());
    let height = (font.ascent() + font.descent()).max(font_size);

    Ok((
        width.ceil() as i32 + TEXT_PADDING * 2,
        height.ceil() as i32,
    ))
}

/// Converts cairo's premultiplied native-endian ARGB into straight RGBA.
fn surface_to_image(mut surface: ImageSurface) -> Result<RgbaImage, RenderError> {
    surface.flush();
    let width = surface.width() as u32;
    let height = surface.height() as u32;
    let stride = surface.stride() as usize;
    let data = surface.data()?;

    let mut image = RgbaImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let offset = y as usize * stride + x as usize * 4;
        let argb = u32::from_ne_bytes([
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ]);
        let a = (argb >> 24) as u8;
        *pixel = Rgba([
            unpremultiply((argb >> 16) as u8, a),
            unpremultiply((argb >> 8) as u8, a),
            unpremultiply(argb as u8, a),
            a,
        ]);
    }

    Ok(image)
}

/// Converts straight RGBA into a cairo surface the UI can paint directly.
pub fn image_to_surface(image: &RgbaImage) -> Result<ImageSurface, RenderError> {
    let mut surface =
        ImageSurface::create(Format::ARgb32, image.width() as i32, image.height() as i32)?;
    let stride = surface.stride() as usize;
    {
        let mut data = surface.data()?;
        for (x, y, pixel) in image.enumerate_pixels() {
            let [r, g, b, a] = pixel.0;
            let argb = (a as u32) << 24
                | (premultiply(r, a) as u32) << 16
                | (premultiply(g, a) as u32) << 8
                | premultiply(b, a) as u32;
            let offset = y as usize * stride + x as usize * 4;
            data[offset..offset + 4].copy_from_slice(&argb.to_ne_bytes());
        }
    }
    surface.mark_dirty();
    Ok(surface)
}

fn premultiply(channel: u8, alpha: u8) -> u8 {
    ((channel as u32 * alpha as u32 + 127) / 255) as u8
}

fn unpremultiply(channel: u8, alpha: u8) -> u8 {
    if alpha == 0 {
        return 0;
    }
    let value = (channel as u32 * 255 + alpha as u32 / 2) / alpha as u32;
    value.min(255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtk4::gdk::RGBA;

    fn pen(width: f64) -> Pen {
        Pen {
            color: RGBA::new(0.0, 0.0, 1.0, 1.0),
            width,
            font_size: 16.0,
        }
    }

    fn painted(image: &RgbaImage) -> usize {
        image.pixels().filter(|p| p.0[3] > 0).count()
    }

    #[test]
    fn test_line_paints_only_its_band() {
        let area = Rect::new(-4, -4, 18, 8);
        let line = Shape::Line {
            start: Point::new(0, 0),
            end: Point::new(10, 0),
        };
        let image = render(&line, &pen(4.0), area).unwrap();

        assert_eq!(image.dimensions(), (18, 8));
        // Centre of the stroke, local (4 + 5, 4).
        let mid = image.get_pixel(9, 4);
        assert_eq!(mid.0, [0, 0, 255, 255]);
        // Corners of the bitmap lie outside the round-capped stroke.
        assert_eq!(image.get_pixel(0, 0).0[3], 0);
        assert_eq!(image.get_pixel(17, 7).0[3], 0);
    }

    #[test]
    fn test_rectangle_is_stroked_not_filled() {
        let area = Rect::new(0, 0, 40, 40);
        let image = render(&Shape::Rectangle(Rect::new(5, 5, 30, 30)), &pen(2.0), area).unwrap();

        assert!(image.get_pixel(5, 20).0[3] > 0);
        assert_eq!(image.get_pixel(20, 20).0[3], 0);
    }

    #[test]
    fn test_ellipse_leaves_center_empty() {
        let area = Rect::new(0, 0, 40, 30);
        let image = render(&Shape::Ellipse(Rect::new(4, 4, 32, 22)), &pen(2.0), area).unwrap();

        assert!(painted(&image) > 0);
        assert_eq!(image.get_pixel(20, 15).0[3], 0);
        assert!(image.get_pixel(4, 15).0[3] > 0);
    }

    #[test]
    fn test_arrow_head_reaches_back_from_tip() {
        let area = Rect::new(0, 0, 60, 40);
        let arrow = Shape::Arrow {
            start: Point::new(10, 20),
            end: Point::new(50, 20),
        };
        let image = render(&arrow, &pen(4.0), area).unwrap();

        // Head strokes run up-left and down-left from the tip at 45 degrees.
        assert!(image.get_pixel(45, 15).0[3] > 0);
        assert!(image.get_pixel(45, 25).0[3] > 0);
        assert_eq!(image.get_pixel(30, 30).0[3], 0);
    }

    #[test]
    fn test_freehand_single_point_leaves_dot() {
        let points = [Point::new(10, 10)];
        let image = render(&Shape::Path(&points), &pen(6.0), Rect::new(0, 0, 20, 20)).unwrap();
        assert!(image.get_pixel(10, 10).0[3] > 0);
    }

    #[test]
    fn test_empty_area_is_rejected() {
        let result = render(&Shape::Rectangle(Rect::default()), &pen(2.0), Rect::default());
        assert!(matches!(result, Err(RenderError::EmptyArea { .. })));
    }

    #[test]
    fn test_measure_text_grows_with_content() {
        let (short, h) = measure_text("a", 16.0).unwrap();
        let (long, _) = measure_text("a much longer label", 16.0).unwrap();
        assert!(h >= 16);
        assert!(long >= short);
    }

    #[test]
    fn test_image_to_surface_keeps_opaque_pixels() {
        let image = RgbaImage::from_fn(3, 2, |x, y| Rgba([x as u8 * 40, y as u8 * 90, 7, 255]));
        let surface = image_to_surface(&image).unwrap();
        assert_eq!(surface_to_image(surface).unwrap(), image);
    }

    #[test]
    fn test_premultiply() {
        assert_eq!(premultiply(255, 128), 128);
        assert_eq!(premultiply(200, 0), 0);
        assert_eq!(premultiply(10, 255), 10);
    }

    #[test]
    fn test_unpremultiply() {
        assert_eq!(unpremultiply(0, 0), 0);
        assert_eq!(unpremultiply(128, 128), 255);
        assert_eq!(unpremultiply(64, 128), 128);
    }
}
