//! Shared UI state
//!
//! Everything the GTK callbacks need lives behind one `Rc<RefCell<AppState>>`.

use gtk4::cairo::ImageSurface;
use log::error;

use super::config::ShortcutConfig;
use super::session::Session;
use crate::editor::render;
use crate::geometry::{Point, Rect};

/// Maps between drawing-area pixels and canvas pixels. The canvas is scaled
/// to fit the widget and centred in it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

impl ViewTransform {
    pub fn fit(canvas_width: f64, canvas_height: f64, area_width: f64, area_height: f64) -> Self {
        if canvas_width <= 0.0 || canvas_height <= 0.0 {
            return Self::default();
        }
        let scale = (area_width / canvas_width).min(area_height / canvas_height);
        Self {
            scale,
            offset_x: (area_width - canvas_width * scale) / 2.0,
            offset_y: (area_height - canvas_height * scale) / 2.0,
        }
    }

    pub fn display_to_canvas(&self, display_x: f64, display_y: f64) -> Point {
        Point::new(
            ((display_x - self.offset_x) / self.scale).round() as i32,
            ((display_y - self.offset_y) / self.scale).round() as i32,
        )
    }

    pub fn canvas_to_display(&self, p: Point) -> (f64, f64) {
        (
            p.x as f64 * self.scale + self.offset_x,
            p.y as f64 * self.scale + self.offset_y,
        )
    }

    pub fn rect_to_display(&self, rect: Rect) -> (f64, f64, f64, f64) {
        let r = rect.normalized();
        let (x, y) = self.canvas_to_display(r.top_left());
        (x, y, r.width as f64 * self.scale, r.height as f64 * self.scale)
    }
}

pub struct AppState {
    pub session: Session,
    pub shortcuts: ShortcutConfig,
    pub view: ViewTransform,
    /// The merged canvas as a paintable surface, built once per session.
    pub canvas_surface: Option<ImageSurface>,
}

impl AppState {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            shortcuts: ShortcutConfig::new(),
            view: ViewTransform::default(),
            canvas_surface: None,
        }
    }

    /// Rebuilds the cached canvas surface after activation or hiding.
    pub fn refresh_canvas_surface(&mut self) {
        self.canvas_surface = match self.session.canvas() {
            Some(canvas) => match render::image_to_surface(canvas) {
                Ok(surface) => Some(surface),
                Err(e) => {
                    error!("Failed to prepare canvas for display: {}", e);
                    None
                }
            },
            None => None,
        };
    }

    pub fn update_view(&mut self, area_width: f64, area_height: f64) {
        let Some(canvas) = self.session.canvas() else {
            return;
        };
        self.view = ViewTransform::fit(
            canvas.width() as f64,
            canvas.height() as f64,
            area_width,
            area_height,
        );
        self.session.set_display_scale(self.view.scale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_letterboxes_wide_canvas() {
        let view = ViewTransform::fit(3200.0, 1080.0, 1600.0, 900.0);
        assert_eq!(view.scale, 0.5);
        assert_eq!(view.offset_x, 0.0);
        assert_eq!(view.offset_y, (900.0 - 540.0) / 2.0);
    }

    #[test]
    fn test_display_canvas_mapping() {
        let view = ViewTransform {
            scale: 0.5,
            offset_x: 10.0,
            offset_y: 20.0,
        };
        assert_eq!(view.display_to_canvas(60.0, 70.0), Point::new(100, 100));
        assert_eq!(view.canvas_to_display(Point::new(100, 100)), (60.0, 70.0));
        assert_eq!(
            view.rect_to_display(Rect::new(100, 100, -20, 40)),
            (50.0, 70.0, 10.0, 20.0)
        );
    }

    #[test]
    fn test_fit_empty_canvas_is_identity() {
        assert_eq!(ViewTransform::fit(0.0, 0.0, 100.0, 100.0), ViewTransform::default());
    }
}
