use gtk4 as gtk;

use gtk::cairo::{self, Context};
use gtk::DrawingArea;
use gtk4::prelude::*;
use std::cell::RefCell;
use std::f64::consts::PI;
use std::rc::Rc;

use crate::app::{AppState, ViewTransform};
use crate::editor::render;
use crate::editor::selection::AreaSelection;
use crate::geometry::Point;

/// Opacity of the veil over everything outside the selection.
const BACKDROP_ALPHA: f64 = 80.0 / 255.0;
const DIMENSION_FONT_SIZE: f64 = 13.0;

pub struct DrawingComponents {
    pub drawing_area: DrawingArea,
}

pub fn create_drawing_area(state: &Rc<RefCell<AppState>>) -> DrawingComponents {
    let drawing_area = DrawingArea::builder()
        .hexpand(true)
        .vexpand(true)
        .focusable(true)
        .build();

    setup_draw_function(&drawing_area, state);

    DrawingComponents { drawing_area }
}

fn setup_draw_function(drawing_area: &DrawingArea, state: &Rc<RefCell<AppState>>) {
    drawing_area.set_draw_func({
        let state = state.clone();
        move |_, cr, width, height| {
            draw_content(&state, cr, width, height);
        }
    });
}

fn draw_content(state: &Rc<RefCell<AppState>>, cr: &Context, width: i32, height: i32) {
    let mut state = state.borrow_mut();

    cr.set_source_rgb(0.0, 0.0, 0.0);
    let _ = cr.paint();

    state.update_view(width as f64, height as f64);
    let Some(canvas) = state.canvas_surface.clone() else {
        return;
    };
    let view = state.view;
    let session = &state.session;
    let area = session.area();

    let _ = cr.save();
    cr.translate(view.offset_x, view.offset_y);
    cr.scale(view.scale, view.scale);

    let _ = cr.set_source_surface(&canvas, 0.0, 0.0);
    let _ = cr.paint();

    cr.set_source_rgba(0.0, 0.0, 0.0, BACKDROP_ALPHA);
    let _ = cr.paint();

    // The preview already carries the flip, so it is painted as is.
    if let Some(preview) = area.preview() {
        let sel = area.selection().normalized();
        paint_image(cr, preview, sel.x as f64, sel.y as f64);
    }

    for drawing in session.drawing().drawings() {
        paint_image(
            cr,
            &drawing.bitmap,
            drawing.placement.x as f64,
            drawing.placement.y as f64,
        );
    }
    let _ = cr.restore();

    let border_width = session.defaults().border_width;
    let handle_size = session.defaults().handle_size;
    draw_selection_border(cr, area, &view, border_width);
    if !area.selection().normalized().is_empty() && !session.drawing().is_active() {
        draw_handles(cr, area, &view, handle_size);
    }
    if area.is_transforming() {
        draw_dimension_label(cr, &area.dimension_label(), &view, area.pointer());
    }

    if let Some(edit) = session.drawing().text_edit() {
        let (x, y, w, h) = view.rect_to_display(edit.area());
        cr.set_source_rgba(1.0, 1.0, 1.0, 0.8);
        cr.set_line_width(1.0);
        cr.set_dash(&[4.0, 4.0], 0.0);
        cr.rectangle(x, y, w.max(2.0), h.max(2.0));
        let _ = cr.stroke();
        cr.set_dash(&[], 0.0);
    }
}

fn paint_image(cr: &Context, image: &image::RgbaImage, x: f64, y: f64) {
    if image.width() == 0 || image.height() == 0 {
        return;
    }
    match render::image_to_surface(image) {
        Ok(surface) => {
            let _ = cr.set_source_surface(&surface, x, y);
            let _ = cr.paint();
        }
        Err(e) => log::warn!("Skipping bitmap that cairo could not take: {}", e),
    }
}

fn draw_selection_border(cr: &Context, area: &AreaSelection, view: &ViewTransform, width: f64) {
    let sel = area.selection().normalized();
    if sel.is_empty() {
        return;
    }
    let (x, y, w, h) = view.rect_to_display(sel);

    cr.set_line_width(width);
    cr.set_source_rgb(1.0, 1.0, 1.0);
    cr.rectangle(x, y, w, h);
    let _ = cr.stroke();

    cr.set_source_rgb(0.0, 0.0, 0.0);
    cr.set_dash(&[2.0, 2.0], 0.0);
    cr.rectangle(x, y, w, h);
    let _ = cr.stroke();
    cr.set_dash(&[], 0.0);
}

fn draw_handles(cr: &Context, area: &AreaSelection, view: &ViewTransform, size: f64) {
    for (_, marker) in area.handles() {
        let (x, y) = view.canvas_to_display(marker);
        cr.arc(x, y, size / 2.0, 0.0, 2.0 * PI);
        cr.set_source_rgb(1.0, 1.0, 1.0);
        let _ = cr.fill_preserve();
        cr.set_source_rgba(0.0, 0.0, 0.0, 0.6);
        cr.set_line_width(1.0);
        let _ = cr.stroke();
    }
}

fn draw_dimension_label(cr: &Context, text: &str, view: &ViewTransform, pointer: Point) {
    let (px, py) = view.canvas_to_display(pointer);

    cr.select_font_face("Sans", cairo::FontSlant::Normal, cairo::FontWeight::Bold);
    cr.set_font_size(DIMENSION_FONT_SIZE);
    let Ok(extents) = cr.text_extents(text) else {
        return;
    };

    let (x, y) = (px + 12.0, py + 12.0);
    let (w, h) = (extents.width() + 12.0, extents.height() + 10.0);

    cr.set_source_rgba(0.0, 0.0, 0.0, 0.7);
    cr.rectangle(x, y, w, h);
    let _ = cr.fill();

    cr.set_source_rgb(1.0, 1.0, 1.0);
    cr.move_to(x + 6.0 - extents.x_bearing(), y + 5.0 - extents.y_bearing());
    let _ = cr.show_text(text);
}
