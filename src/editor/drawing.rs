//! The annotation engine: per-stroke lifecycle, text editing and history.
//!
//! Every committed annotation is a [`Drawing`]: a pre-rendered transparent
//! bitmap plus the canvas rectangle it covers. While the pointer is down the
//! stroke's entry at the top of the history is replaced on every move, so a
//! stroke only ever adds one entry.

use std::rc::Rc;

use gtk4::gdk::RGBA;
use image::imageops;
use image::RgbaImage;
use log::{debug, info};

use super::history::History;
use super::render::{self, Shape};
use super::tools::{Pen, ToolKind};
use crate::error::RenderError;
use crate::geometry::{Point, Rect};

/// One committed annotation in canvas-local coordinates.
#[derive(Clone, Debug)]
pub struct Drawing {
    pub placement: Rect,
    pub bitmap: Rc<RgbaImage>,
}

impl PartialEq for Drawing {
    fn eq(&self, other: &Self) -> bool {
        self.placement == other.placement && Rc::ptr_eq(&self.bitmap, &other.bitmap)
    }
}

#[derive(Clone, Debug)]
struct Stroke {
    start: Point,
    end: Point,
    path: Vec<Point>,
    /// Bitmap of the entry this stroke last put into the history.
    live: Option<Rc<RgbaImage>>,
}

/// An open text box; nothing is committed until it is closed.
#[derive(Clone, Debug, PartialEq)]
pub struct TextEdit {
    pub start: Point,
    pub end: Point,
    pub content: String,
}

impl TextEdit {
    pub fn area(&self) -> Rect {
        Rect::from_corners(self.start, self.end).normalized()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EscapeOutcome {
    TextClosed,
    ToolCleared,
    Ignored,
}

#[derive(Clone, Debug, Default)]
pub struct DrawingEngine {
    canvas: Rect,
    tool: ToolKind,
    pen: Pen,
    history: History<Drawing>,
    stroke: Option<Stroke>,
    text_edit: Option<TextEdit>,
}

impl DrawingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sizes the engine for a new canvas and drops all previous drawings.
    pub fn set_canvas(&mut self, width: u32, height: u32) {
        debug!("Drawing canvas set to {}x{}", width, height);
        self.canvas = Rect::from_size(width, height);
        self.history.clear();
        self.stroke = None;
        self.text_edit = None;
        self.tool = ToolKind::Cursor;
    }

    pub fn canvas(&self) -> Rect {
        self.canvas
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn is_active(&self) -> bool {
        self.tool.is_draw_tool()
    }

    pub fn pen(&self) -> &Pen {
        &self.pen
    }

    pub fn set_pen(&mut self, pen: Pen) {
        self.pen = pen;
    }

    pub fn start(&mut self, tool: ToolKind) -> Result<(), RenderError> {
        debug!("Drawing tool set to {:?}", tool);
        if tool != ToolKind::Text {
            self.close_text_edit()?;
        }
        self.stroke = None;
        self.tool = tool;
        Ok(())
    }

    /// Returns to the cursor, committing any open text box.
    pub fn stop(&mut self) -> Result<(), RenderError> {
        self.start(ToolKind::Cursor)
    }

    pub fn press(&mut self, point: Point) -> Result<(), RenderError> {
        if !self.is_active() {
            return Ok(());
        }

        self.close_text_edit()?;

        if self.tool == ToolKind::Text {
            self.text_edit = Some(TextEdit {
                start: point,
                end: point,
                content: String::new(),
            });
            return Ok(());
        }

        self.stroke = Some(Stroke {
            start: point,
            end: point,
            path: vec![point],
            live: None,
        });
        Ok(())
    }

    pub fn drag(&mut self, point: Point) -> Result<(), RenderError> {
        if let Some(edit) = self.text_edit.as_mut() {
            edit.end = point;
            return Ok(());
        }

        let Some(stroke) = self.stroke.as_mut() else {
            return Ok(());
        };
        stroke.end = point;
        if self.tool == ToolKind::Freehand {
            stroke.path.push(point);
        }

        self.render_stroke(false)
    }

    pub fn release(&mut self, point: Point) -> Result<(), RenderError> {
        if self.text_edit.is_some() {
            return self.drag(point);
        }
        if self.stroke.is_none() {
            return Ok(());
        }

        self.drag(point)?;
        if self.tool == ToolKind::Freehand {
            self.render_stroke(true)?;
        }

        if let Some(stroke) = self.stroke.take() {
            debug!(
                "Committed {:?} stroke from ({}, {}) to ({}, {})",
                self.tool, stroke.start.x, stroke.start.y, stroke.end.x, stroke.end.y
            );
        }
        Ok(())
    }

    fn render_stroke(&mut self, tight: bool) -> Result<(), RenderError> {
        let Some(stroke) = self.stroke.as_ref() else {
            return Ok(());
        };

        let margin = self.tool.margin(self.pen.width);
        let bounds = Rect::from_corners(stroke.start, stroke.end).expanded(margin);

        let (shape, area) = match self.tool {
            ToolKind::Freehand => {
                let area = if tight {
                    path_bounds(&stroke.path)
                        .expanded(margin)
                        .intersection(&self.canvas)
                        .unwrap_or(self.canvas)
                } else {
                    self.canvas
                };
                (Shape::Path(&stroke.path), area)
            }
            ToolKind::Line => (
                Shape::Line {
                    start: stroke.start,
                    end: stroke.end,
                },
                bounds,
            ),
            ToolKind::Arrow => (
                Shape::Arrow {
                    start: stroke.start,
                    end: stroke.end,
                },
                bounds,
            ),
            ToolKind::Rectangle => (
                Shape::Rectangle(Rect::from_corners(stroke.start, stroke.end)),
                bounds,
            ),
            ToolKind::Ellipse => (
                Shape::Ellipse(Rect::from_corners(stroke.start, stroke.end)),
                bounds,
            ),
            ToolKind::Cursor | ToolKind::Text => return Ok(()),
        };

        let bitmap = Rc::new(render::render(&shape, &self.pen, area)?);
        let replaces_live = match (&stroke.live, self.history.last()) {
            (Some(live), Some(last)) => Rc::ptr_eq(live, &last.bitmap),
            _ => false,
        };

        let drawing = Drawing {
            placement: area,
            bitmap: Rc::clone(&bitmap),
        };
        if replaces_live {
            self.history.replace_last(drawing);
        } else {
            self.history.push(drawing);
        }

        if let Some(stroke) = self.stroke.as_mut() {
            stroke.live = Some(bitmap);
        }
        Ok(())
    }

    pub fn text_edit(&self) -> Option<&TextEdit> {
        self.text_edit.as_ref()
    }

    pub fn is_editing_text(&self) -> bool {
        self.text_edit.is_some()
    }

    pub fn set_text(&mut self, content: &str) {
        if let Some(edit) = self.text_edit.as_mut() {
            edit.content = content.to_string();
        }
    }

    /// Closes the open text box, committing it when it holds any text.
    ///
    /// Returns whether a drawing was committed.
    pub fn close_text_edit(&mut self) -> Result<bool, RenderError> {
        let Some(edit) = self.text_edit.take() else {
            return Ok(false);
        };
        if edit.content.is_empty() {
            debug!("Discarding empty text box");
            return Ok(false);
        }

        let origin = edit.area().top_left();
        let (width, height) = render::measure_text(&edit.content, self.pen.font_size)?;
        let placement = Rect::new(origin.x, origin.y, width, height);
        let bitmap = render::render(
            &Shape::Text {
                origin,
                text: &edit.content,
            },
            &self.pen,
            placement,
        )?;

        info!("Committed text annotation '{}'", edit.content);
        self.history.push(Drawing {
            placement,
            bitmap: Rc::new(bitmap),
        });
        Ok(true)
    }

    pub fn set_color(&mut self, color: RGBA) -> Result<(), RenderError> {
        debug!("Pen colour set to {:?}", color);
        self.pen.color = color;
        self.render_stroke(false)
    }

    pub fn set_pen_width(&mut self, width: f64) -> Result<(), RenderError> {
        self.pen.set_width(width);
        debug!("Pen width set to {}", self.pen.width);
        self.render_stroke(false)
    }

    pub fn step_pen_width(&mut self, steps: i32) -> Result<(), RenderError> {
        self.set_pen_width(self.pen.width + super::tools::PEN_WIDTH_STEP * steps as f64)
    }

    pub fn undo(&mut self) -> bool {
        let undone = self.history.undo();
        debug!("Undo {}", if undone { "applied" } else { "ignored" });
        undone
    }

    pub fn redo(&mut self) -> bool {
        let redone = self.history.redo();
        debug!("Redo {}", if redone { "applied" } else { "ignored" });
        redone
    }

    pub fn drawings(&self) -> impl Iterator<Item = &Drawing> {
        self.history.iter()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Escape while typing closes the text box; otherwise it drops the tool.
    pub fn escape(&mut self) -> Result<EscapeOutcome, RenderError> {
        if self.is_editing_text() {
            self.close_text_edit()?;
            return Ok(EscapeOutcome::TextClosed);
        }
        if self.is_active() {
            self.stop()?;
            return Ok(EscapeOutcome::ToolCleared);
        }
        Ok(EscapeOutcome::Ignored)
    }

    /// Paints every committed drawing, in order, onto one transparent canvas.
    pub fn flatten(&self) -> RgbaImage {
        let mut overlay = RgbaImage::new(self.canvas.width as u32, self.canvas.height as u32);
        for drawing in self.history.iter() {
            imageops::overlay(
                &mut overlay,
                &*drawing.bitmap,
                drawing.placement.x as i64,
                drawing.placement.y as i64,
            );
        }
        overlay
    }
}

fn path_bounds(path: &[Point]) -> Rect {
    let Some(first) = path.first() else {
        return Rect::default();
    };
    let (mut left, mut top, mut right, mut bottom) = (first.x, first.y, first.x, first.y);
    for p in path {
        left = left.min(p.x);
        top = top.min(p.y);
        right = right.max(p.x);
        bottom = bottom.max(p.y);
    }
    Rect::new(left, top, right - left, bottom - top)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(tool: ToolKind) -> DrawingEngine {
        let mut engine = DrawingEngine::new();
        engine.set_canvas(200, 100);
        engine.start(tool).unwrap();
        engine
    }

    fn stroke(engine: &mut DrawingEngine, from: Point, to: Point) {
        engine.press(from).unwrap();
        engine.drag(to).unwrap();
        engine.release(to).unwrap();
    }

    #[test]
    fn test_line_placement_includes_margin() {
        let mut engine = engine(ToolKind::Line);
        engine.set_pen_width(4.0).unwrap();
        stroke(&mut engine, Point::new(0, 0), Point::new(10, 0));

        assert_eq!(engine.len(), 1);
        let drawing = engine.drawings().next().unwrap();
        let bare = Rect::new(0, 0, 10, 0);
        assert!(drawing.placement.contains_rect(&bare));
        assert!(drawing.placement.width > bare.width);
        assert!(drawing.placement.height > bare.height);
        assert_eq!(
            drawing.bitmap.dimensions(),
            (drawing.placement.width as u32, drawing.placement.height as u32)
        );

        // One horizontal band of ink through the middle row.
        let mid_row = (-drawing.placement.y) as u32;
        assert!(drawing.bitmap.get_pixel(9, mid_row).0[3] > 0);
        assert_eq!(drawing.bitmap.get_pixel(9, 0).0[3], 0);
    }

    #[test]
    fn test_many_moves_commit_one_entry() {
        let mut engine = engine(ToolKind::Rectangle);
        engine.press(Point::new(10, 10)).unwrap();
        for i in 0..25 {
            engine.drag(Point::new(20 + i, 20 + i)).unwrap();
        }
        engine.release(Point::new(60, 60)).unwrap();
        assert_eq!(engine.len(), 1);

        let mut freehand = self::engine(ToolKind::Freehand);
        freehand.press(Point::new(5, 5)).unwrap();
        for i in 0..10 {
            freehand.drag(Point::new(5 + i * 3, 5 + i)).unwrap();
        }
        freehand.release(Point::new(40, 20)).unwrap();
        assert_eq!(freehand.len(), 1);
    }

    #[test]
    fn test_freehand_is_tightened_on_release() {
        let mut engine = engine(ToolKind::Freehand);
        engine.press(Point::new(10, 10)).unwrap();
        engine.drag(Point::new(20, 15)).unwrap();
        assert_eq!(engine.drawings().next().unwrap().placement, engine.canvas());

        engine.release(Point::new(30, 20)).unwrap();
        let placement = engine.drawings().next().unwrap().placement;
        assert!(placement.width < 200);
        assert!(placement.contains_rect(&Rect::new(10, 10, 20, 10)));
    }

    #[test]
    fn test_undo_redo_restores_exact_drawing() {
        let mut engine = engine(ToolKind::Ellipse);
        stroke(&mut engine, Point::new(10, 10), Point::new(50, 40));
        stroke(&mut engine, Point::new(60, 10), Point::new(90, 40));
        let before: Vec<Drawing> = engine.drawings().cloned().collect();

        assert!(engine.undo());
        assert_eq!(engine.len(), 1);
        assert!(engine.redo());

        let after: Vec<Drawing> = engine.drawings().cloned().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_commit_after_undo_clears_redo() {
        let mut engine = engine(ToolKind::Line);
        stroke(&mut engine, Point::new(0, 0), Point::new(10, 10));
        engine.undo();
        stroke(&mut engine, Point::new(20, 20), Point::new(30, 30));

        assert!(!engine.redo());
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_undo_on_empty_history_is_noop() {
        let mut engine = engine(ToolKind::Line);
        assert!(!engine.undo());
        assert!(!engine.redo());
        assert!(engine.is_empty());
        assert_eq!(engine.tool(), ToolKind::Line);
    }

    #[test]
    fn test_undo_mid_stroke_does_not_eat_older_drawing() {
        let mut engine = engine(ToolKind::Line);
        stroke(&mut engine, Point::new(0, 0), Point::new(10, 10));
        engine.press(Point::new(50, 50)).unwrap();
        engine.drag(Point::new(60, 60)).unwrap();
        engine.undo();
        engine.drag(Point::new(70, 70)).unwrap();
        engine.release(Point::new(70, 70)).unwrap();

        assert_eq!(engine.len(), 2);
    }

    #[test]
    fn test_colour_change_rerenders_live_stroke() {
        let mut engine = engine(ToolKind::Line);
        engine.press(Point::new(10, 10)).unwrap();
        engine.drag(Point::new(40, 10)).unwrap();
        let before = Rc::clone(&engine.drawings().next().unwrap().bitmap);

        engine.set_color(RGBA::new(0.0, 1.0, 0.0, 1.0)).unwrap();
        let after = &engine.drawings().next().unwrap().bitmap;

        assert_eq!(engine.len(), 1);
        assert!(!Rc::ptr_eq(&before, after));
    }

    #[test]
    fn test_text_commits_only_when_closed_and_non_empty() {
        let mut engine = engine(ToolKind::Text);
        engine.press(Point::new(10, 10)).unwrap();
        engine.release(Point::new(80, 40)).unwrap();
        assert!(engine.is_editing_text());
        assert!(engine.is_empty());

        engine.set_text("hello");
        assert_eq!(engine.escape().unwrap(), EscapeOutcome::TextClosed);
        assert_eq!(engine.len(), 1);
        assert_eq!(engine.drawings().next().unwrap().placement.top_left(), Point::new(10, 10));
        assert_eq!(engine.tool(), ToolKind::Text);

        engine.press(Point::new(100, 50)).unwrap();
        assert!(!engine.close_text_edit().unwrap());
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_escape_on_empty_text_box_keeps_text_tool() {
        let mut engine = engine(ToolKind::Text);
        engine.press(Point::new(10, 10)).unwrap();
        engine.release(Point::new(80, 40)).unwrap();

        assert_eq!(engine.escape().unwrap(), EscapeOutcome::TextClosed);
        assert!(!engine.is_editing_text());
        assert!(engine.is_empty());
        assert_eq!(engine.tool(), ToolKind::Text);

        assert_eq!(engine.escape().unwrap(), EscapeOutcome::ToolCleared);
        assert_eq!(engine.tool(), ToolKind::Cursor);
    }

    #[test]
    fn test_press_while_editing_commits_text_first() {
        let mut engine = engine(ToolKind::Text);
        engine.press(Point::new(10, 10)).unwrap();
        engine.set_text("first");
        engine.press(Point::new(100, 50)).unwrap();

        assert_eq!(engine.len(), 1);
        assert_eq!(engine.text_edit().map(|e| e.start), Some(Point::new(100, 50)));
    }

    #[test]
    fn test_escape_clears_tool_and_keeps_drawings() {
        let mut engine = engine(ToolKind::Arrow);
        stroke(&mut engine, Point::new(10, 10), Point::new(60, 40));
        assert_eq!(engine.escape().unwrap(), EscapeOutcome::ToolCleared);
        assert_eq!(engine.tool(), ToolKind::Cursor);
        assert_eq!(engine.len(), 1);
        assert_eq!(engine.escape().unwrap(), EscapeOutcome::Ignored);
    }

    #[test]
    fn test_cursor_tool_ignores_pointer() {
        let mut engine = engine(ToolKind::Cursor);
        stroke(&mut engine, Point::new(0, 0), Point::new(10, 10));
        assert!(engine.is_empty());
    }

    #[test]
    fn test_flatten_paints_in_order() {
        let mut engine = engine(ToolKind::Line);
        engine.set_pen_width(10.0).unwrap();
        stroke(&mut engine, Point::new(20, 50), Point::new(80, 50));
        engine.set_color(RGBA::new(0.0, 0.0, 1.0, 1.0)).unwrap();
        stroke(&mut engine, Point::new(50, 20), Point::new(50, 80));

        let overlay = engine.flatten();
        assert_eq!(overlay.dimensions(), (200, 100));
        assert_eq!(overlay.get_pixel(50, 50).0, [0, 0, 255, 255]);
        assert_eq!(overlay.get_pixel(25, 50).0, [255, 0, 0, 255]);
        assert_eq!(overlay.get_pixel(150, 10).0[3], 0);
    }
}
