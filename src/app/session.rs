//! One capture-and-annotate session.
//!
//! The session owns the merged canvas and routes pointer input either to the
//! area selection (cursor tool) or to the drawing engine. Toolkit commands
//! come in as [`ToolkitCommand`] values and everything the UI needs to react
//! to goes back out as [`UiEvent`]s, in the order they should be applied.

use std::path::Path;
use std::rc::Rc;
use std::time::SystemTime;

use gtk4::gdk::RGBA;
use image::RgbaImage;
use log::{debug, info, warn};

use super::config::EditorDefaults;
use crate::capture::{merge, CaptureSource};
use crate::editor::drawing::{DrawingEngine, EscapeOutcome};
use crate::editor::effects::{FlipAxis, PostEffects};
use crate::editor::export::{self, ClipboardTarget, SaveTarget};
use crate::editor::palette::ColorMenu;
use crate::editor::selection::{AreaSelection, SelectionEvent};
use crate::editor::tools::ToolKind;
use crate::error::{CaptureError, ClipboardError, ExportError, Result, SaveError};
use crate::geometry::{is_point_on_any, Point, Rect};

/// Gap between the selection and the toolkit bars.
pub const TOOLKIT_GAP: i32 = 10;
/// Thickness reserved for a toolkit bar placed above or beside the selection.
pub const TOOLKIT_THICKNESS: i32 = 40;

#[derive(Clone, Copy, Debug)]
pub enum ToolkitCommand {
    Cursor,
    Save,
    Copy,
    Close,
    Color(RGBA),
    ColorMenu,
    FlipHorizontal,
    FlipVertical,
    SelectTool(ToolKind),
}

#[derive(Clone, Debug)]
pub enum UiEvent {
    ToolkitVisible(bool),
    ColorIconChanged(RGBA),
    ColorMenuVisible(bool),
    ToolChanged(ToolKind),
    /// A text box was dragged open at this canvas rectangle.
    TextEditOpened(Rect),
    SaveRequested { suggested_name: String },
    Hidden,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolkitOrientation {
    Horizontal,
    Vertical,
}

/// Places a toolkit bar of `size` next to `selection`: above (horizontal) or
/// left of (vertical) its top-left corner, or past its bottom-right corner
/// when that spot is off every display.
pub fn align_toolkit(
    selection: Rect,
    screens: &[Rect],
    size: (i32, i32),
    orientation: ToolkitOrientation,
) -> Point {
    let sel = selection.normalized();
    let (width, height) = size;

    let (preferred, fallback) = match orientation {
        ToolkitOrientation::Horizontal => (
            Point::new(sel.left(), sel.top() - TOOLKIT_THICKNESS),
            Point::new(sel.right() - width, sel.bottom() + TOOLKIT_GAP),
        ),
        ToolkitOrientation::Vertical => (
            Point::new(sel.left() - TOOLKIT_THICKNESS, sel.top()),
            Point::new(sel.right() + TOOLKIT_GAP, sel.bottom() - height),
        ),
    };

    if is_point_on_any(preferred, screens) {
        preferred
    } else {
        fallback
    }
}

pub struct Session {
    defaults: EditorDefaults,
    active: bool,
    ignore_focus: bool,
    canvas: Option<Rc<RgbaImage>>,
    origin: Point,
    screens: Vec<Rect>,
    selection: Rect,
    area: AreaSelection,
    drawing: DrawingEngine,
    effects: PostEffects,
    colors: ColorMenu,
    toolkit_visible: bool,
    clipboard: Box<dyn ClipboardTarget>,
    saver: Box<dyn SaveTarget>,
}

impl Session {
    pub fn new(
        defaults: EditorDefaults,
        clipboard: Box<dyn ClipboardTarget>,
        saver: Box<dyn SaveTarget>,
    ) -> Self {
        let mut drawing = DrawingEngine::new();
        drawing.set_pen(defaults.pen());

        Self {
            defaults,
            active: false,
            ignore_focus: false,
            canvas: None,
            origin: Point::default(),
            screens: Vec::new(),
            selection: Rect::default(),
            area: AreaSelection::new(),
            drawing,
            effects: PostEffects::new(),
            colors: ColorMenu::new(),
            toolkit_visible: false,
            clipboard,
            saver,
        }
    }

    /// Grabs every display and starts a fresh session on the merged canvas.
    /// Drawings, effects and the selection of any previous session are dropped.
    pub fn activate(
        &mut self,
        source: &dyn CaptureSource,
    ) -> std::result::Result<Vec<UiEvent>, CaptureError> {
        let captures = source.capture_all()?;
        let merged = merge(&captures)?;

        let canvas = Rc::new(merged.image);
        let bounds = Rect::from_size(canvas.width(), canvas.height());

        self.drawing.set_canvas(canvas.width(), canvas.height());
        self.effects.clear();
        self.colors.deactivate();
        self.area
            .start(Rc::clone(&canvas), merged.origin, merged.screens.clone());

        self.origin = merged.origin;
        self.screens = merged.screens;
        self.canvas = Some(canvas);
        // Whole canvas until the user drags a region.
        self.selection = bounds;
        self.toolkit_visible = false;
        self.ignore_focus = false;
        self.active = true;

        info!(
            "Session activated: {}x{} canvas at ({}, {})",
            bounds.width, bounds.height, self.origin.x, self.origin.y
        );

        Ok(vec![
            UiEvent::ToolkitVisible(false),
            UiEvent::ColorMenuVisible(false),
            UiEvent::ToolChanged(ToolKind::Cursor),
            UiEvent::ColorIconChanged(self.drawing.pen().color),
        ])
    }

    /// Ends the session and releases the captured bitmaps.
    pub fn hide(&mut self) -> Vec<UiEvent> {
        if !self.active {
            return Vec::new();
        }

        self.active = false;
        self.ignore_focus = false;
        self.toolkit_visible = false;
        self.canvas = None;
        self.screens.clear();
        self.selection = Rect::default();
        self.area = AreaSelection::new();
        self.drawing.set_canvas(0, 0);
        self.effects.clear();
        self.colors.deactivate();

        info!("Session hidden");
        vec![
            UiEvent::ToolkitVisible(false),
            UiEvent::ColorMenuVisible(false),
            UiEvent::Hidden,
        ]
    }

    /// Window deactivation ends the session unless a modal dialog owns focus.
    pub fn focus_lost(&mut self) -> Vec<UiEvent> {
        if self.ignore_focus {
            debug!("Focus lost while a dialog is open, keeping session");
            return Vec::new();
        }
        self.hide()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn ignores_focus(&self) -> bool {
        self.ignore_focus
    }

    pub fn defaults(&self) -> &EditorDefaults {
        &self.defaults
    }

    pub fn canvas(&self) -> Option<&Rc<RgbaImage>> {
        self.canvas.as_ref()
    }

    /// The last committed selection, canvas-local.
    pub fn selection(&self) -> Rect {
        self.selection
    }

    pub fn area(&self) -> &AreaSelection {
        &self.area
    }

    pub fn drawing(&self) -> &DrawingEngine {
        &self.drawing
    }

    pub fn effects(&self) -> PostEffects {
        self.effects
    }

    pub fn colors(&self) -> &ColorMenu {
        &self.colors
    }

    pub fn is_toolkit_visible(&self) -> bool {
        self.toolkit_visible
    }

    /// Keeps handle hit-testing at a constant on-screen size.
    pub fn set_display_scale(&mut self, scale: f64) {
        if scale > 0.0 {
            self.area
                .set_handle_radius(self.defaults.handle_size / 2.0 / scale);
        }
    }

    pub fn toolkit_position(&self, size: (i32, i32), orientation: ToolkitOrientation) -> Point {
        align_toolkit(self.selection, &self.screens, size, orientation)
    }

    fn on_selection_event(&mut self, event: SelectionEvent) -> Vec<UiEvent> {
        match event {
            SelectionEvent::TransformStart => {
                let mut events = vec![UiEvent::ToolkitVisible(false)];
                if self.colors.deactivate() {
                    events.push(UiEvent::ColorMenuVisible(false));
                }
                self.toolkit_visible = false;
                events
            }
            SelectionEvent::TransformEnd(selection) => {
                self.selection = selection;
                self.toolkit_visible = !selection.is_empty();
                debug!(
                    "Selection committed: {:?} (desktop {:?})",
                    selection,
                    self.area.global_selection()
                );
                vec![UiEvent::ToolkitVisible(self.toolkit_visible)]
            }
        }
    }

    pub fn press(&mut self, p: Point) -> Result<Vec<UiEvent>> {
        if !self.active {
            return Ok(Vec::new());
        }

        let mut events = Vec::new();
        if self.colors.deactivate() {
            events.push(UiEvent::ColorMenuVisible(false));
        }

        if self.drawing.is_active() {
            self.drawing.press(p)?;
        } else {
            let event = self.area.press(p);
            events.extend(self.on_selection_event(event));
        }
        Ok(events)
    }

    pub fn drag(&mut self, p: Point, constrain: bool) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        if self.drawing.is_active() {
            self.drawing.drag(p)?;
        } else {
            self.area.drag(p, constrain);
        }
        Ok(())
    }

    pub fn release(&mut self, p: Point, constrain: bool) -> Result<Vec<UiEvent>> {
        if !self.active {
            return Ok(Vec::new());
        }

        if self.drawing.is_active() {
            self.drawing.release(p)?;
            return Ok(self
                .drawing
                .text_edit()
                .map(|edit| vec![UiEvent::TextEditOpened(edit.area())])
                .unwrap_or_default());
        }

        Ok(match self.area.release(p, constrain) {
            Some(event) => self.on_selection_event(event),
            None => Vec::new(),
        })
    }

    pub fn select_all(&mut self) -> Vec<UiEvent> {
        if !self.active {
            return Vec::new();
        }
        let event = self.area.set_selection(self.area.bounds());
        self.on_selection_event(event)
    }

    pub fn handle_command(&mut self, command: ToolkitCommand) -> Result<Vec<UiEvent>> {
        if !self.active {
            return Ok(Vec::new());
        }
        debug!("Toolkit command: {:?}", command);

        match command {
            ToolkitCommand::Cursor => {
                self.drawing.stop()?;
                Ok(vec![UiEvent::ToolChanged(ToolKind::Cursor)])
            }
            ToolkitCommand::SelectTool(tool) => {
                self.drawing.start(tool)?;
                Ok(vec![UiEvent::ToolChanged(tool)])
            }
            ToolkitCommand::Save => {
                // Commit an open text box so it lands in the output.
                self.drawing.stop()?;
                self.ignore_focus = true;
                Ok(vec![
                    UiEvent::ToolChanged(ToolKind::Cursor),
                    UiEvent::SaveRequested {
                        suggested_name: export::default_file_name(SystemTime::now()),
                    },
                ])
            }
            ToolkitCommand::Copy => Ok(self.copy()?),
            ToolkitCommand::Close => Ok(self.hide()),
            ToolkitCommand::Color(color) => {
                self.drawing.set_color(color)?;
                Ok(vec![
                    UiEvent::ColorMenuVisible(self.colors.is_active()),
                    UiEvent::ColorIconChanged(color),
                ])
            }
            ToolkitCommand::ColorMenu => {
                let visible = self.colors.toggle();
                Ok(vec![UiEvent::ColorMenuVisible(visible)])
            }
            ToolkitCommand::FlipHorizontal => {
                self.flip(FlipAxis::Horizontal)?;
                Ok(Vec::new())
            }
            ToolkitCommand::FlipVertical => {
                self.flip(FlipAxis::Vertical)?;
                Ok(Vec::new())
            }
        }
    }

    /// Picks a preset from the colour menu.
    pub fn pick_color(&mut self, index: usize) -> Result<Vec<UiEvent>> {
        match self.colors.select(index) {
            Some(color) => self.handle_command(ToolkitCommand::Color(color)),
            None => Ok(Vec::new()),
        }
    }

    fn flip(&mut self, axis: FlipAxis) -> Result<()> {
        self.effects.toggle_flip(axis);
        self.area.set_effects(self.effects)?;
        Ok(())
    }

    /// Escape closes the colour menu, then leaves the drawing tool, then
    /// ends the session.
    pub fn escape(&mut self) -> Result<Vec<UiEvent>> {
        if self.colors.deactivate() {
            return Ok(vec![UiEvent::ColorMenuVisible(false)]);
        }

        match self.drawing.escape()? {
            EscapeOutcome::TextClosed => Ok(Vec::new()),
            EscapeOutcome::ToolCleared => Ok(vec![UiEvent::ToolChanged(ToolKind::Cursor)]),
            EscapeOutcome::Ignored => Ok(self.hide()),
        }
    }

    pub fn undo(&mut self) -> bool {
        self.active && self.drawing.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.active && self.drawing.redo()
    }

    pub fn step_pen_width(&mut self, steps: i32) -> Result<()> {
        self.drawing.step_pen_width(steps)?;
        Ok(())
    }

    pub fn set_text(&mut self, content: &str) {
        self.drawing.set_text(content);
    }

    pub fn close_text_edit(&mut self) -> Result<bool> {
        Ok(self.drawing.close_text_edit()?)
    }

    pub fn final_image(&self) -> std::result::Result<RgbaImage, ExportError> {
        let canvas = self.canvas.as_ref().ok_or(ExportError::EmptySelection)?;
        export::final_image(canvas, self.selection, &self.effects, &self.drawing.flatten())
    }

    /// Copies the final image and ends the session. A failure keeps the
    /// session open.
    pub fn copy(&mut self) -> std::result::Result<Vec<UiEvent>, ClipboardError> {
        if let Err(e) = self.drawing.stop() {
            warn!("Failed to commit open text before copy: {}", e);
        }
        let image = self.final_image()?;
        self.clipboard.set_image(&image)?;
        Ok(self.hide())
    }

    /// Completes a save started by [`ToolkitCommand::Save`]. `None` means the
    /// dialog was cancelled and the session carries on.
    pub fn finish_save(
        &mut self,
        path: Option<&Path>,
    ) -> std::result::Result<Vec<UiEvent>, SaveError> {
        self.ignore_focus = false;

        let Some(path) = path else {
            debug!("Save cancelled");
            return Ok(Vec::new());
        };

        let image = self.final_image()?;
        self.saver.save(&image, path)?;
        Ok(self.hide())
    }
}
