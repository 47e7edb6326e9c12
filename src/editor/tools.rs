use gtk4::gdk::RGBA;

pub const MIN_PEN_WIDTH: f64 = 2.0;
pub const MAX_PEN_WIDTH: f64 = 50.0;
pub const PEN_WIDTH_STEP: f64 = 2.0;

/// The active annotation mode. `Cursor` hands pointer input back to the selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ToolKind {
    #[default]
    Cursor,
    Freehand,
    Line,
    Arrow,
    Rectangle,
    Ellipse,
    Text,
}

impl ToolKind {
    pub fn is_draw_tool(&self) -> bool {
        !matches!(self, ToolKind::Cursor)
    }

    /// Get the icon name for this tool
    pub fn icon_name(&self) -> &'static str {
        match self {
            ToolKind::Cursor => "input-mouse-symbolic",
            ToolKind::Freehand => "document-edit-symbolic",
            ToolKind::Line => "format-text-strikethrough-symbolic",
            ToolKind::Arrow => "go-next-symbolic",
            ToolKind::Rectangle => "media-playback-stop-symbolic",
            ToolKind::Ellipse => "media-record-symbolic",
            ToolKind::Text => "insert-text-symbolic",
        }
    }

    /// Get the tooltip text for this tool
    pub fn tooltip(&self) -> &'static str {
        match self {
            ToolKind::Cursor => "Cursor",
            ToolKind::Freehand => "Brush",
            ToolKind::Line => "Line",
            ToolKind::Arrow => "Arrow",
            ToolKind::Rectangle => "Rectangle",
            ToolKind::Ellipse => "Ellipse",
            ToolKind::Text => "Text",
        }
    }

    /// Toolkit order
    pub fn all() -> &'static [ToolKind] {
        &[
            ToolKind::Cursor,
            ToolKind::Freehand,
            ToolKind::Arrow,
            ToolKind::Line,
            ToolKind::Rectangle,
            ToolKind::Ellipse,
            ToolKind::Text,
        ]
    }

    /// Extra room around a shape's bounding box so wide strokes and
    /// arrowheads are not clipped by their bitmap.
    pub fn margin(&self, pen_width: f64) -> i32 {
        let margin = match self {
            ToolKind::Cursor | ToolKind::Text => 0.0,
            ToolKind::Arrow => pen_width * 3.25,
            ToolKind::Freehand | ToolKind::Line | ToolKind::Rectangle | ToolKind::Ellipse => {
                pen_width
            }
        };
        margin.ceil() as i32
    }
}

/// Appearance applied to the next stroke.
#[derive(Clone, Debug)]
pub struct Pen {
    pub color: RGBA,
    pub width: f64,
    pub font_size: f64,
}

impl Default for Pen {
    fn default() -> Self {
        Self {
            color: RGBA::new(1.0, 0.0, 0.0, 1.0),
            width: 4.0,
            font_size: 24.0,
        }
    }
}

impl Pen {
    pub fn set_width(&mut self, width: f64) {
        self.width = width.clamp(MIN_PEN_WIDTH, MAX_PEN_WIDTH);
    }

    pub fn set_font_size(&mut self, size: f64) {
        self.font_size = size.clamp(8.0, 200.0);
    }
}
