//! Interactive selection region: drag-to-create, move and resize by handle.
//!
//! All coordinates are canvas-local. The live rectangle may be unnormalized
//! while a transform is running; it is normalized and clamped on release.
//! After every accepted change each of its four corners lies on some
//! display, so the region never drifts into the dead space between
//! differently sized monitors.

use std::rc::Rc;

use image::imageops;
use image::RgbaImage;
use log::{debug, error};

use super::effects::PostEffects;
use crate::error::EffectsError;
use crate::geometry::{closest_point_on_line, is_point_on_any, Point, Rect};

/// Distance the handle markers sit outside the border.
pub const HANDLE_OFFSET: i32 = 2;
pub const HANDLE_SIZE: f64 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Handle {
    TopLeft,
    Top,
    TopRight,
    CenterLeft,
    CenterRight,
    BottomLeft,
    Bottom,
    BottomRight,
}

impl Handle {
    pub fn all() -> [Handle; 8] {
        [
            Handle::TopLeft,
            Handle::Top,
            Handle::TopRight,
            Handle::CenterLeft,
            Handle::CenterRight,
            Handle::BottomLeft,
            Handle::Bottom,
            Handle::BottomRight,
        ]
    }

    fn is_corner(&self) -> bool {
        matches!(
            self,
            Handle::TopLeft | Handle::TopRight | Handle::BottomLeft | Handle::BottomRight
        )
    }

    /// The point on the border this handle drags.
    fn anchor_point(&self, rect: Rect) -> Point {
        let (l, t, r, b) = (rect.left(), rect.top(), rect.right(), rect.bottom());
        let (cx, cy) = ((l + r) / 2, (t + b) / 2);
        match self {
            Handle::TopLeft => Point::new(l, t),
            Handle::Top => Point::new(cx, t),
            Handle::TopRight => Point::new(r, t),
            Handle::CenterLeft => Point::new(l, cy),
            Handle::CenterRight => Point::new(r, cy),
            Handle::BottomLeft => Point::new(l, b),
            Handle::Bottom => Point::new(cx, b),
            Handle::BottomRight => Point::new(r, b),
        }
    }

    /// Where the marker is drawn: the border point pushed outwards.
    pub fn marker(&self, rect: Rect) -> Point {
        let r = rect.normalized();
        let p = self.anchor_point(r);
        let o = HANDLE_OFFSET;
        let (dx, dy) = match self {
            Handle::TopLeft => (-o, -o),
            Handle::Top => (0, -o),
            Handle::TopRight => (o, -o),
            Handle::CenterLeft => (-o, 0),
            Handle::CenterRight => (o, 0),
            Handle::BottomLeft => (-o, o),
            Handle::Bottom => (0, o),
            Handle::BottomRight => (o, o),
        };
        Point::new(p.x + dx, p.y + dy)
    }

    fn opposite(&self) -> Handle {
        match self {
            Handle::TopLeft => Handle::BottomRight,
            Handle::Top => Handle::Bottom,
            Handle::TopRight => Handle::BottomLeft,
            Handle::CenterLeft => Handle::CenterRight,
            Handle::CenterRight => Handle::CenterLeft,
            Handle::BottomLeft => Handle::TopRight,
            Handle::Bottom => Handle::Top,
            Handle::BottomRight => Handle::TopLeft,
        }
    }

    /// Moves the edges this handle owns to `p`.
    fn apply(&self, rect: &mut Rect, p: Point) {
        match self {
            Handle::TopLeft => {
                rect.set_left(p.x);
                rect.set_top(p.y);
            }
            Handle::Top => rect.set_top(p.y),
            Handle::TopRight => {
                rect.set_right(p.x);
                rect.set_top(p.y);
            }
            Handle::CenterLeft => rect.set_left(p.x),
            Handle::CenterRight => rect.set_right(p.x),
            Handle::BottomLeft => {
                rect.set_left(p.x);
                rect.set_bottom(p.y);
            }
            Handle::Bottom => rect.set_bottom(p.y),
            Handle::BottomRight => {
                rect.set_right(p.x);
                rect.set_bottom(p.y);
            }
        }
    }
}

/// Resizes `anchor` by dragging `handle` to `p`.
///
/// With `constrain` the opposite side mirrors the dragged one about the
/// centre; corners additionally keep the aspect ratio by snapping to the
/// diagonal through both corners.
fn resize(anchor: Rect, handle: Handle, p: Point, constrain: bool) -> Rect {
    if !constrain {
        let mut rect = anchor;
        handle.apply(&mut rect, p);
        return rect;
    }

    let sum_x = anchor.left() + anchor.right();
    let sum_y = anchor.top() + anchor.bottom();

    if handle.is_corner() {
        if anchor.width == 0 || anchor.height == 0 {
            // No diagonal to follow yet; grow from the press point outward.
            let c = anchor.center();
            return Rect::from_corners(Point::new(2 * c.x - p.x, 2 * c.y - p.y), p);
        }
        let q = closest_point_on_line(
            handle.opposite().anchor_point(anchor),
            handle.anchor_point(anchor),
            p,
        );
        let mirrored = Point::new(sum_x - q.x, sum_y - q.y);
        return Rect::from_corners(mirrored, q);
    }

    let mut rect = anchor;
    match handle {
        Handle::Top | Handle::Bottom => {
            rect.y = p.y.min(sum_y - p.y);
            rect.height = (sum_y - 2 * p.y).abs();
        }
        _ => {
            rect.x = p.x.min(sum_x - p.x);
            rect.width = (sum_x - 2 * p.x).abs();
        }
    }
    rect
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Transform {
    Idle,
    Moving { grab: Point },
    Resizing { handle: Handle, anchor: Rect },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionEvent {
    TransformStart,
    TransformEnd(Rect),
}

#[derive(Clone, Debug)]
pub struct AreaSelection {
    canvas: Option<Rc<RgbaImage>>,
    origin: Point,
    screens: Vec<Rect>,
    bounds: Rect,
    selection: Rect,
    transform: Transform,
    effects: PostEffects,
    preview: Option<RgbaImage>,
    pointer: Point,
    handle_radius: f64,
}

impl Default for AreaSelection {
    fn default() -> Self {
        Self {
            canvas: None,
            origin: Point::default(),
            screens: Vec::new(),
            bounds: Rect::default(),
            selection: Rect::default(),
            transform: Transform::Idle,
            effects: PostEffects::default(),
            preview: None,
            pointer: Point::default(),
            handle_radius: HANDLE_SIZE / 2.0,
        }
    }
}

impl AreaSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a new session. `screens` are display rectangles in canvas-local
    /// coordinates; `origin` is the canvas top-left on the virtual desktop.
    pub fn start(&mut self, canvas: Rc<RgbaImage>, origin: Point, screens: Vec<Rect>) {
        self.bounds = Rect::from_size(canvas.width(), canvas.height());
        self.screens = if screens.is_empty() {
            vec![self.bounds]
        } else {
            screens
        };
        self.canvas = Some(canvas);
        self.origin = origin;
        self.selection = Rect::default();
        self.transform = Transform::Idle;
        self.effects = PostEffects::default();
        self.preview = None;
        debug!(
            "Selection started on {}x{} canvas with {} screen(s)",
            self.bounds.width,
            self.bounds.height,
            self.screens.len()
        );
    }

    pub fn selection(&self) -> Rect {
        self.selection
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// The selection in virtual-desktop coordinates.
    pub fn global_selection(&self) -> Rect {
        self.selection.normalized().translated(self.origin)
    }

    pub fn pointer(&self) -> Point {
        self.pointer
    }

    pub fn is_transforming(&self) -> bool {
        self.transform != Transform::Idle
    }

    /// Hit radius for handles, in canvas pixels.
    pub fn set_handle_radius(&mut self, radius: f64) {
        self.handle_radius = radius.max(1.0);
    }

    pub fn handles(&self) -> [(Handle, Point); 8] {
        Handle::all().map(|h| (h, h.marker(self.selection)))
    }

    pub fn handle_at(&self, p: Point) -> Option<Handle> {
        if self.selection.normalized().is_empty() {
            return None;
        }
        self.handles().into_iter().find_map(|(handle, marker)| {
            let dx = (p.x - marker.x) as f64;
            let dy = (p.y - marker.y) as f64;
            (dx.hypot(dy) <= self.handle_radius).then_some(handle)
        })
    }

    pub fn dimension_label(&self) -> String {
        format!(
            "{}x{}",
            self.selection.width.abs(),
            self.selection.height.abs()
        )
    }

    pub fn preview(&self) -> Option<&RgbaImage> {
        self.preview.as_ref()
    }

    pub fn set_effects(&mut self, effects: PostEffects) -> Result<(), EffectsError> {
        self.effects = effects;
        self.refresh_preview()
    }

    pub fn press(&mut self, p: Point) -> SelectionEvent {
        let p = self.clamp_to_bounds(p);
        self.pointer = p;
        let current = self.selection.normalized();

        self.transform = if let Some(handle) = self.handle_at(p) {
            self.selection = current;
            Transform::Resizing {
                handle,
                anchor: current,
            }
        } else if !current.is_empty() && current.contains(p) {
            self.selection = current;
            Transform::Moving {
                grab: p - current.top_left(),
            }
        } else {
            let start = self.nearest_on_screen(p);
            let fresh = Rect::new(start.x, start.y, 0, 0);
            self.selection = fresh;
            Transform::Resizing {
                handle: Handle::BottomRight,
                anchor: fresh,
            }
        };

        debug!("Selection transform started: {:?}", self.transform);
        self.refresh();
        SelectionEvent::TransformStart
    }

    pub fn drag(&mut self, p: Point, constrain: bool) {
        let p = self.clamp_to_bounds(p);
        self.pointer = p;

        match self.transform {
            Transform::Idle => return,
            Transform::Moving { grab } => {
                let size = self.selection.normalized();
                let moved = Rect::new(p.x - grab.x, p.y - grab.y, size.width, size.height);
                if self.is_on_screen(&moved) {
                    self.selection = moved;
                } else {
                    let clamped = self.clamp_inside(moved);
                    if self.is_on_screen(&clamped) {
                        self.selection = clamped;
                    }
                }
            }
            Transform::Resizing { handle, anchor } => {
                let resized = resize(anchor, handle, p, constrain);
                if self.is_on_screen(&resized) {
                    self.selection = resized;
                }
            }
        }

        self.refresh();
    }

    pub fn release(&mut self, p: Point, constrain: bool) -> Option<SelectionEvent> {
        if self.transform == Transform::Idle {
            return None;
        }
        self.drag(p, constrain);

        let normalized = self.selection.normalized();
        self.selection = normalized
            .intersection(&self.bounds)
            .unwrap_or(Rect::new(normalized.x, normalized.y, 0, 0));
        self.transform = Transform::Idle;
        self.refresh();

        debug!("Selection transform ended at {:?}", self.selection);
        Some(SelectionEvent::TransformEnd(self.selection))
    }

    /// Direct entry, e.g. select-all. Only bounded by the canvas, not by
    /// the per-display corner test.
    pub fn set_selection(&mut self, rect: Rect) -> SelectionEvent {
        let normalized = rect.normalized();
        self.selection = normalized
            .intersection(&self.bounds)
            .unwrap_or(Rect::new(normalized.x, normalized.y, 0, 0));
        self.transform = Transform::Idle;
        self.refresh();
        SelectionEvent::TransformEnd(self.selection)
    }

    fn clamp_to_bounds(&self, p: Point) -> Point {
        Point::new(
            p.x.clamp(self.bounds.left(), self.bounds.right()),
            p.y.clamp(self.bounds.top(), self.bounds.bottom()),
        )
    }

    fn clamp_inside(&self, rect: Rect) -> Rect {
        let r = rect.normalized();
        let max_x = (self.bounds.right() - r.width).max(self.bounds.left());
        let max_y = (self.bounds.bottom() - r.height).max(self.bounds.top());
        Rect::new(
            r.x.clamp(self.bounds.left(), max_x),
            r.y.clamp(self.bounds.top(), max_y),
            r.width,
            r.height,
        )
    }

    /// `p` itself when it lies on a display, else the closest display pixel.
    fn nearest_on_screen(&self, p: Point) -> Point {
        if is_point_on_any(p, &self.screens) {
            return p;
        }
        self.screens
            .iter()
            .map(Rect::normalized)
            .filter(|screen| !screen.is_empty())
            .map(|screen| {
                Point::new(
                    p.x.clamp(screen.left(), screen.right() - 1),
                    p.y.clamp(screen.top(), screen.bottom() - 1),
                )
            })
            .min_by_key(|q| {
                let d = *q - p;
                (d.x as i64).pow(2) + (d.y as i64).pow(2)
            })
            .unwrap_or(p)
    }

    fn is_on_screen(&self, rect: &Rect) -> bool {
        rect.corner_pixels()
            .iter()
            .all(|corner| is_point_on_any(*corner, &self.screens))
    }

    fn refresh(&mut self) {
        if let Err(e) = self.refresh_preview() {
            error!("Selection preview failed: {}", e);
        }
    }

    fn refresh_preview(&mut self) -> Result<(), EffectsError> {
        let Some(canvas) = self.canvas.as_ref() else {
            self.preview = None;
            return Ok(());
        };

        self.preview = match self.selection.normalized().intersection(&self.bounds) {
            Some(area) => {
                let crop = imageops::crop_imm(
                    &**canvas,
                    area.x as u32,
                    area.y as u32,
                    area.width as u32,
                    area.height as u32,
                )
                .to_image();
                Some(self.effects.apply(&crop)?)
            }
            None => None,
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::effects::FlipAxis;
    use image::Rgba;

    fn canvas(width: u32, height: u32) -> Rc<RgbaImage> {
        Rc::new(RgbaImage::from_fn(width, height, |x, y| {
            Rgba([x as u8, y as u8, 0, 255])
        }))
    }

    fn single_screen() -> AreaSelection {
        let mut selection = AreaSelection::new();
        selection.start(canvas(200, 200), Point::new(0, 0), vec![Rect::new(0, 0, 200, 200)]);
        selection
    }

    /// 100x100 screen beside a 100x50 one; the lower right quarter is dead space.
    fn uneven_screens() -> AreaSelection {
        let mut selection = AreaSelection::new();
        selection.start(
            canvas(200, 100),
            Point::new(0, 0),
            vec![Rect::new(0, 0, 100, 100), Rect::new(100, 0, 100, 50)],
        );
        selection
    }

    fn select(selection: &mut AreaSelection, from: Point, to: Point) -> Option<SelectionEvent> {
        selection.press(from);
        selection.drag(to, false);
        selection.release(to, false)
    }

    #[test]
    fn test_drag_up_left_creates_normalized_selection() {
        let mut selection = single_screen();
        assert_eq!(
            selection.press(Point::new(100, 100)),
            SelectionEvent::TransformStart
        );
        selection.drag(Point::new(50, 50), false);
        assert_eq!(selection.dimension_label(), "50x50");
        assert!(!selection.selection().is_normalized());

        let event = selection.release(Point::new(50, 50), false);
        assert_eq!(
            event,
            Some(SelectionEvent::TransformEnd(Rect::new(50, 50, 50, 50)))
        );
        assert!(!selection.is_transforming());
    }

    #[test]
    fn test_move_by_body() {
        let mut selection = single_screen();
        select(&mut selection, Point::new(10, 10), Point::new(30, 30));

        selection.press(Point::new(20, 20));
        selection.drag(Point::new(40, 50), false);
        let event = selection.release(Point::new(40, 50), false);

        assert_eq!(
            event,
            Some(SelectionEvent::TransformEnd(Rect::new(30, 40, 20, 20)))
        );
    }

    #[test]
    fn test_move_is_clamped_to_canvas_edge() {
        let mut selection = single_screen();
        select(&mut selection, Point::new(10, 10), Point::new(30, 30));

        selection.press(Point::new(20, 20));
        selection.drag(Point::new(5, 20), false);

        assert_eq!(selection.selection(), Rect::new(0, 10, 20, 20));
    }

    #[test]
    fn test_move_into_dead_space_keeps_last_valid() {
        let mut selection = uneven_screens();
        select(&mut selection, Point::new(10, 10), Point::new(30, 30));

        selection.press(Point::new(20, 20));
        selection.drag(Point::new(60, 60), false);
        assert_eq!(selection.selection(), Rect::new(50, 50, 20, 20));

        selection.drag(Point::new(160, 80), false);
        assert_eq!(selection.selection(), Rect::new(50, 50, 20, 20));

        selection.drag(Point::new(160, 20), false);
        assert_eq!(selection.selection(), Rect::new(150, 10, 20, 20));
    }

    #[test]
    fn test_resize_into_dead_space_is_rejected() {
        let mut selection = uneven_screens();
        select(&mut selection, Point::new(10, 10), Point::new(90, 40));

        selection.press(Handle::BottomRight.marker(selection.selection()));
        selection.drag(Point::new(150, 45), false);
        assert_eq!(selection.selection(), Rect::new(10, 10, 140, 35));

        selection.drag(Point::new(150, 90), false);
        assert_eq!(selection.selection(), Rect::new(10, 10, 140, 35));
    }

    #[test]
    fn test_corner_handle_moves_two_edges() {
        let mut selection = single_screen();
        selection.set_selection(Rect::new(50, 50, 100, 100));

        selection.press(Point::new(48, 48));
        selection.drag(Point::new(30, 40), false);
        selection.release(Point::new(30, 40), false);

        assert_eq!(selection.selection(), Rect::new(30, 40, 120, 110));
    }

    #[test]
    fn test_edge_handle_moves_one_edge() {
        let mut selection = single_screen();
        selection.set_selection(Rect::new(50, 50, 100, 100));

        selection.press(Handle::Bottom.marker(selection.selection()));
        selection.drag(Point::new(0, 170), false);

        assert_eq!(selection.selection(), Rect::new(50, 50, 100, 120));
    }

    #[test]
    fn test_constrained_corner_resize_is_symmetric_and_proportional() {
        let mut selection = single_screen();
        selection.set_selection(Rect::new(50, 50, 100, 100));

        selection.press(Handle::BottomRight.marker(selection.selection()));
        selection.drag(Point::new(170, 180), true);

        assert_eq!(selection.selection().normalized(), Rect::new(25, 25, 150, 150));
    }

    #[test]
    fn test_constrained_edge_resize_mirrors_opposite_edge() {
        let mut selection = single_screen();
        selection.set_selection(Rect::new(50, 50, 100, 100));

        selection.press(Handle::CenterRight.marker(selection.selection()));
        selection.drag(Point::new(160, 0), true);

        assert_eq!(selection.selection(), Rect::new(40, 50, 120, 100));
    }

    #[test]
    fn test_constrained_drag_creates_selection_around_press_point() {
        let mut selection = single_screen();

        selection.press(Point::new(100, 100));
        selection.drag(Point::new(140, 130), true);
        assert!(!selection.selection().normalized().is_empty());

        let event = selection.release(Point::new(140, 130), true);
        assert_eq!(
            event,
            Some(SelectionEvent::TransformEnd(Rect::new(60, 70, 80, 60)))
        );
    }

    #[test]
    fn test_press_in_dead_space_starts_on_nearest_display() {
        let mut selection = uneven_screens();

        select(&mut selection, Point::new(150, 80), Point::new(120, 20));

        assert_eq!(selection.selection(), Rect::new(120, 20, 30, 29));
    }

    #[test]
    fn test_press_outside_starts_new_selection() {
        let mut selection = single_screen();
        selection.set_selection(Rect::new(10, 10, 20, 20));

        select(&mut selection, Point::new(100, 100), Point::new(120, 130));

        assert_eq!(selection.selection(), Rect::new(100, 100, 20, 30));
    }

    #[test]
    fn test_pointer_outside_canvas_is_clamped() {
        let mut selection = single_screen();
        select(&mut selection, Point::new(150, 150), Point::new(900, -40));

        assert_eq!(selection.selection(), Rect::new(150, 0, 50, 150));
    }

    #[test]
    fn test_handles_sit_outside_border() {
        let mut selection = single_screen();
        selection.set_selection(Rect::new(50, 50, 100, 100));
        let rect = selection.selection();

        for (handle, marker) in selection.handles() {
            assert!(!rect.contains(marker));
            assert_eq!(selection.handle_at(marker), Some(handle));
        }
    }

    #[test]
    fn test_preview_follows_selection_and_effects() {
        let mut selection = single_screen();
        selection.set_selection(Rect::new(10, 20, 5, 4));

        let preview = selection.preview().unwrap();
        assert_eq!(preview.dimensions(), (5, 4));
        assert_eq!(preview.get_pixel(0, 0).0, [10, 20, 0, 255]);

        let mut effects = PostEffects::new();
        effects.toggle_flip(FlipAxis::Horizontal);
        selection.set_effects(effects).unwrap();
        assert_eq!(selection.preview().unwrap().get_pixel(0, 0).0, [14, 20, 0, 255]);
    }

    #[test]
    fn test_global_selection_adds_origin() {
        let mut selection = AreaSelection::new();
        selection.start(canvas(100, 100), Point::new(-50, 10), Vec::new());
        selection.set_selection(Rect::new(5, 5, 10, 10));

        assert_eq!(selection.global_selection(), Rect::new(-45, 15, 10, 10));
    }
}
