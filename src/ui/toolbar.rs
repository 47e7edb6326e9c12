use gtk4 as gtk;

use gtk::{Align, Orientation};
use gtk4::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

use crate::app::{Action, AppState};
use crate::editor::palette;
use crate::editor::tools::ToolKind;

pub struct ToolbarComponents {
    /// Tools, colour and flips; sits above the selection.
    pub horizontal_box: gtk::Box,
    /// Close, copy and save; sits left of the selection.
    pub vertical_box: gtk::Box,
    pub tool_buttons: Vec<(ToolKind, gtk::ToggleButton)>,
    pub color_button: gtk::ToggleButton,
    pub color_circle: gtk::DrawingArea,
    pub color_popover: gtk::Popover,
    pub swatch_buttons: Vec<gtk::Button>,
    pub flip_horizontal_btn: gtk::Button,
    pub flip_vertical_btn: gtk::Button,
    pub close_btn: gtk::Button,
    pub copy_btn: gtk::Button,
    pub save_btn: gtk::Button,
}

impl ToolbarComponents {
    pub fn tool_button(&self, tool: ToolKind) -> Option<&gtk::ToggleButton> {
        self.tool_buttons
            .iter()
            .find(|(kind, _)| *kind == tool)
            .map(|(_, btn)| btn)
    }
}

fn tooltip(state: &Rc<RefCell<AppState>>, action: Action) -> String {
    let shortcut = state.borrow().shortcuts.get_shortcut_label(action);
    if shortcut.is_empty() {
        action.label().to_string()
    } else {
        format!("{} ({})", action.label(), shortcut)
    }
}

fn toolkit_box(orientation: Orientation) -> gtk::Box {
    let bar = gtk::Box::builder()
        .orientation(orientation)
        .spacing(4)
        .halign(Align::Start)
        .valign(Align::Start)
        .visible(false)
        .build();
    bar.add_css_class("osd");
    bar.add_css_class("toolbar");
    bar
}

fn flat_button(icon: &str, tooltip: &str) -> gtk::Button {
    let btn = gtk::Button::builder()
        .icon_name(icon)
        .tooltip_text(tooltip)
        .build();
    btn.add_css_class("flat");
    btn
}

pub fn create_toolbar(state: &Rc<RefCell<AppState>>) -> ToolbarComponents {
    let horizontal_box = toolkit_box(Orientation::Horizontal);

    let mut tool_buttons: Vec<(ToolKind, gtk::ToggleButton)> = Vec::new();
    for tool in ToolKind::all() {
        let btn = gtk::ToggleButton::builder()
            .icon_name(tool.icon_name())
            .tooltip_text(tooltip(state, Action::Tool(*tool)))
            .active(*tool == ToolKind::Cursor)
            .build();
        btn.add_css_class("flat");
        if let Some((_, first)) = tool_buttons.first() {
            btn.set_group(Some(first));
        }
        horizontal_box.append(&btn);
        tool_buttons.push((*tool, btn));
    }

    let color_circle = create_color_circle(state);
    let color_button = gtk::ToggleButton::builder()
        .child(&color_circle)
        .tooltip_text("Pen Color")
        .build();
    color_button.add_css_class("flat");

    let (color_popover, swatch_buttons) = create_color_popover(state, &color_button);
    horizontal_box.append(&color_button);

    let flip_horizontal_btn = flat_button(
        "object-flip-horizontal-symbolic",
        &tooltip(state, Action::FlipHorizontal),
    );
    let flip_vertical_btn = flat_button(
        "object-flip-vertical-symbolic",
        &tooltip(state, Action::FlipVertical),
    );
    horizontal_box.append(&flip_horizontal_btn);
    horizontal_box.append(&flip_vertical_btn);

    let vertical_box = toolkit_box(Orientation::Vertical);

    let close_btn = flat_button("window-close-symbolic", &tooltip(state, Action::Cancel));
    let copy_btn = flat_button(
        "edit-copy-symbolic",
        &tooltip(state, Action::Copy),
    );
    let save_btn = gtk::Button::builder()
        .icon_name("document-save-symbolic")
        .tooltip_text(tooltip(state, Action::Save))
        .build();
    save_btn.add_css_class("suggested-action");

    vertical_box.append(&close_btn);
    vertical_box.append(&copy_btn);
    vertical_box.append(&save_btn);

    ToolbarComponents {
        horizontal_box,
        vertical_box,
        tool_buttons,
        color_button,
        color_circle,
        color_popover,
        swatch_buttons,
        flip_horizontal_btn,
        flip_vertical_btn,
        close_btn,
        copy_btn,
        save_btn,
    }
}

fn draw_swatch(cr: &gtk::cairo::Context, width: i32, height: i32, color: &gtk::gdk::RGBA) {
    cr.arc(
        width as f64 / 2.0,
        height as f64 / 2.0,
        (width.min(height) as f64 / 2.0) - 2.0,
        0.0,
        2.0 * std::f64::consts::PI,
    );
    cr.set_source_rgba(
        color.red() as f64,
        color.green() as f64,
        color.blue() as f64,
        color.alpha() as f64,
    );
    let _ = cr.fill_preserve();
    cr.set_source_rgb(0.0, 0.0, 0.0);
    cr.set_line_width(1.0);
    let _ = cr.stroke();
}

fn create_color_circle(state: &Rc<RefCell<AppState>>) -> gtk::DrawingArea {
    let color_circle = gtk::DrawingArea::builder()
        .width_request(20)
        .height_request(20)
        .build();

    color_circle.set_draw_func({
        let state = state.clone();
        move |_, cr, width, height| {
            let color = state.borrow().session.drawing().pen().color;
            draw_swatch(cr, width, height, &color);
        }
    });

    color_circle
}

fn create_color_popover(
    state: &Rc<RefCell<AppState>>,
    parent: &gtk::ToggleButton,
) -> (gtk::Popover, Vec<gtk::Button>) {
    let grid = gtk::Grid::builder()
        .row_spacing(4)
        .column_spacing(4)
        .margin_top(6)
        .margin_bottom(6)
        .margin_start(6)
        .margin_end(6)
        .build();

    let colors = state.borrow().session.colors().colors().to_vec();
    let mut swatch_buttons = Vec::with_capacity(colors.len());

    for (index, color) in colors.into_iter().enumerate() {
        let swatch = gtk::DrawingArea::builder()
            .width_request(24)
            .height_request(24)
            .build();
        swatch.set_draw_func({
            let state = state.clone();
            move |_, cr, width, height| {
                draw_swatch(cr, width, height, &color);
                if state.borrow().session.colors().current_index() == index {
                    cr.arc(
                        width as f64 / 2.0,
                        height as f64 / 2.0,
                        width.min(height) as f64 / 2.0 - 0.5,
                        0.0,
                        2.0 * std::f64::consts::PI,
                    );
                    cr.set_source_rgb(1.0, 1.0, 1.0);
                    cr.set_line_width(1.0);
                    let _ = cr.stroke();
                }
            }
        });

        let btn = gtk::Button::builder()
            .child(&swatch)
            .tooltip_text(palette::to_hex(&color))
            .build();
        btn.add_css_class("flat");

        grid.attach(&btn, (index % 4) as i32, (index / 4) as i32, 1, 1);
        swatch_buttons.push(btn);
    }

    let popover = gtk::Popover::builder()
        .child(&grid)
        .autohide(false)
        .has_arrow(true)
        .build();
    popover.set_parent(parent);

    (popover, swatch_buttons)
}
