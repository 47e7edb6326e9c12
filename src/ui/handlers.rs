use gtk4 as gtk;
use libadwaita as adw;
use log::{debug, error, info};

use gtk::{gdk, glib, EventControllerKey, EventControllerScroll, GestureDrag};
use gtk4::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::app::{Action, AppState, ToolkitCommand, ToolkitOrientation, UiEvent};
use crate::capture::XcapSource;
use crate::editor::tools::ToolKind;
use crate::geometry::Point;
use crate::ui::dialogs::{self, TextPopoverComponents};
use crate::ui::drawing::DrawingComponents;
use crate::ui::toolbar::ToolbarComponents;

pub struct UiComponents {
    pub window: adw::ApplicationWindow,
    pub toolbar: ToolbarComponents,
    pub drawing: DrawingComponents,
    pub text_popover: TextPopoverComponents,
}

/// Applies session events to the widgets in order. Must be called with the
/// state borrow released, since widget signals may re-enter the handlers.
pub fn apply_events(state: &Rc<RefCell<AppState>>, ui: &Rc<UiComponents>, events: Vec<UiEvent>) {
    for event in events {
        match event {
            UiEvent::ToolkitVisible(true) => {
                place_toolkit(state, ui);
                ui.toolbar.horizontal_box.set_visible(true);
                ui.toolbar.vertical_box.set_visible(true);
            }
            UiEvent::ToolkitVisible(false) => {
                ui.toolbar.horizontal_box.set_visible(false);
                ui.toolbar.vertical_box.set_visible(false);
            }
            UiEvent::ColorIconChanged(_) => ui.toolbar.color_circle.queue_draw(),
            UiEvent::ColorMenuVisible(visible) => {
                if visible {
                    ui.toolbar.color_popover.popup();
                } else {
                    ui.toolbar.color_popover.popdown();
                }
                if ui.toolbar.color_button.is_active() != visible {
                    ui.toolbar.color_button.set_active(visible);
                }
            }
            UiEvent::ToolChanged(tool) => {
                if let Some(btn) = ui.toolbar.tool_button(tool) {
                    if !btn.is_active() {
                        btn.set_active(true);
                    }
                }
            }
            UiEvent::TextEditOpened(rect) => {
                let view = state.borrow().view;
                let (x, y, w, h) = view.rect_to_display(rect);
                dialogs::show_text_popover(ui, x, y, w, h);
            }
            UiEvent::SaveRequested { suggested_name } => {
                dialogs::show_save_dialog(state, ui, suggested_name);
            }
            UiEvent::Hidden => {
                ui.text_popover.text_popover.popdown();
                state.borrow_mut().refresh_canvas_surface();
                ui.window.set_visible(false);
            }
        }
    }
    ui.drawing.drawing_area.queue_draw();
}

fn place_toolkit(state: &Rc<RefCell<AppState>>, ui: &UiComponents) {
    let s = state.borrow();
    let view = s.view;

    for (bar, orientation) in [
        (&ui.toolbar.horizontal_box, ToolkitOrientation::Horizontal),
        (&ui.toolbar.vertical_box, ToolkitOrientation::Vertical),
    ] {
        let (_, natural) = bar.preferred_size();
        let size = (
            (natural.width() as f64 / view.scale).ceil() as i32,
            (natural.height() as f64 / view.scale).ceil() as i32,
        );
        let (x, y) = view.canvas_to_display(s.session.toolkit_position(size, orientation));
        bar.set_margin_start(x.max(0.0) as i32);
        bar.set_margin_top(y.max(0.0) as i32);
    }
}

fn run_command(state: &Rc<RefCell<AppState>>, ui: &Rc<UiComponents>, command: ToolkitCommand) {
    let result = state.borrow_mut().session.handle_command(command);
    match result {
        Ok(events) => apply_events(state, ui, events),
        Err(e) => error!("{:?} failed: {}", command, e),
    }
}

fn sync_text_popover(state: &Rc<RefCell<AppState>>, ui: &UiComponents) {
    let editing = state.borrow().session.drawing().is_editing_text();
    if !editing && ui.text_popover.text_popover.is_visible() {
        ui.text_popover.text_popover.popdown();
    }
}

fn beep(ui: &UiComponents) {
    WidgetExt::display(&ui.window).beep();
}

pub fn connect_drag_handlers(state: &Rc<RefCell<AppState>>, ui: &Rc<UiComponents>) {
    debug!("Connecting drag handlers");
    let drag = GestureDrag::new();
    drag.set_button(gdk::BUTTON_PRIMARY);

    drag.connect_drag_begin({
        let state = state.clone();
        let ui = ui.clone();
        move |_, x, y| {
            let result = {
                let mut s = state.borrow_mut();
                let p = s.view.display_to_canvas(x, y);
                s.session.press(p)
            };
            match result {
                Ok(events) => apply_events(&state, &ui, events),
                Err(e) => error!("Press failed: {}", e),
            }
            sync_text_popover(&state, &ui);
        }
    });

    drag.connect_drag_update({
        let state = state.clone();
        let ui = ui.clone();
        move |gesture, offset_x, offset_y| {
            let Some((start_x, start_y)) = gesture.start_point() else {
                return;
            };
            let constrain = gesture
                .current_event_state()
                .contains(gdk::ModifierType::SHIFT_MASK);
            let mut s = state.borrow_mut();
            let p = s.view.display_to_canvas(start_x + offset_x, start_y + offset_y);
            if let Err(e) = s.session.drag(p, constrain) {
                error!("Drag failed: {}", e);
            }
            drop(s);
            ui.drawing.drawing_area.queue_draw();
        }
    });

    drag.connect_drag_end({
        let state = state.clone();
        let ui = ui.clone();
        move |gesture, offset_x, offset_y| {
            let Some((start_x, start_y)) = gesture.start_point() else {
                return;
            };
            let constrain = gesture
                .current_event_state()
                .contains(gdk::ModifierType::SHIFT_MASK);
            let result = {
                let mut s = state.borrow_mut();
                let p = s.view.display_to_canvas(start_x + offset_x, start_y + offset_y);
                s.session.release(p, constrain)
            };
            match result {
                Ok(events) => apply_events(&state, &ui, events),
                Err(e) => error!("Release failed: {}", e),
            }
        }
    });

    ui.drawing.drawing_area.add_controller(drag);
}

pub fn connect_scroll_handler(state: &Rc<RefCell<AppState>>, ui: &Rc<UiComponents>) {
    let scroll = EventControllerScroll::new(gtk::EventControllerScrollFlags::VERTICAL);

    scroll.connect_scroll({
        let state = state.clone();
        let ui = ui.clone();
        move |_, _, dy| {
            let mut s = state.borrow_mut();
            if !s.session.drawing().is_active() {
                return glib::Propagation::Proceed;
            }
            let steps = if dy < 0.0 { 1 } else { -1 };
            if let Err(e) = s.session.step_pen_width(steps) {
                error!("Failed to change pen width: {}", e);
            }
            drop(s);
            ui.drawing.drawing_area.queue_draw();
            glib::Propagation::Stop
        }
    });

    ui.drawing.drawing_area.add_controller(scroll);
}

pub fn connect_key_handler(state: &Rc<RefCell<AppState>>, ui: &Rc<UiComponents>) {
    let keys = EventControllerKey::new();
    keys.set_propagation_phase(gtk::PropagationPhase::Capture);

    keys.connect_key_pressed({
        let state = state.clone();
        let ui = ui.clone();
        move |_, key, _, modifiers| {
            let action = state.borrow().shortcuts.get_action(key, modifiers);
            let Some(action) = action else {
                return glib::Propagation::Proceed;
            };

            // Typing into the text box must not switch tools.
            if ui.text_popover.text_popover.is_visible() && action != Action::Cancel {
                return glib::Propagation::Proceed;
            }

            handle_action(&state, &ui, action);
            glib::Propagation::Stop
        }
    });

    ui.window.add_controller(keys);
}

fn handle_action(state: &Rc<RefCell<AppState>>, ui: &Rc<UiComponents>, action: Action) {
    debug!("Shortcut action: {:?}", action);
    match action {
        Action::Copy => run_command(state, ui, ToolkitCommand::Copy),
        Action::Save => run_command(state, ui, ToolkitCommand::Save),
        Action::Undo => {
            let undone = state.borrow_mut().session.undo();
            if !undone {
                beep(ui);
            }
            ui.drawing.drawing_area.queue_draw();
        }
        Action::Redo => {
            let redone = state.borrow_mut().session.redo();
            if !redone {
                beep(ui);
            }
            ui.drawing.drawing_area.queue_draw();
        }
        Action::SelectAll => {
            let events = state.borrow_mut().session.select_all();
            apply_events(state, ui, events);
        }
        Action::Cancel => {
            let result = state.borrow_mut().session.escape();
            match result {
                Ok(events) => apply_events(state, ui, events),
                Err(e) => error!("Escape failed: {}", e),
            }
            sync_text_popover(state, ui);
        }
        Action::Tool(ToolKind::Cursor) => run_command(state, ui, ToolkitCommand::Cursor),
        Action::Tool(tool) => run_command(state, ui, ToolkitCommand::SelectTool(tool)),
        Action::FlipHorizontal => run_command(state, ui, ToolkitCommand::FlipHorizontal),
        Action::FlipVertical => run_command(state, ui, ToolkitCommand::FlipVertical),
        Action::PenWidthDown | Action::PenWidthUp => {
            let steps = if action == Action::PenWidthUp { 1 } else { -1 };
            if let Err(e) = state.borrow_mut().session.step_pen_width(steps) {
                error!("Failed to change pen width: {}", e);
            }
            ui.drawing.drawing_area.queue_draw();
        }
    }
}

pub fn connect_toolkit_handlers(state: &Rc<RefCell<AppState>>, ui: &Rc<UiComponents>) {
    for (tool, btn) in &ui.toolbar.tool_buttons {
        let tool = *tool;
        btn.connect_toggled({
            let state = state.clone();
            let ui = ui.clone();
            move |btn| {
                if !btn.is_active() {
                    return;
                }
                let command = match tool {
                    ToolKind::Cursor => ToolkitCommand::Cursor,
                    other => ToolkitCommand::SelectTool(other),
                };
                run_command(&state, &ui, command);
            }
        });
    }

    ui.toolbar.color_button.connect_clicked({
        let state = state.clone();
        let ui = ui.clone();
        move |_| run_command(&state, &ui, ToolkitCommand::ColorMenu)
    });

    for (index, btn) in ui.toolbar.swatch_buttons.iter().enumerate() {
        btn.connect_clicked({
            let state = state.clone();
            let ui = ui.clone();
            move |_| {
                let result = state.borrow_mut().session.pick_color(index);
                match result {
                    Ok(events) => apply_events(&state, &ui, events),
                    Err(e) => error!("Failed to set color: {}", e),
                }
            }
        });
    }

    for (btn, command) in [
        (&ui.toolbar.flip_horizontal_btn, ToolkitCommand::FlipHorizontal),
        (&ui.toolbar.flip_vertical_btn, ToolkitCommand::FlipVertical),
        (&ui.toolbar.close_btn, ToolkitCommand::Close),
        (&ui.toolbar.copy_btn, ToolkitCommand::Copy),
        (&ui.toolbar.save_btn, ToolkitCommand::Save),
    ] {
        btn.connect_clicked({
            let state = state.clone();
            let ui = ui.clone();
            move |_| run_command(&state, &ui, command)
        });
    }
}

pub fn connect_focus_handler(state: &Rc<RefCell<AppState>>, ui: &Rc<UiComponents>) {
    ui.window.connect_is_active_notify({
        let state = state.clone();
        let ui = ui.clone();
        move |window| {
            if window.is_active() {
                return;
            }
            let events = match state.try_borrow_mut() {
                Ok(mut s) => s.session.focus_lost(),
                Err(_) => return,
            };
            apply_events(&state, &ui, events);
        }
    });
}

/// Hides our own window, grabs every display and shows the editor over the result.
pub fn start_capture(state: &Rc<RefCell<AppState>>, ui: &Rc<UiComponents>) {
    ui.window.set_visible(false);

    let context = glib::MainContext::default();
    while context.pending() {
        context.iteration(false);
    }
    std::thread::sleep(Duration::from_millis(200));

    let result = state.borrow_mut().session.activate(&XcapSource::new());
    match result {
        Ok(events) => {
            state.borrow_mut().refresh_canvas_surface();
            ui.window.fullscreen();
            ui.window.present();
            ui.drawing.drawing_area.grab_focus();
            apply_events(state, ui, events);
            info!("Capture session started");
        }
        Err(e) => {
            error!("Failed to capture screen: {}", e);
        }
    }
}

pub fn connect_all_handlers(state: &Rc<RefCell<AppState>>, ui: &Rc<UiComponents>) {
    debug!("Initializing UI handlers");
    connect_drag_handlers(state, ui);
    connect_scroll_handler(state, ui);
    connect_key_handler(state, ui);
    connect_toolkit_handlers(state, ui);
    connect_focus_handler(state, ui);
    dialogs::connect_text_popover(state, ui);
}
