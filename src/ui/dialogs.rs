use gtk4 as gtk;

use gtk::{gio, glib, Orientation};
use gtk4::prelude::*;
use log::{debug, error};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use crate::app::AppState;
use crate::ui::handlers::{apply_events, UiComponents};

pub struct TextPopoverComponents {
    pub text_popover: gtk::Popover,
    pub text_entry: gtk::Entry,
    pub text_confirm_btn: gtk::Button,
}

pub fn create_text_popover(drawing_area: &gtk::DrawingArea) -> TextPopoverComponents {
    let text_entry = gtk::Entry::builder()
        .placeholder_text("Enter text...")
        .width_chars(20)
        .build();

    let text_confirm_btn = gtk::Button::builder()
        .icon_name("object-select-symbolic")
        .tooltip_text("Add Text")
        .build();
    text_confirm_btn.add_css_class("suggested-action");

    let text_input_box = gtk::Box::builder()
        .orientation(Orientation::Horizontal)
        .spacing(6)
        .margin_top(6)
        .margin_bottom(6)
        .margin_start(6)
        .margin_end(6)
        .build();
    text_input_box.append(&text_entry);
    text_input_box.append(&text_confirm_btn);

    let text_popover = gtk::Popover::builder()
        .child(&text_input_box)
        .autohide(false)
        .build();
    text_popover.set_parent(drawing_area);

    TextPopoverComponents {
        text_popover,
        text_entry,
        text_confirm_btn,
    }
}

/// Live text goes straight into the open text box; closing the popover
/// commits it.
pub fn connect_text_popover(state: &Rc<RefCell<AppState>>, ui: &Rc<UiComponents>) {
    let components = &ui.text_popover;

    components.text_entry.connect_changed({
        let state = state.clone();
        let drawing_area = ui.drawing.drawing_area.clone();
        move |entry| {
            if let Ok(mut s) = state.try_borrow_mut() {
                s.session.set_text(&entry.text());
            }
            drawing_area.queue_draw();
        }
    });

    components.text_confirm_btn.connect_clicked({
        let text_popover = components.text_popover.clone();
        move |_| text_popover.popdown()
    });

    components.text_entry.connect_activate({
        let text_popover = components.text_popover.clone();
        move |_| text_popover.popdown()
    });

    components.text_popover.connect_closed({
        let state = state.clone();
        let drawing_area = ui.drawing.drawing_area.clone();
        move |_| {
            if let Ok(mut s) = state.try_borrow_mut() {
                if let Err(e) = s.session.close_text_edit() {
                    error!("Failed to commit text: {}", e);
                }
            }
            drawing_area.queue_draw();
        }
    });
}

pub fn show_text_popover(ui: &UiComponents, x: f64, y: f64, w: f64, h: f64) {
    let components = &ui.text_popover;
    components.text_entry.set_text("");
    let rect = gtk::gdk::Rectangle::new(x as i32, y as i32, (w as i32).max(1), (h as i32).max(1));
    components.text_popover.set_pointing_to(Some(&rect));
    components.text_popover.popup();
    components.text_entry.grab_focus();
}

fn pictures_dir() -> Option<PathBuf> {
    glib::user_special_dir(glib::UserDirectory::Pictures).or_else(|| Some(glib::home_dir()))
}

/// Asks for a destination; the session ignores focus loss while this is open.
pub fn show_save_dialog(state: &Rc<RefCell<AppState>>, ui: &Rc<UiComponents>, suggested_name: String) {
    let state = state.clone();
    let ui = ui.clone();

    glib::spawn_future_local(async move {
        let filter = gtk::FileFilter::new();
        filter.set_name(Some("Images"));
        for pattern in ["*.png", "*.jpg", "*.jpeg", "*.bmp"] {
            filter.add_pattern(pattern);
        }

        let dialog = gtk::FileDialog::builder()
            .title("Save Screenshot")
            .modal(true)
            .initial_name(suggested_name.as_str())
            .default_filter(&filter)
            .build();
        if let Some(dir) = pictures_dir() {
            dialog.set_initial_folder(Some(&gio::File::for_path(dir)));
        }

        let path = match dialog.save_future(Some(&ui.window)).await {
            Ok(file) => file.path(),
            Err(e) => {
                debug!("Save dialog dismissed: {}", e);
                None
            }
        };

        let result = state.borrow_mut().session.finish_save(path.as_deref());
        match result {
            Ok(events) => apply_events(&state, &ui, events),
            Err(e) => error!("Failed to save image: {}", e),
        }
    });
}
