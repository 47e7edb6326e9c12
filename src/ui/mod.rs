pub mod dialogs;
pub mod drawing;
pub mod handlers;
pub mod toolbar;

use gtk4 as gtk;
use libadwaita as adw;

use adw::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

use crate::app::{AppState, EditorDefaults, Session};
use crate::editor::{ClipboardManager, FileSaver};
use handlers::UiComponents;

/// The editor window and the state behind it; built once, reused for
/// every capture.
pub struct Ui {
    state: Rc<RefCell<AppState>>,
    components: Rc<UiComponents>,
}

impl Ui {
    pub fn capture(&self) {
        handlers::start_capture(&self.state, &self.components);
    }
}

pub fn build_ui(app: &adw::Application) -> Ui {
    let session = Session::new(
        EditorDefaults::default(),
        Box::new(ClipboardManager::from_default_display()),
        Box::new(FileSaver),
    );
    let state = Rc::new(RefCell::new(AppState::new(session)));

    let toolbar = toolbar::create_toolbar(&state);
    let drawing = drawing::create_drawing_area(&state);
    let text_popover = dialogs::create_text_popover(&drawing.drawing_area);

    let overlay = gtk::Overlay::builder().child(&drawing.drawing_area).build();
    overlay.add_overlay(&toolbar.horizontal_box);
    overlay.add_overlay(&toolbar.vertical_box);

    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("Screenshooter")
        .content(&overlay)
        .decorated(false)
        .build();

    let components = Rc::new(UiComponents {
        window,
        toolbar,
        drawing,
        text_popover,
    });

    handlers::connect_all_handlers(&state, &components);

    Ui { state, components }
}
