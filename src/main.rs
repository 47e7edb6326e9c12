mod app;
mod capture;
mod editor;
mod error;
mod geometry;
mod ui;

use libadwaita as adw;

use adw::prelude::*;
use gtk4::glib;
use std::cell::OnceCell;
use std::rc::Rc;

const APP_ID: &str = "org.example.Screenshooter";

fn main() -> glib::ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let app = adw::Application::builder().application_id(APP_ID).build();

    // Every activation (first launch or a relaunch while running) starts a
    // new capture session in the same window.
    let ui: Rc<OnceCell<ui::Ui>> = Rc::new(OnceCell::new());
    app.connect_activate(move |app| {
        let ui = ui.get_or_init(|| ui::build_ui(app));
        ui.capture();
    });

    // Keep running between sessions while the window is hidden.
    let _hold = app.hold();
    app.run()
}
