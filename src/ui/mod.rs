//! GUI implementation with egui/eframe
//!
//! The window talks to the session worker only through commands and events;
//! no model ever runs on the render thread.

mod app;
mod components;
mod state;
mod theme;

pub use app::{show_session, TalkbackApp, TITLE};
pub use state::UiState;
pub use theme::Theme;

use crate::session::SessionHandle;

/// Run the window until it is closed
pub fn run(session: SessionHandle) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([760.0, 720.0])
            .with_min_inner_size([480.0, 400.0])
            .with_title(TITLE),
        ..Default::default()
    };

    eframe::run_native(
        "Talkback",
        options,
        Box::new(move |cc| Ok(Box::new(TalkbackApp::new(cc, session)))),
    )
}
