//! Main application struct and eframe integration

use crate::session::SessionHandle;
use crate::ui::components::{HistoryView, InputPanel, NoticeList, ResponseView, StatusBar};
use crate::ui::state::UiState;
use crate::ui::theme::Theme;
use egui::{self, CentralPanel, RichText};
use std::time::Duration;
use tracing::{error, info};

pub const TITLE: &str = "Speech-to-Speech Chatbot Application";

const WELCOME: &str =
    "Welcome to the Speech-to-Speech application! Select your input method below.";

/// Render the whole session view
///
/// Pure function of `state`; user actions only queue commands on it.
pub fn show_session(ui: &mut egui::Ui, state: &mut UiState, theme: &Theme) {
    ui.heading(RichText::new(TITLE).color(theme.text_primary));
    ui.label(RichText::new(WELCOME).color(theme.text_secondary));
    StatusBar::new(state, theme).show(ui);

    ui.separator();
    InputPanel::new(state, theme).show(ui);
    ui.add_space(theme.spacing_sm);

    NoticeList::new(state, theme).show(ui);
    ui.add_space(theme.spacing_sm);

    ResponseView::new(state, theme).show(ui);

    ui.separator();
    HistoryView::new(state, theme).show(ui);
}

pub struct TalkbackApp {
    state: UiState,
    theme: Theme,
    session: SessionHandle,
}

impl TalkbackApp {
    pub fn new(cc: &eframe::CreationContext<'_>, session: SessionHandle) -> Self {
        let theme = Theme::dark();
        theme.apply(&cc.egui_ctx);

        Self {
            state: UiState::new(),
            theme,
            session,
        }
    }

    fn poll_events(&mut self) {
        loop {
            match self.session.try_recv_event() {
                Ok(Some(event)) => self.state.apply_event(event),
                Ok(None) => break,
                Err(e) => {
                    if !self.state.disconnected {
                        error!("Lost the session worker: {}", e);
                    }
                    self.state.session_lost(&e);
                    break;
                }
            }
        }
    }

    fn dispatch_commands(&mut self) {
        for command in self.state.take_commands() {
            if let Err(e) = self.session.send(command) {
                error!("Session worker is gone: {}", e);
                self.state.command_failed(&e);
            }
        }
    }
}

impl eframe::App for TalkbackApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_events();

        CentralPanel::default()
            .frame(egui::Frame::none().fill(self.theme.bg_primary).inner_margin(self.theme.spacing))
            .show(ctx, |ui| {
                show_session(ui, &mut self.state, &self.theme);
            });

        self.dispatch_commands();

        // The worker cannot wake the UI, so keep polling while it has work
        if (!self.state.ready || self.state.busy) && !self.state.disconnected {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("Talkback shutting down");
    }
}
