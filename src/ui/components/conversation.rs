//! Response block and conversation history

use crate::ui::state::UiState;
use crate::ui::theme::Theme;
use egui::{self, RichText};

/// "Response:" block with the Speak Response action
pub struct ResponseView<'a> {
    state: &'a mut UiState,
    theme: &'a Theme,
}

impl<'a> ResponseView<'a> {
    pub fn new(state: &'a mut UiState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        let Some(response) = self.state.response.clone() else {
            return;
        };

        ui.label(RichText::new("Response:").strong());
        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing_sm)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.label(RichText::new(&response).color(self.theme.text_primary));
            });

        let enabled = self.state.can_speak();
        let button = egui::Button::new("Speak Response").rounding(self.theme.button_rounding);
        let clicked = ui.add_enabled(enabled, button).clicked();
        if clicked {
            self.state.request_speak();
        }
    }
}

/// Every turn so far, oldest first
pub struct HistoryView<'a> {
    state: &'a UiState,
    theme: &'a Theme,
}

impl<'a> HistoryView<'a> {
    pub fn new(state: &'a UiState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        ui.heading("Conversation History");

        if self.state.history.is_empty() {
            ui.label(RichText::new("No messages yet.").color(self.theme.text_muted));
            return;
        }

        egui::ScrollArea::vertical()
            .id_salt("conversation_history")
            .auto_shrink([false, true])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                ui.label(RichText::new(self.state.history_text()).color(self.theme.text_secondary));
            });
    }
}
