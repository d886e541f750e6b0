//! Input method selector, text field and the Start button

use crate::session::InputMethod;
use crate::ui::state::UiState;
use crate::ui::theme::Theme;
use egui::{self, Key, RichText};

pub struct InputPanel<'a> {
    state: &'a mut UiState,
    theme: &'a Theme,
}

impl<'a> InputPanel<'a> {
    pub fn new(state: &'a mut UiState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        ui.label("Select input method:");
        ui.horizontal(|ui| {
            for method in InputMethod::ALL {
                let response = ui.add_enabled(
                    !self.state.busy,
                    egui::RadioButton::new(self.state.input_method == method, method.label()),
                );
                if response.clicked() {
                    self.state.input_method = method;
                }
            }
        });

        ui.add_space(self.theme.spacing_sm);

        if self.state.input_method == InputMethod::TextInput {
            self.show_text_input(ui);
            ui.add_space(self.theme.spacing_sm);
        }

        self.show_start_button(ui);
    }

    fn show_text_input(&mut self, ui: &mut egui::Ui) {
        ui.label("Enter your text:");

        let enabled = !self.state.busy;
        let response = ui.add_enabled(
            enabled,
            egui::TextEdit::singleline(&mut self.state.input_text)
                .desired_width(f32::INFINITY)
                .id(egui::Id::new("message_text")),
        );
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::TextEdit, enabled, "Message text")
        });

        if response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter)) {
            self.state.request_start();
        }
    }

    fn show_start_button(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let enabled = self.state.can_start();
            let button = egui::Button::new(RichText::new("Start").strong())
                .rounding(self.theme.button_rounding);
            let response = ui.add_enabled(enabled, button);
            response.widget_info(|| {
                egui::WidgetInfo::labeled(egui::WidgetType::Button, enabled, "Start")
            });

            if response.clicked() {
                self.state.request_start();
            }

            if self.state.disconnected {
                ui.label(RichText::new("Session stopped").color(self.theme.text_muted));
            } else if !self.state.ready {
                ui.spinner();
                ui.label(RichText::new("Loading models...").color(self.theme.text_muted));
            } else if self.state.busy {
                ui.spinner();
                ui.label(
                    RichText::new(self.state.session_state.label()).color(self.theme.text_muted),
                );
            }
        });
    }
}
