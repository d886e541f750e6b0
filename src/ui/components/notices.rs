//! Colored status lines

use crate::session::NoticeLevel;
use crate::ui::state::UiState;
use crate::ui::theme::Theme;
use egui::{self, RichText};

pub struct NoticeList<'a> {
    state: &'a UiState,
    theme: &'a Theme,
}

impl<'a> NoticeList<'a> {
    pub fn new(state: &'a UiState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        for notice in &self.state.notices {
            let color = self.theme.notice_color(notice.level);
            egui::Frame::none()
                .fill(color.gamma_multiply(0.15))
                .stroke(egui::Stroke::new(1.0, color))
                .rounding(self.theme.button_rounding)
                .inner_margin(egui::Margin::symmetric(self.theme.spacing_sm, 4.0))
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    let text = RichText::new(&notice.text).color(self.theme.text_primary);
                    let text = if notice.level == NoticeLevel::Error {
                        text.strong()
                    } else {
                        text
                    };
                    ui.label(text);
                });
        }
    }
}
