//! Status bar component
//!
//! One colored dot per component: green while it is working, orange when
//! idle, red when it failed to load.

use crate::session::SessionState;
use crate::ui::state::UiState;
use crate::ui::theme::Theme;
use egui::{self, Color32, RichText, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentStatus {
    Waiting,
    Running,
    Unavailable,
}

#[derive(Clone, Debug)]
pub struct StatusIndicator {
    pub name: &'static str,
    pub status: ComponentStatus,
}

pub struct StatusBar<'a> {
    state: &'a UiState,
    theme: &'a Theme,
}

impl<'a> StatusBar<'a> {
    pub fn new(state: &'a UiState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn indicators(&self) -> Vec<StatusIndicator> {
        let caps = self.state.capabilities;
        let current = self.state.session_state;
        let status = |available: bool, active: bool| {
            if self.state.disconnected {
                ComponentStatus::Unavailable
            } else if !self.state.ready {
                ComponentStatus::Waiting
            } else if !available {
                ComponentStatus::Unavailable
            } else if active {
                ComponentStatus::Running
            } else {
                ComponentStatus::Waiting
            }
        };

        vec![
            StatusIndicator {
                name: "STT",
                status: status(
                    caps.microphone,
                    matches!(current, SessionState::Capturing | SessionState::Transcribing),
                ),
            },
            StatusIndicator {
                name: "LLM",
                status: status(caps.responder, current == SessionState::Generating),
            },
            StatusIndicator {
                name: "TTS",
                status: status(caps.narrator, self.state.speaking),
            },
        ]
    }

    pub fn show(self, ui: &mut egui::Ui) {
        let time = ui.ctx().input(|i| i.time);
        let pulse = ((time * 2.0).sin() * 0.5 + 0.5) as f32;
        let indicators = self.indicators();

        ui.horizontal(|ui| {
            for indicator in &indicators {
                let base = match indicator.status {
                    ComponentStatus::Waiting => self.theme.warning,
                    ComponentStatus::Running => self.theme.success,
                    ComponentStatus::Unavailable => self.theme.error,
                };
                let color = if indicator.status == ComponentStatus::Running {
                    Color32::from_rgba_unmultiplied(
                        base.r(),
                        base.g(),
                        base.b(),
                        (255.0 * (0.6 + 0.4 * pulse)) as u8,
                    )
                } else {
                    base
                };

                let (rect, response) =
                    ui.allocate_exact_size(Vec2::splat(10.0), egui::Sense::hover());
                ui.painter().circle_filled(rect.center(), 5.0, color);
                response.on_hover_text(format!("{}: {:?}", indicator.name, indicator.status));

                ui.label(
                    RichText::new(indicator.name)
                        .size(12.0)
                        .color(self.theme.text_secondary),
                );
                ui.add_space(self.theme.spacing_sm);
            }

            if let Some(ms) = self.state.last_cycle_ms {
                ui.label(
                    RichText::new(format!("last cycle {:.1}s", ms as f32 / 1000.0))
                        .size(12.0)
                        .color(self.theme.text_muted),
                );
            }
        });

        if indicators
            .iter()
            .any(|i| i.status == ComponentStatus::Running)
        {
            ui.ctx().request_repaint();
        }
    }
}
