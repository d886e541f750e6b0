mod conversation;
mod input_panel;
mod notices;
mod status_bar;

pub use conversation::{HistoryView, ResponseView};
pub use input_panel::InputPanel;
pub use notices::NoticeList;
pub use status_bar::{ComponentStatus, StatusBar, StatusIndicator};
