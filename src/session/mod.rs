//! The conversational loop
//!
//! - **controller**: the request/response state machine and its history
//! - **worker**: thread that loads the models and owns the controller
//! - **events**: commands in, events out

pub mod controller;
pub mod events;
pub mod worker;

pub use controller::SessionController;
pub use events::{
    Capabilities, CycleOutcome, CycleResult, InputMethod, Notice, NoticeLevel, SessionCommand,
    SessionEvent, SessionState, TurnInput,
};
pub use worker::{build_controller, SessionHandle, SessionWorker};
