//! Reply generation with mistral.rs
//!
//! - **config**: model selection and generation parameters
//! - **inference**: the `Responder` seam and its mistral.rs implementation

pub mod config;
pub mod inference;

pub use config::{LLMConfig, QuantizationType};
pub use inference::{MistralResponder, Responder};
