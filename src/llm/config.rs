//! Language model configuration for mistral.rs

use serde::{Deserialize, Serialize};

/// Quantization applied to model weights at load time
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuantizationType {
    /// No quantization (full precision)
    #[serde(rename = "none")]
    None,
    /// 4-bit quantization (Q4K)
    #[default]
    #[serde(rename = "q4k")]
    Q4K,
    /// 8-bit quantization (Q8_0)
    #[serde(rename = "q8_0")]
    Q8_0,
    /// 4-bit quantization (Q4_0)
    #[serde(rename = "q4_0")]
    Q4_0,
}

/// Configuration for the responder
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LLMConfig {
    /// Model identifier (HuggingFace model ID or local path)
    pub model_id: String,

    /// Quantization type for model weights
    pub quantization: QuantizationType,

    /// Hard cap on generated tokens per reply
    pub max_new_tokens: usize,

    /// Sampling temperature; the model default when unset
    pub temperature: Option<f64>,

    /// Top-p (nucleus) sampling; the model default when unset
    pub top_p: Option<f64>,

    /// Whether the model is gated and needs the access token
    pub requires_credential: bool,

    /// Enable mistral.rs logging of inference details
    pub enable_logging: bool,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            model_id: "meta-llama/Llama-2-7b-chat-hf".to_string(),
            quantization: QuantizationType::Q4K,
            max_new_tokens: 50,
            temperature: None,
            top_p: None,
            requires_credential: true,
            enable_logging: false,
        }
    }
}

impl LLMConfig {
    /// Create a new configuration for the specified model
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            ..Default::default()
        }
    }

    pub fn with_quantization(mut self, quantization: QuantizationType) -> Self {
        self.quantization = quantization;
        self
    }

    pub fn with_max_new_tokens(mut self, max_new_tokens: usize) -> Self {
        self.max_new_tokens = max_new_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Mark the model as public so no token is required
    pub fn ungated(mut self) -> Self {
        self.requires_credential = false;
        self
    }
}
