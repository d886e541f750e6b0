//! Responder backed by mistral.rs
//!
//! mistral.rs is async; the responder owns a private tokio runtime and
//! blocks on it so callers get a plain synchronous contract.

use crate::credentials::Credential;
use crate::llm::config::{LLMConfig, QuantizationType};
use crate::{Result, TalkbackError};
use mistralrs::{
    IsqType, Model, RequestBuilder, TextMessageRole, TextMessages, TextModelBuilder, TokenSource,
};
use tokio::runtime::Runtime;
use tracing::{debug, info};

/// Turns a prompt into a reply
pub trait Responder {
    /// Generate a reply for the full prompt, capped at the configured
    /// number of new tokens
    fn generate(&mut self, prompt: &str) -> Result<String>;
}

/// Causal language model loaded once and held for the process lifetime
pub struct MistralResponder {
    config: LLMConfig,
    runtime: Runtime,
    model: Model,
}

impl MistralResponder {
    /// Load the configured model
    ///
    /// Gated models are refused without a credential before any download
    /// is attempted.
    pub fn load(config: LLMConfig, credential: Option<&Credential>) -> Result<Self> {
        if config.requires_credential && credential.is_none() {
            return Err(TalkbackError::ModelLoad(format!(
                "{} is gated and no access token is available",
                config.model_id
            )));
        }

        info!("Loading language model: {}", config.model_id);

        let runtime = Runtime::new()
            .map_err(|e| TalkbackError::ModelLoad(format!("Failed to create runtime: {}", e)))?;

        let isq_type = match config.quantization {
            QuantizationType::None => None,
            QuantizationType::Q4K => Some(IsqType::Q4K),
            QuantizationType::Q8_0 => Some(IsqType::Q8_0),
            QuantizationType::Q4_0 => Some(IsqType::Q4_0),
        };

        let mut builder = TextModelBuilder::new(&config.model_id);

        if let Some(isq) = isq_type {
            builder = builder.with_isq(isq);
        }

        if config.enable_logging {
            builder = builder.with_logging();
        }

        if let Some(credential) = credential {
            builder = builder.with_token_source(TokenSource::Literal(credential.token().to_string()));
        }

        let model = runtime
            .block_on(builder.build())
            .map_err(|e| TalkbackError::ModelLoad(format!("Failed to load language model: {}", e)))?;

        info!("Language model loaded");

        Ok(Self {
            config,
            runtime,
            model,
        })
    }

    fn build_request(&self, prompt: &str) -> RequestBuilder {
        let messages = TextMessages::new().add_message(TextMessageRole::User, prompt);

        let mut request =
            RequestBuilder::from(messages).set_sampler_max_len(self.config.max_new_tokens);

        if let Some(temperature) = self.config.temperature {
            request = request.set_sampler_temperature(temperature);
        }
        if let Some(top_p) = self.config.top_p {
            request = request.set_sampler_topp(top_p);
        }

        request
    }
}

impl Responder for MistralResponder {
    fn generate(&mut self, prompt: &str) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(TalkbackError::Generation("Prompt is empty".into()));
        }

        debug!("Generating reply for {} char prompt", prompt.len());

        let request = self.build_request(prompt);
        let response = self
            .runtime
            .block_on(self.model.send_chat_request(request))
            .map_err(|e| TalkbackError::Generation(format!("Chat request failed: {}", e)))?;

        let reply = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default()
            .trim()
            .to_string();

        debug!(
            "Generated {} tokens @ {:.1} tok/s",
            response.usage.completion_tokens, response.usage.avg_compl_tok_per_sec
        );

        if reply.is_empty() {
            return Err(TalkbackError::Generation("Model returned an empty reply".into()));
        }

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gated_model_refused_without_credential() {
        let result = MistralResponder::load(LLMConfig::default(), None);
        match result {
            Err(TalkbackError::ModelLoad(msg)) => assert!(msg.contains("gated")),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("gated model loaded without a token"),
        }
    }

    #[test]
    #[ignore = "downloads and loads a language model"]
    fn test_simple_generation() {
        let config = LLMConfig::new("microsoft/Phi-3.5-mini-instruct").ungated();
        let mut responder = MistralResponder::load(config, None).unwrap();
        let reply = responder.generate("Say hello in one word.").unwrap();
        assert!(!reply.is_empty());
    }
}
