//! Application configuration
//!
//! Every field has a default, so an empty or partial TOML file is valid.
//! Lookup order: the file named by `TALKBACK_CONFIG`, then
//! `<config_dir>/talkback/config.toml`, then built-in defaults.

use crate::audio::CaptureConfig;
use crate::conversation::PromptWindow;
use crate::credentials::DEFAULT_TOKEN_ENV;
use crate::llm::LLMConfig;
use crate::speech::{TTSConfig, WhisperConfig};
use crate::{Result, TalkbackError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "TALKBACK_CONFIG";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// STT (Whisper) configuration
    pub stt: WhisperConfig,

    /// Language model configuration
    pub llm: LLMConfig,

    /// TTS configuration
    pub tts: TTSConfig,

    /// Microphone capture and utterance segmentation
    pub capture: CaptureConfig,

    /// History included in each prompt
    pub prompt: PromptWindow,

    /// Environment variable holding the Hugging Face token
    pub credential_env: String,

    /// Whether to load the microphone and Whisper
    pub enable_audio_input: bool,

    /// Whether to load the voice and speaker
    pub enable_audio_output: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            stt: WhisperConfig::default(),
            llm: LLMConfig::default(),
            tts: TTSConfig::default(),
            capture: CaptureConfig::default(),
            prompt: PromptWindow::default(),
            credential_env: DEFAULT_TOKEN_ENV.to_string(),
            enable_audio_input: true,
            enable_audio_output: true,
        }
    }
}

impl AppConfig {
    /// Resolve the configuration from the environment and user config dir
    pub fn load() -> Result<Self> {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        Self::load_from(explicit, dirs::config_dir())
    }

    /// An explicit path must exist; the per-user file is optional
    pub fn load_from(explicit: Option<PathBuf>, config_dir: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = explicit {
            info!("Loading config from {} ({})", path.display(), CONFIG_ENV);
            return Self::from_toml_path(&path);
        }

        if let Some(path) = config_dir.map(|dir| dir.join("talkback").join("config.toml")) {
            if path.exists() {
                info!("Loading config from {}", path.display());
                return Self::from_toml_path(&path);
            }
            debug!("No config file at {}", path.display());
        }

        info!("Using default configuration");
        Ok(Self::default())
    }

    pub fn from_toml_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TalkbackError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
            .map_err(|e| TalkbackError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| TalkbackError::Config(format!("Invalid TOML: {}", e)))
    }

    /// Create a configuration with model paths
    pub fn with_models(
        whisper_model: impl Into<PathBuf>,
        tts_model: impl Into<String>,
        tts_tokens: impl Into<String>,
    ) -> Self {
        let mut config = Self::default();
        config.stt.model_path = whisper_model.into();
        config.tts.model_path = tts_model.into();
        config.tts.tokens_path = tts_tokens.into();
        config
    }

    pub fn with_llm(mut self, llm: LLMConfig) -> Self {
        self.llm = llm;
        self
    }

    pub fn with_capture(mut self, capture: CaptureConfig) -> Self {
        self.capture = capture;
        self
    }

    pub fn with_prompt_window(mut self, prompt: PromptWindow) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn with_credential_env(mut self, var: impl Into<String>) -> Self {
        self.credential_env = var.into();
        self
    }

    /// Disable audio input (text-only mode)
    pub fn without_audio_input(mut self) -> Self {
        self.enable_audio_input = false;
        self
    }

    /// Disable audio output (no spoken responses)
    pub fn without_audio_output(mut self) -> Self {
        self.enable_audio_output = false;
        self
    }

    /// Check capture settings and that model files exist for every
    /// enabled component
    pub fn validate(&self) -> Result<()> {
        self.capture.validate()?;

        if self.credential_env.trim().is_empty() {
            return Err(TalkbackError::Config(
                "credential_env must name an environment variable".into(),
            ));
        }

        if self.enable_audio_input && !self.stt.model_path.exists() {
            return Err(TalkbackError::Config(format!(
                "Whisper model not found: {:?}",
                self.stt.model_path
            )));
        }

        if self.enable_audio_output {
            if self.tts.model_path.is_empty() {
                return Err(TalkbackError::Config("TTS model path is required".into()));
            }
            if !Path::new(&self.tts.model_path).exists() {
                return Err(TalkbackError::Config(format!(
                    "TTS model not found: {}",
                    self.tts.model_path
                )));
            }
            if !Path::new(&self.tts.tokens_path).exists() {
                return Err(TalkbackError::Config(format!(
                    "TTS tokens file not found: {}",
                    self.tts.tokens_path
                )));
            }
        }

        Ok(())
    }
}
