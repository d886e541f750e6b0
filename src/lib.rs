pub mod audio;
pub mod config;
pub mod conversation;
pub mod credentials;
pub mod llm;
pub mod session;
pub mod speech;
pub mod ui;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TalkbackError {
    #[error("Credential missing: {0}")]
    CredentialMissing(String),

    #[error("No speech detected before the {0:.1}s timeout")]
    CaptureTimeout(f32),

    #[error("Recognition error: {0}")]
    Recognition(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("There is no response to speak yet")]
    NoResponse,

    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Model load error: {0}")]
    ModelLoad(String),

    #[error("Audio processing error: {0}")]
    AudioProcessing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IO(String),

    #[error("Channel error: {0}")]
    Channel(String),
}

impl From<std::io::Error> for TalkbackError {
    fn from(e: std::io::Error) -> Self {
        TalkbackError::IO(e.to_string())
    }
}

impl TalkbackError {
    /// Check if this error is recoverable within the running session
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Startup problems: the affected component stays unavailable
            TalkbackError::CredentialMissing(_) => false,
            TalkbackError::ModelLoad(_) => false,
            TalkbackError::Config(_) => false,
            TalkbackError::Channel(_) => false,
            // Hardware may need user intervention
            TalkbackError::AudioDevice(_) => false,
            TalkbackError::IO(_) => false,
            // Per-cycle failures: reported, next cycle starts clean
            TalkbackError::CaptureTimeout(_) => true,
            TalkbackError::Recognition(_) => true,
            TalkbackError::Generation(_) => true,
            TalkbackError::Playback(_) => true,
            TalkbackError::NoResponse => true,
            TalkbackError::AudioProcessing(_) => true,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            TalkbackError::CredentialMissing(var) => format!(
                "Hugging Face token is not set. Please set {} in the environment.",
                var
            ),
            TalkbackError::CaptureTimeout(_) => {
                "No speech was detected. Please try again.".to_string()
            }
            TalkbackError::Recognition(_) => {
                "Speech recognition failed. Please try again.".to_string()
            }
            TalkbackError::Generation(_) => {
                "Response generation failed. Please try again.".to_string()
            }
            TalkbackError::Playback(_) => {
                "Could not play the response. Please check your speakers.".to_string()
            }
            TalkbackError::NoResponse => "There is no response to speak yet.".to_string(),
            TalkbackError::AudioDevice(_) => {
                "Audio device error. Please check your microphone/speakers.".to_string()
            }
            TalkbackError::ModelLoad(_) => {
                "Failed to load a model. Please verify model files are present.".to_string()
            }
            TalkbackError::AudioProcessing(_) => {
                "Audio processing failed. Please try again.".to_string()
            }
            TalkbackError::Config(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            TalkbackError::IO(_) => "File system error occurred.".to_string(),
            TalkbackError::Channel(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, TalkbackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_errors_are_recoverable() {
        assert!(TalkbackError::CaptureTimeout(5.0).is_recoverable());
        assert!(TalkbackError::Recognition("x".into()).is_recoverable());
        assert!(TalkbackError::Generation("x".into()).is_recoverable());
        assert!(TalkbackError::Playback("x".into()).is_recoverable());
        assert!(!TalkbackError::CredentialMissing("HUGGING_FACE_TOKEN".into()).is_recoverable());
    }

    #[test]
    fn test_credential_message_names_variable() {
        let err = TalkbackError::CredentialMissing("HUGGING_FACE_TOKEN".into());
        assert_eq!(
            err.user_message(),
            "Hugging Face token is not set. Please set HUGGING_FACE_TOKEN in the environment."
        );
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: TalkbackError = io.into();
        assert!(matches!(err, TalkbackError::IO(_)));
    }
}
