use config::{Config, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Runtime settings for both the chat client and the synthesis invoker.
///
/// Loaded once at startup and passed explicitly to constructors so tests can
/// substitute their own values and multiple instances can coexist.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Remote voice-chat endpoint receiving the multipart WAV upload.
    pub api_url: String,
    /// Upper bound on the full request/response round trip.
    pub request_timeout_secs: u64,
    /// Flat JSON document holding the conversation history.
    pub history_path: PathBuf,
    /// Name (or path) of the external TTS executable.
    pub tts_binary: String,
    /// Directory holding the checkpoint, config and speaker-embedding files.
    /// The TTS process runs with this as its working directory because the
    /// speaker file is resolved relative to it.
    pub tts_dir: PathBuf,
    pub tts_model: String,
    pub tts_config: String,
    pub tts_speaker: String,
    pub tts_timeout_secs: u64,
    /// Fixed microphone capture window for the `chat` command.
    pub record_secs: u64,
    /// Audio artifacts in the temp dir older than this are swept.
    pub artifact_retention_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000/voice-chat".to_string(),
            request_timeout_secs: 60,
            history_path: std::env::temp_dir().join("voice_chat_history.json"),
            tts_binary: "tts".to_string(),
            tts_dir: PathBuf::from("coqui_utils"),
            tts_model: "checkpoint_1260000-inference.pth".to_string(),
            tts_config: "config.json".to_string(),
            tts_speaker: "wibowo".to_string(),
            tts_timeout_secs: 120,
            record_secs: 5,
            artifact_retention_secs: 24 * 60 * 60,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, config::ConfigError> {
        let defaults = Settings::default();
        let builder = Config::builder()
            .set_default("api_url", defaults.api_url)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs)?
            .set_default(
                "history_path",
                defaults.history_path.to_string_lossy().to_string(),
            )?
            .set_default("tts_binary", defaults.tts_binary)?
            .set_default("tts_dir", defaults.tts_dir.to_string_lossy().to_string())?
            .set_default("tts_model", defaults.tts_model)?
            .set_default("tts_config", defaults.tts_config)?
            .set_default("tts_speaker", defaults.tts_speaker)?
            .set_default("tts_timeout_secs", defaults.tts_timeout_secs)?
            .set_default("record_secs", defaults.record_secs)?
            .set_default("artifact_retention_secs", defaults.artifact_retention_secs)?
            // Merge with local config file (if exists)
            .add_source(File::with_name("Voxchat").required(false))
            .add_source(
                File::from(
                    dirs::config_dir()
                        .unwrap_or_default()
                        .join("voxchat")
                        .join("Voxchat"),
                )
                .required(false),
            )
            // Merge with environment variables (e.g. VOXCHAT_API_URL)
            .add_source(config::Environment::with_prefix("VOXCHAT"));

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(config::ConfigError::Message(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.tts_timeout_secs == 0 {
            return Err(config::ConfigError::Message(
                "tts_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.tts_speaker.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "tts_speaker must not be empty".to_string(),
            ));
        }
        if self.record_secs == 0 {
            return Err(config::ConfigError::Message(
                "record_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
