use crate::artifact::{Artifact, INPUT_PREFIX, REPLY_PREFIX};
use crate::config::Settings;
use crate::error::ChatError;
use crate::history::{HistoryLog, Turn};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, warn};

pub const USER_TURN_LABEL: &str = "🎤 Voice message";
pub const ASSISTANT_TURN_LABEL: &str = "🔊 Voice reply";

/// Captured microphone audio: raw PCM samples plus the stream parameters
/// needed to encode them as WAV.
#[derive(Debug, Clone)]
pub struct Recording {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Warning,
    Error,
}

/// The user-visible status line produced by every operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub kind: StatusKind,
    pub text: String,
}

impl Status {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }
}

/// Result of one submit action. `reply` owns the saved response audio; the
/// caller keeps it alive while playing, or takes the path with
/// [`Artifact::into_path`].
#[derive(Debug)]
pub struct Outcome {
    pub reply: Option<Artifact>,
    pub history: Vec<Turn>,
    pub status: Status,
}

impl Outcome {
    fn failure(history: Vec<Turn>, status: Status) -> Self {
        Self {
            reply: None,
            history,
            status,
        }
    }
}

/// Exchanges recorded audio with the remote voice-chat service and maintains
/// the persisted conversation log.
pub struct VoiceChatClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    log: HistoryLog,
}

impl VoiceChatClient {
    pub fn new(settings: &Settings) -> Result<Self, ChatError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint: settings.api_url.clone(),
            log: HistoryLog::new(settings.history_path.clone()),
        })
    }

    pub fn load_history(&self) -> Vec<Turn> {
        self.log.load()
    }

    /// Run one exchange: encode the recording, upload it, save the reply.
    ///
    /// Exactly one network attempt. Transport and remote failures append a
    /// visible error turn (user = error text, no assistant reply) without
    /// touching the persisted log; only a successful exchange is persisted.
    pub fn handle_turn(&self, recording: Option<&Recording>, history: &[Turn]) -> Outcome {
        let recording = match recording {
            Some(r) => r,
            None => {
                return Outcome::failure(
                    history.to_vec(),
                    Status::warning("⚠️ Please record a voice message first"),
                );
            }
        };

        info!(
            sample_rate = recording.sample_rate,
            samples = recording.samples.len(),
            "processing voice request"
        );

        // Local encode failure: report it, but no network call and no
        // history mutation.
        let input = match self.encode_input(recording) {
            Ok(a) => a,
            Err(e) => {
                error!(error = %e, "failed to save input audio");
                return Outcome::failure(
                    history.to_vec(),
                    Status::warning("⚠️ Failed to save audio file"),
                );
            }
        };

        let response = match self.upload(&input) {
            Ok(r) => r,
            Err(status) => {
                let history = with_error_turn(history, &status.text);
                return Outcome::failure(history, status);
            }
        };

        let code = response.status();
        let body = match response.bytes() {
            Ok(b) => b,
            Err(e) => {
                let status = Status::error(format!("🔴 Error: {e}"));
                let history = with_error_turn(history, &status.text);
                return Outcome::failure(history, status);
            }
        };
        info!(status = %code, bytes = body.len(), "received response");

        if !code.is_success() {
            let detail = parse_error_message(&body)
                .unwrap_or_else(|| format!("Status code: {}", code.as_u16()));
            let status = Status::error(format!("⚠️ Server Error: {detail}"));
            let history = with_error_turn(history, &status.text);
            return Outcome::failure(history, status);
        }

        if body.is_empty() {
            let status = Status::warning("⚠️ Server returned empty response");
            let history = with_error_turn(history, &status.text);
            return Outcome::failure(history, status);
        }

        let reply = match self.save_reply(&body) {
            Ok(a) => a,
            Err(e) => {
                error!(error = %e, "failed to save response audio");
                let status = Status::warning("⚠️ Invalid response audio");
                let history = with_error_turn(history, &status.text);
                return Outcome::failure(history, status);
            }
        };

        let turn = Turn::now(USER_TURN_LABEL, Some(ASSISTANT_TURN_LABEL.to_string()));
        let history = match self.log.append(history, turn.clone()) {
            Ok(h) => h,
            Err(e) => {
                // The exchange itself succeeded; losing the persisted log
                // must not lose the reply.
                warn!(error = %e, "failed to persist history");
                let mut h = history.to_vec();
                h.push(turn);
                h
            }
        };

        Outcome {
            reply: Some(reply),
            history,
            status: Status::success("✅ Reply received"),
        }
    }

    /// Delete the persisted log. Idempotent; always leaves an empty history.
    pub fn clear_history(&self) -> (Vec<Turn>, Status) {
        match self.log.clear() {
            Ok(()) => (
                Vec::new(),
                Status::success("🗑️ Conversation history cleared"),
            ),
            Err(e) => (Vec::new(), Status::error(format!("🔴 Error: {e}"))),
        }
    }

    fn encode_input(&self, recording: &Recording) -> Result<Artifact, ChatError> {
        let artifact = Artifact::create(INPUT_PREFIX)?;
        write_wav(recording, artifact.path())?;
        if artifact.is_empty() {
            return Err(ChatError::Io(std::io::Error::other(
                "input WAV did not materialize",
            )));
        }
        Ok(artifact)
    }

    /// Single multipart POST of the encoded WAV. Failures are already mapped
    /// to their user-visible status.
    fn upload(&self, input: &Artifact) -> Result<reqwest::blocking::Response, Status> {
        let file_name = input
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "input.wav".to_string());
        let bytes = std::fs::read(input.path())
            .map_err(|e| Status::error(format!("🔴 Error: {e}")))?;

        let part = reqwest::blocking::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/wav")
            .map_err(|e| Status::error(format!("🔴 Error: {e}")))?;
        let form = reqwest::blocking::multipart::Form::new().part("file", part);

        info!(endpoint = %self.endpoint, "sending voice request");
        self.http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .map_err(|e| {
                error!(error = %e, "voice request failed");
                if e.is_timeout() {
                    Status::error("🕒 Request timed out. The server took too long to respond.")
                } else if e.is_connect() {
                    Status::error(format!(
                        "🔌 Cannot connect to server. Make sure it is running at {}",
                        self.endpoint
                    ))
                } else {
                    Status::error(format!("🔴 Error: {e}"))
                }
            })
    }

    fn save_reply(&self, body: &[u8]) -> Result<Artifact, ChatError> {
        let artifact = Artifact::create(REPLY_PREFIX)?;
        let mut file = std::fs::File::create(artifact.path())?;
        file.write_all(body)?;
        file.flush()?;
        if artifact.is_empty() {
            return Err(ChatError::Io(std::io::Error::other(
                "reply audio did not materialize",
            )));
        }
        Ok(artifact)
    }
}

fn with_error_turn(history: &[Turn], message: &str) -> Vec<Turn> {
    let mut updated = history.to_vec();
    updated.push(Turn::now(message, None));
    updated
}

/// Pull a human-readable `message` out of a JSON error body, if there is one.
fn parse_error_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value
        .get("message")
        .and_then(|m| m.as_str())
        .map(|s| s.to_string())
}

/// Encode the recording as 16-bit PCM WAV at the given path.
pub fn write_wav(recording: &Recording, path: &Path) -> Result<(), hound::Error> {
    let spec = hound::WavSpec {
        channels: recording.channels,
        sample_rate: recording.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in &recording.samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()
}
