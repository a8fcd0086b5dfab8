use std::path::PathBuf;
use thiserror::Error;

/// Failures of the external TTS invocation, split by cause so callers can
/// react to a missing binary differently from a bad synthesis run.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("failed to spawn TTS process '{binary}': {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("synthesis failed (exit {code:?}): {stderr}")]
    Failed { code: Option<i32>, stderr: String },

    #[error("synthesis timed out after {0}s")]
    TimedOut(u64),

    #[error("synthesis reported success but no output file at {0}")]
    OutputMissing(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Local failures of the chat client that prevent an exchange from starting.
/// Transport and remote failures are folded into the exchange outcome instead,
/// since those must surface as history turns.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("failed to write audio file: {0}")]
    AudioWrite(#[from] hound::Error),

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no input device available")]
    NoInputDevice,

    #[error("audio capture failed: {0}")]
    Capture(String),

    #[error("audio playback failed: {0}")]
    Playback(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
