//! voxchat: a voice-chat front end.
//!
//! Two loosely related components share this crate:
//!
//! - [`client::VoiceChatClient`] records a voice message, uploads it to a
//!   remote voice-chat service, saves the synthesized reply audio, and keeps
//!   a persisted conversation log.
//! - [`synth::SynthesisInvoker`] drives a local command-line TTS engine and
//!   returns the path of the generated audio file.

pub mod artifact;
pub mod capture;
pub mod client;
pub mod config;
pub mod error;
pub mod history;
pub mod playback;
pub mod render;
pub mod synth;
