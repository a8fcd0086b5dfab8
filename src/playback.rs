use crate::error::ChatError;
use rodio::{Decoder, OutputStream, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// Play an audio file on the default output device, blocking until it ends.
pub fn play(path: &Path) -> Result<(), ChatError> {
    info!(path = %path.display(), "playing audio");

    let file = File::open(path)?;

    let (_stream, stream_handle) =
        OutputStream::try_default().map_err(|e| ChatError::Playback(e.to_string()))?;
    let sink = Sink::try_new(&stream_handle).map_err(|e| ChatError::Playback(e.to_string()))?;

    let source =
        Decoder::new(BufReader::new(file)).map_err(|e| ChatError::Playback(e.to_string()))?;

    sink.append(source);
    sink.sleep_until_end();
    Ok(())
}
