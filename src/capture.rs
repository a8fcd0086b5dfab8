use crate::client::Recording;
use crate::error::ChatError;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing::info;

/// Record from the default input device for a fixed window and return the
/// captured samples as 16-bit PCM. Blocks the calling thread for the whole
/// window.
pub fn record(duration: Duration) -> Result<Recording, ChatError> {
    let host = cpal::default_host();
    let device = host.default_input_device().ok_or(ChatError::NoInputDevice)?;

    info!(
        device = %device.name().unwrap_or_else(|_| "unknown".to_string()),
        secs = duration.as_secs(),
        "recording"
    );

    let config = device
        .default_input_config()
        .map_err(|e| ChatError::Capture(e.to_string()))?;
    let sample_rate = config.sample_rate();
    let channels = config.channels();

    let buffer = Arc::new(Mutex::new(Vec::<f32>::new()));
    let buffer_clone = buffer.clone();

    let err_fn = move |err| {
        tracing::error!(error = %err, "input stream error");
    };

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => device
            .build_input_stream(
                &config.clone().into(),
                move |data: &[f32], _: &_| {
                    if let Ok(mut b) = buffer_clone.lock() {
                        b.extend_from_slice(data);
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| ChatError::Capture(e.to_string()))?,
        other => {
            return Err(ChatError::Capture(format!(
                "unsupported input sample format: {other:?}"
            )))
        }
    };

    stream
        .play()
        .map_err(|e| ChatError::Capture(e.to_string()))?;
    thread::sleep(duration);
    drop(stream); // Stop recording

    let captured = buffer.lock().unwrap_or_else(|e| e.into_inner());
    let samples = captured.iter().map(|&s| f32_to_i16(s)).collect();

    Ok(Recording {
        sample_rate,
        channels,
        samples,
    })
}

fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}
