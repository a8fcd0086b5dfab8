use crate::artifact::{Artifact, TTS_PREFIX};
use crate::config::Settings;
use crate::error::SynthesisError;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::{debug, info};
use wait_timeout::ChildExt;

/// Drives the external Coqui-style `tts` executable.
///
/// The tool resolves its speaker-embedding file relative to its working
/// directory, so the child process is started inside `work_dir`; every other
/// path is handed over absolute. The parent's working directory is never
/// touched, so concurrent invocations cannot corrupt each other's file
/// resolution.
pub struct SynthesisInvoker {
    binary: String,
    work_dir: PathBuf,
    model_path: PathBuf,
    config_path: PathBuf,
    speaker: String,
    timeout: Duration,
}

impl SynthesisInvoker {
    pub fn new(settings: &Settings) -> Self {
        Self {
            binary: settings.tts_binary.clone(),
            work_dir: settings.tts_dir.clone(),
            model_path: settings.tts_dir.join(&settings.tts_model),
            config_path: settings.tts_dir.join(&settings.tts_config),
            speaker: settings.tts_speaker.clone(),
            timeout: Duration::from_secs(settings.tts_timeout_secs),
        }
    }

    /// Convert `text` to speech, returning the absolute path of the generated
    /// WAV. Single attempt, no retries; the text is passed through untouched.
    pub fn synthesize(&self, text: &str) -> Result<PathBuf, SynthesisError> {
        let out = Artifact::create(TTS_PREFIX)?;
        let model = std::path::absolute(&self.model_path)?;
        let config = std::path::absolute(&self.config_path)?;
        let out_path = std::path::absolute(out.path())?;

        debug!(
            binary = %self.binary,
            work_dir = %self.work_dir.display(),
            out = %out_path.display(),
            "running TTS"
        );

        let mut child = Command::new(&self.binary)
            .arg("--text")
            .arg(text)
            .arg("--model_path")
            .arg(&model)
            .arg("--config_path")
            .arg(&config)
            .arg("--speaker_idx")
            .arg(&self.speaker)
            .arg("--out_path")
            .arg(&out_path)
            .current_dir(&self.work_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| SynthesisError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        match child.wait_timeout(self.timeout)? {
            Some(status) => {
                let output = child.wait_with_output()?;
                if !status.success() {
                    return Err(SynthesisError::Failed {
                        code: status.code(),
                        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    });
                }
            }
            None => {
                // Timeout occurred, kill the process
                let _ = child.kill();
                let _ = child.wait();
                return Err(SynthesisError::TimedOut(self.timeout.as_secs()));
            }
        }

        // Zero exit alone is not success: the tool must have produced audio.
        if out.is_empty() {
            return Err(SynthesisError::OutputMissing(out_path));
        }

        info!(out = %out_path.display(), "synthesis complete");
        Ok(out.into_path()?)
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::{tempdir, TempDir};

    fn fake_tts(dir: &TempDir, script_body: &str) -> SynthesisInvoker {
        let script = dir.path().join("fake-tts");
        std::fs::write(&script, format!("#!/bin/sh\n{script_body}\n")).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let settings = Settings {
            tts_binary: script.to_string_lossy().into_owned(),
            tts_dir: dir.path().to_path_buf(),
            tts_timeout_secs: 5,
            ..Settings::default()
        };
        SynthesisInvoker::new(&settings)
    }

    // Emits the value following --out_path so scripts can write the file.
    const FIND_OUT_PATH: &str = r#"
out=""
while [ $# -gt 0 ]; do
    if [ "$1" = "--out_path" ]; then out="$2"; fi
    shift
done"#;

    #[test]
    fn test_success_returns_existing_file() {
        let dir = tempdir().unwrap();
        let invoker = fake_tts(&dir, &format!("{FIND_OUT_PATH}\nprintf RIFFdata > \"$out\""));

        let path = invoker.synthesize("halo dunia").unwrap();
        assert!(path.is_absolute());
        assert_eq!(std::fs::read(&path).unwrap(), b"RIFFdata");
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_nonzero_exit_is_failed() {
        let dir = tempdir().unwrap();
        let invoker = fake_tts(&dir, "echo boom >&2\nexit 3");

        let err = invoker.synthesize("halo").unwrap_err();
        match err {
            SynthesisError::Failed { code, stderr } => {
                assert_eq!(code, Some(3));
                assert!(stderr.contains("boom"));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_exit_without_output_is_missing() {
        let dir = tempdir().unwrap();
        let invoker = fake_tts(&dir, "exit 0");

        let err = invoker.synthesize("halo").unwrap_err();
        assert!(matches!(err, SynthesisError::OutputMissing(_)));
    }

    #[test]
    fn test_missing_binary_is_spawn_error() {
        let dir = tempdir().unwrap();
        let settings = Settings {
            tts_binary: dir
                .path()
                .join("no-such-binary")
                .to_string_lossy()
                .into_owned(),
            tts_dir: dir.path().to_path_buf(),
            ..Settings::default()
        };
        let invoker = SynthesisInvoker::new(&settings);

        let err = invoker.synthesize("halo").unwrap_err();
        assert!(matches!(err, SynthesisError::Spawn { .. }));
    }

    #[test]
    fn test_parent_working_directory_untouched_on_failure() {
        let dir = tempdir().unwrap();
        let invoker = fake_tts(&dir, "exit 1");
        assert_eq!(invoker.work_dir(), dir.path());

        let before = std::env::current_dir().unwrap();
        let _ = invoker.synthesize("halo");
        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[test]
    fn test_hung_process_times_out() {
        let dir = tempdir().unwrap();
        let mut invoker = fake_tts(&dir, "sleep 10");
        invoker.timeout = Duration::from_millis(200);

        let err = invoker.synthesize("halo").unwrap_err();
        assert!(matches!(err, SynthesisError::TimedOut(_)));
    }
}
