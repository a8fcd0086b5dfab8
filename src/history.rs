use serde::{Deserialize, Serialize};
use std::io::Result;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// One logged exchange. Persisted as a 3-element JSON array
/// `[user, assistantOrNull, "HH:MM:SS"]`, matching the on-disk log format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TurnWire", into = "TurnWire")]
pub struct Turn {
    pub user: String,
    /// Absent on error turns: the user-visible message carries the failure
    /// and there is no reply to pair it with.
    pub assistant: Option<String>,
    pub timestamp: String,
}

type TurnWire = (String, Option<String>, String);

impl From<TurnWire> for Turn {
    fn from((user, assistant, timestamp): TurnWire) -> Self {
        Self {
            user,
            assistant,
            timestamp,
        }
    }
}

impl From<Turn> for TurnWire {
    fn from(turn: Turn) -> Self {
        (turn.user, turn.assistant, turn.timestamp)
    }
}

impl Turn {
    /// A turn stamped with the current wall-clock time.
    pub fn now(user: impl Into<String>, assistant: Option<String>) -> Self {
        Self {
            user: user.into(),
            assistant,
            timestamp: chrono::Local::now().format("%H:%M:%S").to_string(),
        }
    }
}

/// The persisted conversation log. All writes go through a single in-process
/// lock and land via temp-file-and-rename, so a crash mid-save cannot leave a
/// truncated document behind.
pub struct HistoryLog {
    path: PathBuf,
    writer: Mutex<()>,
}

impl HistoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole log. A missing file is an empty history; an unreadable
    /// or malformed file is logged and treated as empty rather than blocking
    /// the session.
    pub fn load(&self) -> Vec<Turn> {
        if !self.path.exists() {
            return Vec::new();
        }
        match std::fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(turns) => turns,
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "malformed history file, starting empty");
                    Vec::new()
                }
            },
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read history file");
                Vec::new()
            }
        }
    }

    /// Persist the full history, pretty-printed, non-ASCII preserved.
    pub fn save(&self, history: &[Turn]) -> Result<()> {
        let _guard = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        let json = serde_json::to_string_pretty(history)?;
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        use std::io::Write;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Append one turn and persist the result.
    pub fn append(&self, history: &[Turn], turn: Turn) -> Result<Vec<Turn>> {
        let mut updated = history.to_vec();
        updated.push(turn);
        self.save(&updated)?;
        Ok(updated)
    }

    /// Delete the persisted log. Idempotent: clearing an absent log is a
    /// no-op, not an error.
    pub fn clear(&self) -> Result<()> {
        let _guard = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn log_in(dir: &tempfile::TempDir) -> HistoryLog {
        HistoryLog::new(dir.path().join("voice_chat_history.json"))
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        assert!(log_in(&dir).load().is_empty());
    }

    #[test]
    fn test_append_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let log = log_in(&dir);

        let turn = Turn {
            user: "🎤 Voice message".to_string(),
            assistant: Some("🔊 Voice reply".to_string()),
            timestamp: "12:34:56".to_string(),
        };
        let updated = log.append(&[], turn.clone()).unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(log.load(), updated);
        assert_eq!(log.load()[0], turn);
    }

    #[test]
    fn test_wire_format_is_array_of_triples() {
        let dir = tempdir().unwrap();
        let log = log_in(&dir);
        let turn = Turn {
            user: "u".to_string(),
            assistant: None,
            timestamp: "01:02:03".to_string(),
        };
        log.save(&[turn]).unwrap();

        let raw = std::fs::read_to_string(log.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value, serde_json::json!([["u", null, "01:02:03"]]));
    }

    #[test]
    fn test_non_ascii_preserved_on_disk() {
        let dir = tempdir().unwrap();
        let log = log_in(&dir);
        let turn = Turn {
            user: "⚠️ Tidak dapat terhubung".to_string(),
            assistant: None,
            timestamp: "00:00:01".to_string(),
        };
        log.save(&[turn]).unwrap();

        let raw = std::fs::read_to_string(log.path()).unwrap();
        assert!(raw.contains("Tidak dapat terhubung"));
        assert!(raw.contains('⚠'), "non-ASCII must not be escaped: {raw}");
    }

    #[test]
    fn test_malformed_file_loads_empty() {
        let dir = tempdir().unwrap();
        let log = log_in(&dir);
        std::fs::write(log.path(), "{ not json").unwrap();
        assert!(log.load().is_empty());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = tempdir().unwrap();
        let log = log_in(&dir);
        log.save(&[Turn::now("hello", None)]).unwrap();

        log.clear().unwrap();
        assert!(log.load().is_empty());
        // Second clear with no file present must also succeed.
        log.clear().unwrap();
        assert!(log.load().is_empty());
    }
}
