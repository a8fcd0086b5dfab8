//! Pure projections of the data model into display markup. Nothing here
//! touches the filesystem or network; rendering the same input twice yields
//! identical output.

use crate::client::{Status, StatusKind};
use crate::history::Turn;

pub const EMPTY_HISTORY: &str =
    "<div class='empty-history'>No conversation yet. Start by recording a voice message.</div>";

/// Render the transcript in stored order: one user bubble per turn, an
/// assistant bubble only when a reply exists, each stamped with the turn's
/// timestamp.
pub fn render_history(history: &[Turn]) -> String {
    if history.is_empty() {
        return EMPTY_HISTORY.to_string();
    }

    let mut html = String::from("<div class='chat-container'>");
    for turn in history {
        push_bubble(&mut html, "user-bubble", "👤", &turn.user, &turn.timestamp);
        if let Some(reply) = &turn.assistant {
            push_bubble(&mut html, "assistant-bubble", "🤖", reply, &turn.timestamp);
        }
    }
    html.push_str("</div>");
    html
}

fn push_bubble(html: &mut String, class: &str, icon: &str, message: &str, timestamp: &str) {
    html.push_str(&format!(
        "<div class=\"chat-row\">\
         <div class=\"chat-bubble {class}\">\
         <div class=\"chat-content\">\
         <div class=\"chat-icon\">{icon}</div>\
         <div class=\"chat-message\">{}</div>\
         </div>\
         <div class=\"timestamp\">{}</div>\
         </div>\
         </div>",
        escape_html(message),
        escape_html(timestamp),
    ));
}

pub fn render_status(status: &Status) -> String {
    let class = match status.kind {
        StatusKind::Success => "status-success",
        StatusKind::Warning => "status-warning",
        StatusKind::Error => "status-error",
    };
    format!(
        "<div class=\"status-message {class}\">{}</div>",
        escape_html(&status.text)
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Cosmetic recording indicator: two mutually exclusive visibility flags
/// driven by the input widget's start/stop signals. Carries no data-model
/// consequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecorderIndicator {
    #[default]
    Idle,
    Recording,
}

impl RecorderIndicator {
    pub fn recording_started(self) -> Self {
        Self::Recording
    }

    pub fn recording_stopped(self) -> Self {
        Self::Idle
    }

    /// `(recording_visible, ready_visible)` — always exactly one is set.
    pub fn visibility(self) -> (bool, bool) {
        match self {
            Self::Recording => (true, false),
            Self::Idle => (false, true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn turn(user: &str, assistant: Option<&str>, ts: &str) -> Turn {
        Turn {
            user: user.to_string(),
            assistant: assistant.map(|s| s.to_string()),
            timestamp: ts.to_string(),
        }
    }

    #[test]
    fn test_empty_history_renders_placeholder() {
        assert_eq!(render_history(&[]), EMPTY_HISTORY);
    }

    #[test]
    fn test_assistant_bubble_only_when_reply_present() {
        let with_reply = render_history(&[turn("q", Some("a"), "10:00:00")]);
        assert!(with_reply.contains("user-bubble"));
        assert!(with_reply.contains("assistant-bubble"));

        let error_turn = render_history(&[turn("⚠️ Server Error: overloaded", None, "10:00:01")]);
        assert!(error_turn.contains("user-bubble"));
        assert!(!error_turn.contains("assistant-bubble"));
    }

    #[test]
    fn test_order_preserved() {
        let html = render_history(&[
            turn("first", None, "10:00:00"),
            turn("second", None, "10:00:01"),
            turn("third", None, "10:00:02"),
        ]);
        let first = html.find("first").unwrap();
        let second = html.find("second").unwrap();
        let third = html.find("third").unwrap();
        assert!(first < second && second < third);
    }

    #[test]
    fn test_messages_are_escaped() {
        let html = render_history(&[turn("<script>alert(1)</script>", None, "10:00:00")]);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_status_classes() {
        assert!(render_status(&Status::success("ok")).contains("status-success"));
        assert!(render_status(&Status::warning("hm")).contains("status-warning"));
        assert!(render_status(&Status::error("no")).contains("status-error"));
    }

    #[test]
    fn test_indicator_flags_mutually_exclusive() {
        let idle = RecorderIndicator::default();
        assert_eq!(idle.visibility(), (false, true));

        let recording = idle.recording_started();
        assert_eq!(recording.visibility(), (true, false));

        assert_eq!(recording.recording_stopped(), RecorderIndicator::Idle);
    }

    proptest! {
        // Rendering is a pure, order-preserving projection.
        #[test]
        fn prop_render_is_pure_and_ordered(
            turns in proptest::collection::vec(
                ("[a-z]{1,12}", proptest::option::of("[a-z]{1,12}")),
                0..8,
            )
        ) {
            let history: Vec<Turn> = turns
                .iter()
                .enumerate()
                .map(|(i, (user, assistant))| Turn {
                    user: format!("{user}-{i}"),
                    assistant: assistant.clone(),
                    timestamp: format!("00:00:{i:02}"),
                })
                .collect();

            let once = render_history(&history);
            let twice = render_history(&history);
            prop_assert_eq!(&once, &twice);

            let mut last = 0;
            for turn in &history {
                let pos = once[last..].find(&turn.user).expect("turn must render");
                last += pos;
            }
        }
    }
}
