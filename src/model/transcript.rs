//! Display-side record of a story: what the player did and what the narrator
//! answered, in turn order.
//!
//! This is derived data. The conversation history stays authoritative; the
//! transcript only feeds the timeline and the exported story.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

const CHOICE_PREFIX: &str = "I choose: ";
const STORY_TITLE: &str = "# My Interactive Adventure";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "speaker", rename_all = "snake_case")]
pub enum EntryKind {
    Player {
        text: String,
    },
    Narrator {
        text: String,
        choices: Vec<String>,
        failed: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub id: Uuid,
    pub turn: u32,
    #[serde(flatten)]
    pub kind: EntryKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineItem {
    pub turn: u32,
    pub preview: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn record_player_input(&mut self, turn: u32, input: &str, is_choice: bool) {
        let text = if is_choice {
            format!("{CHOICE_PREFIX}{}", strip_leading_symbols(input))
        } else {
            input.to_string()
        };
        self.push(turn, EntryKind::Player { text });
    }

    pub fn record_narration(&mut self, turn: u32, text: &str, choices: &[String]) {
        self.push(
            turn,
            EntryKind::Narrator {
                text: text.to_string(),
                choices: choices.to_vec(),
                failed: false,
            },
        );
    }

    pub fn record_failure(&mut self, turn: u32, message: &str) {
        self.push(
            turn,
            EntryKind::Narrator {
                text: message.to_string(),
                choices: Vec::new(),
                failed: true,
            },
        );
    }

    fn push(&mut self, turn: u32, kind: EntryKind) {
        self.entries.push(TranscriptEntry {
            id: Uuid::new_v4(),
            turn,
            kind,
        });
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the story as markdown for download.
    pub fn export_story(&self) -> String {
        let mut story = String::new();
        story.push_str(STORY_TITLE);
        story.push_str("\n\n");

        for entry in &self.entries {
            match &entry.kind {
                EntryKind::Narrator { text, .. } => {
                    story.push_str(text);
                    story.push_str("\n\n");
                }
                EntryKind::Player { text } => {
                    let text = text.strip_prefix(CHOICE_PREFIX).unwrap_or(text);
                    story.push_str(&format!("*[I chose: {text}]*\n\n"));
                }
            }
        }

        story
    }

    /// Narrator entries, newest first, each cut to `width` characters.
    pub fn timeline(&self, width: usize) -> Vec<TimelineItem> {
        self.entries
            .iter()
            .rev()
            .filter_map(|entry| match &entry.kind {
                EntryKind::Narrator { text, .. } => Some(TimelineItem {
                    turn: entry.turn,
                    preview: truncate(text, width),
                }),
                EntryKind::Player { .. } => None,
            })
            .collect()
    }
}

/// Drop leading emoji/punctuation so "🏃 Run away" reads as "Run away".
pub fn strip_leading_symbols(choice: &str) -> &str {
    choice
        .trim_start_matches(|c: char| !(c.is_alphanumeric() || c == '_'))
        .trim_end()
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let head: String = text.chars().take(width).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}
