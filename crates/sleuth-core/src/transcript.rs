//! Role-tagged conversation log owned by one agent.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message of a transcript. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Append-only, chronological list of turns.
///
/// Only a suffix window of at most `window_size` turns is ever sent out, so
/// the outbound payload stays bounded however long the run gets.
#[derive(Debug, Clone)]
pub struct Transcript {
    turns: Vec<Turn>,
    window_size: usize,
}

impl Transcript {
    pub fn new(window_size: usize) -> Self {
        Self {
            turns: Vec::new(),
            window_size: window_size.max(1),
        }
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// The most recent turns, at most `window_size` of them.
    ///
    /// The window never opens on an assistant turn: the completion endpoint
    /// expects conversations to start with the user.
    pub fn window(&self) -> &[Turn] {
        self.suffix(self.window_size)
    }

    /// Window followed by one extra user turn, for an outbound request.
    ///
    /// The extra turn counts against the window size.
    pub fn window_with(&self, prompt: &str) -> Vec<Turn> {
        let mut turns = self.suffix(self.window_size - 1).to_vec();
        turns.push(Turn::user(prompt));
        turns
    }

    fn suffix(&self, n: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(n);
        let mut window = &self.turns[start..];
        while let Some((first, rest)) = window.split_first() {
            if first.role == Role::User {
                break;
            }
            window = rest;
        }
        window
    }
}
