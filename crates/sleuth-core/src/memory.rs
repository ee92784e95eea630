//! Investigator case memory.
//!
//! Everything the investigator has learned, re-inserted into each analysis
//! prompt. Clue entries are capped: once `capacity` is exceeded the oldest
//! entries are evicted first and only their locations survive, folded into a
//! one-line digest. The clue path and newspaper clues are never evicted.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::case::Clue;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// What the investigator was thinking when the clue was handed over.
    pub thoughts: String,
    pub clue: Clue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewspaperClue {
    pub description: String,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseMemory {
    capacity: usize,
    entries: VecDeque<MemoryEntry>,
    clue_path: Vec<String>,
    evicted_locations: Vec<String>,
    newspaper_clues: Vec<NewspaperClue>,
}

impl CaseMemory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
            clue_path: Vec::new(),
            evicted_locations: Vec::new(),
            newspaper_clues: Vec::new(),
        }
    }

    pub fn record_clue(&mut self, thoughts: impl Into<String>, clue: Clue) {
        self.clue_path.push(format!(
            "location - {}, type - {}",
            clue.location,
            clue.category.as_str()
        ));
        self.entries.push_back(MemoryEntry {
            thoughts: thoughts.into(),
            clue,
        });
        while self.entries.len() > self.capacity {
            if let Some(old) = self.entries.pop_front() {
                self.evicted_locations.push(old.clue.location);
            }
        }
    }

    pub fn record_newspaper_clue(&mut self, clue: NewspaperClue) {
        self.newspaper_clues.push(clue);
    }

    pub fn entries(&self) -> impl Iterator<Item = &MemoryEntry> {
        self.entries.iter()
    }

    pub fn clue_path(&self) -> &[String] {
        &self.clue_path
    }

    pub fn newspaper_clues(&self) -> &[NewspaperClue] {
        &self.newspaper_clues
    }

    pub fn evicted(&self) -> usize {
        self.evicted_locations.len()
    }

    /// Prompt section listing what has been discovered so far.
    pub fn render(&self) -> String {
        let mut out = String::from("Clues discovered:\n");
        if self.entries.is_empty() && self.evicted_locations.is_empty() {
            out.push_str("(none yet)\n");
        }
        if !self.evicted_locations.is_empty() {
            out.push_str(&format!(
                "Earlier leads (details summarized away): {}\n",
                self.evicted_locations.join("; ")
            ));
        }
        for entry in &self.entries {
            out.push_str(&format!(
                "- my previous thoughts - {}\n  new clue given - location: {}\n  location_type: {}\n  description: {}\n",
                entry.thoughts.trim(),
                entry.clue.location,
                entry.clue.category.as_str(),
                entry.clue.description
            ));
        }

        out.push_str("\nNewspaper clues:\n");
        if self.newspaper_clues.is_empty() {
            out.push_str("(none yet)\n");
        }
        for clue in &self.newspaper_clues {
            out.push_str(&format!("- {} ({})\n", clue.description, clue.explanation));
        }
        out
    }
}
