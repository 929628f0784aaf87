//! Session history of generated audiobooks

use crate::domain::tone::Tone;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::VecDeque;

/// Characters of the original text kept in a record
const EXCERPT_CHARS: usize = 100;

/// One generated audiobook
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NarrationRecord {
    pub timestamp: DateTime<Local>,
    pub tone: Tone,
    pub voice: String,
    pub original_excerpt: String,
    pub rewritten_text: String,
    #[serde(skip)]
    pub audio: Vec<u8>,
    pub filename: String,
    /// Seconds spent rewriting and narrating
    pub processing_time: f64,
}

impl NarrationRecord {
    /// Shorten `original` to the excerpt stored in history
    pub fn excerpt(original: &str) -> String {
        match original.char_indices().nth(EXCERPT_CHARS) {
            Some((byte, _)) => format!("{}...", &original[..byte]),
            None => original.to_string(),
        }
    }
}

/// Most recent records first, bounded
#[derive(Debug, Clone)]
pub struct SessionHistory {
    records: VecDeque<NarrationRecord>,
    capacity: usize,
}

impl Default for SessionHistory {
    fn default() -> Self {
        Self::new(crate::api::config::defaults::HISTORY_CAPACITY)
    }
}

impl SessionHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Add a record, evicting the oldest beyond capacity
    pub fn push(&mut self, record: NarrationRecord) {
        self.records.push_front(record);
        self.records.truncate(self.capacity);
    }

    /// Records, newest first
    pub fn iter(&self) -> impl Iterator<Item = &NarrationRecord> {
        self.records.iter()
    }

    pub fn latest(&self) -> Option<&NarrationRecord> {
        self.records.front()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> NarrationRecord {
        NarrationRecord {
            timestamp: Local::now(),
            tone: Tone::Neutral,
            voice: "Sarah (Female)".into(),
            original_excerpt: NarrationRecord::excerpt("text"),
            rewritten_text: "text".into(),
            audio: vec![1, 2, 3],
            filename: format!("{name}.mp3"),
            processing_time: 0.5,
        }
    }

    #[test]
    fn test_newest_first_and_bounded() {
        let mut history = SessionHistory::new(5);
        for i in 0..7 {
            history.push(record(&format!("book{i}")));
        }
        assert_eq!(history.len(), 5);
        let names: Vec<_> = history.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, ["book6.mp3", "book5.mp3", "book4.mp3", "book3.mp3", "book2.mp3"]);
        assert_eq!(history.latest().unwrap().filename, "book6.mp3");
    }

    #[test]
    fn test_clear() {
        let mut history = SessionHistory::default();
        history.push(record("a"));
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.capacity(), 5);
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(NarrationRecord::excerpt("short"), "short");
        let long = "x".repeat(150);
        let excerpt = NarrationRecord::excerpt(&long);
        assert_eq!(excerpt.len(), 103);
        assert!(excerpt.ends_with("..."));
    }
}
