//! Track repository boundary
//!
//! Hosts that analyze a library of songs want to attach analysis summaries
//! to tracks. The analysis core itself never touches storage; it talks to
//! this trait, and the host decides where the data lives. An in-memory
//! implementation is provided for tests and hosts without persistence.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Analysis summary attached to one track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackEntry {
    /// Content hash identifying the audio data
    pub content_hash: String,
    /// Display title
    pub title: String,
    /// Estimated tempo in BPM, if analysis produced one
    pub bpm: Option<f32>,
    /// Peak vocal presence observed across the track, in [0, 1]
    pub peak_vocal_presence: f32,
}

/// Storage boundary for per-track analysis results
///
/// Keys are content hashes, so re-encoded copies of the same audio share
/// an entry regardless of filename.
pub trait TrackRepository {
    /// Fetch the entry for a content hash, if present
    fn get(&self, content_hash: &str) -> Option<TrackEntry>;

    /// Insert or replace the entry for its content hash
    fn put(&mut self, entry: TrackEntry);

    /// Remove and return the entry for a content hash
    fn remove(&mut self, content_hash: &str) -> Option<TrackEntry>;

    /// All entries in insertion order
    fn list(&self) -> Vec<TrackEntry>;
}

/// In-memory repository for tests and hosts without persistence
#[derive(Debug, Default)]
pub struct MemoryTrackRepository {
    entries: HashMap<String, TrackEntry>,
    order: Vec<String>,
}

impl MemoryTrackRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the repository holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TrackRepository for MemoryTrackRepository {
    fn get(&self, content_hash: &str) -> Option<TrackEntry> {
        self.entries.get(content_hash).cloned()
    }

    fn put(&mut self, entry: TrackEntry) {
        if !self.entries.contains_key(&entry.content_hash) {
            self.order.push(entry.content_hash.clone());
        }
        self.entries.insert(entry.content_hash.clone(), entry);
    }

    fn remove(&mut self, content_hash: &str) -> Option<TrackEntry> {
        self.order.retain(|h| h != content_hash);
        self.entries.remove(content_hash)
    }

    fn list(&self) -> Vec<TrackEntry> {
        self.order
            .iter()
            .filter_map(|h| self.entries.get(h).cloned())
            .collect()
    }
}
