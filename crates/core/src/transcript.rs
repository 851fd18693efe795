//! Transcript store: the ordered, bounded list of turns for one session.
//!
//! The retention bound is enforced on every mutation: appending past the
//! bound evicts from the front, and a transcript read back from session
//! storage is trimmed the same way.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::TranscriptError;
use crate::turn::Turn;

/// Default number of turns a transcript retains.
pub const DEFAULT_RETENTION_BOUND: usize = 40;

/// Smallest bound that still holds a user turn together with its reply.
pub const MIN_RETENTION_BOUND: usize = 2;

/// Ordered sequence of turns owned by one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredTranscript")]
pub struct Transcript {
    retention_bound: usize,
    turns: VecDeque<Turn>,
}

/// Wire shape of a transcript; converted through [`Transcript::from`] so the
/// bound holds for anything deserialized.
#[derive(Deserialize)]
struct StoredTranscript {
    #[serde(default = "default_retention_bound")]
    retention_bound: usize,
    #[serde(default)]
    turns: Vec<Turn>,
}

fn default_retention_bound() -> usize {
    DEFAULT_RETENTION_BOUND
}

impl From<StoredTranscript> for Transcript {
    fn from(stored: StoredTranscript) -> Self {
        let mut transcript = Transcript::with_retention_bound(stored.retention_bound);
        for turn in stored.turns {
            transcript.append(turn);
        }
        transcript
    }
}

impl Transcript {
    /// Create an empty transcript with the default bound (40).
    pub fn new() -> Self {
        Self::with_retention_bound(DEFAULT_RETENTION_BOUND)
    }

    /// Create an empty transcript keeping at most `bound` turns, raised to
    /// [`MIN_RETENTION_BOUND`] if smaller.
    pub fn with_retention_bound(bound: usize) -> Self {
        let retention_bound = bound.max(MIN_RETENTION_BOUND);
        Self {
            retention_bound,
            turns: VecDeque::with_capacity(retention_bound),
        }
    }

    pub fn retention_bound(&self) -> usize {
        self.retention_bound
    }

    /// Add a turn at the end, then evict from the front until the bound holds.
    ///
    /// Returns the number of evicted turns.
    pub fn append(&mut self, turn: Turn) -> usize {
        let turn = match self.turns.back() {
            Some(last) => turn.not_before(last.created_at()),
            None => turn,
        };
        self.turns.push_back(turn);

        let mut evicted = 0;
        while self.turns.len() > self.retention_bound {
            self.turns.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// Remove exactly the turn at `index`, keeping the rest in order.
    pub fn delete_at(&mut self, index: usize) -> Result<Turn, TranscriptError> {
        let len = self.turns.len();
        self.turns
            .remove(index)
            .ok_or(TranscriptError::OutOfRange { index, len })
    }

    /// Remove every turn.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Read view of the turns in chronological order.
    pub fn turns(&self) -> &VecDeque<Turn> {
        &self.turns
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Turn> + ExactSizeIterator {
        self.turns.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Turn> {
        self.turns.get(index)
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.back()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Owned copy of the turns, for handing to a renderer or an API body.
    pub fn to_vec(&self) -> Vec<Turn> {
        self.turns.iter().cloned().collect()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Turn;
    type IntoIter = std::collections::vec_deque::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}
