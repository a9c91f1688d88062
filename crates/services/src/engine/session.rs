use rand::rng;
use rand::seq::SliceRandom;

use vocab_core::model::{AnswerKind, VocabularyItem, score_percent};

/// End-of-game report handed to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameResults {
    pub correct_count: u32,
    pub wrong_count: u32,
    pub skipped_count: u32,
    pub total: usize,
    /// `round(100 · correct / total)`, 0 for an empty session.
    pub percentage: u8,
    pub wrong_items: Vec<VocabularyItem>,
    pub is_retry_mode: bool,
}

/// In-memory state of one play-through: a shuffled permutation of the
/// active item set, a monotonically advancing cursor, and the per-pass
/// counters.
///
/// At most one of correct/wrong/skipped applies per displayed item; the
/// `has_answered` guard rejects the rest. Items answered wrong or skipped
/// land in the deduplicated wrong-item set that feeds a retry pass.
pub struct GameSession {
    items: Vec<VocabularyItem>,
    cursor: usize,
    correct: u32,
    wrong: u32,
    skipped: u32,
    wrong_items: Vec<VocabularyItem>,
    is_retry: bool,
    has_answered: bool,
    ended: bool,
}

impl GameSession {
    /// Shuffle `items` into a fresh session with zeroed counters.
    #[must_use]
    pub fn start(mut items: Vec<VocabularyItem>, is_retry: bool) -> Self {
        items.shuffle(&mut rng());
        Self {
            items,
            cursor: 0,
            correct: 0,
            wrong: 0,
            skipped: 0,
            wrong_items: Vec::new(),
            is_retry,
            has_answered: false,
            ended: false,
        }
    }

    #[must_use]
    pub fn items(&self) -> &[VocabularyItem] {
        &self.items
    }

    #[must_use]
    pub fn current(&self) -> Option<&VocabularyItem> {
        self.items.get(self.cursor)
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.items.len()
    }

    #[must_use]
    pub fn is_retry(&self) -> bool {
        self.is_retry
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn wrong_count(&self) -> u32 {
        self.wrong
    }

    #[must_use]
    pub fn skipped_count(&self) -> u32 {
        self.skipped
    }

    #[must_use]
    pub fn wrong_items(&self) -> &[VocabularyItem] {
        &self.wrong_items
    }

    /// Score the current item. Returns false when the item was already
    /// answered or the sequence is exhausted; counters are untouched then.
    pub fn record(&mut self, kind: AnswerKind) -> bool {
        if self.has_answered {
            return false;
        }
        let Some(current) = self.items.get(self.cursor) else {
            return false;
        };

        match kind {
            AnswerKind::Correct => self.correct += 1,
            AnswerKind::Wrong => self.wrong += 1,
            AnswerKind::Skipped => self.skipped += 1,
        }
        if kind.feeds_retry() {
            let current = current.clone();
            if !self.wrong_items.iter().any(|i| i.same_identity(&current)) {
                self.wrong_items.push(current);
            }
        }

        self.has_answered = true;
        true
    }

    /// Advance to the next item and re-arm the answer guard. Saturates at
    /// the terminal position.
    pub fn advance(&mut self) {
        if self.cursor < self.items.len() {
            self.cursor += 1;
        }
        self.has_answered = false;
    }

    /// Re-shuffle the sequence in place and reset the cursor. Counters are
    /// deliberately left alone; this is lighter-weight than a restart. An
    /// ended session stays ended; replaying takes a fresh start.
    pub fn reshuffle(&mut self) {
        if self.ended {
            return;
        }
        self.items.shuffle(&mut rng());
        self.cursor = 0;
        self.has_answered = false;
    }

    /// Flip the session into its ended state; false if already ended.
    pub fn mark_ended(&mut self) -> bool {
        if self.ended {
            return false;
        }
        self.ended = true;
        true
    }

    /// Drain the wrong-item set for a retry pass.
    pub fn take_wrong_items(&mut self) -> Vec<VocabularyItem> {
        std::mem::take(&mut self.wrong_items)
    }

    #[must_use]
    pub fn results(&self) -> GameResults {
        let total = self.items.len();
        GameResults {
            correct_count: self.correct,
            wrong_count: self.wrong,
            skipped_count: self.skipped,
            total,
            percentage: score_percent(self.correct, u32::try_from(total).unwrap_or(u32::MAX)),
            wrong_items: self.wrong_items.clone(),
            is_retry_mode: self.is_retry,
        }
    }
}
