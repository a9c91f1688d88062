use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::LessonId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum VocabularyItemError {
    #[error("front side must not be empty")]
    EmptyFront,

    #[error("back side must not be empty")]
    EmptyBack,
}

/// A single vocabulary entry.
///
/// Immutable once loaded for the duration of a session. Identity for
/// deduplication is `id` when present, otherwise `front` (checked in that
/// priority order), with full equality as the last resort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    front: String,
    back: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lesson: Option<LessonId>,
}

impl VocabularyItem {
    /// Create an item without an explicit id or lesson tag.
    ///
    /// # Errors
    ///
    /// Returns `VocabularyItemError` if either side is empty after trimming.
    pub fn new(
        front: impl Into<String>,
        back: impl Into<String>,
    ) -> Result<Self, VocabularyItemError> {
        Self::build(None, front.into(), back.into(), None)
    }

    /// Create an item with an explicit id.
    ///
    /// # Errors
    ///
    /// Returns `VocabularyItemError` if either side is empty after trimming.
    pub fn with_id(
        id: impl Into<String>,
        front: impl Into<String>,
        back: impl Into<String>,
    ) -> Result<Self, VocabularyItemError> {
        Self::build(Some(id.into()), front.into(), back.into(), None)
    }

    /// Attach a lesson tag.
    #[must_use]
    pub fn in_lesson(mut self, lesson: LessonId) -> Self {
        self.lesson = Some(lesson);
        self
    }

    fn build(
        id: Option<String>,
        front: String,
        back: String,
        lesson: Option<LessonId>,
    ) -> Result<Self, VocabularyItemError> {
        if front.trim().is_empty() {
            return Err(VocabularyItemError::EmptyFront);
        }
        if back.trim().is_empty() {
            return Err(VocabularyItemError::EmptyBack);
        }
        Ok(Self {
            id,
            front,
            back,
            lesson,
        })
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    #[must_use]
    pub fn front(&self) -> &str {
        &self.front
    }

    #[must_use]
    pub fn back(&self) -> &str {
        &self.back
    }

    #[must_use]
    pub fn lesson(&self) -> Option<LessonId> {
        self.lesson
    }

    /// The key used to deduplicate items: `id` if set, otherwise `front`.
    #[must_use]
    pub fn identity_key(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.front)
    }

    /// Identity comparison in priority order: ids when both carry one,
    /// fronts otherwise, full equality as the last resort.
    #[must_use]
    pub fn same_identity(&self, other: &Self) -> bool {
        match (&self.id, &other.id) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.front == other.front,
            _ => self == other,
        }
    }
}
