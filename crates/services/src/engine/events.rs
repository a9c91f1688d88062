use vocab_core::model::VocabularyItem;

use super::session::GameResults;
use crate::lesson_manager::LessonSelection;

/// Observer contract between the engine and page-level UI.
///
/// Every hook is optional (default no-op); the engine never depends on any
/// of them being implemented. Hooks fire synchronously, in the order the
/// engine performs the corresponding transitions.
pub trait GameEvents: Send + Sync {
    /// A fresh session started over the given shuffled items.
    fn on_game_start(&self, _items: &[VocabularyItem]) {}

    /// An item became the current one. `index` is 0-based, `total` is the
    /// session length.
    fn on_display_item(&self, _item: &VocabularyItem, _index: usize, _total: usize) {}

    fn on_correct(&self, _item: &VocabularyItem) {}

    fn on_wrong(&self, _item: &VocabularyItem) {}

    fn on_skipped(&self, _item: &VocabularyItem) {}

    /// The sequence is exhausted and final results are available.
    fn on_game_end(&self, _results: &GameResults) {}

    /// A retry pass over previously missed items started.
    fn on_retry_start(&self, _items: &[VocabularyItem]) {}

    /// The lesson scope changed; a new session over it follows.
    fn on_lesson_change(&self, _selection: LessonSelection) {}
}

/// Silent observer for headless and test use.
pub struct NoopEvents;

impl GameEvents for NoopEvents {}
