use vocab_core::model::{LessonId, VocabularyItem};

/// Scope of the active item set: one lesson, or everything combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LessonSelection {
    /// Sentinel for "all lessons combined"; the default.
    #[default]
    All,
    Lesson(LessonId),
}

/// Configuration forwarded to the UI collaborator that renders the lesson
/// selector; the manager itself only owns selection state.
#[derive(Debug, Clone, Copy, Default)]
pub struct LessonSelectorOptions {
    pub include_shuffle_button: bool,
}

/// Derives lesson partitions from a flat vocabulary list and tracks the
/// current selection.
pub struct LessonManager {
    items: Vec<VocabularyItem>,
    current: LessonSelection,
    options: LessonSelectorOptions,
}

impl LessonManager {
    #[must_use]
    pub fn new(items: Vec<VocabularyItem>) -> Self {
        Self::with_options(items, LessonSelectorOptions::default())
    }

    #[must_use]
    pub fn with_options(items: Vec<VocabularyItem>, options: LessonSelectorOptions) -> Self {
        Self {
            items,
            current: LessonSelection::All,
            options,
        }
    }

    /// Distinct lesson identifiers, ascending. Untagged items belong only
    /// to the "all" scope.
    #[must_use]
    pub fn lesson_ids(&self) -> Vec<LessonId> {
        let mut ids: Vec<LessonId> = self.items.iter().filter_map(VocabularyItem::lesson).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Items scoped to the given selection.
    #[must_use]
    pub fn items_for(&self, selection: LessonSelection) -> Vec<VocabularyItem> {
        match selection {
            LessonSelection::All => self.items.clone(),
            LessonSelection::Lesson(id) => self
                .items
                .iter()
                .filter(|item| item.lesson() == Some(id))
                .cloned()
                .collect(),
        }
    }

    /// Items scoped to the current selection.
    #[must_use]
    pub fn current_items(&self) -> Vec<VocabularyItem> {
        self.items_for(self.current)
    }

    #[must_use]
    pub fn current(&self) -> LessonSelection {
        self.current
    }

    /// Change the current selection; returns whether it actually changed.
    pub fn select(&mut self, selection: LessonSelection) -> bool {
        if self.current == selection {
            return false;
        }
        self.current = selection;
        true
    }

    #[must_use]
    pub fn options(&self) -> LessonSelectorOptions {
        self.options
    }
}
