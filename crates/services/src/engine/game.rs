use std::sync::Arc;

use vocab_core::model::{AnswerKind, GameId, VocabularyItem};

use crate::lesson_manager::{LessonManager, LessonSelection, LessonSelectorOptions};
use crate::stats::{SessionOptions, StatisticsService};
use crate::vocabulary_service::{SourceTier, VocabularyService};

use super::events::{GameEvents, NoopEvents};
use super::session::{GameResults, GameSession};

/// Static description of one game: its identity, which vocabulary set it
/// plays over, and whether it offers a lesson selector.
#[derive(Debug, Clone)]
pub struct GameConfig {
    game_id: GameId,
    kind: String,
    lesson_selector: Option<LessonSelectorOptions>,
}

impl GameConfig {
    #[must_use]
    pub fn new(game_id: GameId, kind: impl Into<String>) -> Self {
        Self {
            game_id,
            kind: kind.into(),
            lesson_selector: None,
        }
    }

    /// Enable the lesson selector for this game.
    #[must_use]
    pub fn with_lesson_selector(mut self, options: LessonSelectorOptions) -> Self {
        self.lesson_selector = Some(options);
        self
    }

    #[must_use]
    pub fn game_id(&self) -> &GameId {
        &self.game_id
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }
}

/// Orchestrates one game: loads vocabulary through the tiered service,
/// drives the session state machine, reports lifecycle transitions to the
/// event observer, and feeds the statistics recorder.
///
/// Nothing here returns an error. Vocabulary loading degrades through its
/// tiers down to the embedded defaults, statistics failures are logged and
/// swallowed inside the recorder, and invalid inputs (answering twice,
/// retrying with nothing to retry) report `false` instead of failing.
pub struct GameEngine {
    config: GameConfig,
    vocabulary: Arc<VocabularyService>,
    statistics: StatisticsService,
    events: Arc<dyn GameEvents>,
    embedded: Vec<VocabularyItem>,
    full_set: Vec<VocabularyItem>,
    lessons: Option<LessonManager>,
    vocabulary_source: SourceTier,
    session: Option<GameSession>,
}

impl GameEngine {
    #[must_use]
    pub fn new(
        config: GameConfig,
        vocabulary: Arc<VocabularyService>,
        statistics: StatisticsService,
    ) -> Self {
        Self {
            config,
            vocabulary,
            statistics,
            events: Arc::new(NoopEvents),
            embedded: Vec::new(),
            full_set: Vec::new(),
            lessons: None,
            vocabulary_source: SourceTier::Embedded,
            session: None,
        }
    }

    /// Attach the event observer.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn GameEvents>) -> Self {
        self.events = events;
        self
    }

    /// Items to fall back on when every vocabulary tier misses.
    #[must_use]
    pub fn with_embedded_defaults(mut self, items: Vec<VocabularyItem>) -> Self {
        self.embedded = items;
        self
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    /// Which tier fed the current item set. Meaningful after `init`.
    #[must_use]
    pub fn vocabulary_source(&self) -> SourceTier {
        self.vocabulary_source
    }

    #[must_use]
    pub fn lessons(&self) -> Option<&LessonManager> {
        self.lessons.as_ref()
    }

    #[must_use]
    pub fn results(&self) -> Option<GameResults> {
        self.session.as_ref().map(GameSession::results)
    }

    /// Load vocabulary and start the first session.
    ///
    /// Returns false only when no tier, embedded defaults included, yields
    /// a single item; there is nothing to play then.
    pub async fn init(&mut self) -> bool {
        let resolution = self.vocabulary.resolve(self.config.kind()).await;
        self.vocabulary_source = resolution.status.tier;
        let items = match resolution.items {
            Some(items) => items,
            None => self.embedded.clone(),
        };

        if items.is_empty() {
            return false;
        }

        self.lessons = self
            .config
            .lesson_selector
            .map(|options| LessonManager::with_options(items.clone(), options));
        self.full_set = items;

        self.start_game().await;
        true
    }

    /// Start a fresh session over the current lesson scope, or the full set
    /// when the game has no lesson selector.
    pub async fn start_game(&mut self) {
        let items = match &self.lessons {
            Some(lessons) => lessons.current_items(),
            None => self.full_set.clone(),
        };
        self.begin_session(items, false).await;
    }

    /// Record the current item as answered correctly.
    pub async fn record_correct(&mut self) -> bool {
        self.record(AnswerKind::Correct).await
    }

    /// Record the current item as answered wrong; it joins the retry set.
    pub async fn record_wrong(&mut self) -> bool {
        self.record(AnswerKind::Wrong).await
    }

    /// Skip the current item; it joins the retry set like a wrong answer.
    pub async fn record_skipped(&mut self) -> bool {
        self.record(AnswerKind::Skipped).await
    }

    /// Move on to the next item, or finish the game when the sequence is
    /// exhausted.
    pub async fn next_item(&mut self) {
        if let Some(session) = &mut self.session {
            session.advance();
        }
        self.display_current().await;
    }

    /// Throw away the current session and play the same scope again.
    pub async fn restart_game(&mut self) {
        self.start_game().await;
    }

    /// Start a retry pass over the items missed so far. Returns false when
    /// there is nothing to retry.
    pub async fn retry_wrong_items(&mut self) -> bool {
        let wrong = match &mut self.session {
            Some(session) => session.take_wrong_items(),
            None => return false,
        };
        if wrong.is_empty() {
            return false;
        }

        self.events.on_retry_start(&wrong);
        self.begin_session(wrong, true).await;
        true
    }

    /// Re-shuffle the current sequence in place, without starting a new
    /// statistics session.
    pub async fn shuffle_current_items(&mut self) {
        if let Some(session) = &mut self.session {
            session.reshuffle();
        }
        self.display_current().await;
    }

    /// Switch the lesson scope and start a fresh session over it. Returns
    /// false when the game has no lesson selector or the selection did not
    /// change.
    pub async fn select_lesson(&mut self, selection: LessonSelection) -> bool {
        let Some(lessons) = &mut self.lessons else {
            return false;
        };
        if !lessons.select(selection) {
            return false;
        }

        self.events.on_lesson_change(selection);
        self.start_game().await;
        true
    }

    async fn begin_session(&mut self, items: Vec<VocabularyItem>, is_retry: bool) {
        let session = GameSession::start(items, is_retry);

        let options = SessionOptions {
            total_words: u32::try_from(session.total()).unwrap_or(u32::MAX),
            lesson: self.lesson_label(),
            difficulty: None,
            is_retry_mode: is_retry,
            source: self.vocabulary_source.as_str().to_string(),
        };
        self.statistics
            .start_session(self.config.game_id.clone(), options)
            .await;

        if !is_retry {
            self.events.on_game_start(session.items());
        }
        self.session = Some(session);
        self.display_current().await;
    }

    async fn record(&mut self, kind: AnswerKind) -> bool {
        let Some(session) = &mut self.session else {
            return false;
        };
        let Some(item) = session.current().cloned() else {
            return false;
        };
        if !session.record(kind) {
            return false;
        }

        self.statistics.record_answer(kind).await;
        match kind {
            AnswerKind::Correct => self.events.on_correct(&item),
            AnswerKind::Wrong => self.events.on_wrong(&item),
            AnswerKind::Skipped => self.events.on_skipped(&item),
        }
        true
    }

    async fn display_current(&mut self) {
        let Some(session) = &mut self.session else {
            return;
        };

        if session.is_finished() {
            // mark_ended guards the end transition; landing on the terminal
            // position twice must not finalize twice.
            if session.mark_ended() {
                let results = session.results();
                self.statistics.end_session().await;
                self.events.on_game_end(&results);
            }
            return;
        }

        if let Some(item) = session.current().cloned() {
            let index = session.cursor();
            let total = session.total();
            self.events.on_display_item(&item, index, total);
        }
    }

    fn lesson_label(&self) -> Option<String> {
        match self.lessons.as_ref().map(LessonManager::current) {
            Some(LessonSelection::Lesson(id)) => Some(id.to_string()),
            _ => None,
        }
    }
}
