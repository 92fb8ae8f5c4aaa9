//! The study engine: one entry point for picking and recording questions.

use chrono::{NaiveDate, Utc};
use rand::RngCore;

use crate::config::EngineConfig;
use crate::mastery::{update_streak_on, MasteryTracker};
use crate::model::{AnswerRecord, LearnerState, LevelChangeResult, Question};
use crate::selector::QuestionSelector;

/// Ties the selector and the mastery tracker to a single configuration.
pub struct StudyEngine {
    config: EngineConfig,
    selector: QuestionSelector,
    tracker: MasteryTracker,
}

impl Default for StudyEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl StudyEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            selector: QuestionSelector::new(config.clone()),
            tracker: MasteryTracker::new(config.clone()),
            config,
        }
    }

    /// Use a custom selector, for example one with a different strategy chain.
    pub fn with_selector(mut self, selector: QuestionSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Pick the next question for the learner. `None` means nothing is in
    /// scope for the current exam mode and subcategory.
    pub fn next_question<'c, R: RngCore>(
        &self,
        catalog: &'c [Question],
        state: &LearnerState,
        subcategory: Option<&str>,
        rng: &mut R,
    ) -> Option<&'c Question> {
        self.selector.select(catalog, state, subcategory, rng)
    }

    /// Record an answer given today.
    pub fn record_answer(
        &self,
        state: &mut LearnerState,
        record: AnswerRecord,
    ) -> LevelChangeResult {
        self.record_answer_on(state, record, Utc::now().date_naive())
    }

    /// Append the answer to the history, update the subcategory's level and
    /// the overall level, then count `today` towards the study streak.
    pub fn record_answer_on(
        &self,
        state: &mut LearnerState,
        record: AnswerRecord,
        today: NaiveDate,
    ) -> LevelChangeResult {
        let subcategory = record.subcategory.clone();
        let is_correct = record.is_correct;
        state.history.push(record);

        let result = self.tracker.record_outcome(state, &subcategory, is_correct);
        update_streak_on(state, today);
        result
    }
}
