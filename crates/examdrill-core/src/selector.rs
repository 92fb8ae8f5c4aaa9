//! Layered next-question selection.
//!
//! A [`QuestionSelector`] runs an ordered list of [`SelectionStrategy`]s over
//! the scoped catalog; the first strategy that returns a question wins:
//!
//! 1. [`RetryStrategy`]: missed questions whose spaced-repetition gap elapsed
//! 2. [`WeakQuestionStrategy`]: occasionally, a question the learner flagged
//! 3. [`LevelWeightedStrategy`]: unanswered questions near the learner's level

use std::collections::{HashMap, HashSet};

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

use crate::config::EngineConfig;
use crate::model::{AnswerRecord, LearnerState, Question};

/// Everything a strategy may look at when picking a question.
pub struct SelectionContext<'c, 's> {
    /// Questions in scope, in catalog order. Never empty.
    pub scoped: &'s [&'c Question],
    pub state: &'s LearnerState,
    pub config: &'s EngineConfig,
}

/// One layer of the selection policy.
pub trait SelectionStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Pick a question, or `None` to defer to the next layer.
    fn select<'c>(
        &self,
        ctx: &SelectionContext<'c, '_>,
        rng: &mut dyn RngCore,
    ) -> Option<&'c Question>;
}

// ---------------------------------------------------------------------------
// Scope filtering
// ---------------------------------------------------------------------------

/// Restrict the catalog to the learner's exam mode and, if given, one
/// subcategory. Catalog order is preserved.
pub fn scope_catalog<'c>(
    catalog: &'c [Question],
    state: &LearnerState,
    subcategory: Option<&str>,
) -> Vec<&'c Question> {
    catalog
        .iter()
        .filter(|q| state.settings.exam_mode.admits(q.exam_type))
        .filter(|q| subcategory.map_or(true, |s| q.subcategory == s))
        .collect()
}

// ---------------------------------------------------------------------------
// Spaced repetition
// ---------------------------------------------------------------------------

/// Retry bookkeeping for one question whose latest answer was wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryInfo {
    /// Wrong answers since the last correct one.
    pub wrong_count: u32,
    /// Position of the most recent answer in the history.
    pub last_index: usize,
}

/// Scan the history for questions whose most recent answer was wrong.
///
/// A correct answer clears everything recorded for that question before it.
pub fn pending_retries(history: &[AnswerRecord]) -> HashMap<&str, RetryInfo> {
    let mut pending: HashMap<&str, RetryInfo> = HashMap::new();
    for (index, record) in history.iter().enumerate() {
        if record.is_correct {
            pending.remove(record.question_id.as_str());
        } else {
            let info = pending.entry(record.question_id.as_str()).or_insert(RetryInfo {
                wrong_count: 0,
                last_index: index,
            });
            info.wrong_count += 1;
            info.last_index = index;
        }
    }
    pending
}

/// Brings back a missed question once enough other answers went by.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryStrategy;

impl SelectionStrategy for RetryStrategy {
    fn name(&self) -> &'static str {
        "retry"
    }

    fn select<'c>(
        &self,
        ctx: &SelectionContext<'c, '_>,
        _rng: &mut dyn RngCore,
    ) -> Option<&'c Question> {
        let history = &ctx.state.history;
        let pending = pending_retries(history);
        if pending.is_empty() {
            return None;
        }

        ctx.scoped.iter().copied().find(|q| {
            pending.get(q.question_id.as_str()).is_some_and(|info| {
                let since = history.len() - info.last_index - 1;
                since >= ctx.config.retry.gap_for(info.wrong_count)
            })
        })
    }
}

// ---------------------------------------------------------------------------
// Weak questions
// ---------------------------------------------------------------------------

/// With a fixed probability, serves one of the learner's flagged questions.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeakQuestionStrategy;

impl SelectionStrategy for WeakQuestionStrategy {
    fn name(&self) -> &'static str {
        "weak-question"
    }

    fn select<'c>(
        &self,
        ctx: &SelectionContext<'c, '_>,
        rng: &mut dyn RngCore,
    ) -> Option<&'c Question> {
        if ctx.state.weak_questions.is_empty() {
            return None;
        }
        let weak: Vec<&'c Question> = ctx
            .scoped
            .iter()
            .copied()
            .filter(|q| ctx.state.is_weak(&q.question_id))
            .collect();
        if weak.is_empty() || !rng.gen_bool(ctx.config.weak_question_probability) {
            return None;
        }
        weak.choose(rng).copied()
    }
}

// ---------------------------------------------------------------------------
// Level weighting
// ---------------------------------------------------------------------------

/// Prefers unanswered questions at or next to the learner's level for their
/// subcategory.
///
/// Level-matched questions weigh [`LevelWeighting::exact`], neighbours
/// [`LevelWeighting::adjacent`]; anything further away is left out. When
/// nothing is within reach the pick is uniform over the pool.
///
/// [`LevelWeighting::exact`]: crate::config::LevelWeighting::exact
/// [`LevelWeighting::adjacent`]: crate::config::LevelWeighting::adjacent
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelWeightedStrategy;

impl SelectionStrategy for LevelWeightedStrategy {
    fn name(&self) -> &'static str {
        "level-weighted"
    }

    fn select<'c>(
        &self,
        ctx: &SelectionContext<'c, '_>,
        rng: &mut dyn RngCore,
    ) -> Option<&'c Question> {
        let pool = unanswered_pool(ctx.scoped, ctx.state);

        let (candidates, weights): (Vec<&'c Question>, Vec<u32>) = pool
            .iter()
            .filter_map(|q| {
                let learner_level = ctx.state.levels.categories.get(&q.subcategory);
                ctx.config
                    .weighting
                    .weight_for(q.level.abs_diff(learner_level))
                    .map(|w| (*q, w))
            })
            .unzip();

        if candidates.is_empty() {
            return pool.choose(rng).copied();
        }

        match WeightedIndex::new(&weights) {
            Ok(dist) => Some(candidates[dist.sample(rng)]),
            Err(e) => {
                tracing::warn!("level weights unusable ({e}), picking uniformly");
                pool.choose(rng).copied()
            }
        }
    }
}

/// Scoped questions never answered, or the whole scope once everything was.
fn unanswered_pool<'c>(scoped: &[&'c Question], state: &LearnerState) -> Vec<&'c Question> {
    let answered: HashSet<&str> = state
        .history
        .iter()
        .map(|r| r.question_id.as_str())
        .collect();
    let unanswered: Vec<&'c Question> = scoped
        .iter()
        .copied()
        .filter(|q| !answered.contains(q.question_id.as_str()))
        .collect();
    if unanswered.is_empty() {
        scoped.to_vec()
    } else {
        unanswered
    }
}

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

/// Composes strategies into the full selection policy.
pub struct QuestionSelector {
    config: EngineConfig,
    strategies: Vec<Box<dyn SelectionStrategy>>,
}

impl Default for QuestionSelector {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl QuestionSelector {
    /// The standard retry → weak question → level-weighted chain.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_strategies(
            config,
            vec![
                Box::new(RetryStrategy),
                Box::new(WeakQuestionStrategy),
                Box::new(LevelWeightedStrategy),
            ],
        )
    }

    /// A selector running `strategies` in order.
    pub fn with_strategies(
        config: EngineConfig,
        strategies: Vec<Box<dyn SelectionStrategy>>,
    ) -> Self {
        Self { config, strategies }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Pick the next question to present.
    ///
    /// Returns `None` only when no question survives scope filtering. If
    /// every strategy defers, a scoped question is picked uniformly.
    pub fn select<'c, R: RngCore>(
        &self,
        catalog: &'c [Question],
        state: &LearnerState,
        subcategory: Option<&str>,
        rng: &mut R,
    ) -> Option<&'c Question> {
        let scoped = scope_catalog(catalog, state, subcategory);
        if scoped.is_empty() {
            tracing::debug!(
                exam_mode = %state.settings.exam_mode,
                subcategory,
                "no questions in scope"
            );
            return None;
        }

        let ctx = SelectionContext {
            scoped: &scoped,
            state,
            config: &self.config,
        };
        let rng: &mut dyn RngCore = rng;

        for strategy in &self.strategies {
            if let Some(question) = strategy.select(&ctx, rng) {
                tracing::debug!(
                    strategy = strategy.name(),
                    question = %question.question_id,
                    "selected next question"
                );
                return Some(question);
            }
        }

        scoped.choose(rng).copied()
    }
}

/// [`QuestionSelector::select`] with the default configuration.
///
/// Builds a fresh [`QuestionSelector`] on every call. Callers picking
/// questions in a loop should hold a `QuestionSelector` or a
/// [`StudyEngine`](crate::engine::StudyEngine) and call it instead.
pub fn select_next<'c, R: RngCore>(
    catalog: &'c [Question],
    state: &LearnerState,
    subcategory: Option<&str>,
    rng: &mut R,
) -> Option<&'c Question> {
    QuestionSelector::default().select(catalog, state, subcategory, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExamModeFilter, ExamPart};
    use chrono::Utc;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn question(id: &str, part: ExamPart, subcategory: &str, level: u8) -> Question {
        Question {
            question_id: id.into(),
            exam_type: part,
            category: "テクノロジ系".into(),
            subcategory: subcategory.into(),
            level,
            choices: vec![],
            content: serde_json::Map::new(),
        }
    }

    fn answer(id: &str, subcategory: &str, correct: bool) -> AnswerRecord {
        AnswerRecord {
            question_id: id.into(),
            answered_at: Utc::now(),
            selected_choice: "a".into(),
            is_correct: correct,
            time_spent: 0,
            category: "テクノロジ系".into(),
            subcategory: subcategory.into(),
        }
    }

    fn catalog() -> Vec<Question> {
        vec![
            question("a1", ExamPart::PartA, "database", 1),
            question("a2", ExamPart::PartA, "database", 2),
            question("a3", ExamPart::PartA, "network", 1),
            question("a4", ExamPart::PartA, "network", 5),
            question("b1", ExamPart::PartB, "algorithm-programming", 1),
        ]
    }

    fn rng(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }

    /// A strategy that always defers.
    struct Never;

    impl SelectionStrategy for Never {
        fn name(&self) -> &'static str {
            "never"
        }

        fn select<'c>(
            &self,
            _ctx: &SelectionContext<'c, '_>,
            _rng: &mut dyn RngCore,
        ) -> Option<&'c Question> {
            None
        }
    }

    #[test]
    fn scope_all_preserves_catalog() {
        let catalog = catalog();
        let state = LearnerState::new();
        let scoped = scope_catalog(&catalog, &state, None);
        let ids: Vec<&str> = scoped.iter().map(|q| q.question_id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a2", "a3", "a4", "b1"]);
    }

    #[test]
    fn scope_by_exam_mode_and_subcategory() {
        let catalog = catalog();
        let mut state = LearnerState::new();
        state.settings.exam_mode = ExamModeFilter::PartBOnly;
        let scoped = scope_catalog(&catalog, &state, None);
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].question_id, "b1");

        state.settings.exam_mode = ExamModeFilter::PartAOnly;
        let scoped = scope_catalog(&catalog, &state, Some("network"));
        let ids: Vec<&str> = scoped.iter().map(|q| q.question_id.as_str()).collect();
        assert_eq!(ids, vec!["a3", "a4"]);
    }

    #[test]
    fn empty_scope_returns_none() {
        let catalog = vec![question("a1", ExamPart::PartA, "database", 1)];
        let mut state = LearnerState::new();
        state.settings.exam_mode = ExamModeFilter::PartBOnly;
        assert!(select_next(&catalog, &state, None, &mut rng(1)).is_none());

        state.settings.exam_mode = ExamModeFilter::All;
        assert!(select_next(&catalog, &state, Some("security"), &mut rng(1)).is_none());
        assert!(select_next(&[], &state, None, &mut rng(1)).is_none());
    }

    #[test]
    fn pending_retries_cleared_by_correct_answer() {
        let history = vec![
            answer("q1", "database", false),
            answer("q2", "database", false),
            answer("q1", "database", false),
            answer("q2", "database", true),
        ];
        let pending = pending_retries(&history);
        assert_eq!(pending.len(), 1);
        assert_eq!(
            pending["q1"],
            RetryInfo {
                wrong_count: 2,
                last_index: 2
            }
        );

        let history = vec![
            answer("q1", "database", false),
            answer("q1", "database", true),
            answer("q1", "database", false),
        ];
        let pending = pending_retries(&history);
        assert_eq!(pending["q1"].wrong_count, 1);
    }

    #[test]
    fn retry_due_after_gap_wins_over_everything() {
        let catalog = catalog();
        let mut state = LearnerState::new();
        state.history = vec![
            answer("a4", "network", false),
            answer("a1", "database", true),
            answer("a2", "database", true),
            answer("b1", "algorithm-programming", true),
        ];
        // Flag every other question as weak and make the weak layer certain.
        for id in ["a1", "a2", "a3", "b1"] {
            state.toggle_weak_question(id);
        }
        let selector = QuestionSelector::new(EngineConfig {
            weak_question_probability: 1.0,
            ..EngineConfig::default()
        });

        for seed in 0..20 {
            let picked = selector.select(&catalog, &state, None, &mut rng(seed)).unwrap();
            assert_eq!(picked.question_id, "a4");
        }
    }

    #[test]
    fn retry_not_due_before_gap() {
        let catalog = catalog();
        let mut state = LearnerState::new();
        state.history = vec![
            answer("a4", "network", false),
            answer("a1", "database", true),
            answer("a2", "database", true),
        ];
        let ctx = SelectionContext {
            scoped: &scope_catalog(&catalog, &state, None),
            state: &state,
            config: &EngineConfig::default(),
        };
        assert!(RetryStrategy.select(&ctx, &mut rng(0)).is_none());
    }

    #[test]
    fn retry_gap_grows_with_second_miss() {
        let catalog = catalog();
        let mut state = LearnerState::new();
        state.history = vec![answer("a4", "network", false), answer("a4", "network", false)];
        for _ in 0..9 {
            state.history.push(answer("a1", "database", true));
        }
        let config = EngineConfig::default();
        let scoped = scope_catalog(&catalog, &state, None);

        let ctx = SelectionContext {
            scoped: &scoped,
            state: &state,
            config: &config,
        };
        assert!(RetryStrategy.select(&ctx, &mut rng(0)).is_none());

        state.history.push(answer("a2", "database", true));
        let ctx = SelectionContext {
            scoped: &scoped,
            state: &state,
            config: &config,
        };
        assert_eq!(
            RetryStrategy.select(&ctx, &mut rng(0)).unwrap().question_id,
            "a4"
        );
    }

    #[test]
    fn retry_after_third_miss_due_after_five() {
        let catalog = catalog();
        let mut state = LearnerState::new();
        state.history = vec![answer("a4", "network", false); 3];
        for _ in 0..4 {
            state.history.push(answer("a1", "database", true));
        }
        let config = EngineConfig::default();
        let scoped = scope_catalog(&catalog, &state, None);

        let ctx = SelectionContext {
            scoped: &scoped,
            state: &state,
            config: &config,
        };
        assert!(RetryStrategy.select(&ctx, &mut rng(0)).is_none(), "not due after 4");

        state.history.push(answer("a2", "database", true));
        let ctx = SelectionContext {
            scoped: &scoped,
            state: &state,
            config: &config,
        };
        assert_eq!(
            RetryStrategy.select(&ctx, &mut rng(0)).unwrap().question_id,
            "a4"
        );
    }

    #[test]
    fn retry_ties_broken_by_catalog_order() {
        let catalog = catalog();
        let mut state = LearnerState::new();
        state.history = vec![
            answer("a3", "network", false),
            answer("a1", "database", false),
            answer("b1", "algorithm-programming", true),
            answer("b1", "algorithm-programming", true),
            answer("b1", "algorithm-programming", true),
        ];
        let picked = select_next(&catalog, &state, None, &mut rng(3)).unwrap();
        assert_eq!(picked.question_id, "a1");
    }

    #[test]
    fn retry_ignores_questions_out_of_scope() {
        let catalog = catalog();
        let mut state = LearnerState::new();
        state.history = vec![
            answer("b1", "algorithm-programming", false),
            answer("a1", "database", true),
            answer("a2", "database", true),
            answer("a3", "network", true),
        ];
        state.settings.exam_mode = ExamModeFilter::PartAOnly;
        let picked = select_next(&catalog, &state, None, &mut rng(9)).unwrap();
        assert_ne!(picked.question_id, "b1");
    }

    #[test]
    fn weak_question_served_when_probability_is_certain() {
        let catalog = catalog();
        let mut state = LearnerState::new();
        state.toggle_weak_question("a4");
        let selector = QuestionSelector::new(EngineConfig {
            weak_question_probability: 1.0,
            ..EngineConfig::default()
        });
        for seed in 0..20 {
            let picked = selector.select(&catalog, &state, None, &mut rng(seed)).unwrap();
            assert_eq!(picked.question_id, "a4");
        }
    }

    #[test]
    fn weak_question_skipped_when_probability_is_zero() {
        let catalog = catalog();
        let mut state = LearnerState::new();
        state.toggle_weak_question("a4");
        let selector = QuestionSelector::new(EngineConfig {
            weak_question_probability: 0.0,
            ..EngineConfig::default()
        });
        for seed in 0..50 {
            let picked = selector.select(&catalog, &state, None, &mut rng(seed)).unwrap();
            // a4 is level 5 against a learner at 1, so only weak selection reaches it.
            assert_ne!(picked.question_id, "a4");
        }
    }

    #[test]
    fn weak_question_served_about_one_in_five_by_default() {
        let catalog = catalog();
        let mut state = LearnerState::new();
        state.toggle_weak_question("a4");
        let selector = QuestionSelector::default();

        let mut rng = rng(7);
        let mut weak = 0;
        let draws = 3_000;
        for _ in 0..draws {
            // a4 is out of the level band, so every hit came from the weak layer.
            if selector.select(&catalog, &state, None, &mut rng).unwrap().question_id == "a4" {
                weak += 1;
            }
        }
        let ratio = weak as f64 / draws as f64;
        assert!((0.17..0.23).contains(&ratio), "expected ~0.2, got {ratio}");
    }

    #[test]
    fn weak_question_out_of_scope_defers() {
        let catalog = catalog();
        let mut state = LearnerState::new();
        state.toggle_weak_question("b1");
        state.settings.exam_mode = ExamModeFilter::PartAOnly;
        let config = EngineConfig {
            weak_question_probability: 1.0,
            ..EngineConfig::default()
        };
        let scoped = scope_catalog(&catalog, &state, None);
        let ctx = SelectionContext {
            scoped: &scoped,
            state: &state,
            config: &config,
        };
        assert!(WeakQuestionStrategy.select(&ctx, &mut rng(0)).is_none());
    }

    #[test]
    fn level_weighting_excludes_distant_questions() {
        let catalog = catalog();
        let state = LearnerState::new();
        for seed in 0..100 {
            let picked = select_next(&catalog, &state, None, &mut rng(seed)).unwrap();
            assert_ne!(picked.question_id, "a4", "level 5 is out of reach for level 1");
        }
    }

    #[test]
    fn level_weighting_prefers_unanswered() {
        let catalog = catalog();
        let mut state = LearnerState::new();
        state.history = vec![
            answer("a1", "database", true),
            answer("a3", "network", true),
            answer("b1", "algorithm-programming", true),
        ];
        for seed in 0..30 {
            let picked = select_next(&catalog, &state, None, &mut rng(seed)).unwrap();
            assert_eq!(picked.question_id, "a2");
        }
    }

    #[test]
    fn level_weighting_reuses_scope_once_all_answered() {
        let catalog = vec![question("a1", ExamPart::PartA, "database", 1)];
        let mut state = LearnerState::new();
        state.history = vec![answer("a1", "database", true)];
        let picked = select_next(&catalog, &state, None, &mut rng(0)).unwrap();
        assert_eq!(picked.question_id, "a1");
    }

    #[test]
    fn level_weighting_falls_back_to_uniform() {
        let catalog = vec![
            question("hard1", ExamPart::PartA, "database", 8),
            question("hard2", ExamPart::PartA, "database", 9),
        ];
        let state = LearnerState::new();
        let picked = select_next(&catalog, &state, None, &mut rng(5)).unwrap();
        assert!(picked.question_id.starts_with("hard"));
    }

    #[test]
    fn level_matched_roughly_twice_as_likely_as_adjacent() {
        let catalog = vec![
            question("match", ExamPart::PartA, "database", 3),
            question("above", ExamPart::PartA, "database", 4),
        ];
        let mut state = LearnerState::new();
        state.levels.categories.set("database", 3);

        let mut rng = rng(42);
        let mut matched = 0;
        let draws = 3_000;
        for _ in 0..draws {
            if select_next(&catalog, &state, None, &mut rng).unwrap().question_id == "match" {
                matched += 1;
            }
        }
        let ratio = matched as f64 / draws as f64;
        assert!((0.6..0.73).contains(&ratio), "expected ~2/3, got {ratio}");
    }

    #[test]
    fn level_weighting_uses_subcategory_level() {
        let catalog = vec![
            question("db-low", ExamPart::PartA, "database", 1),
            question("net-high", ExamPart::PartA, "network", 6),
        ];
        let mut state = LearnerState::new();
        state.levels.categories.set("database", 6);
        state.levels.categories.set("network", 6);
        for seed in 0..20 {
            let picked = select_next(&catalog, &state, None, &mut rng(seed)).unwrap();
            assert_eq!(picked.question_id, "net-high");
        }
    }

    #[test]
    fn selection_does_not_touch_state() {
        let catalog = catalog();
        let mut state = LearnerState::new();
        state.history = vec![answer("a1", "database", false)];
        let before = state.clone();
        select_next(&catalog, &state, None, &mut rng(0));
        assert_eq!(state, before);
    }

    #[test]
    fn deferring_chain_still_picks_in_scope() {
        let catalog = catalog();
        let state = LearnerState::new();
        let selector =
            QuestionSelector::with_strategies(EngineConfig::default(), vec![Box::new(Never)]);
        assert_eq!(selector.strategy_names(), vec!["never"]);
        assert!(selector.select(&catalog, &state, None, &mut rng(0)).is_some());
    }

    #[test]
    fn default_chain_order() {
        let selector = QuestionSelector::default();
        assert_eq!(
            selector.strategy_names(),
            vec!["retry", "weak-question", "level-weighted"]
        );
    }
}
