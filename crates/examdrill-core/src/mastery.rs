//! Mastery tracking: streak-driven level transitions, the weighted overall
//! level, and day-based study streaks.

use chrono::{NaiveDate, Utc};

use crate::config::EngineConfig;
use crate::domains::{Domain, DomainTable};
use crate::model::{
    LearnerState, LevelChangeResult, LevelDirection, LevelMap, MAX_LEVEL, MIN_LEVEL,
};

/// Applies answer outcomes to a [`LearnerState`].
#[derive(Debug, Clone, Default)]
pub struct MasteryTracker {
    config: EngineConfig,
}

impl MasteryTracker {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Record one answer for `subcategory` and move its level if a streak
    /// reached the threshold.
    ///
    /// The streak counter that hit the threshold is reset even when the level
    /// is already at its cap or floor. The overall level is recomputed
    /// afterwards in every case.
    pub fn record_outcome(
        &self,
        state: &mut LearnerState,
        subcategory: &str,
        is_correct: bool,
    ) -> LevelChangeResult {
        let threshold = self.config.streak_threshold;
        let current = state.levels.categories.get(subcategory);
        let mut result = LevelChangeResult::unchanged(subcategory, current);

        let (streak, target, direction) = if is_correct {
            state.consecutive_wrong.reset(subcategory);
            (
                state.consecutive_correct.increment(subcategory),
                current.saturating_add(1).min(MAX_LEVEL),
                LevelDirection::Up,
            )
        } else {
            state.consecutive_correct.reset(subcategory);
            (
                state.consecutive_wrong.increment(subcategory),
                current.saturating_sub(1).max(MIN_LEVEL),
                LevelDirection::Down,
            )
        };

        if streak >= threshold {
            if target != current {
                state.levels.categories.set(subcategory, target);
                result.changed = true;
                result.new_level = target;
                result.direction = direction;
                tracing::debug!(
                    subcategory,
                    from = current,
                    to = target,
                    "level {}",
                    if is_correct { "up" } else { "down" }
                );
            }
            if is_correct {
                state.consecutive_correct.reset(subcategory);
            } else {
                state.consecutive_wrong.reset(subcategory);
            }
        }

        state.levels.overall =
            compute_overall_level(&state.levels.categories, &self.config.domains);
        result
    }
}

/// [`MasteryTracker::record_outcome`] with the default configuration.
pub fn record_outcome(
    state: &mut LearnerState,
    subcategory: &str,
    is_correct: bool,
) -> LevelChangeResult {
    MasteryTracker::default().record_outcome(state, subcategory, is_correct)
}

/// Weighted average of per-domain mean levels, rounded to the nearest level.
///
/// Subcategories outside the table are ignored. Only the weights of domains
/// that have at least one subcategory present make up the divisor. Returns
/// [`MIN_LEVEL`] when nothing maps to a domain.
pub fn compute_overall_level(levels: &LevelMap, domains: &DomainTable) -> u8 {
    let mut sums = [(0u32, 0u32); Domain::ALL.len()];

    for (subcategory, level) in levels.iter() {
        let Some(domain) = domains.domain_of(subcategory) else {
            continue;
        };
        let slot = &mut sums[domain_index(domain)];
        slot.0 += u32::from(level);
        slot.1 += 1;
    }

    let mut weighted_sum = 0.0f64;
    let mut total_weight = 0.0f64;
    for domain in Domain::ALL {
        let (total, count) = sums[domain_index(domain)];
        if count == 0 {
            continue;
        }
        let weight = domains.weight(domain);
        weighted_sum += f64::from(total) / f64::from(count) * weight;
        total_weight += weight;
    }

    if total_weight <= 0.0 {
        return MIN_LEVEL;
    }

    let overall = (weighted_sum / total_weight).round();
    (overall as u8).clamp(MIN_LEVEL, MAX_LEVEL)
}

fn domain_index(domain: Domain) -> usize {
    match domain {
        Domain::Technology => 0,
        Domain::Management => 1,
        Domain::Strategy => 2,
    }
}

/// Update the study-day streak for today's UTC date.
pub fn update_streak(state: &mut LearnerState) {
    update_streak_on(state, Utc::now().date_naive());
}

/// Update the study-day streak as if today were `today`.
///
/// Studying again on the same day changes nothing. Studying the day after the
/// last study day extends the streak; any other gap restarts it at 1.
pub fn update_streak_on(state: &mut LearnerState, today: NaiveDate) {
    let streaks = &mut state.streaks;
    if streaks.last_study_date == Some(today) {
        return;
    }

    let continues = streaks
        .last_study_date
        .is_some_and(|last| last.succ_opt() == Some(today));

    if continues {
        streaks.current_streak += 1;
    } else {
        streaks.current_streak = 1;
    }

    streaks.last_study_date = Some(today);
    if streaks.current_streak > streaks.max_streak {
        streaks.max_streak = streaks.current_streak;
    }
}
