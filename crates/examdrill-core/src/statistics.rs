//! Study statistics derived from a learner's answer history.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::domains::{Domain, DomainTable};
use crate::model::LearnerState;
use crate::selector::pending_retries;

/// Answered/correct counts for some slice of the history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccuracyStats {
    pub answered: u32,
    pub correct: u32,
}

impl AccuracyStats {
    /// Fraction answered correctly, `0.0` when nothing was answered.
    pub fn rate(&self) -> f64 {
        if self.answered == 0 {
            0.0
        } else {
            f64::from(self.correct) / f64::from(self.answered)
        }
    }

    fn add(&mut self, is_correct: bool) {
        self.answered += 1;
        if is_correct {
            self.correct += 1;
        }
    }
}

/// Progress summary for a learner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudyStats {
    pub overall: AccuracyStats,
    pub by_subcategory: BTreeMap<String, AccuracyStats>,
    /// Only subcategories mapped to a domain are counted here.
    pub by_domain: BTreeMap<Domain, AccuracyStats>,
    /// Distinct questions answered at least once.
    pub questions_answered: usize,
    /// Questions whose latest answer was wrong.
    pub pending_retries: usize,
}

/// Summarize `state`'s history.
pub fn compute_study_stats(state: &LearnerState, domains: &DomainTable) -> StudyStats {
    let mut stats = StudyStats::default();
    let mut distinct = HashSet::new();

    for record in &state.history {
        stats.overall.add(record.is_correct);
        stats
            .by_subcategory
            .entry(record.subcategory.clone())
            .or_default()
            .add(record.is_correct);
        if let Some(domain) = domains.domain_of(&record.subcategory) {
            stats.by_domain.entry(domain).or_default().add(record.is_correct);
        }
        distinct.insert(record.question_id.as_str());
    }

    stats.questions_answered = distinct.len();
    stats.pending_retries = pending_retries(&state.history).len();
    stats
}
