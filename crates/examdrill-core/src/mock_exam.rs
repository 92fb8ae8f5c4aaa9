//! Timed mock exams drawn from the catalog.
//!
//! A session draws a fixed number of questions for one exam part, collects
//! answers and flags while it runs, and is scored once with [`finish`]. The
//! graded answers can then be fed back through the study engine so mock exams
//! count towards mastery like regular practice.
//!
//! [`finish`]: MockExamSession::finish

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MockExamError;
use crate::model::{AnswerRecord, ExamPart, Question};

/// Score out of 1000 needed to pass.
pub const PASSING_SCORE: u32 = 600;

/// The available mock exam formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MockExamKind {
    /// Full part A exam.
    SubjectA,
    /// Full part B exam.
    SubjectB,
    /// Short part A drill.
    MiniA,
    /// Short part B drill.
    MiniB,
}

/// Size, time limit and part of a [`MockExamKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockExamFormat {
    pub question_count: usize,
    pub time_limit_minutes: i64,
    pub part: ExamPart,
}

impl MockExamKind {
    pub const ALL: [MockExamKind; 4] = [
        MockExamKind::SubjectA,
        MockExamKind::SubjectB,
        MockExamKind::MiniA,
        MockExamKind::MiniB,
    ];

    pub fn format(self) -> MockExamFormat {
        let (question_count, time_limit_minutes, part) = match self {
            MockExamKind::SubjectA => (60, 90, ExamPart::PartA),
            MockExamKind::SubjectB => (20, 100, ExamPart::PartB),
            MockExamKind::MiniA => (10, 15, ExamPart::PartA),
            MockExamKind::MiniB => (5, 25, ExamPart::PartB),
        };
        MockExamFormat {
            question_count,
            time_limit_minutes,
            part,
        }
    }
}

impl fmt::Display for MockExamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MockExamKind::SubjectA => write!(f, "subject-a"),
            MockExamKind::SubjectB => write!(f, "subject-b"),
            MockExamKind::MiniA => write!(f, "mini-a"),
            MockExamKind::MiniB => write!(f, "mini-b"),
        }
    }
}

impl FromStr for MockExamKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "subject-a" | "subjecta" => Ok(MockExamKind::SubjectA),
            "subject-b" | "subjectb" => Ok(MockExamKind::SubjectB),
            "mini-a" | "minia" => Ok(MockExamKind::MiniA),
            "mini-b" | "minib" => Ok(MockExamKind::MiniB),
            other => Err(format!("unknown mock exam: {other}")),
        }
    }
}

/// A mock exam in progress.
#[derive(Debug, Clone)]
pub struct MockExamSession {
    pub id: Uuid,
    pub kind: MockExamKind,
    /// Drawn questions, in presentation order.
    pub question_ids: Vec<String>,
    /// Selected choice per answered question.
    pub answers: BTreeMap<String, String>,
    /// Questions marked for review.
    pub flagged: BTreeSet<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    choice_ids: HashMap<String, Vec<String>>,
}

impl MockExamSession {
    /// Draw a new exam of `kind` from `catalog`.
    ///
    /// Takes up to the format's question count; a smaller catalog yields a
    /// shorter exam.
    pub fn start<R: RngCore>(
        catalog: &[Question],
        kind: MockExamKind,
        rng: &mut R,
    ) -> Result<Self, MockExamError> {
        let format = kind.format();
        let mut pool: Vec<&Question> = catalog
            .iter()
            .filter(|q| q.exam_type == format.part)
            .collect();
        if pool.is_empty() {
            return Err(MockExamError::NoQuestions(kind));
        }

        pool.shuffle(rng);
        pool.truncate(format.question_count);

        let session = Self {
            id: Uuid::new_v4(),
            kind,
            question_ids: pool.iter().map(|q| q.question_id.clone()).collect(),
            answers: BTreeMap::new(),
            flagged: BTreeSet::new(),
            started_at: Utc::now(),
            finished_at: None,
            choice_ids: pool
                .iter()
                .map(|q| {
                    let ids = q.choices.iter().map(|c| c.id.clone()).collect();
                    (q.question_id.clone(), ids)
                })
                .collect(),
        };
        tracing::debug!(
            id = %session.id,
            kind = %kind,
            questions = session.question_ids.len(),
            "mock exam started"
        );
        Ok(session)
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    /// Time left at `now`, never negative.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        let deadline = self.started_at + Duration::minutes(self.kind.format().time_limit_minutes);
        (deadline - now).max(Duration::zero())
    }

    /// Select `choice_id` for `question_id`, replacing any earlier answer.
    pub fn answer(&mut self, question_id: &str, choice_id: &str) -> Result<(), MockExamError> {
        self.ensure_running()?;
        let choices = self
            .choice_ids
            .get(question_id)
            .ok_or_else(|| MockExamError::UnknownQuestion(question_id.to_string()))?;
        if !choices.is_empty() && !choices.iter().any(|c| c == choice_id) {
            return Err(MockExamError::UnknownChoice {
                question_id: question_id.to_string(),
                choice_id: choice_id.to_string(),
            });
        }
        self.answers.insert(question_id.to_string(), choice_id.to_string());
        Ok(())
    }

    /// Flag or unflag a question for review. Returns `true` if it is now
    /// flagged.
    pub fn toggle_flag(&mut self, question_id: &str) -> Result<bool, MockExamError> {
        self.ensure_running()?;
        if !self.choice_ids.contains_key(question_id) {
            return Err(MockExamError::UnknownQuestion(question_id.to_string()));
        }
        if self.flagged.remove(question_id) {
            Ok(false)
        } else {
            self.flagged.insert(question_id.to_string());
            Ok(true)
        }
    }

    /// Score the session. Unanswered questions count as wrong.
    pub fn finish(
        &mut self,
        catalog: &[Question],
        finished_at: DateTime<Utc>,
    ) -> Result<MockExamResult, MockExamError> {
        self.ensure_running()?;
        let questions = self.drawn_questions(catalog)?;

        let mut correct = 0u32;
        let mut by_subcategory: BTreeMap<String, SubcategoryScore> = BTreeMap::new();
        for question in &questions {
            let is_correct = self
                .answers
                .get(&question.question_id)
                .is_some_and(|choice| question.is_correct_choice(choice));
            let entry = by_subcategory.entry(question.subcategory.clone()).or_default();
            entry.total += 1;
            if is_correct {
                entry.correct += 1;
                correct += 1;
            }
        }

        let total = questions.len() as u32;
        let score = if total == 0 {
            0
        } else {
            (f64::from(correct) / f64::from(total) * 1000.0).round() as u32
        };
        let time_limit = Duration::minutes(self.kind.format().time_limit_minutes);
        let elapsed = finished_at - self.started_at;

        self.finished_at = Some(finished_at);
        let result = MockExamResult {
            id: self.id,
            kind: self.kind,
            correct,
            total,
            score,
            passed: score >= PASSING_SCORE,
            unanswered: total - self.answers.len() as u32,
            elapsed_seconds: elapsed.num_seconds().max(0),
            over_time: elapsed > time_limit,
            by_subcategory,
        };
        tracing::debug!(
            id = %result.id,
            score = result.score,
            passed = result.passed,
            "mock exam finished"
        );
        Ok(result)
    }

    /// Graded records for every answered question, in presentation order.
    pub fn answer_records(&self, catalog: &[Question]) -> Result<Vec<AnswerRecord>, MockExamError> {
        let answered_at = self.finished_at.unwrap_or_else(Utc::now);
        Ok(self
            .drawn_questions(catalog)?
            .into_iter()
            .filter_map(|q| {
                self.answers
                    .get(&q.question_id)
                    .map(|choice| AnswerRecord::grade(q, choice, answered_at))
            })
            .collect())
    }

    fn ensure_running(&self) -> Result<(), MockExamError> {
        if self.is_finished() {
            Err(MockExamError::AlreadyFinished)
        } else {
            Ok(())
        }
    }

    fn drawn_questions<'c>(
        &self,
        catalog: &'c [Question],
    ) -> Result<Vec<&'c Question>, MockExamError> {
        let by_id: HashMap<&str, &Question> =
            catalog.iter().map(|q| (q.question_id.as_str(), q)).collect();
        self.question_ids
            .iter()
            .map(|id| {
                by_id
                    .get(id.as_str())
                    .copied()
                    .ok_or_else(|| MockExamError::UnknownQuestion(id.clone()))
            })
            .collect()
    }
}

/// Correct and total counts for one subcategory of a mock exam.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubcategoryScore {
    pub correct: u32,
    pub total: u32,
}

/// Outcome of a finished mock exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockExamResult {
    pub id: Uuid,
    pub kind: MockExamKind,
    pub correct: u32,
    pub total: u32,
    /// Score out of 1000.
    pub score: u32,
    pub passed: bool,
    pub unanswered: u32,
    pub elapsed_seconds: i64,
    /// Finished after the time limit ran out.
    pub over_time: bool,
    pub by_subcategory: BTreeMap<String, SubcategoryScore>,
}
