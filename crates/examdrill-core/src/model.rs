//! Core data model types for examdrill.
//!
//! These are the records shared between the engine and the application that
//! loads questions and persists learner progress. Field names serialize in
//! camelCase so the JSON written by the persistence layer stays stable.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Lowest mastery level.
pub const MIN_LEVEL: u8 = 1;
/// Highest mastery level.
pub const MAX_LEVEL: u8 = 10;

/// A multiple-choice question from the catalog.
///
/// Only the fields the engine reasons about are typed; everything else
/// (question text, explanations, pseudo code, ...) is kept in `content`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Unique identifier within the catalog.
    pub question_id: String,
    /// Which part of the exam this question belongs to.
    pub exam_type: ExamPart,
    /// Top-level category label.
    pub category: String,
    /// Unit of mastery tracking.
    pub subcategory: String,
    /// Declared difficulty, 1 to 10.
    pub level: u8,
    /// Answer choices. Only the correctness flag matters to the engine.
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Opaque payload.
    #[serde(flatten)]
    pub content: serde_json::Map<String, serde_json::Value>,
}

impl Question {
    /// Look up a choice by id.
    pub fn choice(&self, choice_id: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.id == choice_id)
    }

    /// Whether picking `choice_id` answers this question correctly.
    /// Unknown choices are wrong.
    pub fn is_correct_choice(&self, choice_id: &str) -> bool {
        self.choice(choice_id).is_some_and(|c| c.is_correct)
    }
}

/// One answer choice of a [`Question`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    /// Choice identifier ("a", "b", ...).
    pub id: String,
    #[serde(default)]
    pub is_correct: bool,
    /// Text and explanations.
    #[serde(flatten)]
    pub content: serde_json::Map<String, serde_json::Value>,
}

/// The two parts of the exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ExamPart {
    #[serde(rename = "partA", alias = "科目A")]
    PartA,
    #[serde(rename = "partB", alias = "科目B")]
    PartB,
}

impl fmt::Display for ExamPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExamPart::PartA => write!(f, "partA"),
            ExamPart::PartB => write!(f, "partB"),
        }
    }
}

impl FromStr for ExamPart {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "parta" | "part-a" | "a" | "科目a" => Ok(ExamPart::PartA),
            "partb" | "part-b" | "b" | "科目b" => Ok(ExamPart::PartB),
            other => Err(format!("unknown exam part: {other}")),
        }
    }
}

/// Restricts selection to one exam part, or lets everything through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExamModeFilter {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "partA", alias = "科目A")]
    PartAOnly,
    #[serde(rename = "partB", alias = "科目B")]
    PartBOnly,
}

impl ExamModeFilter {
    /// Whether a question of `part` is in scope under this filter.
    pub fn admits(self, part: ExamPart) -> bool {
        match self {
            ExamModeFilter::All => true,
            ExamModeFilter::PartAOnly => part == ExamPart::PartA,
            ExamModeFilter::PartBOnly => part == ExamPart::PartB,
        }
    }
}

impl fmt::Display for ExamModeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExamModeFilter::All => write!(f, "all"),
            ExamModeFilter::PartAOnly => write!(f, "partA"),
            ExamModeFilter::PartBOnly => write!(f, "partB"),
        }
    }
}

impl FromStr for ExamModeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(ExamModeFilter::All);
        }
        match s.parse::<ExamPart>() {
            Ok(ExamPart::PartA) => Ok(ExamModeFilter::PartAOnly),
            Ok(ExamPart::PartB) => Ok(ExamModeFilter::PartBOnly),
            Err(_) => Err(format!("unknown exam mode: {s}")),
        }
    }
}

/// Subcategory → level, where a subcategory never seen is at [`MIN_LEVEL`].
///
/// Stored levels are always within `[MIN_LEVEL, MAX_LEVEL]`, including ones
/// read from persisted data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, u8>", into = "BTreeMap<String, u8>")]
pub struct LevelMap(BTreeMap<String, u8>);

impl LevelMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Level for `subcategory`, defaulting to [`MIN_LEVEL`] on a miss.
    pub fn get(&self, subcategory: &str) -> u8 {
        self.0.get(subcategory).copied().unwrap_or(MIN_LEVEL)
    }

    /// Store a level, clamped into `[MIN_LEVEL, MAX_LEVEL]`.
    pub fn set(&mut self, subcategory: &str, level: u8) {
        self.0.insert(subcategory.to_string(), level.clamp(MIN_LEVEL, MAX_LEVEL));
    }

    pub fn contains(&self, subcategory: &str) -> bool {
        self.0.contains_key(subcategory)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u8)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, u8)> for LevelMap {
    fn from_iter<I: IntoIterator<Item = (S, u8)>>(iter: I) -> Self {
        let mut map = LevelMap::new();
        for (subcategory, level) in iter {
            let subcategory: String = subcategory.into();
            map.set(&subcategory, level);
        }
        map
    }
}

impl From<BTreeMap<String, u8>> for LevelMap {
    fn from(raw: BTreeMap<String, u8>) -> Self {
        raw.into_iter().collect()
    }
}

impl From<LevelMap> for BTreeMap<String, u8> {
    fn from(levels: LevelMap) -> Self {
        levels.0
    }
}

/// Subcategory → consecutive answer counter, zero on a miss.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CounterMap(BTreeMap<String, u32>);

impl CounterMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, subcategory: &str) -> u32 {
        self.0.get(subcategory).copied().unwrap_or(0)
    }

    /// Add one and return the new count.
    pub fn increment(&mut self, subcategory: &str) -> u32 {
        let count = self.0.entry(subcategory.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    pub fn reset(&mut self, subcategory: &str) {
        self.0.insert(subcategory.to_string(), 0);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Overall and per-subcategory mastery levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Levels {
    /// Weighted aggregate of `categories`; recomputed after every answer.
    #[serde(default = "default_level")]
    pub overall: u8,
    #[serde(default)]
    pub categories: LevelMap,
}

impl Default for Levels {
    fn default() -> Self {
        Self {
            overall: MIN_LEVEL,
            categories: LevelMap::new(),
        }
    }
}

fn default_level() -> u8 {
    MIN_LEVEL
}

/// Consecutive study-day tracking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyStreak {
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub max_streak: u32,
    /// `None` until the first study day. Serialized as `""` in that case.
    #[serde(default, with = "study_date")]
    pub last_study_date: Option<NaiveDate>,
}

mod study_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => s.serialize_str(&d.format(FORMAT).to_string()),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = String::deserialize(d)?;
        if raw.trim().is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(raw.trim(), FORMAT)
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}

/// A single answered question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question_id: String,
    pub answered_at: DateTime<Utc>,
    pub selected_choice: String,
    pub is_correct: bool,
    /// Seconds spent on the question, if the UI measured it.
    #[serde(default)]
    pub time_spent: u64,
    pub category: String,
    pub subcategory: String,
}

impl AnswerRecord {
    /// Build a record for answering `question` with `choice_id`.
    pub fn grade(question: &Question, choice_id: &str, answered_at: DateTime<Utc>) -> Self {
        Self {
            question_id: question.question_id.clone(),
            answered_at,
            selected_choice: choice_id.to_string(),
            is_correct: question.is_correct_choice(choice_id),
            time_spent: 0,
            category: question.category.clone(),
            subcategory: question.subcategory.clone(),
        }
    }

    pub fn with_time_spent(mut self, seconds: u64) -> Self {
        self.time_spent = seconds;
        self
    }
}

/// Everything the engine knows about a learner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LearnerState {
    pub levels: Levels,
    pub streaks: StudyStreak,
    /// Append-only, oldest first.
    #[serde(rename = "questionHistory")]
    pub history: Vec<AnswerRecord>,
    /// Questions the learner flagged for extra practice.
    pub weak_questions: BTreeSet<String>,
    pub consecutive_correct: CounterMap,
    pub consecutive_wrong: CounterMap,
    pub settings: LearnerSettings,
    /// Fields the engine does not use (`userId`, `bookmarks`, ...), kept so
    /// they survive a load/save cycle.
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

/// Learner preferences. Only the exam mode matters to the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnerSettings {
    #[serde(rename = "examMode")]
    pub exam_mode: ExamModeFilter,
    /// Display preferences and anything else stored alongside the mode.
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

impl LearnerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag or unflag a question as weak. Returns `true` if it is now flagged.
    pub fn toggle_weak_question(&mut self, question_id: &str) -> bool {
        if self.weak_questions.remove(question_id) {
            false
        } else {
            self.weak_questions.insert(question_id.to_string());
            true
        }
    }

    pub fn is_weak(&self, question_id: &str) -> bool {
        self.weak_questions.contains(question_id)
    }

    /// Whether `question_id` appears anywhere in the history.
    pub fn has_answered(&self, question_id: &str) -> bool {
        self.history.iter().any(|r| r.question_id == question_id)
    }
}

/// Direction of a level change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelDirection {
    #[serde(rename = "up")]
    Up,
    #[serde(rename = "down")]
    Down,
    #[serde(rename = "none")]
    Unchanged,
}

/// What a single recorded outcome did to a subcategory's level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelChangeResult {
    pub changed: bool,
    pub previous_level: u8,
    pub new_level: u8,
    pub subcategory: String,
    pub direction: LevelDirection,
}

impl LevelChangeResult {
    /// A result for an outcome that left the level where it was.
    pub fn unchanged(subcategory: &str, level: u8) -> Self {
        Self {
            changed: false,
            previous_level: level,
            new_level: level,
            subcategory: subcategory.to_string(),
            direction: LevelDirection::Unchanged,
        }
    }
}
