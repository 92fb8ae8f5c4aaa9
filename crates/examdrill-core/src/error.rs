//! Error types for the fallible edges of the engine.
//!
//! Selection and mastery tracking never fail; only configuration loading and
//! mock exam session bookkeeping can reject their input.

use std::path::PathBuf;

use thiserror::Error;

use crate::mock_exam::MockExamKind;

/// Errors that can occur while loading or validating an [`EngineConfig`].
///
/// [`EngineConfig`]: crate::config::EngineConfig
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The config file exists but could not be read.
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has the wrong shape.
    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The config parsed but holds values the engine cannot use.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors raised by a [`MockExamSession`].
///
/// [`MockExamSession`]: crate::mock_exam::MockExamSession
#[derive(Debug, Error)]
pub enum MockExamError {
    /// The catalog holds no question for the exam's part.
    #[error("no questions available for {0}")]
    NoQuestions(MockExamKind),

    /// The question was not drawn for this session.
    #[error("question {0} is not part of this exam")]
    UnknownQuestion(String),

    /// The chosen choice does not exist on the question.
    #[error("question {question_id} has no choice {choice_id}")]
    UnknownChoice {
        question_id: String,
        choice_id: String,
    },

    /// The session was already scored.
    #[error("exam already finished")]
    AlreadyFinished,
}

impl MockExamError {
    /// Returns `true` if the error comes from caller input rather than the
    /// session's own state.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            MockExamError::UnknownQuestion(_) | MockExamError::UnknownChoice { .. }
        )
    }
}
