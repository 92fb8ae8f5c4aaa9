//! examdrill-core: adaptive question selection and mastery tracking.
//!
//! This crate defines the learner data model, the mastery state machine that
//! moves per-subcategory levels, and the layered selector that decides which
//! question to present next.

pub mod config;
pub mod domains;
pub mod engine;
pub mod error;
pub mod mastery;
pub mod mock_exam;
pub mod model;
pub mod selector;
pub mod statistics;
