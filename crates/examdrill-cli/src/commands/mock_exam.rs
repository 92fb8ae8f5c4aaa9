//! The `examdrill mock-exam` command.

use anyhow::Result;
use chrono::Duration;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use examdrill_core::config::EngineConfig;
use examdrill_core::engine::StudyEngine;
use examdrill_core::mock_exam::{MockExamKind, MockExamResult, MockExamSession};
use examdrill_core::model::LearnerState;

use crate::catalog::{answer_keys, synthetic_catalog};

/// Chance that the simulated learner leaves a question blank.
const SKIP_PROBABILITY: f64 = 0.05;

pub fn execute(kind: String, accuracy: f64, seed: Option<u64>, format: String) -> Result<()> {
    anyhow::ensure!(
        (0.0..=1.0).contains(&accuracy),
        "--accuracy must be between 0.0 and 1.0, got {accuracy}"
    );
    let kind: MockExamKind = kind.parse().map_err(anyhow::Error::msg)?;

    let engine = StudyEngine::new(EngineConfig::default());
    let catalog = synthetic_catalog(&engine.config().domains);
    let seed = seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut session = MockExamSession::start(&catalog, kind, &mut rng)?;
    let by_id: std::collections::HashMap<&str, _> =
        catalog.iter().map(|q| (q.question_id.as_str(), q)).collect();

    let mut seconds = 0i64;
    for id in session.question_ids.clone() {
        seconds += rng.gen_range(30..=120);
        if rng.gen_bool(SKIP_PROBABILITY) {
            continue;
        }
        let Some(question) = by_id.get(id.as_str()) else {
            continue;
        };
        let (correct, wrong) = answer_keys(question);
        let choice = if rng.gen_bool(accuracy) { correct } else { wrong };
        if let Some(choice) = choice {
            session.answer(&id, choice)?;
        }
    }

    let result = session.finish(&catalog, session.started_at + Duration::seconds(seconds))?;

    // Feed the graded answers back so the exam counts towards mastery.
    let mut state = LearnerState::new();
    for record in session.answer_records(&catalog)? {
        engine.record_answer(&mut state, record);
    }

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => {
            print_result(&result);
            println!("Overall level after recording: {}", state.levels.overall);
        }
    }

    Ok(())
}

fn print_result(result: &MockExamResult) {
    use comfy_table::{Cell, Table};

    let format = result.kind.format();
    println!(
        "Mock exam {} ({} questions, {} min)",
        result.kind, result.total, format.time_limit_minutes
    );

    let mut table = Table::new();
    table.set_header(vec!["Subcategory", "Correct", "Total", "Rate"]);
    for (subcategory, score) in &result.by_subcategory {
        let rate = f64::from(score.correct) / f64::from(score.total.max(1)) * 100.0;
        table.add_row(vec![
            Cell::new(subcategory),
            Cell::new(score.correct),
            Cell::new(score.total),
            Cell::new(format!("{rate:.1}%")),
        ]);
    }
    println!("{table}");

    println!(
        "Score: {}/1000 ({})",
        result.score,
        if result.passed { "PASS" } else { "FAIL" }
    );
    println!(
        "Correct: {}/{}, unanswered: {}",
        result.correct, result.total, result.unanswered
    );
    println!(
        "Time: {}m{:02}s{}",
        result.elapsed_seconds / 60,
        result.elapsed_seconds % 60,
        if result.over_time { " (over time)" } else { "" }
    );
}
