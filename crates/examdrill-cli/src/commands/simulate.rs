//! The `examdrill simulate` command.

use std::path::PathBuf;

use anyhow::{bail, ensure, Context, Result};
use chrono::{Days, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use examdrill_core::config::load_config_from;
use examdrill_core::engine::StudyEngine;
use examdrill_core::model::{AnswerRecord, ExamModeFilter, LearnerState, Levels, StudyStreak};
use examdrill_core::statistics::{compute_study_stats, StudyStats};

use crate::catalog::{answer_keys, synthetic_catalog};

pub struct SimulateArgs {
    pub answers: usize,
    pub accuracy: f64,
    pub per_day: usize,
    pub seed: Option<u64>,
    pub exam_mode: String,
    pub subcategory: Option<String>,
    pub format: String,
    pub config: Option<PathBuf>,
}

#[derive(Serialize)]
struct SimulationReport<'a> {
    seed: u64,
    levels: &'a Levels,
    streaks: &'a StudyStreak,
    stats: StudyStats,
    level_changes: usize,
    weak_questions: usize,
}

pub fn execute(args: SimulateArgs) -> Result<()> {
    ensure!(
        (0.0..=1.0).contains(&args.accuracy),
        "--accuracy must be between 0.0 and 1.0, got {}",
        args.accuracy
    );
    ensure!(args.per_day > 0, "--per-day must be at least 1");
    let exam_mode: ExamModeFilter = args.exam_mode.parse().map_err(anyhow::Error::msg)?;

    let config = load_config_from(args.config.as_deref())?;
    let catalog = synthetic_catalog(&config.domains);
    let engine = StudyEngine::new(config);

    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    tracing::info!(seed, questions = catalog.len(), "starting simulation");

    let mut state = LearnerState::new();
    state.settings.exam_mode = exam_mode;
    let first_day = Utc::now().date_naive();
    let mut level_changes = 0;

    for i in 0..args.answers {
        let Some(question) =
            engine.next_question(&catalog, &state, args.subcategory.as_deref(), &mut rng)
        else {
            bail!(
                "no questions in scope (exam mode {exam_mode}, subcategory {})",
                args.subcategory.as_deref().unwrap_or("any")
            );
        };

        let (correct, wrong) = answer_keys(question);
        let choice = if rng.gen_bool(args.accuracy) {
            correct
        } else {
            wrong
        }
        .unwrap_or_default();

        let missed_before = state
            .history
            .iter()
            .rev()
            .find(|r| r.question_id == question.question_id)
            .is_some_and(|r| !r.is_correct);

        let day = first_day
            .checked_add_days(Days::new((i / args.per_day) as u64))
            .context("simulated study day out of range")?;
        let record = AnswerRecord::grade(question, choice, Utc::now());
        let is_correct = record.is_correct;
        let result = engine.record_answer_on(&mut state, record, day);
        if result.changed {
            level_changes += 1;
        }

        // Flag after a second miss in a row, unflag once it is answered correctly.
        let weak = state.is_weak(&question.question_id);
        if (!is_correct && missed_before && !weak) || (is_correct && weak) {
            state.toggle_weak_question(&question.question_id);
        }
    }

    let stats = compute_study_stats(&state, &engine.config().domains);

    match args.format.as_str() {
        "json" => {
            let report = SimulationReport {
                seed,
                levels: &state.levels,
                streaks: &state.streaks,
                stats,
                level_changes,
                weak_questions: state.weak_questions.len(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            print_levels(&state, &stats, &engine);
            println!("Seed: {seed}");
            println!("Overall level: {}", state.levels.overall);
            println!(
                "Answered: {} ({:.1}% correct, {} distinct questions)",
                stats.overall.answered,
                stats.overall.rate() * 100.0,
                stats.questions_answered
            );
            println!("Level changes: {level_changes}");
            println!("Pending retries: {}", stats.pending_retries);
            println!("Weak questions: {}", state.weak_questions.len());
            println!(
                "Study streak: {} day(s), best {}",
                state.streaks.current_streak, state.streaks.max_streak
            );
        }
    }

    Ok(())
}

fn print_levels(state: &LearnerState, stats: &StudyStats, engine: &StudyEngine) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Subcategory", "Domain", "Level", "Answered", "Accuracy"]);

    for (subcategory, accuracy) in &stats.by_subcategory {
        let domain = engine
            .config()
            .domains
            .domain_of(subcategory)
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".into());
        table.add_row(vec![
            Cell::new(subcategory),
            Cell::new(domain),
            Cell::new(state.levels.categories.get(subcategory)),
            Cell::new(accuracy.answered),
            Cell::new(format!("{:.1}%", accuracy.rate() * 100.0)),
        ]);
    }

    println!("{table}");
}
