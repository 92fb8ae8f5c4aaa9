//! examdrill CLI: drive the adaptive engine from the command line.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod catalog;
mod commands;

#[derive(Parser)]
#[command(
    name = "examdrill",
    version,
    about = "Adaptive question selection and mastery tracking"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a learner studying against a synthetic catalog
    Simulate {
        /// Number of questions to answer
        #[arg(long, default_value = "200")]
        answers: usize,

        /// Probability that the simulated learner answers correctly
        #[arg(long, default_value = "0.7")]
        accuracy: f64,

        /// Answers given per study day
        #[arg(long, default_value = "25")]
        per_day: usize,

        /// RNG seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,

        /// Exam mode: all, partA, partB
        #[arg(long, default_value = "all")]
        exam_mode: String,

        /// Restrict practice to one subcategory
        #[arg(long)]
        subcategory: Option<String>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Simulate a timed mock exam
    MockExam {
        /// Exam kind: subject-a, subject-b, mini-a, mini-b
        #[arg(long, default_value = "mini-a")]
        kind: String,

        /// Probability that the simulated learner answers correctly
        #[arg(long, default_value = "0.7")]
        accuracy: f64,

        /// RNG seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Compute the overall level from subcategory levels
    OverallLevel {
        /// Levels as subcategory=level pairs
        #[arg(required = true)]
        levels: Vec<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter examdrill.toml
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("examdrill=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Simulate {
            answers,
            accuracy,
            per_day,
            seed,
            exam_mode,
            subcategory,
            format,
            config,
        } => commands::simulate::execute(commands::simulate::SimulateArgs {
            answers,
            accuracy,
            per_day,
            seed,
            exam_mode,
            subcategory,
            format,
            config,
        }),
        Commands::MockExam {
            kind,
            accuracy,
            seed,
            format,
        } => commands::mock_exam::execute(kind, accuracy, seed, format),
        Commands::OverallLevel { levels, config } => {
            commands::overall_level::execute(levels, config)
        }
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
