//! The `examdrill init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    let path = std::path::Path::new("examdrill.toml");
    if path.exists() {
        println!("examdrill.toml already exists, skipping.");
        return Ok(());
    }

    std::fs::write(path, SAMPLE_CONFIG)?;
    println!("Created examdrill.toml");

    println!("\nNext steps:");
    println!("  1. Adjust the retry gaps and domain weights in examdrill.toml");
    println!("  2. Run: examdrill simulate --answers 300 --seed 1");
    println!("  3. Run: examdrill mock-exam --kind subject-a");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# examdrill configuration

# Consecutive correct (or wrong) answers needed to move a level
streak_threshold = 3

# Chance of serving a flagged weak question when one is in scope
weak_question_probability = 0.2

# History entries that must pass before a missed question comes back
[retry]
first_miss = 3
second_miss = 10
repeated_miss = 5

# Relative odds of level-matched and adjacent-level questions
[weighting]
exact = 2
adjacent = 1

[domains.weights]
technology = 0.55
management = 0.20
strategy = 0.25

[domains.subcategories]
basic-theory = "technology"
algorithm-programming = "technology"
computer-components = "technology"
system-components = "technology"
software-hardware = "technology"
human-interface-multimedia = "technology"
database = "technology"
network = "technology"
security = "technology"
development = "management"
project-management = "management"
service-management = "management"
system-strategy = "strategy"
business-strategy = "strategy"
corporate-law = "strategy"
"#;
