//! The `examdrill overall-level` command.

use std::path::PathBuf;

use anyhow::{ensure, Context, Result};

use examdrill_core::config::load_config_from;
use examdrill_core::domains::Domain;
use examdrill_core::mastery::compute_overall_level;
use examdrill_core::model::{LevelMap, MAX_LEVEL, MIN_LEVEL};

pub fn execute(pairs: Vec<String>, config: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config.as_deref())?;

    let mut levels = LevelMap::new();
    for pair in &pairs {
        let (subcategory, level) = parse_pair(pair)?;
        if config.domains.domain_of(subcategory).is_none() {
            tracing::warn!("{subcategory} is not mapped to a domain and will be ignored");
        }
        levels.set(subcategory, level);
    }

    for domain in Domain::ALL {
        let present: Vec<u8> = config
            .domains
            .subcategories_in(domain)
            .filter(|s| levels.contains(s))
            .map(|s| levels.get(s))
            .collect();
        if !present.is_empty() {
            let mean = present.iter().map(|l| f64::from(*l)).sum::<f64>() / present.len() as f64;
            println!(
                "  {domain}: mean {mean:.2} (weight {:.2})",
                config.domains.weight(domain)
            );
        }
    }

    println!("Overall level: {}", compute_overall_level(&levels, &config.domains));
    Ok(())
}

fn parse_pair(pair: &str) -> Result<(&str, u8)> {
    let (subcategory, level) = pair
        .split_once('=')
        .with_context(|| format!("expected subcategory=level, got '{pair}'"))?;
    let level: u8 = level
        .trim()
        .parse()
        .with_context(|| format!("invalid level in '{pair}'"))?;
    ensure!(
        (MIN_LEVEL..=MAX_LEVEL).contains(&level),
        "level must be between {MIN_LEVEL} and {MAX_LEVEL}, got {level}"
    );
    Ok((subcategory.trim(), level))
}
