//! Engine configuration and loading.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domains::{Domain, DomainTable};
use crate::error::ConfigError;

/// Tunables for the mastery tracker and the question selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Consecutive answers needed to move a level.
    #[serde(default = "default_streak_threshold")]
    pub streak_threshold: u32,
    /// Chance of serving a flagged weak question when one is in scope.
    #[serde(default = "default_weak_probability")]
    pub weak_question_probability: f64,
    /// Spaced-repetition gaps.
    #[serde(default)]
    pub retry: RetrySchedule,
    /// Relative odds for level-matched vs adjacent questions.
    #[serde(default)]
    pub weighting: LevelWeighting,
    /// Subcategory → domain table and domain weights.
    #[serde(default)]
    pub domains: DomainTable,
}

/// How many history entries must pass before a missed question comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySchedule {
    /// Gap after the first miss.
    #[serde(default = "default_first_miss")]
    pub first_miss: usize,
    /// Gap after the second miss in a row.
    #[serde(default = "default_second_miss")]
    pub second_miss: usize,
    /// Gap after three or more misses in a row.
    #[serde(default = "default_repeated_miss")]
    pub repeated_miss: usize,
}

impl RetrySchedule {
    /// Required gap for a question missed `wrong_count` times since its last
    /// correct answer.
    pub fn gap_for(&self, wrong_count: u32) -> usize {
        match wrong_count {
            0 | 1 => self.first_miss,
            2 => self.second_miss,
            _ => self.repeated_miss,
        }
    }
}

impl Default for RetrySchedule {
    fn default() -> Self {
        Self {
            first_miss: default_first_miss(),
            second_miss: default_second_miss(),
            repeated_miss: default_repeated_miss(),
        }
    }
}

/// Sampling weights by distance between question level and learner level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelWeighting {
    #[serde(default = "default_exact_weight")]
    pub exact: u32,
    #[serde(default = "default_adjacent_weight")]
    pub adjacent: u32,
}

impl LevelWeighting {
    /// Weight for a question `distance` levels away from the learner, or
    /// `None` when it is out of range.
    pub fn weight_for(&self, distance: u8) -> Option<u32> {
        let weight = match distance {
            0 => self.exact,
            1 => self.adjacent,
            _ => return None,
        };
        (weight > 0).then_some(weight)
    }
}

impl Default for LevelWeighting {
    fn default() -> Self {
        Self {
            exact: default_exact_weight(),
            adjacent: default_adjacent_weight(),
        }
    }
}

fn default_streak_threshold() -> u32 {
    3
}
fn default_weak_probability() -> f64 {
    0.2
}
fn default_first_miss() -> usize {
    3
}
fn default_second_miss() -> usize {
    10
}
fn default_repeated_miss() -> usize {
    5
}
fn default_exact_weight() -> u32 {
    2
}
fn default_adjacent_weight() -> u32 {
    1
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            streak_threshold: default_streak_threshold(),
            weak_question_probability: default_weak_probability(),
            retry: RetrySchedule::default(),
            weighting: LevelWeighting::default(),
            domains: DomainTable::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: source_path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.streak_threshold == 0 {
            return Err(ConfigError::Invalid(
                "streak_threshold must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.weak_question_probability) {
            return Err(ConfigError::Invalid(format!(
                "weak_question_probability must be between 0.0 and 1.0, got {}",
                self.weak_question_probability
            )));
        }
        for domain in Domain::ALL {
            let weight = self.domains.weight(domain);
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "weight for {domain} must be a non-negative number, got {weight}"
                )));
            }
        }
        Ok(())
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `examdrill.toml` in the current directory
/// 2. `~/.config/examdrill/config.toml`
///
/// Environment variable override: `EXAMDRILL_WEAK_PROBABILITY`.
pub fn load_config() -> Result<EngineConfig, ConfigError> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<EngineConfig, ConfigError> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => return Err(ConfigError::NotFound(p.to_path_buf())),
        None => {
            let local = PathBuf::from("examdrill.toml");
            if local.exists() {
                Some(local)
            } else {
                config_dir()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            tracing::debug!("loading engine config from {}", path.display());
            EngineConfig::from_toml_str(&content, &path)?
        }
        None => EngineConfig::default(),
    };

    if let Ok(raw) = std::env::var("EXAMDRILL_WEAK_PROBABILITY") {
        config.weak_question_probability = raw.trim().parse().map_err(|_| {
            ConfigError::Invalid(format!(
                "EXAMDRILL_WEAK_PROBABILITY is not a number: '{raw}'"
            ))
        })?;
        config.validate()?;
    }

    Ok(config)
}

fn config_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("examdrill"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.streak_threshold, 3);
        assert_eq!(config.weak_question_probability, 0.2);
        assert_eq!(config.retry, RetrySchedule::default());
        assert_eq!(config.weighting.exact, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn retry_gaps_by_miss_count() {
        let retry = RetrySchedule::default();
        assert_eq!(retry.gap_for(1), 3);
        assert_eq!(retry.gap_for(2), 10);
        assert_eq!(retry.gap_for(3), 5);
        assert_eq!(retry.gap_for(7), 5);
    }

    #[test]
    fn level_weighting_excludes_distant_levels() {
        let weighting = LevelWeighting::default();
        assert_eq!(weighting.weight_for(0), Some(2));
        assert_eq!(weighting.weight_for(1), Some(1));
        assert_eq!(weighting.weight_for(2), None);

        let flat = LevelWeighting {
            exact: 1,
            adjacent: 0,
        };
        assert_eq!(flat.weight_for(1), None);
    }

    #[test]
    fn parse_partial_toml() {
        let toml_str = r#"
streak_threshold = 4

[retry]
second_miss = 8

[domains.weights]
management = 0.3

[domains.subcategories]
database = "technology"
pseudo-language-trace = "technology"
"#;
        let config = EngineConfig::from_toml_str(toml_str, Path::new("test.toml")).unwrap();
        assert_eq!(config.streak_threshold, 4);
        assert_eq!(config.retry.first_miss, 3);
        assert_eq!(config.retry.second_miss, 8);
        assert_eq!(config.weak_question_probability, 0.2);
        assert_eq!(config.domains.weights.management, 0.3);
        assert_eq!(config.domains.subcategories.len(), 2);
        assert_eq!(
            config.domains.domain_of("pseudo-language-trace"),
            Some(Domain::Technology)
        );
    }

    #[test]
    fn reject_invalid_values() {
        let err = EngineConfig::from_toml_str("streak_threshold = 0", Path::new("t.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = EngineConfig::from_toml_str(
            "weak_question_probability = 1.5",
            Path::new("t.toml"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("weak_question_probability"));

        let err = EngineConfig::from_toml_str(
            "[domains.weights]\nstrategy = -0.1",
            Path::new("t.toml"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("strategy"));
    }

    #[test]
    fn parse_malformed_toml() {
        let err = EngineConfig::from_toml_str("this is not [valid toml }{", Path::new("bad.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("examdrill.toml");
        std::fs::write(&path, "weak_question_probability = 0.5\n").unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.weak_question_probability, 0.5);
    }

    #[test]
    fn load_missing_explicit_file() {
        let err = load_config_from(Some(Path::new("/nonexistent/examdrill.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}
