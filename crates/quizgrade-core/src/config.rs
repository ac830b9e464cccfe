//! quizgrade configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::results::GradingOptions;

/// Top-level quizgrade configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizgradeConfig {
    /// Default grading policy; a quiz's own `[grading]` table wins.
    #[serde(default)]
    pub grading: GradingOptions,
    /// Max attempts graded concurrently.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Show `earned / possible pts` for points-based quizzes.
    #[serde(default = "default_show_point_values")]
    pub show_point_values: bool,
}

fn default_parallelism() -> usize {
    4
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./quizgrade-results")
}
fn default_show_point_values() -> bool {
    true
}

impl Default for QuizgradeConfig {
    fn default() -> Self {
        Self {
            grading: GradingOptions::default(),
            parallelism: default_parallelism(),
            output_dir: default_output_dir(),
            show_point_values: default_show_point_values(),
        }
    }
}

impl QuizgradeConfig {
    /// The policy for a quiz: its own table if present, else the default.
    pub fn grading_for(&self, quiz_grading: Option<&GradingOptions>) -> GradingOptions {
        quiz_grading.cloned().unwrap_or_else(|| self.grading.clone())
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quizgrade.toml` in the current directory
/// 2. `~/.config/quizgrade/config.toml`
///
/// Environment variable overrides: `QUIZGRADE_PASS_THRESHOLD`,
/// `QUIZGRADE_PARALLELISM`.
pub fn load_config() -> Result<QuizgradeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizgradeConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("quizgrade.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<QuizgradeConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => QuizgradeConfig::default(),
    };

    apply_env_overrides(&mut config)?;
    Ok(config)
}

fn apply_env_overrides(config: &mut QuizgradeConfig) -> Result<()> {
    if let Ok(value) = std::env::var("QUIZGRADE_PASS_THRESHOLD") {
        config.grading.pass_threshold = value
            .trim()
            .parse()
            .with_context(|| format!("invalid QUIZGRADE_PASS_THRESHOLD: {value}"))?;
    }
    if let Ok(value) = std::env::var("QUIZGRADE_PARALLELISM") {
        config.parallelism = value
            .trim()
            .parse()
            .with_context(|| format!("invalid QUIZGRADE_PARALLELISM: {value}"))?;
    }
    Ok(())
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizgrade"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::GradingType;

    #[test]
    fn default_config() {
        let config = QuizgradeConfig::default();
        assert_eq!(config.parallelism, 4);
        assert_eq!(config.grading.pass_threshold, 60.0);
        assert_eq!(config.output_dir, PathBuf::from("./quizgrade-results"));
    }

    #[test]
    fn parse_config_file() {
        let toml_str = r#"
parallelism = 8
output_dir = "reports"

[grading]
grading_type = "pass_fail"
pass_threshold = 75.5
"#;
        let config: QuizgradeConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.parallelism, 8);
        assert_eq!(config.grading.grading_type, GradingType::PassFail);
        assert_eq!(config.grading.pass_threshold, 75.5);
        assert!(config.show_point_values);
    }

    #[test]
    fn explicit_missing_path_fails() {
        let err = load_config_from(Some(Path::new("/nonexistent/quizgrade.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn explicit_path_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "parallelism = 2\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.parallelism, 2);
        assert_eq!(config.grading.grading_type, GradingType::Percentage);
    }

    #[test]
    fn quiz_grading_overrides_default() {
        let config = QuizgradeConfig::default();
        let quiz = GradingOptions {
            grading_type: GradingType::Letter,
            ..GradingOptions::default()
        };
        assert_eq!(config.grading_for(Some(&quiz)).grading_type, GradingType::Letter);
        assert_eq!(config.grading_for(None), config.grading);
    }
}
