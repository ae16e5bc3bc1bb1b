//! Command line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;
use tracing::Level;

use crate::annotate::OverlapPolicy;
use crate::annotate::hit_test::InvalidOverlapPolicy;
use crate::api::GeminiSettings;
use crate::api::gemini::{
    DEFAULT_BASE_URL, DEFAULT_IMAGE_MODEL, DEFAULT_SPEECH_MODEL, DEFAULT_TEXT_MODEL, DEFAULT_VOICE,
};
use crate::constants::{HISTORY_LIMIT, MIN_STROKE_EXTENT};
use crate::geometry::CellMetrics;

/// Environment variables checked for the API key, in order.
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

#[derive(Parser, Debug, Clone)]
#[command(
    name = "chalkmark",
    version = env!("CARGO_PKG_VERSION"),
    about = "Terminal study tutor: ask questions, circle the answer to dig deeper"
)]
pub struct Cli {
    /// API key. Falls back to GEMINI_API_KEY, then API_KEY.
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    #[arg(long, value_name = "URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Model answering study questions.
    #[arg(long, value_name = "MODEL", default_value = DEFAULT_TEXT_MODEL)]
    pub model: String,

    #[arg(long, value_name = "MODEL", default_value = DEFAULT_SPEECH_MODEL)]
    pub speech_model: String,

    #[arg(long, value_name = "MODEL", default_value = DEFAULT_IMAGE_MODEL)]
    pub image_model: String,

    /// Prebuilt narration voice.
    #[arg(long, value_name = "NAME", default_value = DEFAULT_VOICE)]
    pub voice: String,

    /// Request timeout.
    #[arg(long, value_name = "SECONDS", default_value_t = 120)]
    pub timeout: u64,

    /// Messages replayed to the model as context.
    #[arg(long, value_name = "N", default_value_t = HISTORY_LIMIT)]
    pub history: usize,

    /// Smallest circle (pixels, either axis) that counts as a selection.
    #[arg(long, value_name = "PX", default_value_t = MIN_STROKE_EXTENT)]
    pub min_stroke: f32,

    /// Line selection rule: `any` for any overlap, or the fraction of a line
    /// that must be covered.
    #[arg(long, value_name = "POLICY", default_value = "any")]
    pub overlap: String,

    /// How long matched lines stay highlighted.
    #[arg(long, value_name = "MS", default_value_t = 800)]
    pub highlight_ms: u64,

    /// Pixel size of one terminal cell, as WIDTHxHEIGHT.
    #[arg(long, value_name = "WxH", default_value = "8x16")]
    pub cell_size: String,

    /// Also keep every narration as a WAV file in this directory.
    #[arg(long, value_name = "DIR")]
    pub save_audio: Option<PathBuf>,

    /// Image attached to the first question.
    #[arg(long, value_name = "PATH")]
    pub image: Option<PathBuf>,

    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("timeout must be between 1 and 600 seconds")]
    Timeout,
    #[error("history must keep at least one message")]
    History,
    #[error("minimum stroke must be a positive number of pixels")]
    MinStroke,
    #[error(transparent)]
    Overlap(#[from] InvalidOverlapPolicy),
    #[error("invalid cell size {0:?}, expected WIDTHxHEIGHT")]
    CellSize(String),
    #[error("unknown log level {0:?}")]
    LogLevel(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini: GeminiSettings,
    pub history_limit: usize,
    pub min_stroke: f32,
    pub overlap: OverlapPolicy,
    pub highlight: Duration,
    pub cell: CellMetrics,
    pub save_audio: Option<PathBuf>,
    pub image: Option<PathBuf>,
    pub log_level: Level,
}

fn parse_cell_size(raw: &str) -> Result<CellMetrics, ConfigError> {
    let invalid = || ConfigError::CellSize(raw.to_string());
    let (w, h) = raw.split_once(['x', 'X']).ok_or_else(invalid)?;
    let width: f32 = w.trim().parse().map_err(|_| invalid())?;
    let height: f32 = h.trim().parse().map_err(|_| invalid())?;
    if width <= 0.0 || height <= 0.0 {
        return Err(invalid());
    }
    Ok(CellMetrics::new(width, height))
}

impl Config {
    /// Merge parsed arguments with the process environment.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        Self::resolve(cli, |name| std::env::var(name).ok())
    }

    /// Merge parsed arguments with variables read through `env`.
    pub fn resolve(
        cli: &Cli,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if !(1..=600).contains(&cli.timeout) {
            return Err(ConfigError::Timeout);
        }
        if cli.history == 0 {
            return Err(ConfigError::History);
        }
        if !(cli.min_stroke.is_finite() && cli.min_stroke > 0.0) {
            return Err(ConfigError::MinStroke);
        }
        let overlap: OverlapPolicy = cli.overlap.parse()?;
        let cell = parse_cell_size(&cli.cell_size)?;
        let log_level: Level = cli
            .log_level
            .parse()
            .map_err(|_| ConfigError::LogLevel(cli.log_level.clone()))?;

        let api_key = cli
            .api_key
            .clone()
            .or_else(|| API_KEY_VARS.iter().find_map(|name| env(name)))
            .filter(|key| !key.trim().is_empty());

        Ok(Self {
            gemini: GeminiSettings {
                api_key,
                base_url: cli.base_url.clone(),
                text_model: cli.model.clone(),
                speech_model: cli.speech_model.clone(),
                image_model: cli.image_model.clone(),
                voice: cli.voice.clone(),
                timeout: Duration::from_secs(cli.timeout),
            },
            history_limit: cli.history,
            min_stroke: cli.min_stroke,
            overlap,
            highlight: Duration::from_millis(cli.highlight_ms),
            cell,
            save_audio: cli.save_audio.clone(),
            image: cli.image.clone(),
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("chalkmark").chain(args.iter().copied()))
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_resolve() {
        let config = Config::resolve(&cli(&[]), no_env).unwrap();
        assert_eq!(config.gemini.text_model, DEFAULT_TEXT_MODEL);
        assert_eq!(config.gemini.timeout, Duration::from_secs(120));
        assert_eq!(config.gemini.api_key, None);
        assert_eq!(config.history_limit, 10);
        assert_eq!(config.overlap, OverlapPolicy::AnyIntersection);
        assert_eq!(config.highlight, Duration::from_millis(800));
        assert_eq!(config.cell, CellMetrics::default());
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.save_audio, None);
    }

    #[test]
    fn api_key_precedence() {
        let env = |name: &str| match name {
            "GEMINI_API_KEY" => Some("from-gemini".to_string()),
            "API_KEY" => Some("from-generic".to_string()),
            _ => None,
        };
        let config = Config::resolve(&cli(&[]), env).unwrap();
        assert_eq!(config.gemini.api_key.as_deref(), Some("from-gemini"));

        let generic_only = |name: &str| (name == "API_KEY").then(|| "from-generic".to_string());
        let config = Config::resolve(&cli(&[]), generic_only).unwrap();
        assert_eq!(config.gemini.api_key.as_deref(), Some("from-generic"));

        let config = Config::resolve(&cli(&["--api-key", "flag"]), env).unwrap();
        assert_eq!(config.gemini.api_key.as_deref(), Some("flag"));
    }

    #[test]
    fn parses_overlap_and_cell_size() {
        let config =
            Config::resolve(&cli(&["--overlap", "0.5", "--cell-size", "10x20"]), no_env).unwrap();
        assert_eq!(config.overlap, OverlapPolicy::MinCoverage(0.5));
        assert_eq!(config.cell, CellMetrics::new(10.0, 20.0));
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(
            Config::resolve(&cli(&["--cell-size", "wide"]), no_env).unwrap_err(),
            ConfigError::CellSize("wide".into())
        );
        assert_eq!(
            Config::resolve(&cli(&["--timeout", "0"]), no_env).unwrap_err(),
            ConfigError::Timeout
        );
        assert!(matches!(
            Config::resolve(&cli(&["--overlap", "2"]), no_env),
            Err(ConfigError::Overlap(_))
        ));
        assert!(matches!(
            Config::resolve(&cli(&["--log-level", "loud"]), no_env),
            Err(ConfigError::LogLevel(_))
        ));
    }
}
