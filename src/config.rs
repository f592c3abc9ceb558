use crate::index::SearchThresholds;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Default tolerance, in percent.
pub const DEFAULT_TOLERANCE: u8 = 7;
/// Largest accepted tolerance, in percent.
pub const MAX_TOLERANCE: u8 = 50;
/// Slots preallocated in the registry before the walk.
pub const REGISTRY_CAPACITY: usize = 1000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("'-d' option should be in range [0, {max}], got {value}")]
    ToleranceOutOfRange { value: i64, max: u8 },

    #[error("'-d' option is not a number: {input}")]
    ToleranceNotANumber { input: String },
}

/// Maximum allowed difference between two images, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Tolerance(u8);

impl Tolerance {
    pub fn new(percent: i64) -> Result<Self, ConfigError> {
        if (0..=i64::from(MAX_TOLERANCE)).contains(&percent) {
            Ok(Self(percent as u8))
        } else {
            Err(ConfigError::ToleranceOutOfRange {
                value: percent,
                max: MAX_TOLERANCE,
            })
        }
    }

    pub fn percent(self) -> u8 {
        self.0
    }

    pub fn thresholds(self) -> SearchThresholds {
        SearchThresholds::from_percent(self.0)
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self(DEFAULT_TOLERANCE)
    }
}

impl fmt::Display for Tolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Parse a tolerance from command-line text.
pub fn parse_tolerance(input: &str) -> Result<Tolerance, ConfigError> {
    let value: i64 = input
        .trim()
        .parse()
        .map_err(|_| ConfigError::ToleranceNotANumber {
            input: input.to_string(),
        })?;
    Tolerance::new(value)
}

/// How chatty diagnostics on stderr are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    #[default]
    Silent,
    Verbose,
    Debug,
}

impl Verbosity {
    /// Map a repeated `-v` count, capped at [`Verbosity::Debug`].
    pub fn from_occurrences(count: u8) -> Self {
        match count {
            0 => Verbosity::Silent,
            1 => Verbosity::Verbose,
            _ => Verbosity::Debug,
        }
    }

    /// Default tracing filter directive for this level
    pub fn filter_directive(self) -> &'static str {
        match self {
            Verbosity::Silent => "warn",
            Verbosity::Verbose => "info",
            Verbosity::Debug => "debug",
        }
    }

    pub fn shows_progress(self) -> bool {
        self >= Verbosity::Verbose
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    pub tolerance: Tolerance,
    pub verbosity: Verbosity,
}

impl Config {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            tolerance: Tolerance::default(),
            verbosity: Verbosity::default(),
        }
    }

    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerance_bounds() {
        assert_eq!(Tolerance::new(0).unwrap().percent(), 0);
        assert_eq!(Tolerance::new(50).unwrap().percent(), 50);
        assert_eq!(
            Tolerance::new(51),
            Err(ConfigError::ToleranceOutOfRange { value: 51, max: 50 })
        );
        assert!(Tolerance::new(-1).is_err());
    }

    #[test]
    fn test_default_tolerance() {
        assert_eq!(Tolerance::default().percent(), 7);
        assert_eq!(Tolerance::default().to_string(), "7%");
    }

    #[test]
    fn test_parse_tolerance() {
        assert_eq!(parse_tolerance("12").unwrap().percent(), 12);
        assert_eq!(parse_tolerance(" 3 ").unwrap().percent(), 3);
        assert!(matches!(
            parse_tolerance("abc"),
            Err(ConfigError::ToleranceNotANumber { .. })
        ));
        assert!(matches!(
            parse_tolerance("99"),
            Err(ConfigError::ToleranceOutOfRange { value: 99, .. })
        ));
    }

    #[test]
    fn test_thresholds_follow_tolerance() {
        let thresholds = Tolerance::new(50).unwrap().thresholds();
        assert!((thresholds.ratio - 0.5).abs() < f32::EPSILON);
        assert!((thresholds.bitmap - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_verbosity_is_capped() {
        assert_eq!(Verbosity::from_occurrences(0), Verbosity::Silent);
        assert_eq!(Verbosity::from_occurrences(1), Verbosity::Verbose);
        assert_eq!(Verbosity::from_occurrences(2), Verbosity::Debug);
        assert_eq!(Verbosity::from_occurrences(9), Verbosity::Debug);

        assert_eq!(Verbosity::Silent.filter_directive(), "warn");
        assert!(!Verbosity::Silent.shows_progress());
        assert!(Verbosity::Debug.shows_progress());
    }

    #[test]
    fn test_config_builder() {
        let config = Config::new("/photos")
            .with_tolerance(Tolerance::new(20).unwrap())
            .with_verbosity(Verbosity::Verbose);

        assert_eq!(config.root, PathBuf::from("/photos"));
        assert_eq!(config.tolerance.percent(), 20);
        assert_eq!(config.verbosity, Verbosity::Verbose);
    }
}
