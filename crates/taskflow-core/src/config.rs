//! Run configuration for TaskFlow.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! command-line flags. The merged values are validated exactly once into a
//! [`RunConfiguration`], which is immutable afterwards.

use std::fmt;
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

pub const OUTER_RANGE: RangeInclusive<u32> = 1..=1000;
pub const MIDDLE_RANGE: RangeInclusive<u32> = 1..=10;
pub const INNER_RANGE: RangeInclusive<u32> = 1..=20;
pub const SLEEP_RANGE: RangeInclusive<f64> = 0.01..=1.0;

pub const DEFAULT_OUTER: u32 = 100;
pub const DEFAULT_MIDDLE: u32 = 5;
pub const DEFAULT_INNER: u32 = 10;
pub const DEFAULT_SLEEP_SECS: f64 = 0.05;
pub const DEFAULT_EARLY_EXIT_PROBABILITY: f64 = 0.03;
pub const DEFAULT_JITTER_MIN: f64 = 0.5;
pub const DEFAULT_JITTER_MAX: f64 = 1.5;
/// Largest accepted jitter multiplier; keeps a scaled sleep within ten seconds.
pub const MAX_JITTER: f64 = 10.0;
pub const DEFAULT_SPLASH_MS: u64 = 2000;
pub const DEFAULT_LOG_CAPACITY: usize = 100;

/// Upper bound accepted for the splash delay.
const MAX_SPLASH_MS: u64 = 10_000;

/// Configuration violations. Always fatal: they abort before the run starts.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A numeric parameter fell outside its allowed range.
    OutOfRange {
        field: &'static str,
        value: String,
        min: String,
        max: String,
    },
    /// Jitter bounds must satisfy `0 < min <= max <= MAX_JITTER`.
    InvalidJitter { min: f64, max: f64 },
    /// A progress total must be at least 1.
    ZeroTotal { label: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(
                f,
                "invalid value '{value}' for {field}: must be between {min} and {max}"
            ),
            ConfigError::InvalidJitter { min, max } => write!(
                f,
                "invalid jitter bounds [{min}, {max}]: expected 0 < min <= max <= {MAX_JITTER}"
            ),
            ConfigError::ZeroTotal { label } => {
                write!(f, "progress total for '{label}' must be at least 1")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

fn check_range<T>(
    field: &'static str,
    value: T,
    range: &RangeInclusive<T>,
) -> Result<T, ConfigError>
where
    T: PartialOrd + fmt::Display + Copy,
{
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value: value.to_string(),
            min: range.start().to_string(),
            max: range.end().to_string(),
        })
    }
}

/// Validated, immutable parameters for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfiguration {
    outer_count: u32,
    middle_count: u32,
    inner_max: u32,
    base_sleep: Duration,
    early_exit_probability: f64,
    jitter: (f64, f64),
    seed: Option<u64>,
    splash_delay: Duration,
    log_capacity: usize,
}

impl RunConfiguration {
    /// Creates a configuration with default tunables.
    ///
    /// # Errors
    /// Returns `ConfigError::OutOfRange` if any bound is violated.
    pub fn new(
        outer_count: u32,
        middle_count: u32,
        inner_max: u32,
        base_sleep_secs: f64,
    ) -> Result<Self, ConfigError> {
        let outer_count = check_range("outer", outer_count, &OUTER_RANGE)?;
        let middle_count = check_range("middle", middle_count, &MIDDLE_RANGE)?;
        let inner_max = check_range("inner", inner_max, &INNER_RANGE)?;
        // NaN fails `contains`, so it is rejected here too.
        let base_sleep_secs = check_range("sleep", base_sleep_secs, &SLEEP_RANGE)?;

        Ok(Self {
            outer_count,
            middle_count,
            inner_max,
            base_sleep: Duration::from_secs_f64(base_sleep_secs),
            early_exit_probability: DEFAULT_EARLY_EXIT_PROBABILITY,
            jitter: (DEFAULT_JITTER_MIN, DEFAULT_JITTER_MAX),
            seed: None,
            splash_delay: Duration::from_millis(DEFAULT_SPLASH_MS),
            log_capacity: DEFAULT_LOG_CAPACITY,
        })
    }

    /// Sets the per-inner-step early termination probability.
    ///
    /// # Errors
    /// Returns `ConfigError::OutOfRange` unless `0.0 <= p <= 1.0`.
    pub fn with_early_exit_probability(mut self, p: f64) -> Result<Self, ConfigError> {
        self.early_exit_probability = check_range("early_exit_probability", p, &(0.0..=1.0))?;
        Ok(self)
    }

    /// Sets the bounds of the sleep jitter multiplier.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidJitter` unless `0 < min <= max <= MAX_JITTER`.
    pub fn with_jitter(mut self, min: f64, max: f64) -> Result<Self, ConfigError> {
        let bounded = min.is_finite() && min > 0.0 && min <= max && max <= MAX_JITTER;
        if !bounded || Duration::try_from_secs_f64(self.base_sleep.as_secs_f64() * max).is_err() {
            return Err(ConfigError::InvalidJitter { min, max });
        }
        self.jitter = (min, max);
        Ok(self)
    }

    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Sets how long the splash screen stays up before the run starts.
    ///
    /// # Errors
    /// Returns `ConfigError::OutOfRange` above 10 seconds.
    pub fn with_splash_delay(mut self, delay: Duration) -> Result<Self, ConfigError> {
        let ms = check_range("splash_ms", delay.as_millis() as u64, &(0..=MAX_SPLASH_MS))?;
        self.splash_delay = Duration::from_millis(ms);
        Ok(self)
    }

    /// Sets how many wrapped lines the message log retains.
    ///
    /// # Errors
    /// Returns `ConfigError::OutOfRange` for zero or more than 10 000 lines.
    pub fn with_log_capacity(mut self, capacity: usize) -> Result<Self, ConfigError> {
        self.log_capacity = check_range("log_capacity", capacity, &(1..=10_000))?;
        Ok(self)
    }

    pub fn outer_count(&self) -> u32 {
        self.outer_count
    }

    pub fn middle_count(&self) -> u32 {
        self.middle_count
    }

    pub fn inner_max(&self) -> u32 {
        self.inner_max
    }

    pub fn base_sleep(&self) -> Duration {
        self.base_sleep
    }

    pub fn early_exit_probability(&self) -> f64 {
        self.early_exit_probability
    }

    pub fn jitter(&self) -> (f64, f64) {
        self.jitter
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn splash_delay(&self) -> Duration {
        self.splash_delay
    }

    pub fn log_capacity(&self) -> usize {
        self.log_capacity
    }

    /// Planned inner steps per outer iteration (`middle × inner`).
    pub fn inner_budget(&self) -> u64 {
        u64::from(self.middle_count) * u64::from(self.inner_max)
    }

    /// Upper bound on inner steps for the whole run.
    pub fn max_inner_steps(&self) -> u64 {
        u64::from(self.outer_count) * self.inner_budget()
    }
}

impl Default for RunConfiguration {
    fn default() -> Self {
        Self {
            outer_count: DEFAULT_OUTER,
            middle_count: DEFAULT_MIDDLE,
            inner_max: DEFAULT_INNER,
            base_sleep: Duration::from_secs_f64(DEFAULT_SLEEP_SECS),
            early_exit_probability: DEFAULT_EARLY_EXIT_PROBABILITY,
            jitter: (DEFAULT_JITTER_MIN, DEFAULT_JITTER_MAX),
            seed: None,
            splash_delay: Duration::from_millis(DEFAULT_SPLASH_MS),
            log_capacity: DEFAULT_LOG_CAPACITY,
        }
    }
}

/// Unvalidated configuration layer (config file or CLI flags).
///
/// Every field is optional; `merge` lets a later layer override an earlier one.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawRunConfig {
    pub outer: Option<u32>,
    pub middle: Option<u32>,
    pub inner: Option<u32>,
    pub sleep: Option<f64>,
    pub early_exit_probability: Option<f64>,
    pub jitter_min: Option<f64>,
    pub jitter_max: Option<f64>,
    pub seed: Option<u64>,
    pub splash_ms: Option<u64>,
    pub log_capacity: Option<usize>,
}

impl RawRunConfig {
    /// Loads a layer from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("parse config file {}", path.display()))
    }

    /// Parses a layer from TOML text.
    ///
    /// # Errors
    /// Returns an error on malformed TOML or unknown keys.
    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("invalid TOML")
    }

    /// Returns `self` with every field that `overrides` sets replaced.
    #[must_use]
    pub fn merge(self, overrides: RawRunConfig) -> Self {
        Self {
            outer: overrides.outer.or(self.outer),
            middle: overrides.middle.or(self.middle),
            inner: overrides.inner.or(self.inner),
            sleep: overrides.sleep.or(self.sleep),
            early_exit_probability: overrides
                .early_exit_probability
                .or(self.early_exit_probability),
            jitter_min: overrides.jitter_min.or(self.jitter_min),
            jitter_max: overrides.jitter_max.or(self.jitter_max),
            seed: overrides.seed.or(self.seed),
            splash_ms: overrides.splash_ms.or(self.splash_ms),
            log_capacity: overrides.log_capacity.or(self.log_capacity),
        }
    }

    /// Fills unset fields with defaults and validates the result.
    ///
    /// # Errors
    /// Returns the first `ConfigError` encountered.
    pub fn validate(self) -> Result<RunConfiguration, ConfigError> {
        RunConfiguration::new(
            self.outer.unwrap_or(DEFAULT_OUTER),
            self.middle.unwrap_or(DEFAULT_MIDDLE),
            self.inner.unwrap_or(DEFAULT_INNER),
            self.sleep.unwrap_or(DEFAULT_SLEEP_SECS),
        )?
        .with_early_exit_probability(
            self.early_exit_probability
                .unwrap_or(DEFAULT_EARLY_EXIT_PROBABILITY),
        )?
        .with_jitter(
            self.jitter_min.unwrap_or(DEFAULT_JITTER_MIN),
            self.jitter_max.unwrap_or(DEFAULT_JITTER_MAX),
        )?
        .with_splash_delay(Duration::from_millis(
            self.splash_ms.unwrap_or(DEFAULT_SPLASH_MS),
        ))?
        .with_log_capacity(self.log_capacity.unwrap_or(DEFAULT_LOG_CAPACITY))
        .map(|config| config.with_seed(self.seed))
    }
}
