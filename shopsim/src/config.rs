//! Anything related to loading the simulation setup from configuration
//! files.

use std::io::{Cursor, Read};
use std::str::FromStr;
use std::time::Duration;

use eyre::{ensure, WrapErr};
use serde::{Deserialize, Serialize};

use crate::random::DelayDistribution;

/// Type of time units used in the simulation.
#[derive(
    Debug,
    Serialize,
    Deserialize,
    strum::EnumString,
    strum::ToString,
    PartialEq,
    Eq,
    Copy,
    Clone,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TimeUnit {
    /// Nanoseconds.
    Nano,
    /// Microseconds.
    Micro,
    /// Milliseconds.
    Milli,
    /// Seconds.
    Second,
    /// Minutes.
    Minute,
}

impl Default for TimeUnit {
    fn default() -> Self {
        Self::Second
    }
}

impl TimeUnit {
    /// Converts `ticks` of this unit into a [`Duration`].
    #[must_use]
    pub fn duration(self, ticks: u64) -> Duration {
        match self {
            Self::Nano => Duration::from_nanos(ticks),
            Self::Micro => Duration::from_micros(ticks),
            Self::Milli => Duration::from_millis(ticks),
            Self::Second => Duration::from_secs(ticks),
            Self::Minute => Duration::from_secs(ticks.saturating_mul(60)),
        }
    }
}

fn default_stage() -> u64 {
    1
}

/// Simulation configuration typically loaded from a file.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Length of the simulated shift, in time units.
    pub shift: u64,
    /// Distribution of the interval between two job arrivals, in time
    /// units.
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub interarrival: DelayDistribution,
    /// Distribution of the machining time of a single job, in time units.
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub service: DelayDistribution,
    /// Random seed. A seed passed on the command line takes precedence.
    pub seed: Option<u64>,
    /// Time unit. Any integer time will be interpreted as this unit.
    #[serde(default)]
    pub time_unit: TimeUnit,
    /// Priority jobs line up in the backlog with. Lower values dequeue
    /// sooner.
    #[serde(default)]
    pub priority: u64,
    /// Stage tag jobs line up in the backlog with.
    #[serde(default = "default_stage")]
    pub stage: u64,
}

impl Config {
    /// Load config from YAML file.
    ///
    /// # Example
    ///
    /// ```
    /// # use shopsim::config::{Config, TimeUnit};
    /// # fn main() -> eyre::Result<()> {
    /// let input = r#"
    /// time_unit: minute
    /// shift: 480
    /// interarrival:
    ///     uniform:
    ///         low: 14
    ///         high: 26
    /// service:
    ///     uniform:
    ///         low: 12
    ///         high: 20"#;
    /// let config = Config::from_yaml(std::io::Cursor::new(input))?;
    /// assert_eq!(config.time_unit, TimeUnit::Minute);
    /// assert_eq!(config.shift, 480);
    /// assert_eq!(config.seed, None);
    /// assert_eq!(config.priority, 0);
    /// assert_eq!(config.stage, 1);
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// An error is returned if the string/file cannot be parsed, if the
    /// shift is zero, or if either delay distribution is invalid (see
    /// [`DelayDistribution::sampler`]).
    pub fn from_yaml<R: Read>(reader: R) -> eyre::Result<Self> {
        let config: Self = serde_yaml::from_reader(reader).wrap_err("Failed to parse config")?;
        config.verify()
    }

    fn verify(self) -> eyre::Result<Self> {
        ensure!(self.shift > 0, "Shift must be positive");
        self.interarrival
            .sampler()
            .wrap_err("Invalid interarrival distribution")?;
        self.service
            .sampler()
            .wrap_err("Invalid service distribution")?;
        Ok(self)
    }
}

impl FromStr for Config {
    type Err = eyre::Report;
    fn from_str(config: &str) -> Result<Self, Self::Err> {
        Config::from_yaml(Cursor::new(config))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_config() -> eyre::Result<()> {
        let input = r#"
shift: 480
time_unit: minute
seed: 17
priority: 2
stage: 5
interarrival:
    exponential:
        mean: 20
service:
    uniform:
        low: 12
        high: 20"#;
        let config = Config::from_str(input)?;
        assert_eq!(config.shift, 480);
        assert_eq!(config.seed, Some(17));
        assert_eq!(config.time_unit, TimeUnit::Minute);
        assert_eq!(config.priority, 2);
        assert_eq!(config.stage, 5);
        assert_eq!(
            config.interarrival,
            DelayDistribution::Exponential { mean: 20.0 }
        );
        assert_eq!(
            config.service,
            DelayDistribution::Uniform { low: 12, high: 20 }
        );
        Ok(())
    }

    #[test]
    fn test_distributions_parse_from_named_maps() -> eyre::Result<()> {
        let input = r#"
shift: 100
interarrival:
    poisson:
        mean: 4.5
service:
    exponential:
        mean: 16"#;
        let config = Config::from_str(input)?;
        assert_eq!(
            config.interarrival,
            DelayDistribution::Poisson { mean: 4.5 }
        );
        assert_eq!(
            config.service,
            DelayDistribution::Exponential { mean: 16.0 }
        );
        Ok(())
    }

    #[test]
    fn test_time_unit_defaults_to_seconds() -> eyre::Result<()> {
        let input = r#"
shift: 100
interarrival:
    uniform:
        low: 1
        high: 2
service:
    uniform:
        low: 1
        high: 2"#;
        let config = Config::from_str(input)?;
        assert_eq!(config.time_unit, TimeUnit::Second);
        assert_eq!(config.seed, None);
        assert_eq!(config.priority, 0);
        assert_eq!(config.stage, 1);
        Ok(())
    }

    #[test]
    fn test_verify_fails_zero_shift() {
        let input = r#"
shift: 0
interarrival:
    uniform:
        low: 1
        high: 2
service:
    uniform:
        low: 1
        high: 2"#;
        assert_eq!(
            &format!("{}", Config::from_str(input).unwrap_err()),
            "Shift must be positive"
        );
    }

    #[test]
    fn test_verify_fails_invalid_interarrival() {
        let input = r#"
shift: 100
interarrival:
    exponential:
        mean: 0
service:
    uniform:
        low: 1
        high: 2"#;
        assert_eq!(
            &format!("{}", Config::from_str(input).unwrap_err()),
            "Invalid interarrival distribution"
        );
    }

    #[test]
    fn test_verify_fails_invalid_service() {
        let input = r#"
shift: 100
interarrival:
    uniform:
        low: 1
        high: 2
service:
    uniform:
        low: 2
        high: 1"#;
        assert_eq!(
            &format!("{}", Config::from_str(input).unwrap_err()),
            "Invalid service distribution"
        );
    }

    #[test]
    fn test_parse_failure_is_wrapped() {
        assert_eq!(
            &format!("{}", Config::from_str("shift: [").unwrap_err()),
            "Failed to parse config"
        );
    }

    #[test]
    fn test_time_unit_durations() {
        assert_eq!(TimeUnit::Nano.duration(2), Duration::from_nanos(2));
        assert_eq!(TimeUnit::Micro.duration(2), Duration::from_micros(2));
        assert_eq!(TimeUnit::Milli.duration(2), Duration::from_millis(2));
        assert_eq!(TimeUnit::Second.duration(2), Duration::from_secs(2));
        assert_eq!(TimeUnit::Minute.duration(2), Duration::from_secs(120));
    }

    #[test]
    fn test_time_unit_names() -> eyre::Result<()> {
        assert_eq!(TimeUnit::from_str("minute")?, TimeUnit::Minute);
        assert_eq!(TimeUnit::from_str("milli")?, TimeUnit::Milli);
        assert!(TimeUnit::from_str("fortnight").is_err());
        assert_eq!(TimeUnit::Second.to_string(), "second");
        Ok(())
    }
}
