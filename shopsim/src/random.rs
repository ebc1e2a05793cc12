//! Random delay distributions configured by the user.

use eyre::ensure;
use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use rand_distr::{Exp, Poisson};
use serde::{Deserialize, Serialize};

/// Describes the distribution of a delay, in integer ticks of the
/// configured time unit.
#[derive(Debug, Serialize, Deserialize, PartialEq, Copy, Clone)]
#[serde(rename_all = "lowercase")]
pub enum DelayDistribution {
    /// Integers drawn uniformly from `low..=high`.
    Uniform {
        /// Shortest possible delay.
        low: u64,
        /// Longest possible delay.
        high: u64,
    },
    /// Exponentially distributed delays with the given mean, rounded to the
    /// nearest tick.
    Exponential {
        /// Mean delay.
        mean: f64,
    },
    /// Poisson distributed delays with the given mean.
    Poisson {
        /// Mean delay.
        mean: f64,
    },
}

impl DelayDistribution {
    /// Validates the parameters and compiles them into a sampler.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters do not describe a valid
    /// distribution, e.g. inverted uniform bounds or a non-positive mean.
    pub fn sampler(&self) -> eyre::Result<DelaySampler> {
        match *self {
            Self::Uniform { low, high } => {
                ensure!(
                    low <= high,
                    "Uniform delay requires low <= high ({}..{})",
                    low,
                    high
                );
                Ok(DelaySampler::Uniform(Uniform::new_inclusive(low, high)))
            }
            Self::Exponential { mean } => {
                ensure!(
                    mean > 0.0,
                    "Exponential delay requires a positive mean ({})",
                    mean
                );
                Ok(DelaySampler::Exponential(Exp::new(1.0 / mean)?))
            }
            Self::Poisson { mean } => {
                ensure!(
                    mean > 0.0,
                    "Poisson delay requires a positive mean ({})",
                    mean
                );
                Ok(DelaySampler::Poisson(Poisson::new(mean)?))
            }
        }
    }
}

/// A validated, ready-to-draw form of a [`DelayDistribution`].
#[derive(Debug)]
pub enum DelaySampler {
    /// See [`DelayDistribution::Uniform`].
    Uniform(Uniform<u64>),
    /// See [`DelayDistribution::Exponential`].
    Exponential(Exp<f64>),
    /// See [`DelayDistribution::Poisson`].
    Poisson(Poisson<f64>),
}

impl Distribution<u64> for DelaySampler {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        match self {
            Self::Uniform(uniform) => uniform.sample(rng),
            Self::Exponential(exp) => exp.sample(rng).round() as u64,
            Self::Poisson(poisson) => poisson.sample(rng).round() as u64,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use rand::SeedableRng;
    use rand_chacha::ChaChaRng;

    fn mean_of_draws(sampler: &DelaySampler, draws: usize) -> f64 {
        let mut rng = ChaChaRng::seed_from_u64(17);
        let sum: u64 = (0..draws).map(|_| sampler.sample(&mut rng)).sum();
        sum as f64 / draws as f64
    }

    #[test]
    fn test_uniform_draws_stay_within_bounds() {
        let sampler = DelayDistribution::Uniform { low: 14, high: 26 }
            .sampler()
            .unwrap();
        let mut rng = ChaChaRng::seed_from_u64(17);
        for _ in 0..1000 {
            let delay = sampler.sample(&mut rng);
            assert!((14..=26).contains(&delay));
        }
    }

    #[test]
    fn test_degenerate_uniform_is_constant() {
        let sampler = DelayDistribution::Uniform { low: 9, high: 9 }
            .sampler()
            .unwrap();
        let mut rng = ChaChaRng::seed_from_u64(17);
        assert!((0..100).all(|_| sampler.sample(&mut rng) == 9));
    }

    #[test]
    fn test_exponential_draws_hover_around_mean() {
        let sampler = DelayDistribution::Exponential { mean: 10.0 }
            .sampler()
            .unwrap();
        let mean = mean_of_draws(&sampler, 10_000);
        assert!((8.0..12.0).contains(&mean), "unexpected mean: {}", mean);
    }

    #[test]
    fn test_poisson_draws_hover_around_mean() {
        let sampler = DelayDistribution::Poisson { mean: 10.0 }
            .sampler()
            .unwrap();
        let mean = mean_of_draws(&sampler, 10_000);
        assert!((8.0..12.0).contains(&mean), "unexpected mean: {}", mean);
    }

    #[test]
    fn test_sampler_debug_names_the_variant() {
        let sampler = DelayDistribution::Poisson { mean: 2.0 }
            .sampler()
            .unwrap();
        assert!(format!("{:?}", sampler).starts_with("Poisson"));
    }

    #[test]
    fn test_inverted_uniform_bounds_are_rejected() {
        let err = DelayDistribution::Uniform { low: 26, high: 14 }
            .sampler()
            .unwrap_err();
        assert_eq!(
            format!("{}", err),
            "Uniform delay requires low <= high (26..14)"
        );
    }

    #[test]
    fn test_non_positive_means_are_rejected() {
        let err = DelayDistribution::Exponential { mean: 0.0 }
            .sampler()
            .unwrap_err();
        assert_eq!(
            format!("{}", err),
            "Exponential delay requires a positive mean (0)"
        );

        let err = DelayDistribution::Poisson { mean: -3.0 }
            .sampler()
            .unwrap_err();
        assert_eq!(
            format!("{}", err),
            "Poisson delay requires a positive mean (-3)"
        );
    }
}
