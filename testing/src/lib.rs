//! Deterministic stand-ins for the random delay distributions used by
//! simulation models, so model tests can assert exact event traces.

#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::default_trait_access)]

use std::cell::Cell;

use rand::distributions::Distribution;

/// A distribution that ignores the random number generator and always
/// produces the same value.
pub struct ConstDistribution<T> {
    value: T,
}

impl<T> ConstDistribution<T> {
    /// Constructs a distribution that always produces `value`.
    pub fn new(value: T) -> Self {
        Self { value }
    }
}

impl<T: Copy> Distribution<T> for ConstDistribution<T> {
    fn sample<R: rand::Rng + ?Sized>(&self, _: &mut R) -> T {
        self.value
    }
}

/// A distribution that replays a fixed sequence of values, repeating the
/// last one once the sequence is exhausted.
pub struct SequenceDistribution<T> {
    values: Vec<T>,
    position: Cell<usize>,
}

impl<T> SequenceDistribution<T> {
    /// Constructs a distribution replaying `values` in order.
    ///
    /// # Panics
    ///
    /// Panics if `values` is empty.
    pub fn new(values: Vec<T>) -> Self {
        assert!(!values.is_empty(), "sequence must not be empty");
        Self {
            values,
            position: Cell::new(0),
        }
    }
}

impl<T: Copy> Distribution<T> for SequenceDistribution<T> {
    fn sample<R: rand::Rng + ?Sized>(&self, _: &mut R) -> T {
        let position = self.position.get();
        self.position.set((position + 1).min(self.values.len() - 1));
        self.values[position]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use rand::rngs::mock::StepRng;

    #[test]
    fn test_const_distribution_ignores_rng() {
        let dist = ConstDistribution::new(7_u64);
        let mut rng = StepRng::new(0, 1);
        assert_eq!(dist.sample(&mut rng), 7);
        assert_eq!(dist.sample(&mut rng), 7);
    }

    #[test]
    fn test_sequence_repeats_last_value() {
        let dist = SequenceDistribution::new(vec![1_u64, 2, 3]);
        let mut rng = StepRng::new(0, 1);
        let drawn: Vec<_> = (0..5).map(|_| dist.sample(&mut rng)).collect();
        assert_eq!(drawn, vec![1, 2, 3, 3, 3]);
    }

    #[test]
    #[should_panic(expected = "sequence must not be empty")]
    fn test_empty_sequence_is_rejected() {
        let _ = SequenceDistribution::new(Vec::<u64>::new());
    }
}
