use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Closed multiplier interval `[min, max]` applied to a base price.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MultiplierRange {
    pub min: f64,
    pub max: f64,
}

impl MultiplierRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min >= 0.0 && self.min <= self.max
    }

    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }
}

/// Source of the one non-deterministic input to pricing: the multiplier drawn
/// from a selected range.
pub trait MultiplierSource: Send {
    fn draw(&mut self, range: MultiplierRange) -> f64;
}

/// Uniform draw backed by `StdRng`.
pub struct RandomMultiplier {
    rng: StdRng,
}

impl RandomMultiplier {
    pub fn from_entropy() -> Self {
        Self { rng: StdRng::from_entropy() }
    }

    /// Reproducible sequence of draws for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl Default for RandomMultiplier {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl MultiplierSource for RandomMultiplier {
    fn draw(&mut self, range: MultiplierRange) -> f64 {
        if range.min >= range.max {
            return range.min;
        }
        self.rng.gen_range(range.min..=range.max)
    }
}

/// Always lands on the same point of whatever range it is given.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PinnedMultiplier {
    Lower,
    Upper,
    /// Position within the range, `0.0` = min and `1.0` = max.
    Fraction(f64),
}

impl MultiplierSource for PinnedMultiplier {
    fn draw(&mut self, range: MultiplierRange) -> f64 {
        match *self {
            Self::Lower => range.min,
            Self::Upper => range.max,
            Self::Fraction(fraction) => {
                let fraction = fraction.clamp(0.0, 1.0);
                (range.min + (range.max - range.min) * fraction).clamp(range.min, range.max)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MultiplierRange, MultiplierSource, PinnedMultiplier, RandomMultiplier};

    #[test]
    fn seeded_draws_are_reproducible_and_bounded() {
        let range = MultiplierRange::new(0.4, 0.5);
        let mut first = RandomMultiplier::seeded(42);
        let mut second = RandomMultiplier::seeded(42);

        for _ in 0..200 {
            let a = first.draw(range);
            let b = second.draw(range);
            assert_eq!(a, b);
            assert!(range.contains(a), "draw {a} escaped {range:?}");
        }
    }

    #[test]
    fn degenerate_range_returns_its_single_point() {
        let mut source = RandomMultiplier::seeded(7);

        assert_eq!(source.draw(MultiplierRange::new(1.0, 1.0)), 1.0);
    }

    #[test]
    fn pinned_fraction_is_clamped_into_range() {
        let range = MultiplierRange::new(0.6, 0.7);

        assert_eq!(PinnedMultiplier::Lower.draw(range), 0.6);
        assert_eq!(PinnedMultiplier::Upper.draw(range), 0.7);
        assert_eq!(PinnedMultiplier::Fraction(4.0).draw(range), 0.7);
        assert_eq!(PinnedMultiplier::Fraction(-1.0).draw(range), 0.6);
    }

    #[test]
    fn range_validity_rejects_inverted_and_non_finite_bounds() {
        assert!(MultiplierRange::new(0.2, 0.3).is_valid());
        assert!(!MultiplierRange::new(0.3, 0.2).is_valid());
        assert!(!MultiplierRange::new(-0.1, 0.2).is_valid());
        assert!(!MultiplierRange::new(0.1, f64::NAN).is_valid());
    }
}
