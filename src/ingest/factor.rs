use rand::Rng;
use std::ops::RangeInclusive;

/// Source of the multiplier used to derive `estimated_gdp`.
///
/// One value is drawn per country per refresh.
pub trait FactorSource: Send + Sync {
    fn next_factor(&self) -> u32;
}

/// Uniform draw from an inclusive integer range using the thread-local RNG.
#[derive(Debug, Clone)]
pub struct RandomFactor {
    range: RangeInclusive<u32>,
}

impl RandomFactor {
    /// Bounds are swapped if given in the wrong order.
    pub fn new(min: u32, max: u32) -> Self {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        Self { range: lo..=hi }
    }

    pub fn range(&self) -> &RangeInclusive<u32> {
        &self.range
    }
}

impl FactorSource for RandomFactor {
    fn next_factor(&self) -> u32 {
        rand::rng().random_range(self.range.clone())
    }
}

/// Always returns the same factor. Used to make GDP derivation reproducible.
#[derive(Debug, Clone, Copy)]
pub struct FixedFactor(pub u32);

impl FactorSource for FixedFactor {
    fn next_factor(&self) -> u32 {
        self.0
    }
}
