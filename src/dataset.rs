// Working dataset handed to every run

use std::ops::RangeInclusive;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Values shown before the first reset
pub const DEFAULT_VALUES: [f64; 9] = [50.0, 20.0, 90.0, 10.0, 30.0, 70.0, 40.0, 80.0, 60.0];

/// Reset settings (`[dataset]` config section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Starting values; the built-in seed when absent
    #[serde(default)]
    pub initial: Option<Vec<f64>>,
    /// Number of values a random reset produces
    #[serde(default = "default_random_len")]
    pub random_len: usize,
    #[serde(default = "default_random_min")]
    pub random_min: u32,
    #[serde(default = "default_random_max")]
    pub random_max: u32,
}

fn default_random_len() -> usize {
    10
}
fn default_random_min() -> u32 {
    10
}
fn default_random_max() -> u32 {
    99
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            initial: None,
            random_len: default_random_len(),
            random_min: default_random_min(),
            random_max: default_random_max(),
        }
    }
}

impl DatasetConfig {
    pub fn random_range(&self) -> RangeInclusive<u32> {
        let (lo, hi) = (self.random_min, self.random_max);
        lo.min(hi)..=lo.max(hi)
    }

    /// Dataset the session starts with
    pub fn initial_dataset(&self) -> Dataset {
        match &self.initial {
            Some(values) => Dataset::new(values.clone()),
            None => Dataset::default(),
        }
    }

    pub fn reset<R: Rng + ?Sized>(&self, rng: &mut R) -> Dataset {
        Dataset::random(rng, self.random_len, self.random_range())
    }
}

/// Host-owned numbers a script sorts. Runs only ever see a copy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Dataset {
    values: Vec<f64>,
}

impl Default for Dataset {
    fn default() -> Self {
        Dataset::new(DEFAULT_VALUES.to_vec())
    }
}

impl Dataset {
    pub fn new(values: Vec<f64>) -> Self {
        Dataset { values }
    }

    /// `len` random integers drawn uniformly from `range`
    pub fn random<R: Rng + ?Sized>(rng: &mut R, len: usize, range: RangeInclusive<u32>) -> Self {
        let values = (0..len)
            .map(|_| f64::from(rng.random_range(range.clone())))
            .collect();
        Dataset { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parse a comma-separated list such as `5,3,1`
    pub fn parse(text: &str) -> Result<Self, std::num::ParseFloatError> {
        let values = text
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse::<f64>)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Dataset { values })
    }
}

impl From<Vec<f64>> for Dataset {
    fn from(values: Vec<f64>) -> Self {
        Dataset::new(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_default_seed() {
        let dataset = Dataset::default();
        assert_eq!(dataset.len(), 9);
        assert_eq!(dataset.values()[0], 50.0);
    }

    #[test]
    fn test_random_reset_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let dataset = DatasetConfig::default().reset(&mut rng);
        assert_eq!(dataset.len(), 10);
        for &v in dataset.values() {
            assert!((10.0..=99.0).contains(&v));
            assert_eq!(v.fract(), 0.0);
        }
    }

    #[test]
    fn test_swapped_bounds_are_tolerated() {
        let config = DatasetConfig {
            random_min: 50,
            random_max: 5,
            ..DatasetConfig::default()
        };
        assert_eq!(config.random_range(), 5..=50);
    }

    #[test]
    fn test_parse_list() {
        let dataset = Dataset::parse("5, 3,1.5,").unwrap();
        assert_eq!(dataset.values(), &[5.0, 3.0, 1.5]);
        assert!(Dataset::parse("5,x").is_err());
    }
}
