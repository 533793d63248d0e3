/// Rounds to two decimals, ties to even.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Arithmetic mean rounded to two decimals. `None` for empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(round2(values.iter().sum::<f64>() / values.len() as f64))
}

/// Credit-weighted running mean.
///
/// An undefined average carries zero weight and zero numerator, so merging
/// never multiplies through a missing value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WeightedMean {
    weight: i32,
    total: f64,
}

impl WeightedMean {
    pub fn from_average(average: Option<f64>, weight: i32) -> Self {
        match average {
            Some(value) => WeightedMean {
                weight,
                total: value * weight as f64,
            },
            None => WeightedMean::default(),
        }
    }

    pub fn add(&mut self, value: f64, weight: i32) {
        self.weight += weight;
        self.total += value * weight as f64;
    }

    pub fn merge(self, other: WeightedMean) -> WeightedMean {
        WeightedMean {
            weight: self.weight + other.weight,
            total: self.total + other.total,
        }
    }

    pub fn weight(&self) -> i32 {
        self.weight
    }

    /// Rounded mean, or `None` when nothing with weight has been added.
    pub fn value(&self) -> Option<f64> {
        if self.weight == 0 {
            return None;
        }
        Some(round2(self.total / self.weight as f64))
    }
}
