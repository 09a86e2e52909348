use std::fmt::Display;

/// Summary of one pigment field, missing cells excluded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PigmentStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub valid: usize,
    pub total: usize,
}

impl PigmentStats {
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let mut total = 0;
        let mut valid = 0;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for v in values {
            total += 1;
            if v.is_nan() {
                continue;
            }
            valid += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }

        if valid == 0 {
            return Self {
                min: f64::NAN,
                max: f64::NAN,
                mean: f64::NAN,
                valid,
                total,
            };
        }

        Self {
            min,
            max,
            mean: sum / valid as f64,
            valid,
            total,
        }
    }

    pub fn valid_fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.valid as f64 / self.total as f64
        }
    }
}

impl Display for PigmentStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Min: {:.4} mg m-3, Max: {:.4} mg m-3, Mean: {:.4} mg m-3, Valid pixels: {} / {} ({:.1}%)",
            self.min,
            self.max,
            self.mean,
            self.valid,
            self.total,
            100.0 * self.valid_fraction()
        )
    }
}
