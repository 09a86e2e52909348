use super::OutputError;

/// Where a value falls on a map colour scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorClass {
    /// Below the lower bound, drawn in the reserved colour (white)
    Reserved,
    /// Index into the colour ramp
    Ramp(usize),
}

/// Lower/upper bounds of a pigment map's colour ramp, split into `levels`
/// equal bins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    lower: f64,
    upper: f64,
    levels: usize,
}

impl ColorScale {
    /// Number of ramp colours in the default viridis map.
    pub const DEFAULT_LEVELS: usize = 256;

    pub fn new(lower: f64, upper: f64, levels: usize) -> Result<Self, OutputError> {
        if !(lower < upper) || levels == 0 {
            return Err(OutputError::ColorBounds { lower, upper });
        }
        Ok(Self {
            lower,
            upper,
            levels,
        })
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// `None` for missing values; values at or above `upper` clamp to the
    /// top of the ramp.
    pub fn classify(&self, value: f64) -> Option<ColorClass> {
        if value.is_nan() {
            return None;
        }
        if value < self.lower {
            return Some(ColorClass::Reserved);
        }

        let fraction = (value - self.lower) / (self.upper - self.lower);
        let index = (fraction * self.levels as f64).floor() as usize;
        Some(ColorClass::Ramp(index.min(self.levels - 1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        let scale = ColorScale::new(0.0, 1.0, 4).unwrap();
        assert_eq!(scale.classify(f64::NAN), None);
        assert_eq!(scale.classify(-0.1), Some(ColorClass::Reserved));
        assert_eq!(scale.classify(0.0), Some(ColorClass::Ramp(0)));
        assert_eq!(scale.classify(0.3), Some(ColorClass::Ramp(1)));
        assert_eq!(scale.classify(0.99), Some(ColorClass::Ramp(3)));
        assert_eq!(scale.classify(5.0), Some(ColorClass::Ramp(3)));
    }

    #[test]
    fn test_invalid_bounds() {
        assert!(ColorScale::new(1.0, 1.0, 4).is_err());
        assert!(ColorScale::new(2.0, 1.0, 4).is_err());
        assert!(ColorScale::new(0.0, 1.0, 0).is_err());
        assert!(ColorScale::new(0.0, 1.0, ColorScale::DEFAULT_LEVELS).is_ok());
    }
}
