use ndarray::ArrayView1;

use crate::inversion::PixelSpectrum;

/// Inputs gathered for a single (line, pixel) cell.
#[derive(Debug, Clone)]
pub struct PixelData<'a> {
    pub line: usize,
    pub pixel: usize,
    pub rrs: ArrayView1<'a, f64>,     // Remote sensing reflectance, one value per band
    pub rrs_unc: ArrayView1<'a, f64>, // Uncertainty of rrs
    pub salinity: f64,                // PSU, aligned onto the swath
    pub temperature: f64,             // Celsius, aligned onto the swath
}

impl<'a> PixelData<'a> {
    /// A cell is skipped when its leading reflectance, its salinity or its
    /// temperature is missing.
    pub fn is_missing(&self) -> bool {
        let leading = self.rrs.first().copied().unwrap_or(f64::NAN);
        leading.is_nan() || self.salinity.is_nan() || self.temperature.is_nan()
    }

    /// Runs `f` on the cell's spectrum, or returns `None` for a skipped cell.
    pub fn with_spectrum<T, F>(&self, wavelengths: &[f64], f: F) -> Option<T>
    where
        F: FnOnce(&PixelSpectrum<'_>) -> T,
    {
        if self.is_missing() {
            return None;
        }

        let rrs = self.rrs.to_vec();
        let rrs_unc = self.rrs_unc.to_vec();
        let spectrum = PixelSpectrum {
            rrs: &rrs,
            rrs_unc: &rrs_unc,
            wavelengths,
            temperature: self.temperature,
            salinity: self.salinity,
        };

        Some(f(&spectrum))
    }
}
