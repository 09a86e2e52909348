//! Level-2 swath grid: per-pixel reflectance spectra on a curvilinear
//! (scan-line, pixel-in-line) grid.

pub mod subset;

pub use subset::{SubsetError, SwathSubset};

use ndarray::{Array2, Array3, ArrayView1, s};
use std::fmt::Display;
use std::ops::Range;
use thiserror::Error;

use crate::bbox::{BoundingBox, Extent};

#[derive(Debug, Error, PartialEq)]
pub enum SwathError {
    #[error("Rrs shape {rrs:?} does not match Rrs_unc shape {unc:?}")]
    UncertaintyShape {
        rrs: (usize, usize, usize),
        unc: (usize, usize, usize),
    },
    #[error("Rrs has {bands} bands but {wavelengths} wavelengths were given")]
    Wavelengths { bands: usize, wavelengths: usize },
    #[error("{name} shape {got:?} does not match the swath grid {expected:?}")]
    Coordinates {
        name: &'static str,
        got: (usize, usize),
        expected: (usize, usize),
    },
    #[error("window {window:?} exceeds the swath grid {shape:?}")]
    Window {
        window: SwathWindow,
        shape: (usize, usize),
    },
}

/// Rectangular block of lines and pixels of a swath.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwathWindow {
    pub lines: Range<usize>,
    pub pixels: Range<usize>,
}

impl SwathWindow {
    pub fn origin(&self) -> (usize, usize) {
        (self.lines.start, self.pixels.start)
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.lines.len(), self.pixels.len())
    }

    fn fits(&self, (lines, pixels): (usize, usize)) -> bool {
        self.lines.start <= self.lines.end
            && self.lines.end <= lines
            && self.pixels.start <= self.pixels.end
            && self.pixels.end <= pixels
    }
}

/// Per-pixel latitude and longitude of a swath.
#[derive(Debug, Clone, PartialEq)]
pub struct Navigation {
    latitude: Array2<f64>,
    longitude: Array2<f64>,
}

impl Navigation {
    pub fn new(latitude: Array2<f64>, longitude: Array2<f64>) -> Result<Self, SwathError> {
        if longitude.dim() != latitude.dim() {
            return Err(SwathError::Coordinates {
                name: "longitude",
                got: longitude.dim(),
                expected: latitude.dim(),
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> &Array2<f64> {
        &self.latitude
    }

    pub fn longitude(&self) -> &Array2<f64> {
        &self.longitude
    }

    /// (number_of_lines, pixels_per_line)
    pub fn shape(&self) -> (usize, usize) {
        self.latitude.dim()
    }

    pub fn extent(&self) -> Option<Extent> {
        Extent::from_coordinates(self.latitude.iter().zip(self.longitude.iter()))
    }

    /// Smallest window holding every pixel strictly inside `bbox`, `None`
    /// when there is no such pixel.
    pub fn window(&self, bbox: &BoundingBox) -> Option<SwathWindow> {
        let mut lines: Option<(usize, usize)> = None;
        let mut pixels: Option<(usize, usize)> = None;

        for ((line, pixel), &lat) in self.latitude.indexed_iter() {
            if !bbox.contains(lat, self.longitude[[line, pixel]]) {
                continue;
            }
            let l = lines.get_or_insert((line, line));
            l.0 = l.0.min(line);
            l.1 = l.1.max(line);
            let p = pixels.get_or_insert((pixel, pixel));
            p.0 = p.0.min(pixel);
            p.1 = p.1.max(pixel);
        }

        match (lines, pixels) {
            (Some((l0, l1)), Some((p0, p1))) => Some(SwathWindow {
                lines: l0..l1 + 1,
                pixels: p0..p1 + 1,
            }),
            _ => None,
        }
    }

    fn window_copy(&self, window: &SwathWindow) -> Navigation {
        let block = s![window.lines.clone(), window.pixels.clone()];
        Navigation {
            latitude: self.latitude.slice(block).to_owned(),
            longitude: self.longitude.slice(block).to_owned(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Swath {
    wavelengths: Vec<f64>,
    rrs: Array3<f64>,
    rrs_unc: Array3<f64>,
    navigation: Navigation,
}

impl Swath {
    pub fn new(
        wavelengths: Vec<f64>,
        rrs: Array3<f64>,
        rrs_unc: Array3<f64>,
        latitude: Array2<f64>,
        longitude: Array2<f64>,
    ) -> Result<Self, SwathError> {
        if rrs.dim() != rrs_unc.dim() {
            return Err(SwathError::UncertaintyShape {
                rrs: rrs.dim(),
                unc: rrs_unc.dim(),
            });
        }

        let (lines, pixels, bands) = rrs.dim();
        if bands != wavelengths.len() {
            return Err(SwathError::Wavelengths {
                bands,
                wavelengths: wavelengths.len(),
            });
        }

        for (name, coords) in [("latitude", &latitude), ("longitude", &longitude)] {
            if coords.dim() != (lines, pixels) {
                return Err(SwathError::Coordinates {
                    name,
                    got: coords.dim(),
                    expected: (lines, pixels),
                });
            }
        }

        Ok(Self {
            wavelengths,
            rrs,
            rrs_unc,
            navigation: Navigation {
                latitude,
                longitude,
            },
        })
    }

    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    pub fn rrs(&self) -> &Array3<f64> {
        &self.rrs
    }

    pub fn rrs_unc(&self) -> &Array3<f64> {
        &self.rrs_unc
    }

    pub fn navigation(&self) -> &Navigation {
        &self.navigation
    }

    pub fn latitude(&self) -> &Array2<f64> {
        self.navigation.latitude()
    }

    pub fn longitude(&self) -> &Array2<f64> {
        self.navigation.longitude()
    }

    /// (number_of_lines, pixels_per_line)
    pub fn shape(&self) -> (usize, usize) {
        self.navigation.shape()
    }

    pub fn spectrum(&self, line: usize, pixel: usize) -> ArrayView1<'_, f64> {
        self.rrs.slice(s![line, pixel, ..])
    }

    pub fn uncertainty(&self, line: usize, pixel: usize) -> ArrayView1<'_, f64> {
        self.rrs_unc.slice(s![line, pixel, ..])
    }

    /// Copy of the lines and pixels of `window`.
    pub fn window(&self, window: &SwathWindow) -> Result<Swath, SwathError> {
        if !window.fits(self.shape()) {
            return Err(SwathError::Window {
                window: window.clone(),
                shape: self.shape(),
            });
        }

        let block = s![window.lines.clone(), window.pixels.clone(), ..];
        Ok(Swath {
            wavelengths: self.wavelengths.clone(),
            rrs: self.rrs.slice(block).to_owned(),
            rrs_unc: self.rrs_unc.slice(block).to_owned(),
            navigation: self.navigation.window_copy(window),
        })
    }
}

impl Display for Swath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (lines, pixels) = self.shape();
        write!(
            f,
            "Swath {{ lines: {}, pixels: {}, bands: {} }}",
            lines,
            pixels,
            self.wavelengths.len()
        )
    }
}
