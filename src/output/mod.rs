//! Pigment result grid and what can be done with it once the driver is done.

pub mod color;
pub mod export;
pub mod stats;

pub use color::ColorScale;
pub use export::write_tiff;
pub use stats::PigmentStats;

use ndarray::{Array2, ArrayView2};
use std::fmt::Display;
use thiserror::Error;

use crate::inversion::Pigments;
use crate::swath::SwathSubset;

/// Value of a pigment cell that was not computed.
pub const MISSING: f64 = f64::NAN;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),
    #[error("grid of {lines}x{pixels} is too large for a TIFF page")]
    TooLarge { lines: usize, pixels: usize },
    #[error("color scale lower bound {lower} must be below upper bound {upper}")]
    ColorBounds { lower: f64, upper: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pigment {
    Chla,
    Chlb,
    Chlc,
    Ppc,
}

impl Pigment {
    pub const ALL: [Pigment; 4] = [Pigment::Chla, Pigment::Chlb, Pigment::Chlc, Pigment::Ppc];

    pub fn name(&self) -> &'static str {
        match self {
            Pigment::Chla => "chla",
            Pigment::Chlb => "chlb",
            Pigment::Chlc => "chlc",
            Pigment::Ppc => "ppc",
        }
    }
}

impl Display for Pigment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Four pigment fields shaped like the swath subset, mg/m³.
#[derive(Debug, Clone)]
pub struct PigmentGrid {
    chla: Array2<f64>,
    chlb: Array2<f64>,
    chlc: Array2<f64>,
    ppc: Array2<f64>,
}

impl PigmentGrid {
    /// All four fields filled with [`MISSING`].
    pub fn allocate(shape: (usize, usize)) -> Self {
        Self {
            chla: Array2::from_elem(shape, MISSING),
            chlb: Array2::from_elem(shape, MISSING),
            chlc: Array2::from_elem(shape, MISSING),
            ppc: Array2::from_elem(shape, MISSING),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.chla.dim()
    }

    pub fn set(&mut self, (line, pixel): (usize, usize), pigments: Pigments) {
        self.chla[[line, pixel]] = pigments.chla;
        self.chlb[[line, pixel]] = pigments.chlb;
        self.chlc[[line, pixel]] = pigments.chlc;
        self.ppc[[line, pixel]] = pigments.ppc;
    }

    pub fn get(&self, (line, pixel): (usize, usize)) -> [f64; 4] {
        [
            self.chla[[line, pixel]],
            self.chlb[[line, pixel]],
            self.chlc[[line, pixel]],
            self.ppc[[line, pixel]],
        ]
    }

    pub fn field(&self, pigment: Pigment) -> ArrayView2<'_, f64> {
        match pigment {
            Pigment::Chla => self.chla.view(),
            Pigment::Chlb => self.chlb.view(),
            Pigment::Chlc => self.chlc.view(),
            Pigment::Ppc => self.ppc.view(),
        }
    }
}

/// The reflectance subset augmented with the pigment fields.
#[derive(Debug, Clone)]
pub struct PigmentProduct {
    subset: SwathSubset,
    pigments: PigmentGrid,
}

impl PigmentProduct {
    pub fn new(subset: SwathSubset, pigments: PigmentGrid) -> Self {
        debug_assert_eq!(subset.shape(), pigments.shape());
        Self { subset, pigments }
    }

    pub fn subset(&self) -> &SwathSubset {
        &self.subset
    }

    pub fn pigments(&self) -> &PigmentGrid {
        &self.pigments
    }

    pub fn field(&self, pigment: Pigment) -> ArrayView2<'_, f64> {
        self.pigments.field(pigment)
    }

    pub fn latitude(&self) -> &Array2<f64> {
        self.subset.swath().latitude()
    }

    pub fn longitude(&self) -> &Array2<f64> {
        self.subset.swath().longitude()
    }

    pub fn stats(&self, pigment: Pigment) -> PigmentStats {
        PigmentStats::from_values(self.field(pigment).iter().copied())
    }
}
