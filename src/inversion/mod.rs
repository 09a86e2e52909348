//! Seam to the pigment inversion algorithm.
//!
//! The algorithm itself lives outside this crate. Anything that can turn a
//! reflectance spectrum, its uncertainty, the band wavelengths, temperature
//! and salinity into pigment concentrations implements [`PigmentInversion`].

pub mod command;

pub use command::CommandInversion;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InversionError {
    #[error("inversion returned no result group")]
    EmptyResult,
    #[error("inversion failed: {0}")]
    Failed(String),
    #[error("inversion process I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid inversion response: {0}")]
    Protocol(#[from] serde_json::Error),
}

/// Pigment concentrations for one pixel, mg/m³.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "[f64; 4]")]
pub struct Pigments {
    pub chla: f64,
    pub chlb: f64,
    pub chlc: f64,
    pub ppc: f64,
}

impl From<[f64; 4]> for Pigments {
    fn from([chla, chlb, chlc, ppc]: [f64; 4]) -> Self {
        Self {
            chla,
            chlb,
            chlc,
            ppc,
        }
    }
}

impl From<Pigments> for [f64; 4] {
    fn from(p: Pigments) -> Self {
        [p.chla, p.chlb, p.chlc, p.ppc]
    }
}

/// Inputs of one inversion call.
#[derive(Debug, Clone, Copy)]
pub struct PixelSpectrum<'a> {
    pub rrs: &'a [f64],
    pub rrs_unc: &'a [f64],
    pub wavelengths: &'a [f64],
    /// Degrees Celsius
    pub temperature: f64,
    /// PSU
    pub salinity: f64,
}

pub trait PigmentInversion: Sync {
    /// Returns every result group produced for the pixel. Callers use the
    /// first group.
    fn invert(&self, pixel: &PixelSpectrum<'_>) -> Result<Vec<Pigments>, InversionError>;
}

impl<F> PigmentInversion for F
where
    F: Fn(&PixelSpectrum<'_>) -> Result<Vec<Pigments>, InversionError> + Sync,
{
    fn invert(&self, pixel: &PixelSpectrum<'_>) -> Result<Vec<Pigments>, InversionError> {
        self(pixel)
    }
}

/// First result group, or [`InversionError::EmptyResult`].
pub fn first_group(groups: Vec<Pigments>) -> Result<Pigments, InversionError> {
    groups.into_iter().next().ok_or(InversionError::EmptyResult)
}
