use thiserror::Error;

use crate::align::{AlignError, ScalarField};
use crate::bbox::BoundingBox;
use crate::swath::{Navigation, Swath, SwathError, SwathWindow};

/// Source of the level-2 reflectance swath. Navigation is read on its own so
/// that spectra are only loaded for the selected window.
pub trait SwathReader {
    fn read_navigation(&self) -> Result<Navigation, ReadError>;

    fn read_window(&self, window: &SwathWindow) -> Result<Swath, ReadError>;
}

/// Source of a gridded auxiliary field (salinity or temperature).
pub trait FieldReader {
    /// Reads only the rows and columns whose coordinates lie inside `bbox`,
    /// edges included.
    fn read_field(&self, bbox: &BoundingBox) -> Result<ScalarField, ReadError>;
}

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("unsupported file type: {0}")]
    UnknownFileType(String),
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),
    #[error("{variable}: expected {expected} dimensions, found {found}")]
    Dimensions {
        variable: String,
        expected: usize,
        found: usize,
    },
    #[error("{variable}: {source}")]
    Shape {
        variable: String,
        #[source]
        source: ndarray::ShapeError,
    },
    #[error(transparent)]
    Swath(#[from] SwathError),
    #[error(transparent)]
    Field(#[from] AlignError),
}

impl SwathReader for Swath {
    fn read_navigation(&self) -> Result<Navigation, ReadError> {
        Ok(self.navigation().clone())
    }

    fn read_window(&self, window: &SwathWindow) -> Result<Swath, ReadError> {
        Ok(self.window(window)?)
    }
}

impl FieldReader for ScalarField {
    fn read_field(&self, bbox: &BoundingBox) -> Result<ScalarField, ReadError> {
        Ok(self.restrict(bbox))
    }
}
