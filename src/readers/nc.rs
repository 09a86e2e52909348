//! NetCDF product readers built on GDAL's multidimensional API.
//!
//! The L2 AOP swath keeps its variables in groups (`geophysical_data`,
//! `navigation_data`, `sensor_band_parameters`); the salinity and temperature
//! products are flat files with 1D coordinate variables. Large variables are
//! only read over the window that is needed.

use gdal::cpl::CslStringList;
use gdal::raster::{Group, MDArray};
use gdal::{Dataset, DatasetOptions, GdalOpenFlags};
use ndarray::{Array1, Array2, Array3, ArrayD, IxDyn};
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::types::{FieldReader, ReadError, SwathReader};
use super::utils::{check_netcdf, unpack};
use crate::align::{ScalarField, axis_window};
use crate::bbox::BoundingBox;
use crate::swath::{Navigation, Swath, SwathWindow};

fn open_multidim(path: &Path) -> Result<Dataset, ReadError> {
    check_netcdf(path)?;
    let options = DatasetOptions {
        open_flags: GdalOpenFlags::GDAL_OF_MULTIDIM_RASTER,
        ..Default::default()
    };
    Ok(Dataset::open_ex(path, options)?)
}

fn attribute_f64(array: &MDArray, name: &str) -> Option<f64> {
    array.attribute(name).ok().map(|attr| attr.read_as_f64())
}

fn shape_of(array: &MDArray) -> Result<Vec<usize>, ReadError> {
    Ok(array.dimensions()?.iter().map(|d| d.size()).collect())
}

/// Reads `count` samples from `start`, unpacked to `f64` with missing values
/// as NaN.
fn read_block(
    array: &MDArray,
    name: &str,
    start: &[usize],
    count: &[usize],
) -> Result<ArrayD<f64>, ReadError> {
    let values: Vec<f64> = if count.contains(&0) {
        Vec::new()
    } else {
        let fill = array.no_data_value_as_double();
        let scale = attribute_f64(array, "scale_factor").unwrap_or(1.0);
        let offset = attribute_f64(array, "add_offset").unwrap_or(0.0);
        debug!(variable = name, ?start, ?count, ?fill, scale, offset, "read variable");

        let raw: Vec<f64> = array.read_as::<f64>(
            start.iter().map(|&i| i as u64).collect(),
            count.to_vec(),
        )?;
        raw.into_iter()
            .map(|v| unpack(v, fill, scale, offset))
            .collect()
    };

    ArrayD::from_shape_vec(IxDyn(count), values).map_err(|source| ReadError::Shape {
        variable: name.to_string(),
        source,
    })
}

/// Reads a whole variable.
fn read_variable(group: &Group, name: &str) -> Result<ArrayD<f64>, ReadError> {
    let array = group.open_md_array(name, CslStringList::new())?;
    let shape = shape_of(&array)?;
    read_block(&array, name, &vec![0; shape.len()], &shape)
}

/// Reads the trailing `(rows, columns)` block of a 2D variable, or of a 3D
/// variable whose leading axis is kept whole.
fn read_trailing_window(
    group: &Group,
    name: &str,
    rows: &Range<usize>,
    columns: &Range<usize>,
) -> Result<ArrayD<f64>, ReadError> {
    let array = group.open_md_array(name, CslStringList::new())?;
    let shape = shape_of(&array)?;
    let (start, count) = match shape.as_slice() {
        [_, _] => (vec![rows.start, columns.start], vec![rows.len(), columns.len()]),
        [leading, _, _] => (
            vec![0, rows.start, columns.start],
            vec![*leading, rows.len(), columns.len()],
        ),
        found => {
            return Err(ReadError::Dimensions {
                variable: name.to_string(),
                expected: 2,
                found: found.len(),
            });
        }
    };
    read_block(&array, name, &start, &count)
}

fn with_rank<D: ndarray::Dimension>(
    name: &str,
    values: ArrayD<f64>,
) -> Result<ndarray::Array<f64, D>, ReadError> {
    let found = values.ndim();
    values
        .into_dimensionality::<D>()
        .map_err(|_| ReadError::Dimensions {
            variable: name.to_string(),
            expected: D::NDIM.unwrap_or(0),
            found,
        })
}

const WAVELENGTH: &str = "wavelength_3d";

/// Reads every band of a (line, pixel, band) variable over `window`.
fn read_spectra(group: &Group, name: &str, window: &SwathWindow) -> Result<Array3<f64>, ReadError> {
    let array = group.open_md_array(name, CslStringList::new())?;
    let shape = shape_of(&array)?;
    let &[_, _, bands] = shape.as_slice() else {
        return Err(ReadError::Dimensions {
            variable: name.to_string(),
            expected: 3,
            found: shape.len(),
        });
    };
    let block = read_block(
        &array,
        name,
        &[window.lines.start, window.pixels.start, 0],
        &[window.lines.len(), window.pixels.len(), bands],
    )?;
    with_rank(name, block)
}

/// PACE OCI level-2 apparent optical properties file.
pub struct NcSwathReader {
    pub file_name: PathBuf,
}

impl NcSwathReader {
    pub fn new<P: Into<PathBuf>>(file_name: P) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }
}

impl SwathReader for NcSwathReader {
    fn read_navigation(&self) -> Result<Navigation, ReadError> {
        let dataset = open_multidim(&self.file_name)?;
        let navigation = dataset
            .root_group()?
            .open_group("navigation_data", CslStringList::new())?;

        let latitude: Array2<f64> = with_rank("latitude", read_variable(&navigation, "latitude")?)?;
        let longitude: Array2<f64> =
            with_rank("longitude", read_variable(&navigation, "longitude")?)?;

        let navigation = Navigation::new(latitude, longitude)?;
        debug!(file = %self.file_name.display(), shape = ?navigation.shape(), "navigation loaded");
        Ok(navigation)
    }

    fn read_window(&self, window: &SwathWindow) -> Result<Swath, ReadError> {
        let dataset = open_multidim(&self.file_name)?;
        let root = dataset.root_group()?;
        let SwathWindow { lines, pixels } = window;

        let bands = root.open_group("sensor_band_parameters", CslStringList::new())?;
        let wavelengths: Array1<f64> =
            with_rank(WAVELENGTH, read_variable(&bands, WAVELENGTH)?)?;

        let geophysical = root.open_group("geophysical_data", CslStringList::new())?;
        let rrs = read_spectra(&geophysical, "Rrs", window)?;
        let rrs_unc = read_spectra(&geophysical, "Rrs_unc", window)?;

        let navigation = root.open_group("navigation_data", CslStringList::new())?;
        let latitude: Array2<f64> = with_rank(
            "latitude",
            read_trailing_window(&navigation, "latitude", lines, pixels)?,
        )?;
        let longitude: Array2<f64> = with_rank(
            "longitude",
            read_trailing_window(&navigation, "longitude", lines, pixels)?,
        )?;

        let swath = Swath::new(wavelengths.to_vec(), rrs, rrs_unc, latitude, longitude)?;
        debug!(file = %self.file_name.display(), ?window, %swath, "swath window loaded");
        Ok(swath)
    }
}

/// A gridded product holding one variable on 1D latitude/longitude axes,
/// optionally with a leading time axis of length one.
pub struct NcFieldReader {
    pub file_name: PathBuf,
    pub variable: &'static str,
    pub latitude: &'static str,
    pub longitude: &'static str,
}

impl NcFieldReader {
    /// SMAP level-3 sea surface salinity.
    pub fn salinity<P: Into<PathBuf>>(file_name: P) -> Self {
        Self {
            file_name: file_name.into(),
            variable: "smap_sss",
            latitude: "latitude",
            longitude: "longitude",
        }
    }

    /// GHRSST MUR level-4 sea surface temperature, Kelvin.
    pub fn temperature<P: Into<PathBuf>>(file_name: P) -> Self {
        Self {
            file_name: file_name.into(),
            variable: "analysed_sst",
            latitude: "lat",
            longitude: "lon",
        }
    }
}

impl FieldReader for NcFieldReader {
    fn read_field(&self, bbox: &BoundingBox) -> Result<ScalarField, ReadError> {
        let dataset = open_multidim(&self.file_name)?;
        let root = dataset.root_group()?;

        let latitude: Array1<f64> =
            with_rank(self.latitude, read_variable(&root, self.latitude)?)?;
        let longitude: Array1<f64> =
            with_rank(self.longitude, read_variable(&root, self.longitude)?)?;

        let rows = axis_window(latitude.iter().copied(), bbox.south(), bbox.north());
        let columns = axis_window(longitude.iter().copied(), bbox.west(), bbox.east());
        let latitude = latitude.slice(ndarray::s![rows.clone()]).to_owned();
        let longitude = longitude.slice(ndarray::s![columns.clone()]).to_owned();

        let values = read_trailing_window(&root, self.variable, &rows, &columns)?;
        let field = match values.ndim() {
            2 => ScalarField::new(latitude, longitude, with_rank(self.variable, values)?)?,
            _ => ScalarField::from_single_time_step(
                latitude,
                longitude,
                with_rank(self.variable, values)?,
            )?,
        };

        debug!(
            file = %self.file_name.display(),
            variable = self.variable,
            ?rows,
            ?columns,
            "auxiliary field loaded"
        );
        Ok(field)
    }
}
