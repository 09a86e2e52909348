//! Nearest-neighbour alignment of gridded auxiliary fields (salinity,
//! temperature) onto the per-pixel coordinates of a swath.
//!
//! Each axis is looked up independently: a pixel takes the value at the
//! closest latitude row and the closest longitude column. No interpolation is
//! done. A pixel outside the span of an axis, or whose nearest sample is
//! missing, is missing.

use ndarray::{Array1, Array2, Array3, Axis, Zip, s};
use std::ops::Range;
use thiserror::Error;
use tracing::debug;

use crate::bbox::BoundingBox;
use crate::swath::SwathSubset;

/// Kelvin to Celsius offset used for the temperature product.
pub const KELVIN_OFFSET: f64 = 273.0;

#[derive(Debug, Error, PartialEq)]
pub enum AlignError {
    #[error("field shape {got:?} does not match its axes ({lat}, {lon})")]
    Shape {
        got: (usize, usize),
        lat: usize,
        lon: usize,
    },
    #[error("expected a single time step, found {0}")]
    TimeAxis(usize),
}

/// A 2D field on its own 1D latitude and longitude axes. Axes may be
/// ascending or descending but must be monotonic.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField {
    latitude: Array1<f64>,
    longitude: Array1<f64>,
    values: Array2<f64>,
}

impl ScalarField {
    pub fn new(
        latitude: Array1<f64>,
        longitude: Array1<f64>,
        values: Array2<f64>,
    ) -> Result<Self, AlignError> {
        if values.dim() != (latitude.len(), longitude.len()) {
            return Err(AlignError::Shape {
                got: values.dim(),
                lat: latitude.len(),
                lon: longitude.len(),
            });
        }
        Ok(Self {
            latitude,
            longitude,
            values,
        })
    }

    /// Drops a redundant leading time axis of length one.
    pub fn from_single_time_step(
        latitude: Array1<f64>,
        longitude: Array1<f64>,
        values: Array3<f64>,
    ) -> Result<Self, AlignError> {
        let steps = values.len_of(Axis(0));
        if steps != 1 {
            return Err(AlignError::TimeAxis(steps));
        }
        Self::new(latitude, longitude, values.index_axis_move(Axis(0), 0))
    }

    pub fn latitude(&self) -> &Array1<f64> {
        &self.latitude
    }

    pub fn longitude(&self) -> &Array1<f64> {
        &self.longitude
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Keeps the rows and columns whose coordinate lies inside the box,
    /// edges included.
    pub fn restrict(&self, bbox: &BoundingBox) -> ScalarField {
        let rows = axis_window(self.latitude.iter().copied(), bbox.south(), bbox.north());
        let columns = axis_window(self.longitude.iter().copied(), bbox.west(), bbox.east());

        ScalarField {
            latitude: self.latitude.slice(s![rows.clone()]).to_owned(),
            longitude: self.longitude.slice(s![columns.clone()]).to_owned(),
            values: self.values.slice(s![rows, columns]).to_owned(),
        }
    }

    pub fn map_values<F: Fn(f64) -> f64>(&self, f: F) -> ScalarField {
        ScalarField {
            latitude: self.latitude.clone(),
            longitude: self.longitude.clone(),
            values: self.values.mapv(f),
        }
    }

    /// Resamples this field onto a grid of per-pixel coordinates.
    pub fn resample(&self, latitude: &Array2<f64>, longitude: &Array2<f64>) -> Array2<f64> {
        let lat_axis = self.latitude.to_vec();
        let lon_axis = self.longitude.to_vec();

        Zip::from(latitude)
            .and(longitude)
            .map_collect(|&lat, &lon| lookup(&self.values, &lat_axis, &lon_axis, lat, lon))
    }
}

fn lookup(values: &Array2<f64>, lat_axis: &[f64], lon_axis: &[f64], lat: f64, lon: f64) -> f64 {
    match (nearest_index(lat_axis, lat), nearest_index(lon_axis, lon)) {
        (Some(i), Some(j)) => values[[i, j]],
        _ => f64::NAN,
    }
}

/// Index range of a monotonic axis whose samples lie in `[lower, upper]`.
/// Empty when no sample does.
pub fn axis_window<I: IntoIterator<Item = f64>>(axis: I, lower: f64, upper: f64) -> Range<usize> {
    let mut inside = axis
        .into_iter()
        .enumerate()
        .filter(|&(_, v)| v >= lower && v <= upper)
        .map(|(i, _)| i);

    match inside.next() {
        Some(first) => first..inside.last().unwrap_or(first) + 1,
        None => 0..0,
    }
}

/// Index of the sample of a monotonic `axis` closest to `target`.
///
/// Returns `None` when `target` is NaN, the axis is empty, or `target` lies
/// outside `[min(axis), max(axis)]`. When two samples are equally close the
/// lower index wins.
pub fn nearest_index(axis: &[f64], target: f64) -> Option<usize> {
    let (&first, &last) = (axis.first()?, axis.last()?);
    if target.is_nan() {
        return None;
    }

    let ascending = first <= last;
    let (min, max) = if ascending { (first, last) } else { (last, first) };
    if target < min || target > max {
        return None;
    }

    let split = if ascending {
        axis.partition_point(|&v| v < target)
    } else {
        axis.partition_point(|&v| v > target)
    };

    let before = split.checked_sub(1);
    let after = (split < axis.len()).then_some(split);

    match (before, after) {
        (Some(a), Some(b)) => {
            if (axis[b] - target).abs() < (axis[a] - target).abs() {
                Some(b)
            } else {
                Some(a)
            }
        }
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - KELVIN_OFFSET
}

/// Salinity and temperature on the swath subset grid.
#[derive(Debug, Clone)]
pub struct AlignedAuxiliary {
    pub salinity: Array2<f64>,
    pub temperature: Array2<f64>,
}

/// Restricts both fields to the subset's box, converts temperature from
/// Kelvin to Celsius and resamples both onto the subset's pixels.
pub fn align_auxiliary(
    subset: &SwathSubset,
    salinity: &ScalarField,
    temperature_kelvin: &ScalarField,
) -> AlignedAuxiliary {
    let bbox = subset.bbox();
    let latitude = subset.swath().latitude();
    let longitude = subset.swath().longitude();

    let salinity = salinity.restrict(bbox);
    let temperature = temperature_kelvin.restrict(bbox).map_values(kelvin_to_celsius);
    debug!(
        salinity = ?salinity.values().dim(),
        temperature = ?temperature.values().dim(),
        "auxiliary fields restricted to boundary box"
    );

    AlignedAuxiliary {
        salinity: salinity.resample(latitude, longitude),
        temperature: temperature.resample(latitude, longitude),
    }
}
