use ndarray::{Array2, Axis, Zip};
use thiserror::Error;

use super::{Swath, SwathError};
use crate::bbox::BoundingBox;

#[derive(Debug, Error, PartialEq)]
pub enum SubsetError {
    #[error("no swath pixel falls inside the boundary box")]
    Empty,
    #[error(transparent)]
    Swath(#[from] SwathError),
}

/// The part of a swath selected by a boundary box.
///
/// Lines and pixels without any cell inside the box are dropped. The rest of
/// the rectangle is kept; cells outside the box have missing spectra but keep
/// their coordinates. `swath` may itself be a window of a larger swath read
/// from `origin`; kept indices always refer to the full swath.
#[derive(Debug, Clone)]
pub struct SwathSubset {
    bbox: BoundingBox,
    swath: Swath,
    lines: Vec<usize>,
    pixels: Vec<usize>,
}

impl SwathSubset {
    pub fn extract(
        swath: &Swath,
        bbox: &BoundingBox,
        (line_origin, pixel_origin): (usize, usize),
    ) -> Result<Self, SubsetError> {
        let mask: Array2<bool> = Zip::from(swath.latitude())
            .and(swath.longitude())
            .map_collect(|&lat, &lon| bbox.contains(lat, lon));

        let lines: Vec<usize> = mask
            .axis_iter(Axis(0))
            .enumerate()
            .filter(|(_, row)| row.iter().any(|&inside| inside))
            .map(|(i, _)| i)
            .collect();

        let pixels: Vec<usize> = mask
            .axis_iter(Axis(1))
            .enumerate()
            .filter(|(_, column)| column.iter().any(|&inside| inside))
            .map(|(j, _)| j)
            .collect();

        if lines.is_empty() || pixels.is_empty() {
            return Err(SubsetError::Empty);
        }

        let mask = mask.select(Axis(0), &lines).select(Axis(1), &pixels);
        let latitude = swath.latitude().select(Axis(0), &lines).select(Axis(1), &pixels);
        let longitude = swath.longitude().select(Axis(0), &lines).select(Axis(1), &pixels);

        let mut rrs = swath.rrs().select(Axis(0), &lines).select(Axis(1), &pixels);
        let mut rrs_unc = swath.rrs_unc().select(Axis(0), &lines).select(Axis(1), &pixels);

        for ((i, j), &inside) in mask.indexed_iter() {
            if !inside {
                rrs.slice_mut(ndarray::s![i, j, ..]).fill(f64::NAN);
                rrs_unc.slice_mut(ndarray::s![i, j, ..]).fill(f64::NAN);
            }
        }

        let swath = Swath::new(
            swath.wavelengths().to_vec(),
            rrs,
            rrs_unc,
            latitude,
            longitude,
        )?;

        Ok(Self {
            bbox: *bbox,
            swath,
            lines: lines.into_iter().map(|i| i + line_origin).collect(),
            pixels: pixels.into_iter().map(|j| j + pixel_origin).collect(),
        })
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn swath(&self) -> &Swath {
        &self.swath
    }

    /// Line indices of the source swath kept by the selection.
    pub fn lines(&self) -> &[usize] {
        &self.lines
    }

    /// Pixel indices of the source swath kept by the selection.
    pub fn pixels(&self) -> &[usize] {
        &self.pixels
    }

    pub fn shape(&self) -> (usize, usize) {
        self.swath.shape()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swath::tests::regular_swath;

    #[test]
    fn test_extract_keeps_inside_rows_and_columns() {
        let swath = regular_swath(5, 6);
        // lat in {1, 2, 3}, lon in {2, 3}
        let bbox = BoundingBox::new(3.5, 0.5, 3.5, 1.5).unwrap();
        let subset = SwathSubset::extract(&swath, &bbox, (0, 0)).unwrap();

        assert_eq!(subset.lines(), &[1, 2, 3]);
        assert_eq!(subset.pixels(), &[2, 3]);
        assert_eq!(subset.shape(), (3, 2));
        assert_eq!(subset.swath().latitude()[[0, 0]], 1.0);
        assert_eq!(subset.swath().longitude()[[0, 1]], 3.0);
        assert_eq!(
            subset.swath().spectrum(0, 0).to_vec(),
            swath.spectrum(1, 2).to_vec()
        );
    }

    #[test]
    fn test_cells_outside_box_are_masked() {
        // Skewed grid: longitude shifts with the line index, so the kept
        // rectangle contains cells that are outside the box.
        let base = regular_swath(3, 3);
        let longitude = Array2::from_shape_fn((3, 3), |(i, j)| (i + j) as f64);
        let swath = Swath::new(
            base.wavelengths().to_vec(),
            base.rrs().clone(),
            base.rrs_unc().clone(),
            base.latitude().clone(),
            longitude,
        )
        .unwrap();

        // Inside: lon strictly between 0.5 and 2.5 -> lon in {1, 2}
        let bbox = BoundingBox::new(10.0, -1.0, 2.5, 0.5).unwrap();
        let subset = SwathSubset::extract(&swath, &bbox, (0, 0)).unwrap();
        assert_eq!(subset.lines(), &[0, 1, 2]);
        assert_eq!(subset.pixels(), &[0, 1, 2]);

        // (0, 0) has lon 0 -> masked; (2, 2) has lon 4 -> masked
        let out = subset.swath();
        assert!(out.spectrum(0, 0).iter().all(|v| v.is_nan()));
        assert!(out.uncertainty(2, 2).iter().all(|v| v.is_nan()));
        assert!(out.spectrum(0, 1).iter().all(|v| v.is_finite()));
        // Coordinates are never masked
        assert_eq!(out.longitude()[[0, 0]], 0.0);
    }

    #[test]
    fn test_window_origin_offsets_indices() {
        let swath = regular_swath(10, 10);
        let bbox = BoundingBox::new(6.5, 2.5, 7.5, 3.5).unwrap();
        let window = swath.navigation().window(&bbox).unwrap();
        let block = swath.window(&window).unwrap();

        let from_window = SwathSubset::extract(&block, &bbox, window.origin()).unwrap();
        let from_full = SwathSubset::extract(&swath, &bbox, (0, 0)).unwrap();
        assert_eq!(from_window.lines(), from_full.lines());
        assert_eq!(from_window.pixels(), from_full.pixels());
        assert_eq!(from_window.swath().rrs(), from_full.swath().rrs());
    }

    #[test]
    fn test_empty_selection_is_an_error() {
        let swath = regular_swath(3, 3);
        // Box falls between the integer grid points
        let bbox = BoundingBox::new(1.8, 1.2, 1.8, 1.2).unwrap();
        assert_eq!(
            SwathSubset::extract(&swath, &bbox, (0, 0)).unwrap_err(),
            SubsetError::Empty
        );
    }
}
