//! Pixel-wise inversion driver.
//!
//! Every (line, pixel) cell of the box-restricted swath is visited in
//! row-major order. Cells with a missing leading reflectance, salinity or
//! temperature are skipped and keep the missing sentinel; every other cell is
//! handed to the inversion and the first result group is stored. Progress is
//! reported once per attempted cell, skipped or not.

pub mod pixel;
pub mod progress;

pub use pixel::PixelData;
pub use progress::{ConsoleProgress, NoProgress, ProgressSink};

use ndarray::{ArrayView2, ArrayView3, s};
use rayon::prelude::*;
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::align::AlignedAuxiliary;
use crate::inversion::{InversionError, PigmentInversion, Pigments, first_group};
use crate::output::PigmentGrid;
use crate::swath::Swath;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("{name} grid shape {got:?} does not match reflectance grid {expected:?}")]
    Shape {
        name: &'static str,
        got: (usize, usize),
        expected: (usize, usize),
    },
    #[error("inversion failed at line {line}, pixel {pixel}: {source}")]
    Inversion {
        line: usize,
        pixel: usize,
        #[source]
        source: InversionError,
    },
}

/// What to do when the inversion fails on a cell that was not skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the run and return the error
    #[default]
    Abort,
    /// Log a warning and leave the cell missing
    Skip,
}

/// Counts of what happened to the cells of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverStats {
    pub computed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl DriverStats {
    pub fn total(&self) -> usize {
        self.computed + self.skipped + self.failed
    }
}

/// Everything the driver reads, all on the same (line, pixel) grid.
#[derive(Debug, Clone, Copy)]
pub struct DriverInputs<'a> {
    pub rrs: ArrayView3<'a, f64>,
    pub rrs_unc: ArrayView3<'a, f64>,
    pub salinity: ArrayView2<'a, f64>,
    pub temperature: ArrayView2<'a, f64>,
    pub wavelengths: &'a [f64],
}

impl<'a> DriverInputs<'a> {
    pub fn new(swath: &'a Swath, aux: &'a AlignedAuxiliary) -> Result<Self, DriverError> {
        let inputs = Self {
            rrs: swath.rrs().view(),
            rrs_unc: swath.rrs_unc().view(),
            salinity: aux.salinity.view(),
            temperature: aux.temperature.view(),
            wavelengths: swath.wavelengths(),
        };
        inputs.check_shapes()?;
        Ok(inputs)
    }

    fn check_shapes(&self) -> Result<(), DriverError> {
        let (lines, pixels, _) = self.rrs.dim();
        let expected = (lines, pixels);
        let (unc_lines, unc_pixels, _) = self.rrs_unc.dim();

        for (name, got) in [
            ("Rrs_unc", (unc_lines, unc_pixels)),
            ("salinity", self.salinity.dim()),
            ("temperature", self.temperature.dim()),
        ] {
            if got != expected {
                return Err(DriverError::Shape {
                    name,
                    got,
                    expected,
                });
            }
        }
        Ok(())
    }

    pub fn shape(&self) -> (usize, usize) {
        let (lines, pixels, _) = self.rrs.dim();
        (lines, pixels)
    }

    pub fn pixel(&self, (line, pixel): (usize, usize)) -> PixelData<'a> {
        PixelData {
            line,
            pixel,
            rrs: self.rrs.slice_move(s![line, pixel, ..]),
            rrs_unc: self.rrs_unc.slice_move(s![line, pixel, ..]),
            salinity: self.salinity[[line, pixel]],
            temperature: self.temperature[[line, pixel]],
        }
    }
}

/// Row-major iterator over every cell of a `(lines, pixels)` grid.
pub fn cells((lines, pixels): (usize, usize)) -> impl Iterator<Item = (usize, usize)> {
    (0..lines).flat_map(move |line| (0..pixels).map(move |pixel| (line, pixel)))
}

enum CellOutcome {
    Computed(Pigments),
    Skipped,
    Failed,
}

fn invert_cell<I: PigmentInversion + ?Sized>(
    inputs: &DriverInputs<'_>,
    cell: (usize, usize),
    inversion: &I,
    policy: FailurePolicy,
) -> Result<CellOutcome, DriverError> {
    let data = inputs.pixel(cell);
    let Some(result) = data.with_spectrum(inputs.wavelengths, |spectrum| {
        inversion.invert(spectrum).and_then(first_group)
    }) else {
        return Ok(CellOutcome::Skipped);
    };

    match (result, policy) {
        (Ok(pigments), _) => Ok(CellOutcome::Computed(pigments)),
        (Err(e), FailurePolicy::Skip) => {
            debug!(line = cell.0, pixel = cell.1, error = %e, "inversion failed, cell left missing");
            Ok(CellOutcome::Failed)
        }
        (Err(source), FailurePolicy::Abort) => Err(DriverError::Inversion {
            line: cell.0,
            pixel: cell.1,
            source,
        }),
    }
}

fn record(grid: &mut PigmentGrid, stats: &mut DriverStats, cell: (usize, usize), outcome: CellOutcome) {
    match outcome {
        CellOutcome::Computed(pigments) => {
            grid.set(cell, pigments);
            stats.computed += 1;
        }
        CellOutcome::Skipped => stats.skipped += 1,
        CellOutcome::Failed => stats.failed += 1,
    }
}

fn finish(stats: &DriverStats) {
    if stats.failed > 0 {
        warn!(failed = stats.failed, "inversion failed on some cells, left missing");
    }
    info!(?stats, "pigment estimation finished");
}

/// Fills `grid` one cell at a time in row-major order. `grid` must be freshly
/// allocated with the shape of `inputs`.
pub fn run<I: PigmentInversion + ?Sized>(
    inputs: &DriverInputs<'_>,
    inversion: &I,
    progress: &dyn ProgressSink,
    policy: FailurePolicy,
    grid: &mut PigmentGrid,
) -> Result<DriverStats, DriverError> {
    let shape = inputs.shape();
    check_grid(grid, shape)?;
    let total = shape.0 * shape.1;
    let mut stats = DriverStats::default();

    info!(pixels = total, "estimating pigments");

    for (index, cell) in cells(shape).enumerate() {
        let outcome = invert_cell(inputs, cell, inversion, policy)?;
        record(grid, &mut stats, cell, outcome);
        progress.report(index + 1, total);
    }

    finish(&stats);
    Ok(stats)
}

/// Same contract as [`run`], with cells inverted on the rayon thread pool.
/// Outcomes are written into `grid` on the calling thread afterwards. Every
/// progress value from 1 to the total is reported exactly once, not
/// necessarily in order.
pub fn run_parallel<I: PigmentInversion + ?Sized>(
    inputs: &DriverInputs<'_>,
    inversion: &I,
    progress: &dyn ProgressSink,
    policy: FailurePolicy,
    grid: &mut PigmentGrid,
) -> Result<DriverStats, DriverError> {
    let shape = inputs.shape();
    check_grid(grid, shape)?;
    let total = shape.0 * shape.1;
    let done = AtomicUsize::new(0);

    info!(pixels = total, threads = rayon::current_num_threads(), "estimating pigments");

    let all_cells: Vec<(usize, usize)> = cells(shape).collect();
    let outcomes: Vec<((usize, usize), CellOutcome)> = all_cells
        .into_par_iter()
        .map(|cell| {
            let outcome = invert_cell(inputs, cell, inversion, policy);
            progress.report(done.fetch_add(1, Ordering::Relaxed) + 1, total);
            outcome.map(|o| (cell, o))
        })
        .collect::<Result<_, _>>()?;

    let mut stats = DriverStats::default();
    for (cell, outcome) in outcomes {
        record(grid, &mut stats, cell, outcome);
    }

    finish(&stats);
    Ok(stats)
}

fn check_grid(grid: &PigmentGrid, expected: (usize, usize)) -> Result<(), DriverError> {
    if grid.shape() != expected {
        return Err(DriverError::Shape {
            name: "pigment",
            got: grid.shape(),
            expected,
        });
    }
    Ok(())
}
