//! Wires the components of one run together: read the swath, select a
//! region, align salinity and temperature to it, invert every cell and
//! assemble the pigment product.

use std::io::{BufRead, Write};
use tracing::info;

use crate::align::{ScalarField, align_auxiliary};
use crate::bbox::BoundingBox;
use crate::driver::{self, DriverInputs, DriverStats, FailurePolicy, ProgressSink};
use crate::error::PipelineError;
use crate::inversion::PigmentInversion;
use crate::output::{PigmentGrid, PigmentProduct};
use crate::readers::{FieldReader, SwathReader};
use crate::region::{Console, RegionError, RegionSelection, RegionSelector};
use crate::swath::{Swath, SwathSubset};

/// Where the boundary box of a run comes from.
pub trait RegionSource {
    fn choose(&mut self, selector: &RegionSelector<'_>) -> Result<RegionSelection, RegionError>;
}

impl<R: BufRead, W: Write> RegionSource for Console<R, W> {
    fn choose(&mut self, selector: &RegionSelector<'_>) -> Result<RegionSelection, RegionError> {
        selector.select(self)
    }
}

impl RegionSource for BoundingBox {
    fn choose(&mut self, selector: &RegionSelector<'_>) -> Result<RegionSelection, RegionError> {
        selector.select_fixed(self)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub policy: FailurePolicy,
    pub parallel: bool,
}

#[derive(Debug)]
pub struct PipelineOutput {
    pub product: PigmentProduct,
    pub stats: DriverStats,
}

pub struct PigmentPipeline<S, F> {
    swath: S,
    salinity: F,
    temperature: F,
    options: RunOptions,
}

impl<S: SwathReader, F: FieldReader> PigmentPipeline<S, F> {
    /// `temperature` must yield Kelvin.
    pub fn new(swath: S, salinity: F, temperature: F, options: RunOptions) -> Self {
        Self {
            swath,
            salinity,
            temperature,
            options,
        }
    }

    pub fn process<I: PigmentInversion + ?Sized>(
        &self,
        region: &mut dyn RegionSource,
        inversion: &I,
        progress: &dyn ProgressSink,
    ) -> Result<PipelineOutput, PipelineError> {
        run_readers(
            &self.swath,
            &self.salinity,
            &self.temperature,
            region,
            inversion,
            progress,
            self.options,
        )
    }
}

/// Reads only what the selected box needs: navigation first, then the swath
/// window and the auxiliary fields restricted to the box.
fn run_readers<S, F, I>(
    swath_reader: &S,
    salinity_reader: &F,
    temperature_reader: &F,
    region: &mut dyn RegionSource,
    inversion: &I,
    progress: &dyn ProgressSink,
    options: RunOptions,
) -> Result<PipelineOutput, PipelineError>
where
    S: SwathReader + ?Sized,
    F: FieldReader + ?Sized,
    I: PigmentInversion + ?Sized,
{
    let navigation = swath_reader.read_navigation()?;
    info!(shape = ?navigation.shape(), "L2 navigation read");

    let RegionSelection { bbox, window } = region.choose(&RegionSelector::new(&navigation)?)?;
    drop(navigation);

    let swath = swath_reader.read_window(&window)?;
    info!(%swath, origin = ?window.origin(), "L2 swath window read");
    let subset = SwathSubset::extract(&swath, &bbox, window.origin())?;

    let salinity = salinity_reader.read_field(&bbox)?;
    let temperature = temperature_reader.read_field(&bbox)?;

    estimate(subset, &salinity, &temperature, inversion, progress, options)
}

/// Runs alignment and inversion on an extracted subset.
pub fn estimate<I: PigmentInversion + ?Sized>(
    subset: SwathSubset,
    salinity: &ScalarField,
    temperature_kelvin: &ScalarField,
    inversion: &I,
    progress: &dyn ProgressSink,
    options: RunOptions,
) -> Result<PipelineOutput, PipelineError> {
    info!(bbox = ?subset.bbox(), shape = ?subset.shape(), "aligning auxiliary fields");

    let aux = align_auxiliary(&subset, salinity, temperature_kelvin);
    let inputs = DriverInputs::new(subset.swath(), &aux)?;
    let mut grid = PigmentGrid::allocate(inputs.shape());

    let stats = if options.parallel {
        driver::run_parallel(&inputs, inversion, progress, options.policy, &mut grid)?
    } else {
        driver::run(&inputs, inversion, progress, options.policy, &mut grid)?
    };

    Ok(PipelineOutput {
        product: PigmentProduct::new(subset, grid),
        stats,
    })
}

/// Convenience for data already in memory.
pub fn process_swath<I: PigmentInversion + ?Sized>(
    swath: &Swath,
    salinity: &ScalarField,
    temperature_kelvin: &ScalarField,
    region: &mut dyn RegionSource,
    inversion: &I,
    progress: &dyn ProgressSink,
    options: RunOptions,
) -> Result<PipelineOutput, PipelineError> {
    run_readers(
        swath,
        salinity,
        temperature_kelvin,
        region,
        inversion,
        progress,
        options,
    )
}
