use thiserror::Error;

use crate::acquisition::AcquisitionError;
use crate::config::ConfigError;
use crate::driver::DriverError;
use crate::inversion::InversionError;
use crate::output::OutputError;
use crate::readers::ReadError;
use crate::region::RegionError;
use crate::swath::SubsetError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("acquisition: {0}")]
    Acquisition(#[from] AcquisitionError),
    #[error("reading products: {0}")]
    Read(#[from] ReadError),
    #[error("region selection: {0}")]
    Region(#[from] RegionError),
    #[error("subset: {0}")]
    Subset(#[from] SubsetError),
    #[error("inversion: {0}")]
    Inversion(#[from] InversionError),
    #[error(transparent)]
    Driver(#[from] DriverError),
    #[error("output: {0}")]
    Output(#[from] OutputError),
}
