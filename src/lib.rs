pub mod acquisition;
pub mod align;
pub mod bbox;
pub mod config;
pub mod driver;
pub mod error;
pub mod inversion;
pub mod output;
pub mod pipeline;
pub mod readers;
pub mod region;
pub mod swath;

pub use error::PipelineError;
