pub mod nc;
pub mod types;
pub mod utils;

pub use nc::{NcFieldReader, NcSwathReader};
pub use types::{FieldReader, ReadError, SwathReader};
pub use utils::check_netcdf;
