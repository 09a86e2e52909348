use super::types::ReadError;
use std::path::Path;

/// Products are NetCDF4 files; anything else is rejected before GDAL sees it.
pub fn check_netcdf(path: &Path) -> Result<(), ReadError> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("nc") | Some("nc4") => Ok(()),
        _ => Err(ReadError::UnknownFileType(path.display().to_string())),
    }
}

/// Applies the CF packing attributes: fill values become NaN, everything
/// else is `raw * scale + offset`.
pub fn unpack(raw: f64, fill: Option<f64>, scale: f64, offset: f64) -> f64 {
    if raw.is_nan() || fill.is_some_and(|fv| raw == fv) {
        f64::NAN
    } else {
        raw * scale + offset
    }
}
