//! Finding and fetching the three source products for a run: the PACE L2
//! AOP swath, SMAP salinity and MUR sea surface temperature.
//!
//! Query services sit behind [`DataSource`]. [`LocalArchive`] answers queries
//! from a directory tree of granules that were downloaded beforehand.

use chrono::NaiveDate;
use glob::{MatchOptions, Pattern};
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::bbox::BoundingBox;

#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("start date {start} must be earlier than end date {end}")]
    TimeSpan { start: NaiveDate, end: NaiveDate },
    #[error("no data found for: {}", list_products(.0))]
    NoData(Vec<Product>),
    #[error("invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("cannot walk archive: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn list_products(products: &[Product]) -> String {
    products
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Inclusive date range of a query; start strictly before end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpan {
    start: NaiveDate,
    end: NaiveDate,
}

impl TimeSpan {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AcquisitionError> {
        if start >= end {
            return Err(AcquisitionError::TimeSpan { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Product {
    L2Aop,
    Salinity,
    Temperature,
}

impl Product {
    pub const ALL: [Product; 3] = [Product::L2Aop, Product::Salinity, Product::Temperature];

    /// Collection short name in the NASA Earthdata catalogue.
    pub fn short_name(&self) -> &'static str {
        match self {
            Product::L2Aop => "PACE_OCI_L2_AOP",
            Product::Salinity => "SMAP_JPL_L3_SSS_CAP_8DAY-RUNNINGMEAN_V5",
            Product::Temperature => "MUR-JPL-L4-GLOB-v4.1",
        }
    }

    /// Granule file name pattern.
    pub fn file_pattern(&self) -> &'static str {
        match self {
            Product::L2Aop => "PACE_OCI*L2*AOP*.nc",
            Product::Salinity => "SMAP_L3_SSS*.nc",
            Product::Temperature => "*MUR*.nc",
        }
    }

    /// Folder the granule is downloaded into.
    pub fn download_folder(&self) -> &'static str {
        match self {
            Product::L2Aop => "L2_data",
            Product::Salinity => "sal_data",
            Product::Temperature => "temp_data",
        }
    }

    /// Only the swath is searched spatially; the auxiliary products are
    /// global.
    pub fn is_spatial(&self) -> bool {
        matches!(self, Product::L2Aop)
    }
}

impl Display for Product {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Product::L2Aop => write!(f, "L2 AOP"),
            Product::Salinity => write!(f, "salinity"),
            Product::Temperature => write!(f, "temperature"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Granule {
    pub product: Product,
    pub date: NaiveDate,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy)]
pub struct SearchQuery<'a> {
    pub product: Product,
    pub time_span: &'a TimeSpan,
    pub bbox: Option<&'a BoundingBox>,
    pub count: usize,
}

pub trait DataSource {
    /// Granules matching the query, at most `query.count` of them. An empty
    /// result is not an error.
    fn search(&self, query: &SearchQuery<'_>) -> Result<Vec<Granule>, AcquisitionError>;

    /// Makes the granules available under `destination` and returns their
    /// local paths.
    fn download(
        &self,
        granules: &[Granule],
        destination: &Path,
    ) -> Result<Vec<PathBuf>, AcquisitionError>;
}

/// Date of a granule from its file name: the first run of eight digits read
/// as `YYYYMMDD`.
pub fn granule_date(file_name: &str) -> Option<NaiveDate> {
    let bytes = file_name.as_bytes();
    let mut start = 0;
    while start < bytes.len() {
        if !bytes[start].is_ascii_digit() {
            start += 1;
            continue;
        }
        let end = bytes[start..]
            .iter()
            .position(|b| !b.is_ascii_digit())
            .map_or(bytes.len(), |len| start + len);
        if end - start >= 8 {
            return NaiveDate::parse_from_str(&file_name[start..start + 8], "%Y%m%d").ok();
        }
        start = end;
    }
    None
}

/// Granules already on disk, anywhere below `root`.
pub struct LocalArchive {
    root: PathBuf,
}

impl LocalArchive {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }
}

impl DataSource for LocalArchive {
    fn search(&self, query: &SearchQuery<'_>) -> Result<Vec<Granule>, AcquisitionError> {
        let pattern = Pattern::new(query.product.file_pattern())?;
        let options = MatchOptions {
            case_sensitive: false,
            ..MatchOptions::new()
        };

        if let Some(bbox) = query.bbox {
            debug!(?bbox, "local archive does not index granule footprints");
        }

        let mut granules = Vec::new();
        for entry in WalkDir::new(&self.root) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy();
            if !pattern.matches_with(&file_name, options) {
                continue;
            }
            let Some(date) = granule_date(&file_name) else {
                debug!(file = %file_name, "no date in granule name");
                continue;
            };
            if query.time_span.contains(date) {
                granules.push(Granule {
                    product: query.product,
                    date,
                    path: entry.path().to_path_buf(),
                });
            }
        }

        granules.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.path.cmp(&b.path)));
        granules.truncate(query.count);
        Ok(granules)
    }

    fn download(
        &self,
        granules: &[Granule],
        destination: &Path,
    ) -> Result<Vec<PathBuf>, AcquisitionError> {
        fs::create_dir_all(destination)?;

        let mut paths = Vec::with_capacity(granules.len());
        for granule in granules {
            let Some(file_name) = granule.path.file_name() else {
                continue;
            };
            let target = destination.join(file_name);
            if !target.exists() {
                fs::copy(&granule.path, &target)?;
                info!(from = %granule.path.display(), to = %target.display(), "granule copied");
            }
            paths.push(target);
        }
        Ok(paths)
    }
}

/// Local paths of the three products of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductPaths {
    pub l2: PathBuf,
    pub salinity: PathBuf,
    pub temperature: PathBuf,
}

/// Searches one granule of each product and downloads them into
/// `<download_directory>/<product folder>`.
///
/// Every product is searched before anything is downloaded. Each empty
/// result is logged, and if any product is missing the call fails with
/// [`AcquisitionError::NoData`] naming all of them.
pub fn load_data<S: DataSource + ?Sized>(
    source: &S,
    time_span: &TimeSpan,
    bbox: &BoundingBox,
    download_directory: &Path,
) -> Result<ProductPaths, AcquisitionError> {
    let mut found = Vec::with_capacity(Product::ALL.len());
    let mut missing = Vec::new();

    for product in Product::ALL {
        let query = SearchQuery {
            product,
            time_span,
            bbox: product.is_spatial().then_some(bbox),
            count: 1,
        };
        let granules = source.search(&query)?;
        if granules.is_empty() {
            warn!(short_name = product.short_name(), "No {} data found", product);
            missing.push(product);
        } else {
            found.push((product, granules));
        }
    }

    if !missing.is_empty() {
        return Err(AcquisitionError::NoData(missing));
    }

    let mut paths = Vec::with_capacity(found.len());
    for (product, granules) in &found {
        let destination = download_directory.join(product.download_folder());
        let downloaded = source.download(granules, &destination)?;
        let first = downloaded
            .into_iter()
            .next()
            .ok_or_else(|| AcquisitionError::NoData(vec![*product]))?;
        paths.push(first);
    }

    match <[PathBuf; 3]>::try_from(paths) {
        Ok([l2, salinity, temperature]) => Ok(ProductPaths {
            l2,
            salinity,
            temperature,
        }),
        Err(_) => Err(AcquisitionError::NoData(Product::ALL.to_vec())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn span() -> TimeSpan {
        TimeSpan::new(date(2024, 7, 1), date(2024, 7, 5)).unwrap()
    }

    fn bbox() -> BoundingBox {
        BoundingBox::from_corners(-70.0, 38.0, -60.0, 45.0).unwrap()
    }

    fn touch(dir: &Path, name: &str) {
        File::create(dir.join(name)).unwrap();
    }

    #[test]
    fn test_time_span_is_strict() {
        assert!(TimeSpan::new(date(2024, 7, 1), date(2024, 7, 1)).is_err());
        assert!(TimeSpan::new(date(2024, 7, 2), date(2024, 7, 1)).is_err());
        let span = span();
        assert!(span.contains(date(2024, 7, 1)));
        assert!(span.contains(date(2024, 7, 5)));
        assert!(!span.contains(date(2024, 7, 6)));
    }

    #[test]
    fn test_granule_date() {
        assert_eq!(
            granule_date("PACE_OCI.20240701T175112.L2.OC_AOP.V2_0.nc"),
            Some(date(2024, 7, 1))
        );
        assert_eq!(
            granule_date("SMAP_L3_SSS_20240705_8DAYS_V5.0.nc"),
            Some(date(2024, 7, 5))
        );
        assert_eq!(
            granule_date("20240703090000-JPL-L4_GHRSST-SSTfnd-MUR-GLOB-v02.0-fv04.1.nc"),
            Some(date(2024, 7, 3))
        );
        assert_eq!(granule_date("V5.0_8DAYS.nc"), None);
        assert_eq!(granule_date("run_20241399.nc"), None);
    }

    #[test]
    fn test_search_filters_by_pattern_and_date() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("2024").join("07");
        fs::create_dir_all(&nested).unwrap();
        touch(&nested, "PACE_OCI.20240703T175112.L2.OC_AOP.V2_0.nc");
        touch(dir.path(), "PACE_OCI.20240702T160000.L2.OC_AOP.V2_0.nc");
        touch(dir.path(), "PACE_OCI.20240720T160000.L2.OC_AOP.V2_0.nc");
        touch(dir.path(), "PACE_OCI.20240702T160000.L2.OC_BGC.V2_0.nc");

        let archive = LocalArchive::new(dir.path());
        let span = span();
        let bbox = bbox();
        let mut query = SearchQuery {
            product: Product::L2Aop,
            time_span: &span,
            bbox: Some(&bbox),
            count: 10,
        };

        let granules = archive.search(&query).unwrap();
        assert_eq!(granules.len(), 2);
        assert_eq!(granules[0].date, date(2024, 7, 2));
        assert_eq!(granules[1].date, date(2024, 7, 3));

        query.count = 1;
        assert_eq!(archive.search(&query).unwrap().len(), 1);

        query.product = Product::Salinity;
        assert!(archive.search(&query).unwrap().is_empty());
    }

    #[test]
    fn test_load_data_downloads_each_product() {
        let archive_dir = tempdir().unwrap();
        touch(archive_dir.path(), "PACE_OCI.20240702T160000.L2.OC_AOP.V2_0.nc");
        touch(archive_dir.path(), "SMAP_L3_SSS_20240701_8DAYS_V5.0.nc");
        touch(
            archive_dir.path(),
            "20240702090000-JPL-L4_GHRSST-SSTfnd-MUR-GLOB-v02.0-fv04.1.nc",
        );

        let download_dir = tempdir().unwrap();
        let archive = LocalArchive::new(archive_dir.path());
        let paths = load_data(&archive, &span(), &bbox(), download_dir.path()).unwrap();

        assert!(paths.l2.starts_with(download_dir.path().join("L2_data")));
        assert!(paths.salinity.starts_with(download_dir.path().join("sal_data")));
        assert!(paths.temperature.starts_with(download_dir.path().join("temp_data")));
        assert!(paths.l2.exists());
        assert!(paths.temperature.exists());
    }

    #[test]
    fn test_empty_results_are_reported_not_downloaded() {
        let archive_dir = tempdir().unwrap();
        touch(archive_dir.path(), "PACE_OCI.20240702T160000.L2.OC_AOP.V2_0.nc");

        let download_dir = tempdir().unwrap();
        let archive = LocalArchive::new(archive_dir.path());
        let err = load_data(&archive, &span(), &bbox(), download_dir.path()).unwrap_err();

        match err {
            AcquisitionError::NoData(missing) => {
                assert_eq!(missing, vec![Product::Salinity, Product::Temperature])
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!download_dir.path().join("L2_data").exists());
        assert!(!download_dir.path().join("sal_data").exists());
    }

    #[test]
    fn test_no_data_message_lists_products() {
        let err = AcquisitionError::NoData(vec![Product::L2Aop, Product::Temperature]);
        assert_eq!(err.to_string(), "no data found for: L2 AOP, temperature");
    }
}
