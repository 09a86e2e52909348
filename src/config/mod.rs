use chrono::NaiveDate;

use serde::Deserialize;
use serde::Deserializer;
use serde::de::Error;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::acquisition::TimeSpan;
use crate::bbox::BoundingBox;
use crate::driver::FailurePolicy;

pub mod error;
pub use error::ConfigError;

#[derive(Debug, Clone)]
pub struct Config {
    time_span: TimeSpan,
    bbox: BoundingBox,
    archive_directory: PathBuf,
    download_directory: PathBuf,
    region: Option<BoundingBox>,
    inversion_command: Vec<String>,
    on_inversion_failure: FailurePolicy,
    parallel: bool,
    output: Option<PathBuf>,
}

// Dates are parsed and ordered, the search box is validated and the
// inversion command must not be empty.
impl<'de> Deserialize<'de> for Config {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ConfigHelper {
            start_date: String,
            end_date: String,
            bbox: BboxHelper,
            archive_directory: PathBuf,
            #[serde(default = "default_download_directory")]
            download_directory: PathBuf,
            region: Option<BoundingBox>,
            inversion_command: Vec<String>,
            #[serde(default)]
            on_inversion_failure: FailurePolicy,
            #[serde(default)]
            parallel: bool,
            output: Option<PathBuf>,
        }

        #[derive(Deserialize)]
        struct BboxHelper {
            xmin: f64,
            xmax: f64,
            ymin: f64,
            ymax: f64,
        }

        // Deserialize into the helper struct
        let helper = ConfigHelper::deserialize(deserializer)?;

        let start_date = NaiveDate::parse_from_str(&helper.start_date, "%Y-%m-%d")
            .map_err(|e| D::Error::custom(format!("Invalid start_date format: {}", e)))?;

        let end_date = NaiveDate::parse_from_str(&helper.end_date, "%Y-%m-%d")
            .map_err(|e| D::Error::custom(format!("Invalid end_date format: {}", e)))?;

        let time_span = TimeSpan::new(start_date, end_date).map_err(D::Error::custom)?;

        let BboxHelper {
            xmin,
            xmax,
            ymin,
            ymax,
        } = helper.bbox;
        let bbox = BoundingBox::from_corners(xmin, ymin, xmax, ymax)
            .map_err(|e| D::Error::custom(ConfigError::Bbox(e)))?;

        if helper.inversion_command.is_empty() {
            return Err(D::Error::custom(ConfigError::EmptyCommand));
        }

        Ok(Config {
            time_span,
            bbox,
            archive_directory: helper.archive_directory,
            download_directory: helper.download_directory,
            region: helper.region,
            inversion_command: helper.inversion_command,
            on_inversion_failure: helper.on_inversion_failure,
            parallel: helper.parallel,
            output: helper.output,
        })
    }
}

fn default_download_directory() -> PathBuf {
    PathBuf::from(".")
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let config: Config = serde_json::from_reader(reader).map_err(ConfigError::from)?;

        Ok(config)
    }

    pub fn time_span(&self) -> &TimeSpan {
        &self.time_span
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn archive_directory(&self) -> &Path {
        &self.archive_directory
    }

    pub fn download_directory(&self) -> &Path {
        &self.download_directory
    }

    pub fn region(&self) -> Option<&BoundingBox> {
        self.region.as_ref()
    }

    pub fn inversion_command(&self) -> &[String] {
        &self.inversion_command
    }

    pub fn on_inversion_failure(&self) -> FailurePolicy {
        self.on_inversion_failure
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    pub fn set_output(&mut self, output: PathBuf) {
        self.output = Some(output);
    }
}
