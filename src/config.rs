use std::path::PathBuf;

use crate::dates::parse_start_date;
use crate::error::ConfigError;
use crate::models::DateRange;
use crate::schema::SchemaContract;

pub const DEFAULT_PREFIX: &str = "AI Samarth";

pub fn default_languages() -> Vec<String> {
    ["Bengali", "English", "Hindi", "Marathi", "Odia"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Settings for one batch run, resolved from the command line.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub prefix: String,
    pub languages: Vec<String>,
    pub filter: Option<DateRange>,
    pub schema: SchemaContract,
}

impl RunConfig {
    pub fn new(input_dir: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            input_dir,
            output_dir,
            prefix: DEFAULT_PREFIX.to_string(),
            languages: default_languages(),
            filter: None,
            schema: SchemaContract::default(),
        }
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.output_dir.join("Processed_CSVs")
    }
}

/// Builds the optional start-date window from raw `--from`/`--to` values.
pub fn parse_filter(from: Option<&str>, to: Option<&str>) -> Result<Option<DateRange>, ConfigError> {
    match (from, to) {
        (None, None) => Ok(None),
        (Some(from), Some(to)) => {
            let from_date =
                parse_start_date(from).ok_or_else(|| ConfigError::BadDate(from.to_string()))?;
            let to_date =
                parse_start_date(to).ok_or_else(|| ConfigError::BadDate(to.to_string()))?;
            if from_date > to_date {
                return Err(ConfigError::InvertedRange {
                    from: from_date,
                    to: to_date,
                });
            }
            Ok(Some(DateRange {
                from: from_date,
                to: to_date,
            }))
        }
        _ => Err(ConfigError::HalfRange),
    }
}
