use chrono::NaiveDate;
use thiserror::Error;

/// Header contract violations. Any one of these rejects the whole dataset.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("column {column} must contain 'Pillar'")]
    MissingPillar { column: String },

    #[error("expected {expected} video chapters in range {range}, found {found}")]
    ChapterCount {
        expected: usize,
        found: usize,
        range: String,
    },

    #[error("column {column} must contain 'quiz'")]
    MissingQuiz { column: String },
}

/// Batch composition violations, raised before any dataset is read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    #[error("no files containing '{prefix}' found in {folder}")]
    NoFiles { prefix: String, folder: String },

    #[error(
        "folder must contain exactly {expected} dataset files, found {found}{}",
        format_missing(.missing)
    )]
    FileCount {
        expected: usize,
        found: usize,
        missing: Vec<String>,
    },

    #[error("duplicate language files found: {}", format_duplicates(.0))]
    Duplicates(Vec<(String, Vec<String>)>),

    #[error(
        "invalid language files: {}",
        format_composition(.required, .found, .missing, .extra)
    )]
    Composition {
        required: Vec<String>,
        found: Vec<String>,
        missing: Vec<String>,
        extra: Vec<String>,
    },
}

fn format_missing(missing: &[String]) -> String {
    if missing.is_empty() {
        String::new()
    } else {
        format!(" (missing: {})", missing.join(", "))
    }
}

fn format_duplicates(duplicates: &[(String, Vec<String>)]) -> String {
    duplicates
        .iter()
        .map(|(label, files)| format!("{label} ({} files: {})", files.len(), files.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

fn format_composition(
    required: &[String],
    found: &[String],
    missing: &[String],
    extra: &[String],
) -> String {
    let mut message = format!("required {}; found ", required.join(", "));
    if found.is_empty() {
        message.push_str("None");
    } else {
        message.push_str(&found.join(", "));
    }
    if !missing.is_empty() {
        message.push_str(&format!("; missing: {}", missing.join(", ")));
    }
    if !extra.is_empty() {
        message.push_str(&format!("; extra/invalid: {}", extra.join(", ")));
    }
    message
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("could not read '{0}' as a date")]
    BadDate(String),

    #[error("filter start {from} is after filter end {to}")]
    InvertedRange { from: NaiveDate, to: NaiveDate },

    #[error("--from and --to must be given together")]
    HalfRange,
}
