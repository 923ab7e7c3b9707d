use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::Context;
use regex::{Regex, RegexBuilder};

use crate::error::BatchError;

/// One export file picked up from the input folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetFile {
    pub path: PathBuf,
    pub file_name: String,
    pub language: Option<String>,
}

/// Matches `<prefix> - <Language>-<digits>.csv` file names.
#[derive(Debug, Clone)]
pub struct LabelPattern {
    regex: Regex,
}

impl LabelPattern {
    pub fn new(prefix: &str) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(&format!(r"{} - ([^-]+)-\d+\.csv", regex::escape(prefix)))
            .case_insensitive(true)
            .build()?;
        Ok(Self { regex })
    }

    pub fn extract(&self, file_name: &str) -> Option<String> {
        self.regex
            .captures(file_name)
            .and_then(|caps| caps.get(1))
            .map(|label| label.as_str().trim().to_string())
    }
}

/// Regular files whose name contains `prefix` in any casing, sorted by name.
pub fn discover(folder: &Path, prefix: &str) -> anyhow::Result<Vec<DatasetFile>> {
    let pattern = LabelPattern::new(prefix)?;
    let needle = prefix.to_lowercase();
    let mut files = Vec::new();

    let entries = std::fs::read_dir(folder)
        .with_context(|| format!("failed to read input folder {}", folder.display()))?;
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().to_string();
        if !file_name.to_lowercase().contains(&needle) {
            continue;
        }
        files.push(DatasetFile {
            path: entry.path(),
            language: pattern.extract(&file_name),
            file_name,
        });
    }

    files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(files)
}

/// Accepts the batch only when it holds exactly one file per required label.
pub fn check_composition(files: &[DatasetFile], required: &[String]) -> Result<(), BatchError> {
    let mut by_label: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for file in files {
        if let Some(label) = file.language.as_deref() {
            by_label.entry(label).or_default().push(file.file_name.clone());
        }
    }

    let duplicates: Vec<(String, Vec<String>)> = by_label
        .iter()
        .filter(|(_, names)| names.len() > 1)
        .map(|(label, names)| (label.to_string(), names.clone()))
        .collect();
    if !duplicates.is_empty() {
        return Err(BatchError::Duplicates(duplicates));
    }

    let found: BTreeSet<&str> = by_label.keys().copied().collect();
    let wanted: BTreeSet<&str> = required.iter().map(String::as_str).collect();
    let missing: Vec<String> = wanted.difference(&found).map(|s| s.to_string()).collect();
    let extra: Vec<String> = found.difference(&wanted).map(|s| s.to_string()).collect();

    if files.len() != required.len() {
        return Err(BatchError::FileCount {
            expected: required.len(),
            found: files.len(),
            missing,
        });
    }

    if missing.is_empty() && extra.is_empty() {
        return Ok(());
    }

    Err(BatchError::Composition {
        required: wanted.iter().map(|s| s.to_string()).collect(),
        found: found.iter().map(|s| s.to_string()).collect(),
        missing,
        extra,
    })
}
