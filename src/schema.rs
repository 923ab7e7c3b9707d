use std::ops::RangeInclusive;

use csv::StringRecord;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::SchemaError;

static CHAPTER_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r" - ([a-zA-Z0-9]{24})$").unwrap());

/// Fixed column layout of a learner-activity export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaContract {
    pub start_date_column: usize,
    pub pillar_column: usize,
    pub chapter_span: RangeInclusive<usize>,
    pub midpoint_quiz_column: usize,
    pub endpoint_quiz_column: usize,
    pub expected_chapters: usize,
}

impl Default for SchemaContract {
    fn default() -> Self {
        Self {
            start_date_column: 12,
            pillar_column: 17,
            chapter_span: 17..=69,
            midpoint_quiz_column: 41,
            endpoint_quiz_column: 72,
            expected_chapters: 35,
        }
    }
}

/// Column positions confirmed against a real header. Only obtainable
/// through [`SchemaContract::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSchema {
    pub start_date_column: usize,
    pub chapter_columns: Vec<usize>,
    pub quiz_columns: [usize; 2],
}

impl SchemaContract {
    pub fn validate(&self, header: &StringRecord) -> Result<ValidatedSchema, SchemaError> {
        if !header_contains(header, self.pillar_column, "pillar") {
            return Err(SchemaError::MissingPillar {
                column: column_letter(self.pillar_column),
            });
        }

        let chapter_columns = self.chapter_columns(header);
        if chapter_columns.len() != self.expected_chapters {
            return Err(SchemaError::ChapterCount {
                expected: self.expected_chapters,
                found: chapter_columns.len(),
                range: format!(
                    "{} to {}",
                    column_letter(*self.chapter_span.start()),
                    column_letter(*self.chapter_span.end())
                ),
            });
        }

        for column in [self.midpoint_quiz_column, self.endpoint_quiz_column] {
            if !header_contains(header, column, "quiz") {
                return Err(SchemaError::MissingQuiz {
                    column: column_letter(column),
                });
            }
        }

        Ok(ValidatedSchema {
            start_date_column: self.start_date_column,
            chapter_columns,
            quiz_columns: [self.midpoint_quiz_column, self.endpoint_quiz_column],
        })
    }

    fn chapter_columns(&self, header: &StringRecord) -> Vec<usize> {
        self.chapter_span
            .clone()
            .filter_map(|idx| header.get(idx).map(|cell| (idx, cell)))
            .filter(|(_, cell)| is_chapter_header(cell))
            .map(|(idx, _)| idx)
            .collect()
    }
}

pub fn is_chapter_header(cell: &str) -> bool {
    CHAPTER_ID_RE.is_match(cell) && !cell.to_lowercase().contains("quiz")
}

fn header_contains(header: &StringRecord, idx: usize, marker: &str) -> bool {
    header
        .get(idx)
        .map(|cell| cell.to_lowercase().contains(marker))
        .unwrap_or(false)
}

/// Spreadsheet column name for a zero-based index (0 → "A", 26 → "AA").
pub fn column_letter(idx: usize) -> String {
    let mut letters = Vec::new();
    let mut n = idx + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}
