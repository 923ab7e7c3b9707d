use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::dates;

/// A calendar month used as a cohort bucket key. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn month_end(&self) -> Option<NaiveDate> {
        dates::month_end(self.year, self.month)
    }

    /// Short label such as "Nov 2025".
    pub fn label(&self) -> String {
        match NaiveDate::from_ymd_opt(self.year, self.month, 1) {
            Some(first) => first.format("%b %Y").to_string(),
            None => self.to_string(),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProgressTier {
    Zero,
    Quarter,
    Half,
    ThreeQuarters,
    Full,
}

impl ProgressTier {
    pub fn percent(self) -> u8 {
        match self {
            ProgressTier::Zero => 0,
            ProgressTier::Quarter => 25,
            ProgressTier::Half => 50,
            ProgressTier::ThreeQuarters => 75,
            ProgressTier::Full => 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionSummary {
    pub videos_completed: usize,
    pub quizzes_completed: usize,
    pub tier: ProgressTier,
}

impl CompletionSummary {
    /// Content-based start: at least one chapter or quiz completed.
    pub fn has_started(&self) -> bool {
        self.videos_completed > 0 || self.quizzes_completed > 0
    }
}

/// The minimum kept per learner so cohort buckets can be rebuilt later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LearnerStart {
    pub start: NaiveDate,
    pub videos_completed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CohortCounts {
    pub cumulative: usize,
    pub monthly: usize,
}

/// Inclusive start-date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub language: String,
    pub source_file: String,
    pub total_rows: usize,
    pub started_with_date: usize,
    pub started_with_completion: usize,
    pub only_one_video: usize,
    pub reached_25: usize,
    pub reached_50: usize,
    pub reached_75: usize,
    pub completed_100: usize,
    pub cohorts: BTreeMap<MonthKey, CohortCounts>,
}

/// Column sums over every accepted dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OverallTotals {
    pub total_rows: usize,
    pub started_with_date: usize,
    pub started_with_completion: usize,
    pub only_one_video: usize,
    pub reached_25: usize,
    pub reached_50: usize,
    pub reached_75: usize,
    pub completed_100: usize,
    pub cohorts: BTreeMap<MonthKey, CohortCounts>,
}

impl OverallTotals {
    pub fn from_summaries(summaries: &[DatasetSummary]) -> Self {
        let mut totals = OverallTotals::default();
        for summary in summaries {
            totals.total_rows += summary.total_rows;
            totals.started_with_date += summary.started_with_date;
            totals.started_with_completion += summary.started_with_completion;
            totals.only_one_video += summary.only_one_video;
            totals.reached_25 += summary.reached_25;
            totals.reached_50 += summary.reached_50;
            totals.reached_75 += summary.reached_75;
            totals.completed_100 += summary.completed_100;
            for (key, counts) in &summary.cohorts {
                let entry = totals.cohorts.entry(*key).or_default();
                entry.cumulative += counts.cumulative;
                entry.monthly += counts.monthly;
            }
        }
        totals
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedFile {
    pub source_file: String,
    pub reason: String,
}

/// Final product of one batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub filter: Option<DateRange>,
    pub datasets: Vec<DatasetSummary>,
    pub rejected: Vec<RejectedFile>,
    pub totals: OverallTotals,
}
