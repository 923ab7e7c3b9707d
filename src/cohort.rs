use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::models::{
    CohortCounts, CompletionSummary, DatasetSummary, DateRange, LearnerStart, MonthKey,
    ProgressTier,
};

/// Per-dataset aggregate plus the learner list still needed for
/// cross-dataset normalization.
#[derive(Debug, Clone)]
pub struct AggregatedDataset {
    pub summary: DatasetSummary,
    pub retained: Vec<LearnerStart>,
}

/// Folds learner rows of one dataset into a [`DatasetSummary`].
///
/// With a date filter, rows without a start date or outside the window are
/// left out of every counter except `total_rows`.
#[derive(Debug)]
pub struct CohortAggregator {
    summary: DatasetSummary,
    filter: Option<DateRange>,
    discovered: BTreeSet<MonthKey>,
    retained: Vec<LearnerStart>,
}

impl CohortAggregator {
    pub fn new(language: &str, source_file: &str, filter: Option<DateRange>) -> Self {
        Self {
            summary: DatasetSummary {
                language: language.to_string(),
                source_file: source_file.to_string(),
                ..Default::default()
            },
            filter,
            discovered: BTreeSet::new(),
            retained: Vec::new(),
        }
    }

    pub fn observe(&mut self, completion: &CompletionSummary, start: Option<NaiveDate>) {
        self.summary.total_rows += 1;

        if let Some(range) = self.filter {
            match start {
                Some(date) if range.contains(date) => {}
                _ => return,
            }
        }

        let summary = &mut self.summary;
        if start.is_some() {
            summary.started_with_date += 1;
        }
        if completion.has_started() {
            summary.started_with_completion += 1;
        }
        if completion.videos_completed == 1 {
            summary.only_one_video += 1;
        }
        if completion.tier >= ProgressTier::Quarter {
            summary.reached_25 += 1;
        }
        if completion.tier >= ProgressTier::Half {
            summary.reached_50 += 1;
        }
        if completion.tier >= ProgressTier::ThreeQuarters {
            summary.reached_75 += 1;
        }
        if completion.tier == ProgressTier::Full {
            summary.completed_100 += 1;
        }

        if let Some(date) = start {
            self.discovered.insert(MonthKey::of(date));
            if completion.videos_completed >= 1 {
                self.retained.push(LearnerStart {
                    start: date,
                    videos_completed: completion.videos_completed,
                });
            }
        }
    }

    pub fn finish(self) -> AggregatedDataset {
        let mut summary = self.summary;
        summary.cohorts = bucket_counts(self.discovered.iter().copied(), &self.retained);
        AggregatedDataset {
            summary,
            retained: self.retained,
        }
    }
}

/// Counts learners with at least one completed chapter per month:
/// `cumulative` for starts on or before the month's last day, `monthly`
/// for starts inside the month.
pub fn bucket_counts(
    keys: impl IntoIterator<Item = MonthKey>,
    learners: &[LearnerStart],
) -> BTreeMap<MonthKey, CohortCounts> {
    let mut buckets = BTreeMap::new();
    for key in keys {
        let mut counts = CohortCounts::default();
        if let Some(end) = key.month_end() {
            for learner in learners.iter().filter(|l| l.videos_completed >= 1) {
                if learner.start <= end {
                    counts.cumulative += 1;
                }
                if MonthKey::of(learner.start) == key {
                    counts.monthly += 1;
                }
            }
        }
        buckets.insert(key, counts);
    }
    buckets
}
