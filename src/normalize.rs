use std::collections::BTreeSet;

use tracing::debug;

use crate::cohort::{bucket_counts, AggregatedDataset};
use crate::models::{DatasetSummary, MonthKey};

/// Gives every dataset the same month buckets: the union of the months seen
/// in any dataset, recounted from each dataset's retained learners. The
/// retained lists are dropped once counted.
pub fn normalize(datasets: Vec<AggregatedDataset>) -> Vec<DatasetSummary> {
    let months: BTreeSet<MonthKey> = datasets
        .iter()
        .flat_map(|dataset| dataset.summary.cohorts.keys().copied())
        .collect();

    debug!(months = months.len(), datasets = datasets.len(), "normalizing cohort buckets");

    datasets
        .into_iter()
        .map(|dataset| {
            let mut summary = dataset.summary;
            summary.cohorts = bucket_counts(months.iter().copied(), &dataset.retained);
            summary
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::CohortAggregator;
    use crate::completion::progress_tier;
    use crate::models::{CohortCounts, CompletionSummary};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn completion(videos: usize) -> CompletionSummary {
        CompletionSummary {
            videos_completed: videos,
            quizzes_completed: 0,
            tier: progress_tier(videos, 0),
        }
    }

    #[test]
    fn missing_months_are_backfilled_with_zero() {
        let mut a = CohortAggregator::new("Bengali", "a.csv", None);
        a.observe(&completion(1), date(2025, 12, 3));
        let mut b = CohortAggregator::new("Marathi", "b.csv", None);
        b.observe(&completion(4), date(2025, 10, 9));

        let summaries = normalize(vec![a.finish(), b.finish()]);
        let december = MonthKey::new(2025, 12);
        let october = MonthKey::new(2025, 10);

        assert_eq!(summaries[0].cohorts[&october], CohortCounts::default());
        assert_eq!(summaries[0].cohorts[&december], CohortCounts { cumulative: 1, monthly: 1 });
        assert_eq!(summaries[1].cohorts[&october], CohortCounts { cumulative: 1, monthly: 1 });
        assert_eq!(summaries[1].cohorts[&december], CohortCounts { cumulative: 1, monthly: 0 });
    }

    #[test]
    fn every_summary_exposes_identical_keys() {
        let mut a = CohortAggregator::new("Hindi", "a.csv", None);
        a.observe(&completion(2), date(2025, 9, 1));
        a.observe(&completion(0), date(2026, 2, 14));
        let mut b = CohortAggregator::new("Odia", "b.csv", None);
        b.observe(&completion(1), date(2025, 11, 11));
        let c = CohortAggregator::new("English", "c.csv", None);

        let summaries = normalize(vec![a.finish(), b.finish(), c.finish()]);
        let expected = vec![
            MonthKey::new(2025, 9),
            MonthKey::new(2025, 11),
            MonthKey::new(2026, 2),
        ];
        for summary in &summaries {
            assert_eq!(summary.cohorts.keys().copied().collect::<Vec<_>>(), expected);
            let cumulative: Vec<usize> = summary.cohorts.values().map(|c| c.cumulative).collect();
            assert!(cumulative.windows(2).all(|w| w[0] <= w[1]));
        }
        assert_eq!(
            summaries[0].cohorts[&MonthKey::new(2026, 2)],
            CohortCounts { cumulative: 1, monthly: 0 }
        );
    }

    #[test]
    fn learners_started_after_a_month_do_not_count_in_it() {
        let mut a = CohortAggregator::new("Hindi", "a.csv", None);
        a.observe(&completion(3), date(2026, 1, 15));
        let mut b = CohortAggregator::new("Odia", "b.csv", None);
        b.observe(&completion(1), date(2025, 11, 2));

        let summaries = normalize(vec![a.finish(), b.finish()]);
        assert_eq!(
            summaries[0].cohorts[&MonthKey::new(2025, 11)],
            CohortCounts::default()
        );
        assert_eq!(
            summaries[0].cohorts[&MonthKey::new(2026, 1)],
            CohortCounts { cumulative: 1, monthly: 1 }
        );
    }

    #[test]
    fn empty_batch_normalizes_to_nothing() {
        assert!(normalize(Vec::new()).is_empty());
    }
}
