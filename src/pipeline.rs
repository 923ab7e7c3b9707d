use chrono::Utc;
use csv::StringRecord;
use tracing::{info, warn};
use uuid::Uuid;

use crate::batch::{self, DatasetFile};
use crate::cohort::{AggregatedDataset, CohortAggregator};
use crate::completion::{augment_row, summarize_row};
use crate::config::RunConfig;
use crate::error::{BatchError, SchemaError};
use crate::ingest::{self, Dataset};
use crate::models::{BatchReport, DateRange, OverallTotals, RejectedFile};
use crate::normalize::normalize;
use crate::schema::SchemaContract;

pub enum FileOutcome {
    Accepted(AggregatedDataset),
    Rejected(RejectedFile),
}

/// Validates and folds one in-memory dataset, returning the aggregate and
/// the rows with their derived columns appended.
pub fn process_dataset(
    contract: &SchemaContract,
    dataset: &Dataset,
    language: &str,
    source_file: &str,
    filter: Option<DateRange>,
) -> Result<(AggregatedDataset, Vec<StringRecord>), SchemaError> {
    let schema = contract.validate(&dataset.header)?;
    let mut aggregator = CohortAggregator::new(language, source_file, filter);
    let mut augmented = Vec::with_capacity(dataset.rows.len());

    for row in &dataset.rows {
        let completion = summarize_row(&schema, row);
        let start = ingest::start_date(row, schema.start_date_column);
        aggregator.observe(&completion, start);
        augmented.push(augment_row(row, &completion));
    }

    Ok((aggregator.finish(), augmented))
}

pub fn process_file(config: &RunConfig, file: &DatasetFile) -> anyhow::Result<FileOutcome> {
    let language = file.language.clone().unwrap_or_else(|| "Unknown".to_string());

    let dataset = match ingest::read_dataset(&file.path) {
        Ok(dataset) => dataset,
        Err(err) => {
            warn!(file = %file.file_name, error = %format!("{err:#}"), "failed to read dataset");
            return Ok(FileOutcome::Rejected(RejectedFile {
                source_file: file.file_name.clone(),
                reason: format!("failed to read file: {err:#}"),
            }));
        }
    };

    let (aggregated, augmented) =
        match process_dataset(&config.schema, &dataset, &language, &file.file_name, config.filter) {
            Ok(result) => result,
            Err(err) => {
                warn!(file = %file.file_name, reason = %err, "validation failed");
                return Ok(FileOutcome::Rejected(RejectedFile {
                    source_file: file.file_name.clone(),
                    reason: err.to_string(),
                }));
            }
        };

    let stem = file
        .path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| file.file_name.clone());
    let out_path = config.processed_dir().join(format!("{stem}_processed.csv"));
    ingest::write_augmented(&out_path, &dataset.header, &augmented)?;

    info!(
        file = %file.file_name,
        language = %language,
        rows = aggregated.summary.total_rows,
        output = %out_path.display(),
        "dataset processed"
    );

    Ok(FileOutcome::Accepted(aggregated))
}

/// Gate, validate, aggregate and normalize every dataset in the input folder.
pub fn run(config: &RunConfig) -> anyhow::Result<BatchReport> {
    let files = batch::discover(&config.input_dir, &config.prefix)?;
    if files.is_empty() {
        return Err(BatchError::NoFiles {
            prefix: config.prefix.clone(),
            folder: config.input_dir.display().to_string(),
        }
        .into());
    }
    batch::check_composition(&files, &config.languages)?;
    info!(files = files.len(), "batch composition accepted");

    std::fs::create_dir_all(config.processed_dir())?;

    let mut aggregated = Vec::new();
    let mut rejected = Vec::new();
    for file in &files {
        match process_file(config, file)? {
            FileOutcome::Accepted(dataset) => aggregated.push(dataset),
            FileOutcome::Rejected(file) => rejected.push(file),
        }
    }

    let mut datasets = normalize(aggregated);
    datasets.sort_by(|a, b| b.total_rows.cmp(&a.total_rows));
    let totals = OverallTotals::from_summaries(&datasets);

    Ok(BatchReport {
        run_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        filter: config.filter,
        datasets,
        rejected,
        totals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CohortCounts, MonthKey};
    use crate::schema::fixtures::{chapter_positions, valid_header, HEADER_LEN};
    use std::path::Path;

    fn learner(start: &str, videos: usize, quizzes: usize) -> Vec<String> {
        let mut cells = vec![String::new(); HEADER_LEN];
        cells[12] = start.to_string();
        for idx in chapter_positions().into_iter().take(videos) {
            cells[idx] = "Completed".to_string();
        }
        for idx in [41, 72].into_iter().take(quizzes) {
            cells[idx] = "Completed".to_string();
        }
        cells
    }

    fn write_csv(path: &Path, header: &[String], rows: &[Vec<String>]) {
        let mut writer = csv::WriterBuilder::new().flexible(true).from_path(path).unwrap();
        writer.write_record(header).unwrap();
        for row in rows {
            writer.write_record(row).unwrap();
        }
        writer.flush().unwrap();
    }

    fn write_batch(dir: &Path, rows_for: impl Fn(&str) -> Vec<Vec<String>>) {
        for (i, lang) in ["Bengali", "English", "Hindi", "Marathi", "Odia"].iter().enumerate() {
            let name = format!("AI Samarth - {lang}-176855585{i}.csv");
            write_csv(&dir.join(name), &valid_header(), &rows_for(lang));
        }
    }

    #[test]
    fn full_batch_normalizes_months_across_languages() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_batch(input.path(), |lang| match lang {
            "Hindi" => vec![
                learner("06/11/25", 1, 0),
                learner("2025/12/01", 35, 2),
                learner("Not Started", 0, 0),
            ],
            _ => vec![learner("15/10/25", 10, 0)],
        });

        let config = RunConfig::new(input.path().to_path_buf(), output.path().to_path_buf());
        let report = run(&config).unwrap();

        assert!(report.rejected.is_empty());
        assert_eq!(report.datasets.len(), 5);
        assert_eq!(report.datasets[0].language, "Hindi");
        assert_eq!(report.totals.total_rows, 7);

        let expected = vec![
            MonthKey::new(2025, 10),
            MonthKey::new(2025, 11),
            MonthKey::new(2025, 12),
        ];
        for summary in &report.datasets {
            assert_eq!(summary.cohorts.keys().copied().collect::<Vec<_>>(), expected);
        }

        let hindi = &report.datasets[0];
        assert_eq!(hindi.started_with_date, 2);
        assert_eq!(hindi.started_with_completion, 2);
        assert_eq!(hindi.only_one_video, 1);
        assert_eq!(hindi.completed_100, 1);
        assert_eq!(hindi.cohorts[&MonthKey::new(2025, 10)], CohortCounts::default());
        assert_eq!(
            hindi.cohorts[&MonthKey::new(2025, 12)],
            CohortCounts { cumulative: 2, monthly: 1 }
        );

        let odia = report.datasets.iter().find(|d| d.language == "Odia").unwrap();
        assert_eq!(
            odia.cohorts[&MonthKey::new(2025, 11)],
            CohortCounts { cumulative: 1, monthly: 0 }
        );

        let processed = output
            .path()
            .join("Processed_CSVs")
            .join("AI Samarth - Hindi-1768555852_processed.csv");
        let dataset = ingest::read_dataset(&processed).unwrap();
        assert_eq!(dataset.header.len(), HEADER_LEN + 3);
        assert_eq!(dataset.header.get(HEADER_LEN + 2), Some("Progress %"));
        let first = &dataset.rows[0];
        assert_eq!(first.get(HEADER_LEN), Some("1"));
        assert_eq!(first.get(HEADER_LEN + 1), Some("0"));
        assert_eq!(first.get(HEADER_LEN + 2), Some("0"));
        assert_eq!(dataset.rows[1].get(HEADER_LEN + 2), Some("100"));
    }

    #[test]
    fn schema_failure_drops_only_that_dataset() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_batch(input.path(), |_| vec![learner("01/10/25", 2, 0)]);

        let mut broken = valid_header();
        broken[17] = "Module".to_string();
        write_csv(
            &input.path().join("AI Samarth - English-1768555851.csv"),
            &broken,
            &[learner("01/10/25", 2, 0)],
        );

        let config = RunConfig::new(input.path().to_path_buf(), output.path().to_path_buf());
        let report = run(&config).unwrap();

        assert_eq!(report.datasets.len(), 4);
        assert!(report.datasets.iter().all(|d| d.language != "English"));
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].reason, "column R must contain 'Pillar'");
        assert!(!output
            .path()
            .join("Processed_CSVs")
            .join("AI Samarth - English-1768555851_processed.csv")
            .exists());
    }

    #[test]
    fn incomplete_batch_is_rejected_before_processing() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_batch(input.path(), |_| vec![learner("01/10/25", 2, 0)]);
        std::fs::remove_file(input.path().join("AI Samarth - Odia-1768555854.csv")).unwrap();
        std::fs::write(input.path().join("AI Samarth - Tamil-1768555854.csv"), "x\n").unwrap();

        let config = RunConfig::new(input.path().to_path_buf(), output.path().to_path_buf());
        let err = run(&config).unwrap_err();
        let batch_err = err.downcast_ref::<BatchError>().unwrap();
        assert!(matches!(batch_err, BatchError::Composition { .. }));
        assert!(err.to_string().contains("missing: Odia"));
        assert!(!output.path().join("Processed_CSVs").exists());
    }

    #[test]
    fn filter_narrows_cohorts_but_not_population() {
        let header = crate::schema::fixtures::record(&valid_header());
        let rows = vec![
            learner("05/09/25", 3, 0),
            learner("05/10/25", 3, 0),
            learner("", 3, 0),
        ];
        let dataset = Dataset {
            header,
            rows: rows.iter().map(|r| StringRecord::from(r.clone())).collect(),
        };
        let filter = crate::config::parse_filter(Some("2025-10-01"), Some("2025-10-31")).unwrap();

        let (aggregated, augmented) =
            process_dataset(&SchemaContract::default(), &dataset, "Hindi", "h.csv", filter)
                .unwrap();
        assert_eq!(augmented.len(), 3);
        assert_eq!(aggregated.summary.total_rows, 3);
        assert_eq!(aggregated.summary.started_with_completion, 1);
        assert_eq!(
            aggregated.summary.cohorts.keys().copied().collect::<Vec<_>>(),
            vec![MonthKey::new(2025, 10)]
        );
    }
}
