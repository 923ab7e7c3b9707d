use csv::StringRecord;

use crate::models::{CompletionSummary, ProgressTier};
use crate::schema::ValidatedSchema;

pub const QUARTER_VIDEOS: usize = 9;
pub const HALF_VIDEOS: usize = 18;
pub const THREE_QUARTER_VIDEOS: usize = 26;
pub const ALL_VIDEOS: usize = 35;
pub const ALL_QUIZZES: usize = 2;

/// A cell counts as done when it mentions "completed" in any casing.
pub fn is_completed(cell: &str) -> bool {
    cell.to_lowercase().contains("completed")
}

fn count_completed(row: &StringRecord, columns: &[usize]) -> usize {
    columns
        .iter()
        .filter(|&&idx| row.get(idx).map(is_completed).unwrap_or(false))
        .count()
}

pub fn summarize_row(schema: &ValidatedSchema, row: &StringRecord) -> CompletionSummary {
    let videos_completed = count_completed(row, &schema.chapter_columns);
    let quizzes_completed = count_completed(row, &schema.quiz_columns);

    CompletionSummary {
        videos_completed,
        quizzes_completed,
        tier: progress_tier(videos_completed, quizzes_completed),
    }
}

pub fn progress_tier(videos_completed: usize, quizzes_completed: usize) -> ProgressTier {
    if videos_completed >= ALL_VIDEOS && quizzes_completed >= ALL_QUIZZES {
        ProgressTier::Full
    } else if videos_completed >= THREE_QUARTER_VIDEOS {
        ProgressTier::ThreeQuarters
    } else if videos_completed >= HALF_VIDEOS {
        ProgressTier::Half
    } else if videos_completed >= QUARTER_VIDEOS {
        ProgressTier::Quarter
    } else {
        ProgressTier::Zero
    }
}

/// Original cells followed by the three derived columns.
pub fn augment_row(row: &StringRecord, summary: &CompletionSummary) -> StringRecord {
    let mut augmented = row.clone();
    augmented.push_field(&summary.videos_completed.to_string());
    augmented.push_field(&summary.quizzes_completed.to_string());
    augmented.push_field(&summary.tier.percent().to_string());
    augmented
}

pub const AUGMENTED_HEADERS: [&str; 3] = ["Videos Completed", "Quizzes Completed", "Progress %"];
