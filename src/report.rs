use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;

use crate::models::{BatchReport, CohortCounts, MonthKey};

fn pct(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

pub fn build_report(report: &BatchReport) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Course Completion Report");
    let _ = writeln!(
        output,
        "Run {} generated {}",
        report.run_id,
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    if let Some(range) = report.filter {
        let _ = writeln!(
            output,
            "Start dates from {} to {}",
            range.from.format("%d %b %Y"),
            range.to.format("%d %b %Y")
        );
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "## Completion Summary");

    if report.datasets.is_empty() {
        let _ = writeln!(output, "No datasets passed validation.");
    } else {
        let _ = writeln!(
            output,
            "| Course Language | Total Users | Started (date) | Started | Only 1 Video | 25% Completion | 50% Completion | 75% Completion | 100% Completion |"
        );
        let _ = writeln!(output, "|---|---|---|---|---|---|---|---|---|");
        for summary in &report.datasets {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {} | {} | {} | {} | {} |",
                summary.language,
                summary.total_rows,
                summary.started_with_date,
                summary.started_with_completion,
                summary.only_one_video,
                summary.reached_25,
                summary.reached_50,
                summary.reached_75,
                summary.completed_100
            );
        }
        let totals = &report.totals;
        let _ = writeln!(
            output,
            "| OVERALL TOTALS | {} | {} | {} | {} | {} | {} | {} | {} |",
            totals.total_rows,
            totals.started_with_date,
            totals.started_with_completion,
            totals.only_one_video,
            totals.reached_25,
            totals.reached_50,
            totals.reached_75,
            totals.completed_100
        );

        let _ = writeln!(output);
        let whole = totals.total_rows;
        for (label, count) in [
            ("Started", totals.started_with_completion),
            ("Only 1 Video", totals.only_one_video),
            ("25% Completion", totals.reached_25),
            ("50% Completion", totals.reached_50),
            ("75% Completion", totals.reached_75),
            ("100% Completion", totals.completed_100),
        ] {
            let _ = writeln!(
                output,
                "- {}: {} users ({:.1}%)",
                label,
                count,
                pct(count, whole)
            );
        }
    }

    let months: Vec<MonthKey> = report.totals.cohorts.keys().copied().collect();

    let _ = writeln!(output);
    let _ = writeln!(output, "## At Least 1 Video: Cumulative (Start to Month End)");
    write_cohort_table(
        &mut output,
        report,
        &months,
        |m| format!("Up to {} End", m.label()),
        |c| c.cumulative,
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## At Least 1 Video: Monthly (Month Only)");
    write_cohort_table(
        &mut output,
        report,
        &months,
        |m| format!("{} Only", m.label()),
        |c| c.monthly,
    );

    if !report.rejected.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Rejected Files");
        for rejected in &report.rejected {
            let _ = writeln!(output, "- {}: {}", rejected.source_file, rejected.reason);
        }
    }

    output
}

fn write_cohort_table(
    output: &mut String,
    report: &BatchReport,
    months: &[MonthKey],
    heading: impl Fn(&MonthKey) -> String,
    value: impl Fn(&CohortCounts) -> usize,
) {
    if months.is_empty() || report.datasets.is_empty() {
        let _ = writeln!(output, "No learners with a start date in this window.");
        return;
    }

    let headings: Vec<String> = months.iter().map(&heading).collect();
    let _ = writeln!(output, "| Course Language | {} |", headings.join(" | "));
    let _ = writeln!(output, "|---|{}", "---|".repeat(months.len()));

    for summary in &report.datasets {
        let cells: Vec<String> = months
            .iter()
            .map(|m| summary.cohorts.get(m).map(&value).unwrap_or(0).to_string())
            .collect();
        let _ = writeln!(output, "| {} | {} |", summary.language, cells.join(" | "));
    }

    let totals: Vec<String> = months
        .iter()
        .map(|m| report.totals.cohorts.get(m).map(&value).unwrap_or(0).to_string())
        .collect();
    let _ = writeln!(output, "| TOTAL | {} |", totals.join(" | "));
}

/// Writes `summary.json` and `summary.md` into `out_dir`.
pub fn write_outputs(report: &BatchReport, out_dir: &Path) -> anyhow::Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(out_dir)?;

    let json_path = out_dir.join("summary.json");
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(&json_path, json)
        .with_context(|| format!("failed to write {}", json_path.display()))?;

    let md_path = out_dir.join("summary.md");
    std::fs::write(&md_path, build_report(report))
        .with_context(|| format!("failed to write {}", md_path.display()))?;

    Ok((json_path, md_path))
}

/// Earliest and latest start dates plus learners per start month.
pub fn build_date_preview(dates: &[NaiveDate]) -> String {
    let mut output = String::new();

    let (Some(min), Some(max)) = (dates.iter().min(), dates.iter().max()) else {
        let _ = writeln!(output, "No parseable start dates found.");
        return output;
    };

    let _ = writeln!(
        output,
        "Found data from {} to {} ({} learners with a start date)",
        min.format("%d %b %Y"),
        max.format("%d %b %Y"),
        dates.len()
    );

    let mut by_month: BTreeMap<MonthKey, usize> = BTreeMap::new();
    for date in dates {
        *by_month.entry(MonthKey::of(*date)).or_insert(0) += 1;
    }
    for (month, count) in by_month {
        let _ = writeln!(output, "- {} ({}): {} users", month, month.label(), count);
    }

    output
}
