//! Markdown export

use super::{signed, DashboardReport, RankedBucket};
use crate::{CountBucket, CourseFilter};
use chrono::{DateTime, Local, NaiveDate};
use std::fmt::Write;

/// File name used when `--out` is not given:
/// `onclass-analysis[-TAG]-YYYY-MM-DD.md`, no tag for `all`
pub fn default_filename(filter: &CourseFilter, date: NaiveDate) -> String {
    if filter.is_all() {
        format!("onclass-analysis-{}.md", date.format("%Y-%m-%d"))
    } else {
        format!("onclass-analysis-{}-{}.md", filter.tag(), date.format("%Y-%m-%d"))
    }
}

/// Reporter producing a Markdown document
#[derive(Default)]
pub struct MarkdownReporter;

impl MarkdownReporter {
    pub fn new() -> Self {
        Self
    }

    /// Render the report stamped with the current local time
    pub fn report(&self, report: &DashboardReport) -> String {
        self.render(report, Local::now())
    }

    pub fn render(&self, report: &DashboardReport, generated_at: DateTime<Local>) -> String {
        let mut output = String::new();

        let _ = writeln!(output, "# OnClass Feedback Analysis");
        let _ = writeln!(output);
        let _ = writeln!(output, "- Source: `{}`", report.source);
        let _ = writeln!(output, "- Filter: {}", report.filter_label);
        let _ = writeln!(output, "- Scope: {}", report.scope);
        let _ = writeln!(
            output,
            "- Generated: {}",
            generated_at.format("%Y-%m-%d %H:%M")
        );
        let _ = writeln!(output);

        let stats = &report.stats;
        let _ = writeln!(output, "## Overview");
        let _ = writeln!(output, "- Feedbacks: {}", stats.total);
        let _ = writeln!(output, "- Unique users: {}", stats.unique_users);
        match stats.average_length {
            Some(avg) => {
                let _ = writeln!(output, "- Average length: {} chars", avg);
            }
            None => {
                let _ = writeln!(output, "- Average length: no data");
            }
        }
        if let Some(range) = &stats.date_range {
            let _ = writeln!(output, "- Period: {} to {}", range.first, range.last);
        }
        let _ = writeln!(output);

        let _ = writeln!(output, "## Sentiment");
        match report.sentiment.percentages {
            Some(pct) => {
                let summary = &report.sentiment.summary;
                let _ = writeln!(output, "| | Count | Share |");
                let _ = writeln!(output, "|---|---:|---:|");
                let _ = writeln!(output, "| Positive | {} | {}% |", summary.positive, pct.positive);
                let _ = writeln!(output, "| Neutral | {} | {}% |", summary.neutral, pct.neutral);
                let _ = writeln!(output, "| Negative | {} | {}% |", summary.negative, pct.negative);
                let _ = writeln!(output);
                let _ = writeln!(output, "Score: **{}**", signed(pct.score));
                if let Some(insight) = report.sentiment.insight {
                    let _ = writeln!(output);
                    let _ = writeln!(output, "> {}", insight.description());
                }
            }
            None => {
                let _ = writeln!(output, "No data.");
            }
        }
        let _ = writeln!(output);

        if let Some(improvement) = &report.improvement {
            let _ = writeln!(output, "## Improvement Requests");
            let _ = writeln!(output, "{}", improvement.headline());
            let _ = writeln!(output);
            for category in &improvement.categories {
                let _ = writeln!(
                    output,
                    "### {} ({})",
                    category.category, category.count
                );
                if !category.top_keywords.is_empty() {
                    let _ = writeln!(output, "Keywords: {}", category.top_keywords.join(", "));
                }
                for sample in &category.samples {
                    let _ = writeln!(output, "- {}", sample.content);
                }
                let _ = writeln!(output);
            }
        }

        let teachers = &report.teachers;
        let _ = writeln!(
            output,
            "## Teachers (by {}, page {} of {})",
            teachers.sort,
            teachers.page + 1,
            teachers.pages.max(1)
        );
        write_ranking(&mut output, &teachers.entries);

        let _ = writeln!(output, "## Popular Blocks (by {})", report.blocks.sort);
        write_ranking(&mut output, &report.blocks.entries);

        write_counts(&mut output, "Categories", &report.categories);
        write_counts(&mut output, "Courses", &report.courses);
        write_counts(&mut output, "Timeline", &report.timeline);

        let _ = writeln!(output, "## Keywords");
        if report.keywords.is_empty() {
            let _ = writeln!(output, "No keywords extracted.");
        } else {
            let words: Vec<String> = report
                .keywords
                .iter()
                .map(|k| format!("{} ({})", k.term, k.count))
                .collect();
            let _ = writeln!(output, "{}", words.join(", "));
        }
        let _ = writeln!(output);

        let users = &report.users;
        let _ = writeln!(
            output,
            "## Users (by {}, top {} of {})",
            users.sort,
            users.entries.len(),
            users.total
        );
        if users.entries.is_empty() {
            let _ = writeln!(output, "No data.");
        } else {
            let _ = writeln!(output, "| User | Feedbacks | Positive | Negative | Categories |");
            let _ = writeln!(output, "|---|---:|---:|---:|---:|");
            for row in &users.entries {
                let _ = writeln!(
                    output,
                    "| {} | {} | {} | {} | {} |",
                    row.name, row.count, row.positive, row.negative, row.categories
                );
            }
        }
        let _ = writeln!(output);

        let _ = writeln!(output, "## Engagement");
        match &report.engagement {
            Some(engagement) => {
                let _ = writeln!(output, "- Repeat rate: {}%", engagement.repeater_rate);
                let _ = writeln!(output, "- Heavy users: {}", engagement.heavy_users);
                let _ = writeln!(
                    output,
                    "- Categories per user: {:.1}",
                    engagement.average_categories
                );
                for hint in &engagement.hints {
                    let _ = writeln!(output, "- {}", hint.description());
                }
            }
            None => {
                let _ = writeln!(output, "No data.");
            }
        }

        output
    }
}

fn write_ranking(output: &mut String, entries: &[RankedBucket]) {
    if entries.is_empty() {
        let _ = writeln!(output, "No data.");
    } else {
        let _ = writeln!(output, "| # | Name | Feedbacks | Positive | Negative |");
        let _ = writeln!(output, "|---:|---|---:|---:|---:|");
        for entry in entries {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {} |",
                entry.rank,
                entry.bucket.key,
                entry.bucket.count,
                entry.bucket.positive,
                entry.bucket.negative
            );
        }
    }
    let _ = writeln!(output);
}

fn write_counts(output: &mut String, title: &str, counts: &[CountBucket]) {
    let _ = writeln!(output, "## {}", title);
    if counts.is_empty() {
        let _ = writeln!(output, "No data.");
    } else {
        for entry in counts {
            let _ = writeln!(output, "- {}: {}", entry.key, entry.count);
        }
    }
    let _ = writeln!(output);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::fixtures::sample_report;
    use chrono::TimeZone;

    fn stamp() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_default_filename() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(
            default_filename(&CourseFilter::All, date),
            "onclass-analysis-2024-03-01.md"
        );
        assert_eq!(
            default_filename(&CourseFilter::Salon, date),
            "onclass-analysis-salon-2024-03-01.md"
        );
    }

    #[test]
    fn test_render_sections() {
        let md = MarkdownReporter::new().render(&sample_report(), stamp());
        assert!(md.starts_with("# OnClass Feedback Analysis\n"));
        assert!(md.contains("- Generated: 2024-03-01 09:30"));
        assert!(md.contains("| Positive | 2 | 50% |"));
        assert!(md.contains("Score: **+25**"));
        assert!(md.contains("### 集客 (1)"));
        assert!(md.contains("| 1 | 田中先生 | 3 | 2 | 1 |"));
        assert!(md.contains("- 2024-01-05: 3"));
        assert!(md.contains("| 山田 | 2 | 2 | 0 | 1 |"));
        assert!(md.contains("- Repeat rate: 33%"));
    }

    #[test]
    fn test_render_without_data() {
        let mut report = sample_report();
        report.sentiment = crate::reporter::SentimentView::new(Default::default());
        report.improvement = None;
        report.engagement = None;
        report.timeline.clear();
        let md = MarkdownReporter::new().render(&report, stamp());
        assert!(md.contains("## Sentiment\nNo data."));
        assert!(!md.contains("## Improvement Requests"));
        assert!(md.contains("## Timeline\nNo data."));
        assert!(md.contains("## Engagement\nNo data."));
    }
}
