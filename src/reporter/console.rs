//! Console reporter with colored output

use super::{signed, DashboardReport, RankedBucket};
use crate::analyzer::{DetailList, KeywordSize};
use crate::sentiment::{Sentiment, SentimentInsight};
use crate::{truncate_chars, UserBucket};
use colored::{ColoredString, Colorize};
use std::fmt::Write;

/// Category labels are shortened to this many characters on screen
const CATEGORY_LABEL_CHARS: usize = 15;
const SENTIMENT_BAR_WIDTH: usize = 30;

/// Reporter for terminal output
pub struct ConsoleReporter {
    /// Whether to use colors
    use_colors: bool,
    /// Whether to show verbose output
    verbose: bool,
}

impl ConsoleReporter {
    /// Create a new console reporter
    pub fn new() -> Self {
        Self {
            use_colors: true,
            verbose: false,
        }
    }

    /// Disable colors
    pub fn without_colors(mut self) -> Self {
        self.use_colors = false;
        self
    }

    /// Enable verbose output (timeline and sample comments)
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// Print the full dashboard
    pub fn report(&self, report: &DashboardReport) {
        print!("{}", self.render(report));
    }

    /// Print a one-line summary
    pub fn report_quiet(&self, report: &DashboardReport) {
        println!("{}", self.render_quiet(report));
    }

    pub fn report_detail(&self, list: &DetailList) {
        print!("{}", self.render_detail(list));
    }

    pub fn report_users(&self, users: &[&UserBucket]) {
        print!("{}", self.render_users(users));
    }

    pub fn report_users_expanded(&self, users: &[&UserBucket], feedback: &[DetailList]) {
        print!("{}", self.render_users_expanded(users, feedback));
    }

    fn paint<F>(&self, text: &str, style: F) -> String
    where
        F: Fn(&str) -> ColoredString,
    {
        if self.use_colors {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn heading(&self, out: &mut String, title: &str) {
        let _ = writeln!(out, "   {}", self.paint(title, |s| s.bold()));
    }

    pub fn render_quiet(&self, report: &DashboardReport) -> String {
        let score = report
            .sentiment_score()
            .map(signed)
            .unwrap_or_else(|| "-".to_string());
        format!(
            "{}: {} | sentiment {} | {} users",
            report.source, report.scope, score, report.stats.unique_users
        )
    }

    pub fn render(&self, report: &DashboardReport) -> String {
        let mut out = String::new();
        self.render_header(&mut out, report);
        self.render_sentiment(&mut out, report);
        self.render_improvement(&mut out, report);
        self.render_teachers(&mut out, report);
        self.render_blocks(&mut out, report);
        self.render_counts(&mut out, "Categories:", &report.categories, CATEGORY_LABEL_CHARS);
        self.render_counts(&mut out, "Courses:", &report.courses, usize::MAX);
        if self.verbose {
            self.render_counts(&mut out, "Timeline:", &report.timeline, usize::MAX);
        }
        self.render_keywords(&mut out, report);
        self.render_user_table(&mut out, report);
        self.render_engagement(&mut out, report);
        out
    }

    fn render_header(&self, out: &mut String, report: &DashboardReport) {
        let _ = writeln!(out);
        let title = format!("📊 Feedback Analysis: {}", report.source);
        let _ = writeln!(out, "{}", self.paint(&title, |s| s.bold()));
        let _ = writeln!(out, "   {}", report.scope);
        let _ = writeln!(out);

        let stats = &report.stats;
        let avg = stats
            .average_length
            .map(|n| format!("{} chars", n))
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "   Feedbacks: {} | Users: {} | Avg length: {}",
            stats.total, stats.unique_users, avg
        );
        if let Some(range) = &stats.date_range {
            let _ = writeln!(out, "   Period: {} 〜 {}", range.first, range.last);
        }
        let _ = writeln!(out);
    }

    fn render_sentiment(&self, out: &mut String, report: &DashboardReport) {
        self.heading(out, "Sentiment:");
        let view = &report.sentiment;
        let Some(pct) = view.percentages else {
            let _ = writeln!(out, "   {}", self.paint("No data", |s| s.dimmed()));
            let _ = writeln!(out);
            return;
        };

        let _ = writeln!(
            out,
            "   {} {}",
            self.sentiment_bar(pct.positive, pct.neutral, pct.negative),
            self.paint(&signed(pct.score), |s| s.bold())
        );
        let rows = [
            ("✓", "Positive", view.summary.positive, pct.positive),
            ("·", "Neutral", view.summary.neutral, pct.neutral),
            ("⚠", "Negative", view.summary.negative, pct.negative),
        ];
        for (icon, label, count, share) in rows {
            let icon = match label {
                "Positive" => self.paint(icon, |s| s.green()),
                "Negative" => self.paint(icon, |s| s.red()),
                _ => self.paint(icon, |s| s.dimmed()),
            };
            let _ = writeln!(out, "   {} {:<9} {:>4} ({}%)", icon, label, count, share);
        }
        let _ = writeln!(
            out,
            "   {}",
            self.paint(
                &format!("{}% − {}% = {}", pct.positive, pct.negative, signed(pct.score)),
                |s| s.dimmed()
            )
        );
        if let Some(insight) = view.insight {
            let text = insight.description();
            let line = match insight {
                SentimentInsight::Excellent => self.paint(text, |s| s.green()),
                SentimentInsight::NeedsImprovement => self.paint(text, |s| s.yellow()),
                SentimentInsight::Stable => self.paint(text, |s| s.cyan()),
            };
            let _ = writeln!(out, "   {} {}", self.paint("→", |s| s.cyan()), line);
        }
        let _ = writeln!(out);
    }

    fn render_improvement(&self, out: &mut String, report: &DashboardReport) {
        let Some(improvement) = &report.improvement else {
            return;
        };
        self.heading(out, "Improvement Requests:");
        let _ = writeln!(out, "   {}", improvement.headline());

        if !improvement.keywords.is_empty() {
            let keywords: Vec<String> = improvement
                .keywords
                .iter()
                .map(|k| format!("{} ({})", k.key, k.count))
                .collect();
            let _ = writeln!(out, "   Keywords: {}", keywords.join(", "));
        }

        for category in &improvement.categories {
            let quoted: Vec<String> = category
                .top_keywords
                .iter()
                .map(|k| format!("「{}」", k))
                .collect();
            let _ = writeln!(
                out,
                "   {} {} ({}) {}",
                self.paint("⚠", |s| s.yellow()),
                category.category,
                category.count,
                quoted.join(" ")
            );
            if self.verbose {
                for sample in &category.samples {
                    let meta: Vec<&str> = [&sample.user_name, &sample.block, &sample.date]
                        .into_iter()
                        .filter_map(|v| v.as_deref())
                        .collect();
                    let _ = writeln!(out, "       {} {}", self.paint("→", |s| s.dimmed()), sample.content);
                    if !meta.is_empty() {
                        let _ = writeln!(out, "         {}", self.paint(&meta.join(" / "), |s| s.dimmed()));
                    }
                }
            }
        }
        let _ = writeln!(out);
    }

    fn ranking_line(&self, out: &mut String, entry: &RankedBucket) {
        let rank = format!("{:>2}.", entry.rank);
        let rank = if entry.rank <= 3 {
            self.paint(&rank, |s| s.yellow().bold())
        } else {
            rank
        };
        let _ = writeln!(
            out,
            "   {} {} {} {}  {}",
            rank,
            entry.bucket.key,
            self.paint(&format!("✓{}", entry.bucket.positive), |s| s.green()),
            self.paint(&format!("⚠{}", entry.bucket.negative), |s| s.red()),
            self.paint(&format!("{} feedbacks", entry.bucket.count), |s| s.dimmed())
        );
    }

    fn render_teachers(&self, out: &mut String, report: &DashboardReport) {
        let teachers = &report.teachers;
        let title = format!(
            "Teachers (by {}, page {}/{}):",
            teachers.sort,
            teachers.page + 1,
            teachers.pages.max(1)
        );
        self.heading(out, &title);
        if teachers.entries.is_empty() {
            let _ = writeln!(out, "   {}", self.paint("No data", |s| s.dimmed()));
        }
        for entry in &teachers.entries {
            self.ranking_line(out, entry);
        }
        let _ = writeln!(out);
    }

    fn render_blocks(&self, out: &mut String, report: &DashboardReport) {
        let blocks = &report.blocks;
        let title = if report.filter.is_all() {
            format!("Popular Blocks (by {}):", blocks.sort)
        } else {
            format!("Popular Blocks [{}] (by {}):", report.filter_label, blocks.sort)
        };
        self.heading(out, &title);
        if blocks.entries.is_empty() {
            let _ = writeln!(out, "   {}", self.paint("No data", |s| s.dimmed()));
        }
        for entry in &blocks.entries {
            self.ranking_line(out, entry);
        }
        let _ = writeln!(out);
    }

    fn render_counts(
        &self,
        out: &mut String,
        title: &str,
        counts: &[crate::CountBucket],
        label_chars: usize,
    ) {
        if counts.is_empty() {
            return;
        }
        self.heading(out, title);
        let max = counts.iter().map(|c| c.count).max().unwrap_or(1);
        for entry in counts {
            let _ = writeln!(
                out,
                "   {} {:>4}  {}",
                self.mini_bar(entry.count, max),
                entry.count,
                truncate_chars(&entry.key, label_chars)
            );
        }
        let _ = writeln!(out);
    }

    fn render_keywords(&self, out: &mut String, report: &DashboardReport) {
        self.heading(out, "Keywords:");
        if report.keywords.is_empty() {
            let _ = writeln!(out, "   {}", self.paint("No keywords extracted", |s| s.dimmed()));
            let _ = writeln!(out);
            return;
        }
        let words: Vec<String> = report
            .keywords
            .iter()
            .map(|k| {
                let text = format!("{} ({})", k.term, k.count);
                match k.size {
                    KeywordSize::Large => self.paint(&text, |s| s.bold()),
                    KeywordSize::Medium => text,
                    KeywordSize::Small => self.paint(&text, |s| s.dimmed()),
                }
            })
            .collect();
        let _ = writeln!(out, "   {}", words.join("  "));
        let _ = writeln!(out);
    }

    fn render_user_table(&self, out: &mut String, report: &DashboardReport) {
        let users = &report.users;
        let title = format!(
            "Users (by {}, top {} of {}):",
            users.sort,
            users.entries.len(),
            users.total
        );
        self.heading(out, &title);
        for row in &users.entries {
            let _ = writeln!(
                out,
                "   {:<16} {:>4} {} {} {}",
                row.name,
                row.count,
                self.paint(&format!("✓{}", row.positive), |s| s.green()),
                self.paint(&format!("⚠{}", row.negative), |s| s.red()),
                self.paint(&format!("{} categories", row.categories), |s| s.dimmed())
            );
        }
        let _ = writeln!(out);
    }

    fn render_engagement(&self, out: &mut String, report: &DashboardReport) {
        self.heading(out, "Engagement:");
        let Some(engagement) = &report.engagement else {
            let _ = writeln!(out, "   Repeat rate: - | Heavy users: - | Categories per user: -");
            let _ = writeln!(out);
            return;
        };
        let _ = writeln!(
            out,
            "   Repeat rate: {}% | Heavy users: {} | Categories per user: {:.1}",
            engagement.repeater_rate, engagement.heavy_users, engagement.average_categories
        );
        for hint in &engagement.hints {
            let _ = writeln!(out, "   {} {}", self.paint("→", |s| s.cyan()), hint.description());
        }
        let _ = writeln!(out);
    }

    pub fn render_detail(&self, list: &DetailList) -> String {
        let mut out = String::new();
        let _ = writeln!(out);
        let title = format!("{} ({})", list.title, list.total);
        let _ = writeln!(out, "{}", self.paint(&title, |s| s.bold()));
        if list.entries.is_empty() {
            let _ = writeln!(out, "   {}", self.paint("No matching feedback", |s| s.dimmed()));
        }
        for entry in &list.entries {
            let label = self.sentiment_label(entry.sentiment);
            let _ = writeln!(out, "   {} {}", label, entry.content);
            let meta: Vec<&str> = [&entry.user_name, &entry.block, &entry.category, &entry.date]
                .into_iter()
                .filter_map(|v| v.as_deref())
                .filter(|v| !v.is_empty())
                .collect();
            if !meta.is_empty() {
                let _ = writeln!(out, "     {}", self.paint(&meta.join(" / "), |s| s.dimmed()));
            }
        }
        if list.remaining > 0 {
            let _ = writeln!(
                out,
                "   {}",
                self.paint(&format!("... {} more", list.remaining), |s| s.dimmed())
            );
        }
        out
    }

    fn sentiment_label(&self, sentiment: Sentiment) -> String {
        match sentiment {
            Sentiment::Positive => self.paint("✓ positive", |s| s.green()),
            Sentiment::Negative => self.paint("⚠ improvement", |s| s.red()),
            Sentiment::Neutral => self.paint("·", |s| s.dimmed()),
        }
    }

    pub fn render_users(&self, users: &[&UserBucket]) -> String {
        self.render_user_rows(users, &[])
    }

    /// User rows, each followed by that user's feedback
    pub fn render_users_expanded(&self, users: &[&UserBucket], feedback: &[DetailList]) -> String {
        self.render_user_rows(users, feedback)
    }

    fn render_user_rows(&self, users: &[&UserBucket], feedback: &[DetailList]) -> String {
        let mut out = String::new();
        if users.is_empty() {
            let _ = writeln!(out, "No matching users");
            return out;
        }
        let _ = writeln!(
            out,
            "{}",
            self.paint(&format!("{} users (most feedback first)", users.len()), |s| s.bold())
        );
        for (i, user) in users.iter().enumerate() {
            let _ = writeln!(
                out,
                "   {:<16} {:>4} {} {}",
                user.name(),
                user.tally.count,
                self.paint(&format!("✓{}", user.tally.positive), |s| s.green()),
                self.paint(&format!("⚠{}", user.tally.negative), |s| s.red())
            );
            let Some(list) = feedback.get(i) else {
                continue;
            };
            for entry in &list.entries {
                let _ = writeln!(
                    out,
                    "      {} {}",
                    self.sentiment_label(entry.sentiment),
                    entry.content
                );
            }
            if list.remaining > 0 {
                let _ = writeln!(
                    out,
                    "      {}",
                    self.paint(&format!("... {} more", list.remaining), |s| s.dimmed())
                );
            }
        }
        out
    }

    fn sentiment_bar(&self, positive: u32, neutral: u32, negative: u32) -> String {
        let width = |pct: u32| (pct as usize * SENTIMENT_BAR_WIDTH) / 100;
        let pos = width(positive);
        let neg = width(negative);
        let neu = width(neutral).min(SENTIMENT_BAR_WIDTH - pos - neg);
        let pad = SENTIMENT_BAR_WIDTH - pos - neg - neu;
        format!(
            "[{}{}{}]",
            self.paint(&"█".repeat(pos), |s| s.green()),
            "░".repeat(neu + pad),
            self.paint(&"█".repeat(neg), |s| s.red())
        )
    }

    fn mini_bar(&self, count: usize, max: usize) -> String {
        let filled = (count * 10) / max.max(1);
        format!("[{}{}]", "▓".repeat(filled), "░".repeat(10 - filled))
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}
