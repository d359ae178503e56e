//! JSON reporter for machine-readable output

use super::{DashboardReport, UserRow};
use crate::analyzer::DetailList;
use crate::UserBucket;
use serde::Serialize;

/// Reporter for JSON output
pub struct JsonReporter {
    /// Whether to pretty-print JSON
    pretty: bool,
}

impl JsonReporter {
    /// Create a new JSON reporter
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Enable pretty-printing
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T, fallback: &str) -> String {
        let encoded = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        encoded.unwrap_or_else(|_| fallback.to_string())
    }

    /// Report the full dashboard as JSON
    pub fn report(&self, report: &DashboardReport) -> String {
        self.encode(report, "{}")
    }

    /// Report a drill-down list
    pub fn report_detail(&self, list: &DetailList) -> String {
        self.encode(list, "{}")
    }

    /// Report user search results as an array
    pub fn report_users(&self, users: &[&UserBucket]) -> String {
        let rows: Vec<UserSearchRow> = users.iter().map(|u| UserSearchRow::from(*u)).collect();
        self.encode(&rows, "[]")
    }

    /// Users with their feedback lists attached, paired by position
    pub fn report_users_expanded(&self, users: &[&UserBucket], feedback: &[DetailList]) -> String {
        let rows: Vec<UserSearchRow> = users
            .iter()
            .zip(feedback)
            .map(|(u, list)| UserSearchRow {
                feedback: Some(list),
                ..UserSearchRow::from(*u)
            })
            .collect();
        self.encode(&rows, "[]")
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserSearchRow<'a> {
    #[serde(flatten)]
    row: UserRow,
    category_names: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    feedback: Option<&'a DetailList>,
}

impl<'a> From<&'a UserBucket> for UserSearchRow<'a> {
    fn from(user: &'a UserBucket) -> Self {
        Self {
            row: UserRow::from(user),
            category_names: user.categories.iter().map(String::as_str).collect(),
            feedback: None,
        }
    }
}
