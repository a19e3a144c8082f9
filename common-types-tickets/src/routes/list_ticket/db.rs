use serde::Deserialize;
use diesel::prelude::*;
use diesel::sql_types::BigInt;

use crate::db_schema::hooked_sql_types::TicketPriority;
use crate::Lifecycle::{SortColumn, SortDirection, StatusFilter};

#[derive(Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub status: StatusFilter,
    #[serde(default)]
    pub priority: Option<TicketPriority>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort_by: Option<SortColumn>,
    #[serde(default)]
    pub sort_dir: Option<SortDirection>,
    pub page: usize,
    #[serde(default)]
    pub get_total_pages: bool,
}

#[derive(QueryableByName)]
pub struct CountRow {
    #[diesel(sql_type = BigInt)]
    pub count: i64,
}

/// Free-text search is a substring match, so LIKE metacharacters typed by
/// the user have to be treated as literals.
pub fn escape_like_pattern(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like_pattern("100%"), "100\\%");
        assert_eq!(escape_like_pattern("a_b"), "a\\_b");
        assert_eq!(escape_like_pattern("c\\d"), "c\\\\d");
        assert_eq!(escape_like_pattern("plain"), "plain");
    }

    #[test]
    fn query_defaults_leave_filters_wide_open() {
        let query: DashboardQuery = serde_json::from_value(serde_json::json!({ "page": 1 })).unwrap();
        assert_eq!(query.status, StatusFilter::All);
        assert!(query.priority.is_none());
        assert!(query.search.is_none());
        assert!(!query.get_total_pages);
    }

    #[test]
    fn query_parses_sort_and_filter_params() {
        let query: DashboardQuery = serde_json::from_value(serde_json::json!({
            "page": 2,
            "status": "Open",
            "priority": "Factory Constraint",
            "sort_by": "priority",
            "sort_dir": "desc",
            "get_total_pages": true,
        }))
        .unwrap();
        assert_eq!(query.status, StatusFilter::Open);
        assert_eq!(query.priority, Some(TicketPriority::FactoryConstraint));
        assert_eq!(query.sort_by, Some(SortColumn::Priority));
        assert_eq!(query.sort_dir, Some(SortDirection::Desc));
        assert_eq!(query.page, 2);
        assert!(query.get_total_pages);
    }
}
