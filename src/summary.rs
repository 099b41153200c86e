//! Dashboard aggregation and table filtering
//!
//! Summaries are computed from an assignment snapshot; the store's change
//! feed is the signal to recompute. The filter mirrors the job table:
//! substring search over the visible columns plus an optional status filter.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::assignment::Assignment;
use crate::workflow::Status;

/// Aggregates shown on the dashboards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeskSummary {
    pub total: usize,

    /// Counts keyed by status slug
    pub by_status: BTreeMap<String, usize>,

    /// Counts keyed by category slug
    pub by_category: BTreeMap<String, usize>,

    /// Workload per subcontractor
    pub by_subcontractor: BTreeMap<String, usize>,

    /// Creation counts keyed by `YYMM`
    pub by_month: BTreeMap<String, usize>,

    pub total_expenses: f64,

    /// One-line digest for logs and the CLI
    pub human_summary: String,
}

impl DeskSummary {
    pub fn from_assignments(assignments: &[Assignment]) -> Self {
        let mut by_status: BTreeMap<String, usize> = BTreeMap::new();
        let mut by_category: BTreeMap<String, usize> = BTreeMap::new();
        let mut by_subcontractor: BTreeMap<String, usize> = BTreeMap::new();
        let mut by_month: BTreeMap<String, usize> = BTreeMap::new();
        let mut total_expenses = 0.0;

        for assignment in assignments {
            *by_status
                .entry(assignment.status.to_string())
                .or_default() += 1;
            *by_category
                .entry(assignment.category.slug().to_string())
                .or_default() += 1;
            if let Some(subcontractor) = &assignment.subcontractor {
                *by_subcontractor.entry(subcontractor.clone()).or_default() += 1;
            }
            *by_month
                .entry(assignment.created_at.format("%y%m").to_string())
                .or_default() += 1;
            total_expenses += assignment.expenses.unwrap_or(0.0);
        }

        let open = assignments
            .iter()
            .filter(|a| !a.status.is_terminal())
            .count();
        let human_summary = format!(
            "{} assignments ({} open), {:.2} expenses",
            assignments.len(),
            open,
            total_expenses
        );

        Self {
            total: assignments.len(),
            by_status,
            by_category,
            by_subcontractor,
            by_month,
            total_expenses,
            human_summary,
        }
    }
}

/// Search and status filter for the job table.
#[derive(Debug, Clone, Default)]
pub struct TableFilter {
    /// Case-insensitive substring over id, description, location, job type,
    /// agency, and subcontractor
    pub search: String,
    pub status: Option<Status>,
}

impl TableFilter {
    pub fn matches(&self, assignment: &Assignment) -> bool {
        if let Some(status) = self.status {
            if assignment.status != status {
                return false;
            }
        }
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        [
            Some(assignment.internal_id.as_str()),
            Some(assignment.description.as_str()),
            assignment.location.as_deref(),
            Some(assignment.job_type.as_str()),
            assignment.agency.as_deref(),
            assignment.subcontractor.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|value| value.to_lowercase().contains(&needle))
    }
}

/// Apply a filter to a snapshot, keeping order.
pub fn filter<'a>(assignments: &'a [Assignment], filter: &TableFilter) -> Vec<&'a Assignment> {
    assignments.iter().filter(|a| filter.matches(a)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use chrono::{TimeZone, Utc};

    fn make_assignment(
        category: Category,
        internal_id: &str,
        status: Status,
        subcontractor: Option<&str>,
        expenses: Option<f64>,
    ) -> Assignment {
        let created = Utc.with_ymd_and_hms(2026, 8, 7, 8, 0, 0).unwrap();
        Assignment {
            id: internal_id.to_lowercase(),
            category,
            internal_id: internal_id.to_string(),
            job_type: "Other".to_string(),
            description: format!("work for {internal_id}"),
            status,
            action_date: created,
            due_date: None,
            ns_respond: Vec::new(),
            subcontractor: subcontractor.map(String::from),
            expenses,
            agency: Some("NOC".to_string()),
            location: Some("Khlong Toei".to_string()),
            remark: None,
            route_code: None,
            project: None,
            progress_percent: None,
            cancel_by: None,
            cancel_reason: None,
            cancel_date: None,
            created_at: created,
            updated_at: created,
        }
    }

    fn snapshot() -> Vec<Assignment> {
        vec![
            make_assignment(
                Category::SubPreventive,
                "PVT2608001",
                Status::New,
                Some("Alpha"),
                Some(1000.0),
            ),
            make_assignment(
                Category::SubPreventive,
                "PVT2608002",
                Status::Finish,
                Some("Bravo"),
                Some(250.5),
            ),
            make_assignment(Category::Team, "AI2608001", Status::Process, None, None),
        ]
    }

    #[test]
    fn test_summary_counts() {
        let summary = DeskSummary::from_assignments(&snapshot());
        assert_eq!(summary.total, 3);
        assert_eq!(summary.by_status.get("new"), Some(&1));
        assert_eq!(summary.by_status.get("finish"), Some(&1));
        assert_eq!(summary.by_category.get("sub_preventive"), Some(&2));
        assert_eq!(summary.by_subcontractor.get("Alpha"), Some(&1));
        assert_eq!(summary.by_month.get("2608"), Some(&3));
        assert!((summary.total_expenses - 1250.5).abs() < f64::EPSILON);
        assert!(summary.human_summary.contains("3 assignments (2 open)"));
    }

    #[test]
    fn test_summary_empty() {
        let summary = DeskSummary::from_assignments(&[]);
        assert_eq!(summary.total, 0);
        assert!(summary.by_status.is_empty());
        assert_eq!(summary.total_expenses, 0.0);
    }

    #[test]
    fn test_filter_search_is_case_insensitive() {
        let items = snapshot();
        let hits = filter(
            &items,
            &TableFilter {
                search: "pvt2608001".to_string(),
                status: None,
            },
        );
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].internal_id, "PVT2608001");
    }

    #[test]
    fn test_filter_matches_subcontractor() {
        let items = snapshot();
        let hits = filter(
            &items,
            &TableFilter {
                search: "bravo".to_string(),
                status: None,
            },
        );
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_filter_by_status() {
        let items = snapshot();
        let hits = filter(
            &items,
            &TableFilter {
                search: String::new(),
                status: Some(Status::Process),
            },
        );
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].internal_id, "AI2608001");
    }

    #[test]
    fn test_filter_combined() {
        let items = snapshot();
        let hits = filter(
            &items,
            &TableFilter {
                search: "khlong".to_string(),
                status: Some(Status::Finish),
            },
        );
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].internal_id, "PVT2608002");
    }
}
