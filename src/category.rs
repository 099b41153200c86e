//! Job categories and their workflow descriptors
//!
//! Each category carries a tagged descriptor: its display title, workflow
//! kind, internal-id prefix, and the job types it offers. The kind decides
//! which workflow table applies and whether round-robin assignment runs.

use serde::{Deserialize, Serialize};

/// The escape job type: bypasses round-robin assignment entirely.
pub const SPECIAL_JOB: &str = "Special Job";

/// Workflow family of a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    /// Data-entry only, no workflow actions
    Plain,
    /// Planning workflow: receive/cancel, then complete
    Plan,
    /// Subcontractor workflow: receive, assign, approve, finish
    Sub,
}

impl std::fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CategoryKind::Plain => write!(f, "plain"),
            CategoryKind::Plan => write!(f, "plan"),
            CategoryKind::Sub => write!(f, "sub"),
        }
    }
}

/// Static descriptor for a category.
#[derive(Debug, Clone, Copy)]
pub struct CategoryConfig {
    pub title: &'static str,
    pub kind: CategoryKind,
    pub prefix: &'static str,
    pub job_types: &'static [&'static str],
}

/// The fixed set of job categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    PlanInterruption,
    SummaryPlan,
    Team,
    SubPreventive,
    SubReroute,
    SubReconfigure,
}

const PLAN_JOB_TYPES: &[&str] = &[
    "Interruption OFC",
    "Interruption Equipment",
    "Information",
    "Other",
];

const SUMMARY_PLAN_JOB_TYPES: &[&str] = &[
    "MEA",
    "PEA",
    "MOI",
    "Sky Train",
    "Bangkok Metropolis",
    "Department Of Highways",
    "Landlord",
    "Underground",
    "Fiber Infra Sharing",
    "Other",
];

const TEAM_JOB_TYPES: &[&str] = &[
    "Improvement",
    "Create Route",
    "Meeting",
    "Team Daily",
    "Support",
    "Other",
];

const PREVENTIVE_JOB_TYPES: &[&str] = &[
    "Preventive Cable Lashing",
    "Preventive Line Relocation",
    "Preventive New Crossarm",
    "Preventive Sticker Tagging",
    "Preventive Dead Cable Removal",
    "Preventive Stand By",
    "Preventive Site Cleaning",
    SPECIAL_JOB,
    "Other",
];

const REROUTE_JOB_TYPES: &[&str] = &[
    "Reroute Project",
    "Underground",
    "MOI",
    "Reconfig for Reroute",
    SPECIAL_JOB,
    "Other",
];

const RECONFIGURE_JOB_TYPES: &[&str] = &[
    "Reconfig High Loss",
    "Reconfig New Route",
    "Cancel OFC",
    SPECIAL_JOB,
    "Other",
];

impl Category {
    pub const ALL: [Category; 6] = [
        Category::PlanInterruption,
        Category::SummaryPlan,
        Category::Team,
        Category::SubPreventive,
        Category::SubReroute,
        Category::SubReconfigure,
    ];

    pub fn config(&self) -> &'static CategoryConfig {
        match self {
            Category::PlanInterruption => &CategoryConfig {
                title: "Interruption Plan",
                kind: CategoryKind::Plan,
                prefix: "IP",
                job_types: PLAN_JOB_TYPES,
            },
            Category::SummaryPlan => &CategoryConfig {
                title: "Project Plan",
                kind: CategoryKind::Plan,
                prefix: "Sum",
                job_types: SUMMARY_PLAN_JOB_TYPES,
            },
            Category::Team => &CategoryConfig {
                title: "Interruption Team",
                kind: CategoryKind::Plain,
                prefix: "AI",
                job_types: TEAM_JOB_TYPES,
            },
            Category::SubPreventive => &CategoryConfig {
                title: "Assignment Preventive",
                kind: CategoryKind::Sub,
                prefix: "PVT",
                job_types: PREVENTIVE_JOB_TYPES,
            },
            Category::SubReroute => &CategoryConfig {
                title: "Assignment Reroute",
                kind: CategoryKind::Sub,
                prefix: "RER",
                job_types: REROUTE_JOB_TYPES,
            },
            Category::SubReconfigure => &CategoryConfig {
                title: "Assignment Reconfigure",
                kind: CategoryKind::Sub,
                prefix: "REF",
                job_types: RECONFIGURE_JOB_TYPES,
            },
        }
    }

    /// Stable identifier used in documents and rotation-state keys.
    pub fn slug(&self) -> &'static str {
        match self {
            Category::PlanInterruption => "plan_interruption",
            Category::SummaryPlan => "summary_plan",
            Category::Team => "team",
            Category::SubPreventive => "sub_preventive",
            Category::SubReroute => "sub_reroute",
            Category::SubReconfigure => "sub_reconfigure",
        }
    }

    pub fn kind(&self) -> CategoryKind {
        self.config().kind
    }

    pub fn prefix(&self) -> &'static str {
        self.config().prefix
    }

    pub fn title(&self) -> &'static str {
        self.config().title
    }

    pub fn job_types(&self) -> &'static [&'static str] {
        self.config().job_types
    }

    /// Whether this category assigns subcontractors round-robin.
    pub fn is_sub(&self) -> bool {
        self.kind() == CategoryKind::Sub
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl std::str::FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.slug() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_round_trip() {
        for category in Category::ALL {
            let parsed: Category = category.slug().parse().unwrap();
            assert_eq!(parsed, category);
        }
    }

    #[test]
    fn test_unknown_slug_rejected() {
        assert!("sub_everything".parse::<Category>().is_err());
    }

    #[test]
    fn test_serde_uses_slug() {
        let json = serde_json::to_string(&Category::SubPreventive).unwrap();
        assert_eq!(json, "\"sub_preventive\"");
    }

    #[test]
    fn test_prefixes() {
        assert_eq!(Category::SubPreventive.prefix(), "PVT");
        assert_eq!(Category::SubReroute.prefix(), "RER");
        assert_eq!(Category::SubReconfigure.prefix(), "REF");
        assert_eq!(Category::PlanInterruption.prefix(), "IP");
        assert_eq!(Category::SummaryPlan.prefix(), "Sum");
        assert_eq!(Category::Team.prefix(), "AI");
    }

    #[test]
    fn test_sub_categories_offer_special_job() {
        for category in Category::ALL {
            if category.is_sub() {
                assert!(category.job_types().contains(&SPECIAL_JOB));
            } else {
                assert!(!category.job_types().contains(&SPECIAL_JOB));
            }
        }
    }
}
