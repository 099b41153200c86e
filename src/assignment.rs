//! Assignment record and creation draft
//!
//! An assignment is the unit of work staff log and route through the
//! workflow. The record carries a category-dependent bag of optional fields;
//! required fields are validated at creation time against the category's
//! descriptor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::category::Category;
use crate::workflow::Status;

/// Errors for assignment validation and decoding
#[derive(Debug, Error)]
pub enum AssignmentError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("job type {job_type:?} is not offered by category {category}")]
    UnknownJobType { category: Category, job_type: String },

    #[error("field {0} is immutable after creation")]
    ImmutableField(&'static str),

    #[error("malformed assignment document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A tracked job assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    /// Store document key; not part of the stored fields
    #[serde(default, skip_serializing)]
    pub id: String,

    pub category: Category,

    /// Derived human-readable identifier, `{prefix}{YY}{MM}{NNN}`
    pub internal_id: String,

    pub job_type: String,

    pub description: String,

    pub status: Status,

    /// When the work is scheduled to happen
    pub action_date: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,

    /// Responders on call for this job
    #[serde(default)]
    pub ns_respond: Vec<String>,

    /// Assigned at creation for subcontractor categories
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcontractor: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expenses: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agency: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_percent: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_date: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Assignment {
    /// Decode from a store document, keeping the document key.
    pub fn from_document(doc: &teleops_store::Document) -> Result<Self, AssignmentError> {
        let mut assignment: Assignment = serde_json::from_value(doc.fields.clone())?;
        assignment.id = doc.id.clone();
        Ok(assignment)
    }

    /// Encode to the stored field set (the document key is excluded).
    pub fn to_fields(&self) -> Result<Value, AssignmentError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Draft of a new assignment, validated on creation.
///
/// `internal_id`, `status`, `subcontractor`, and timestamps are filled by
/// the service; everything here comes from the creation form.
#[derive(Debug, Clone)]
pub struct AssignmentDraft {
    pub category: Category,
    pub job_type: Option<String>,
    pub description: Option<String>,
    pub action_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub ns_respond: Vec<String>,
    pub agency: Option<String>,
    pub location: Option<String>,
    pub remark: Option<String>,
    pub route_code: Option<String>,
    pub project: Option<String>,
    pub expenses: Option<f64>,
}

impl AssignmentDraft {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            job_type: None,
            description: None,
            action_date: None,
            due_date: None,
            ns_respond: Vec::new(),
            agency: None,
            location: None,
            remark: None,
            route_code: None,
            project: None,
            expenses: None,
        }
    }

    pub fn job_type(mut self, job_type: impl Into<String>) -> Self {
        self.job_type = Some(job_type.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn action_date(mut self, when: DateTime<Utc>) -> Self {
        self.action_date = Some(when);
        self
    }

    pub fn due_date(mut self, when: DateTime<Utc>) -> Self {
        self.due_date = Some(when);
        self
    }

    pub fn responder(mut self, name: impl Into<String>) -> Self {
        self.ns_respond.push(name.into());
        self
    }

    pub fn agency(mut self, agency: impl Into<String>) -> Self {
        self.agency = Some(agency.into());
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = Some(remark.into());
        self
    }

    pub fn route_code(mut self, route_code: impl Into<String>) -> Self {
        self.route_code = Some(route_code.into());
        self
    }

    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn expenses(mut self, expenses: f64) -> Self {
        self.expenses = Some(expenses);
        self
    }

    /// Check required fields and job-type membership.
    ///
    /// Returns the validated (job_type, description) pair.
    pub fn validate(&self) -> Result<(String, String), AssignmentError> {
        let job_type = self
            .job_type
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(AssignmentError::MissingField("job_type"))?;

        let description = self
            .description
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(AssignmentError::MissingField("description"))?;

        if !self.category.job_types().contains(&job_type) {
            return Err(AssignmentError::UnknownJobType {
                category: self.category,
                job_type: job_type.to_string(),
            });
        }

        Ok((job_type.to_string(), description.to_string()))
    }
}
