//! Assignment service: the desk's orchestration over the document store
//!
//! Wires the id generator, the round-robin allocator, and the status
//! workflow to the persistence collaborator. Every mutation is a single
//! atomic document operation; the create flow writes the job document first
//! and only then advances the rotation, so a failed creation never consumes
//! a slot.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Map, Value};
use thiserror::Error;

use teleops_store::path::{get_path, set_path};
use teleops_store::{DocumentStore, StoreError, Subscription};

use crate::assignment::{Assignment, AssignmentDraft, AssignmentError};
use crate::auth::{self, AuthError, Session};
use crate::category::Category;
use crate::ident;
use crate::master::{LinkSupportItem, MasterData, MasterError};
use crate::rotation::{self, RotationPreview};
use crate::summary::DeskSummary;
use crate::workflow::{self, WorkflowAction, WorkflowError};

pub const ASSIGNMENTS: &str = "assignments";
pub const SETTINGS: &str = "settings";
pub const SESSIONS: &str = "sessions";
pub const MASTER_DOC: &str = "master_data";
pub const COUNTERS_DOC: &str = "counters";

/// Service errors
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(#[from] AssignmentError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("assignment not found: {0}")]
    NotFound(String),

    #[error("master data error: {0}")]
    Master(#[from] MasterError),

    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("corrupt assignment document {id}")]
    CorruptDocument {
        id: String,
        #[source]
        source: AssignmentError,
    },
}

impl ServiceError {
    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            ServiceError::Validation(_) => 2,
            ServiceError::Master(_) => 2,
            ServiceError::Workflow(_) => 3,
            ServiceError::NotFound(_) => 4,
            ServiceError::Auth(_) => 5,
            ServiceError::Store(_) => 10,
            ServiceError::CorruptDocument { .. } => 10,
        }
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// The desk's entry point over any document store.
pub struct AssignmentService {
    store: Arc<dyn DocumentStore>,
}

impl AssignmentService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// The shared settings document, defaulting when not yet written.
    pub fn master_data(&self) -> ServiceResult<MasterData> {
        match self.store.get(SETTINGS, MASTER_DOC)? {
            Some(doc) => serde_json::from_value(doc.fields).map_err(|e| {
                ServiceError::CorruptDocument {
                    id: MASTER_DOC.to_string(),
                    source: AssignmentError::Malformed(e),
                }
            }),
            None => Ok(MasterData::default()),
        }
    }

    fn scan_max(&self, month_prefix: &str) -> ServiceResult<u32> {
        let docs = self
            .store
            .query_prefix(ASSIGNMENTS, "internal_id", month_prefix)?;
        let ids: Vec<&str> = docs
            .iter()
            .filter_map(|doc| get_path(&doc.fields, "internal_id").and_then(Value::as_str))
            .collect();
        Ok(ident::max_seq(month_prefix, ids))
    }

    /// Preview the next internal id without consuming it.
    pub fn next_internal_id(&self, category: Category) -> ServiceResult<String> {
        let month_prefix = ident::month_prefix(category.prefix(), Utc::now());
        let scanned = self.scan_max(&month_prefix)?;
        let counter = self
            .store
            .get(SETTINGS, COUNTERS_DOC)?
            .and_then(|doc| get_path(&doc.fields, &month_prefix).and_then(Value::as_u64))
            .unwrap_or(0) as u32;
        Ok(ident::format_id(&month_prefix, scanned.max(counter) + 1))
    }

    /// Allocate the next internal id through the counter document.
    ///
    /// The counter is seeded from the prefix scan when absent, then
    /// incremented inside a transact, so two concurrent creations can never
    /// receive the same id.
    fn allocate_internal_id(&self, category: Category) -> ServiceResult<String> {
        let month_prefix = ident::month_prefix(category.prefix(), Utc::now());
        let scanned = self.scan_max(&month_prefix)?;
        let mut allocated = 0u32;
        self.store.transact(SETTINGS, COUNTERS_DOC, &mut |current| {
            let mut fields = current.unwrap_or_else(|| Value::Object(Map::new()));
            let stored = get_path(&fields, &month_prefix)
                .and_then(Value::as_u64)
                .unwrap_or(0) as u32;
            allocated = stored.max(scanned) + 1;
            set_path(&mut fields, &month_prefix, json!(allocated));
            Some(fields)
        })?;
        let internal_id = ident::format_id(&month_prefix, allocated);
        tracing::debug!(%internal_id, "internal id allocated");
        Ok(internal_id)
    }

    /// Current and previous rotation assignees for a subcontractor category.
    ///
    /// `None` for non-subcontractor categories and for an empty roster.
    pub fn rotation_preview(&self, category: Category) -> ServiceResult<Option<RotationPreview>> {
        if !category.is_sub() {
            return Ok(None);
        }
        let master = self.master_data()?;
        Ok(rotation::preview(
            &master.subcontractors,
            &master.rotation_for(category),
        ))
    }

    fn advance_rotation(&self, category: Category, description: &str) -> ServiceResult<()> {
        let key = format!("rr_indexes.{}", category.slug());
        let mut new_index = 0u64;
        self.store.transact(SETTINGS, MASTER_DOC, &mut |current| {
            let mut fields = current.unwrap_or_else(|| Value::Object(Map::new()));
            let state = get_path(&fields, &key)
                .and_then(|v| serde_json::from_value(v.clone()).ok())
                .unwrap_or_default();
            let next = rotation::advanced(&state, description);
            new_index = next.index;
            set_path(
                &mut fields,
                &key,
                json!({"index": next.index, "last_job": next.last_job}),
            );
            Some(fields)
        })?;
        tracing::info!(category = %category, index = new_index, "rotation advanced");
        Ok(())
    }

    /// Create a new assignment from a draft.
    ///
    /// Allocates the internal id, assigns the current rotation subcontractor
    /// for non-special jobs in subcontractor categories, writes the document
    /// with status `new`, then advances the rotation exactly once.
    pub fn create(&self, draft: AssignmentDraft) -> ServiceResult<Assignment> {
        let (job_type, description) = draft.validate()?;
        let category = draft.category;
        let now = Utc::now();

        let internal_id = self.allocate_internal_id(category)?;

        let rotational = category.is_sub() && !rotation::is_special(&job_type);
        let subcontractor = if rotational {
            let master = self.master_data()?;
            rotation::preview(&master.subcontractors, &master.rotation_for(category))
                .map(|preview| preview.current)
        } else {
            None
        };

        let mut assignment = Assignment {
            id: String::new(),
            category,
            internal_id,
            job_type,
            description: description.clone(),
            status: workflow::Status::New,
            action_date: draft.action_date.unwrap_or(now),
            due_date: draft.due_date,
            ns_respond: draft.ns_respond,
            subcontractor,
            expenses: draft.expenses,
            agency: draft.agency,
            location: draft.location,
            remark: draft.remark,
            route_code: draft.route_code,
            project: draft.project,
            progress_percent: None,
            cancel_by: None,
            cancel_reason: None,
            cancel_date: None,
            created_at: now,
            updated_at: now,
        };

        let doc = self.store.create(ASSIGNMENTS, assignment.to_fields()?)?;
        assignment.id = doc.id;

        // A slot was consumed only if someone was actually assigned
        if assignment.subcontractor.is_some() {
            self.advance_rotation(category, &description)?;
        }

        tracing::info!(
            internal_id = %assignment.internal_id,
            category = %category,
            subcontractor = ?assignment.subcontractor,
            "assignment created"
        );
        Ok(assignment)
    }

    /// Load an assignment by document key.
    pub fn get(&self, id: &str) -> ServiceResult<Assignment> {
        let doc = self
            .store
            .get(ASSIGNMENTS, id)?
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;
        Assignment::from_document(&doc).map_err(|source| ServiceError::CorruptDocument {
            id: id.to_string(),
            source,
        })
    }

    /// Apply a workflow action, merging status, extras, and the timestamp
    /// in one update.
    pub fn apply_action(&self, id: &str, action: WorkflowAction) -> ServiceResult<Assignment> {
        let assignment = self.get(id)?;
        let effect = workflow::apply(assignment.status, action, assignment.category.kind())?;

        let mut fields = Map::new();
        fields.insert("status".to_string(), json!(effect.status));
        for (key, value) in effect.extra {
            fields.insert(key, value);
        }
        fields.insert("updated_at".to_string(), json!(Utc::now()));

        let doc = self.store.update(ASSIGNMENTS, id, fields)?;
        tracing::info!(
            internal_id = %assignment.internal_id,
            from = %assignment.status,
            to = %effect.status,
            %action,
            "status advanced"
        );
        Assignment::from_document(&doc).map_err(|source| ServiceError::CorruptDocument {
            id: id.to_string(),
            source,
        })
    }

    /// Edit assignment fields. Category and internal id are immutable.
    pub fn update(&self, id: &str, mut patch: Map<String, Value>) -> ServiceResult<Assignment> {
        let existing = self.get(id)?;
        patch.remove("id");

        if let Some(category) = patch.get("category") {
            if *category != json!(existing.category) {
                return Err(AssignmentError::ImmutableField("category").into());
            }
        }
        if let Some(internal_id) = patch.get("internal_id") {
            if internal_id.as_str() != Some(existing.internal_id.as_str()) {
                return Err(AssignmentError::ImmutableField("internal_id").into());
            }
        }

        patch.insert("updated_at".to_string(), json!(Utc::now()));
        let doc = self.store.update(ASSIGNMENTS, id, patch)?;
        Assignment::from_document(&doc).map_err(|source| ServiceError::CorruptDocument {
            id: id.to_string(),
            source,
        })
    }

    /// Hard delete.
    pub fn delete(&self, id: &str) -> ServiceResult<()> {
        match self.store.delete(ASSIGNMENTS, id) {
            Ok(()) => {
                tracing::info!(id, "assignment deleted");
                Ok(())
            }
            Err(StoreError::NotFound { .. }) => Err(ServiceError::NotFound(id.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// All assignments, newest internal id first (the dashboard order).
    pub fn assignments(&self) -> ServiceResult<Vec<Assignment>> {
        let mut assignments = Vec::new();
        for doc in self.store.list(ASSIGNMENTS)? {
            let assignment = Assignment::from_document(&doc).map_err(|source| {
                ServiceError::CorruptDocument {
                    id: doc.id.clone(),
                    source,
                }
            })?;
            assignments.push(assignment);
        }
        assignments.sort_by(|a, b| b.internal_id.cmp(&a.internal_id));
        Ok(assignments)
    }

    /// Assignments of one category, newest internal id first.
    pub fn assignments_in(&self, category: Category) -> ServiceResult<Vec<Assignment>> {
        Ok(self
            .assignments()?
            .into_iter()
            .filter(|a| a.category == category)
            .collect())
    }

    /// Aggregate the current snapshot for the dashboards.
    pub fn summary(&self) -> ServiceResult<DeskSummary> {
        Ok(DeskSummary::from_assignments(&self.assignments()?))
    }

    /// Change feed over the assignments collection.
    pub fn watch_assignments(&self) -> Subscription {
        self.store.subscribe(ASSIGNMENTS)
    }

    // Master-data mutations: atomic set-add / set-remove on the settings
    // document, so concurrent edits cannot lose entries.

    pub fn add_subcontractor(&self, name: &str) -> ServiceResult<()> {
        if name.is_empty() {
            return Err(MasterError::MissingField("name").into());
        }
        self.store
            .array_union(SETTINGS, MASTER_DOC, "subcontractors", json!(name))?;
        Ok(())
    }

    /// Remove a roster name. Rotation indexes are left untouched.
    pub fn remove_subcontractor(&self, name: &str) -> ServiceResult<()> {
        self.store
            .array_remove(SETTINGS, MASTER_DOC, "subcontractors", json!(name))?;
        Ok(())
    }

    pub fn add_responder(&self, name: &str, phone: Option<&str>) -> ServiceResult<()> {
        if name.is_empty() {
            return Err(MasterError::MissingField("name").into());
        }
        let entry = crate::master::responder_entry(name, phone);
        self.store
            .array_union(SETTINGS, MASTER_DOC, "ns_respond", json!(entry))?;
        Ok(())
    }

    pub fn remove_responder(&self, entry: &str) -> ServiceResult<()> {
        self.store
            .array_remove(SETTINGS, MASTER_DOC, "ns_respond", json!(entry))?;
        Ok(())
    }

    pub fn add_link(&self, link: LinkSupportItem) -> ServiceResult<LinkSupportItem> {
        let link = link.validated()?;
        self.store.array_union(
            SETTINGS,
            MASTER_DOC,
            "link_support",
            serde_json::to_value(&link).map_err(AssignmentError::Malformed)?,
        )?;
        Ok(link)
    }

    pub fn remove_link(&self, name: &str) -> ServiceResult<()> {
        let master = self.master_data()?;
        let link = master
            .link_support
            .iter()
            .find(|item| item.name == name)
            .ok_or_else(|| MasterError::UnknownLink(name.to_string()))?;
        self.store.array_remove(
            SETTINGS,
            MASTER_DOC,
            "link_support",
            serde_json::to_value(link).map_err(AssignmentError::Malformed)?,
        )?;
        Ok(())
    }

    /// Validate a corporate account and mint a session. Only the token
    /// digest is stored.
    pub fn login(&self, email: &str, domain: &str, ttl_seconds: i64) -> ServiceResult<Session> {
        auth::validate_email(email, domain)?;
        let session = Session::issue(email, ttl_seconds);
        self.store.set(
            SESSIONS,
            &session.token_digest(),
            json!({
                "email": session.email,
                "created_at": session.created_at,
                "expires_at": session.expires_at,
            }),
        )?;
        tracing::info!(email, "session issued");
        Ok(session)
    }
}
