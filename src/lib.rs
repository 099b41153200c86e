//! Teleops Desk - job-assignment tracking for a telecom operations team
//!
//! Staff log interruption/maintenance jobs, route them through a fixed
//! status workflow, and assign subcontractor work round-robin. Persistence
//! is a document-store collaborator (see the `teleops-store` crate).

pub mod assignment;
pub mod auth;
pub mod category;
pub mod config;
pub mod ident;
pub mod master;
pub mod rotation;
pub mod service;
pub mod summary;
pub mod workflow;

pub use assignment::{Assignment, AssignmentDraft, AssignmentError};
pub use category::{Category, CategoryKind, SPECIAL_JOB};
pub use config::DeskConfig;
pub use rotation::{RotationPreview, RotationState};
pub use service::{AssignmentService, ServiceError};
pub use workflow::{Status, WorkflowAction};
