//! Master data: roster, responder directory, link directory
//!
//! One settings document holds the ordered subcontractor roster (rotation
//! order), the responder directory, the support-link directory, and the
//! per-category rotation states.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::category::Category;
use crate::rotation::RotationState;

/// Errors for master-data mutations
#[derive(Debug, Error)]
pub enum MasterError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("no support link named {0:?}")]
    UnknownLink(String),
}

/// An entry in the support-link directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSupportItem {
    pub name: String,
    pub url: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl LinkSupportItem {
    /// Validate required fields and normalize the url scheme.
    pub fn validated(mut self) -> Result<Self, MasterError> {
        if self.name.is_empty() {
            return Err(MasterError::MissingField("name"));
        }
        if self.url.is_empty() {
            return Err(MasterError::MissingField("url"));
        }
        if self.kind.is_empty() {
            return Err(MasterError::MissingField("kind"));
        }
        self.url = normalize_url(&self.url);
        Ok(self)
    }
}

/// Prepend `https://` when no scheme is present.
pub fn normalize_url(url: &str) -> String {
    if url.starts_with("http") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

/// A responder directory entry, `"Name"` or `"Name - Phone"`.
pub fn responder_entry(name: &str, phone: Option<&str>) -> String {
    match phone {
        Some(phone) if !phone.is_empty() => format!("{name} - {phone}"),
        _ => name.to_string(),
    }
}

/// The settings document the desk shares.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MasterData {
    /// Ordered roster; order defines the rotation order
    #[serde(default)]
    pub subcontractors: Vec<String>,

    /// Responder directory shown on the creation form
    #[serde(default)]
    pub ns_respond: Vec<String>,

    /// Support-link directory
    #[serde(default)]
    pub link_support: Vec<LinkSupportItem>,

    /// Rotation state per category slug, created lazily
    #[serde(default)]
    pub rr_indexes: HashMap<String, RotationState>,
}

impl MasterData {
    /// Rotation state for a category, defaulting to index 0 when absent.
    pub fn rotation_for(&self, category: Category) -> RotationState {
        self.rr_indexes
            .get(category.slug())
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url_adds_scheme() {
        assert_eq!(normalize_url("drive.example.com"), "https://drive.example.com");
        assert_eq!(normalize_url("https://a.example"), "https://a.example");
        assert_eq!(normalize_url("http://a.example"), "http://a.example");
    }

    #[test]
    fn test_link_validation() {
        let link = LinkSupportItem {
            name: "NOC Portal".to_string(),
            url: "noc.example.com".to_string(),
            kind: "Site Access".to_string(),
            detail: None,
        };
        let validated = link.validated().unwrap();
        assert_eq!(validated.url, "https://noc.example.com");

        let missing = LinkSupportItem {
            name: String::new(),
            url: "x".to_string(),
            kind: "Other".to_string(),
            detail: None,
        };
        assert!(matches!(
            missing.validated(),
            Err(MasterError::MissingField("name"))
        ));
    }

    #[test]
    fn test_responder_entry() {
        assert_eq!(responder_entry("Arthit", Some("0812345678")), "Arthit - 0812345678");
        assert_eq!(responder_entry("Arthit", None), "Arthit");
        assert_eq!(responder_entry("Arthit", Some("")), "Arthit");
    }

    #[test]
    fn test_rotation_for_defaults_to_zero() {
        let master = MasterData::default();
        let state = master.rotation_for(Category::SubReroute);
        assert_eq!(state.index, 0);
        assert_eq!(state.last_job, "");
    }

    #[test]
    fn test_master_data_decodes_partial_document() {
        // Older documents may lack whole sections
        let master: MasterData =
            serde_json::from_value(serde_json::json!({"subcontractors": ["A"]})).unwrap();
        assert_eq!(master.subcontractors, vec!["A"]);
        assert!(master.ns_respond.is_empty());
        assert!(master.rr_indexes.is_empty());
    }
}
