//! Response types for the API

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Answer to a phonehome report
///
/// `git_hash` is absent when no rule matched the reporting host. That is
/// distinct from a resolved revision which happens to equal the one the
/// client already runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PhonehomeResponse {
    /// Revision the client should be running
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_hash: Option<String>,
    /// Apply the revision even if the client does not auto-update
    #[serde(default, skip_serializing_if = "is_false")]
    pub force_update: bool,
    /// Restart after the next applied update
    #[serde(default, skip_serializing_if = "is_false")]
    pub force_restart: bool,
}

impl PhonehomeResponse {
    /// Response carrying the resolved revision, if any
    #[must_use]
    pub fn resolved(git_hash: Option<String>) -> Self {
        Self {
            git_hash,
            ..Self::default()
        }
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_no_match_serializes_empty_object() {
        let body = serde_json::to_value(PhonehomeResponse::resolved(None)).unwrap();
        assert_eq!(body, json!({}));
    }

    #[test]
    fn test_flags_default_to_false() {
        let resp: PhonehomeResponse = serde_json::from_value(json!({"git_hash": "abc"})).unwrap();

        assert_eq!(resp.git_hash.as_deref(), Some("abc"));
        assert!(!resp.force_update);
        assert!(!resp.force_restart);
    }
}
