//! Request types for the API

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::ValidationError;

/// Status report sent by a client on every phonehome cycle
///
/// Fields that are present but not strings are treated as absent, so a
/// malformed report is rejected by [`PhonehomeRequest::validate`] rather than
/// by the JSON extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PhonehomeRequest {
    /// Name of the deployed package
    #[serde(default, deserialize_with = "lenient_string")]
    pub package_name: String,
    /// Hostname of the reporting machine
    #[serde(default, deserialize_with = "lenient_string")]
    pub hostname: String,
    /// Revision currently applied on the client, if known
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_optional_string"
    )]
    pub git_hash: Option<String>,
    /// Externally reachable addresses of the client
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub ip_list: IpList,
}

impl PhonehomeRequest {
    /// Create a report for the given package and host
    pub fn new(package_name: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            hostname: hostname.into(),
            git_hash: None,
            ip_list: IpList::default(),
        }
    }

    /// Attach the currently applied revision
    #[must_use]
    pub fn with_git_hash(mut self, git_hash: Option<String>) -> Self {
        self.git_hash = git_hash.filter(|h| !h.is_empty());
        self
    }

    /// Attach the address list
    #[must_use]
    pub fn with_ip_list(mut self, ips: Vec<String>) -> Self {
        self.ip_list = IpList::List(ips);
        self
    }

    /// Check the mandatory identity fields
    ///
    /// # Errors
    /// Returns `ValidationError::MissingRequiredField` naming the first empty
    /// field, checked in the order `package_name`, `hostname`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.package_name.is_empty() {
            return Err(ValidationError::MissingRequiredField("package_name"));
        }
        if self.hostname.is_empty() {
            return Err(ValidationError::MissingRequiredField("hostname"));
        }
        Ok(())
    }
}

/// Address list as sent on the wire
///
/// Clients send an array; older clients send a single comma-joined string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum IpList {
    /// One entry per address
    List(Vec<String>),
    /// Pre-joined `a,b,c` form
    Joined(String),
}

impl IpList {
    /// Canonical comma-joined form used for storage
    #[must_use]
    pub fn joined(&self) -> String {
        match self {
            IpList::List(ips) => ips.join(","),
            IpList::Joined(s) => s.clone(),
        }
    }

    /// Whether no address was reported
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            IpList::List(ips) => ips.is_empty(),
            IpList::Joined(s) => s.is_empty(),
        }
    }
}

impl Default for IpList {
    fn default() -> Self {
        IpList::List(Vec::new())
    }
}

impl<'de> Deserialize<'de> for IpList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let list = match Value::deserialize(deserializer)? {
            Value::Array(items) => IpList::List(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ),
            Value::String(s) => IpList::Joined(s),
            _ => IpList::default(),
        };
        Ok(list)
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        _ => Ok(String::new()),
    }
}

fn lenient_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => Ok(Some(s)),
        _ => Ok(None),
    }
}
