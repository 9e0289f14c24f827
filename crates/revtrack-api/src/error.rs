//! Request validation errors

use thiserror::Error;

/// Reasons a phonehome report is rejected before it reaches storage
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A mandatory string field was missing, empty, or not a string
    #[error("{0} is required")]
    MissingRequiredField(&'static str),
}
