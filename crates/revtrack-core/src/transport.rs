//! Phonehome transport trait

use async_trait::async_trait;
use revtrack_api::{PhonehomeRequest, PhonehomeResponse};

use crate::error::CoreError;

/// Delivers a report to the authority and returns its answer
///
/// Implementations map failures onto `NetworkFailure`, `BadHttpStatus` and
/// `MalformedResponseBody`.
#[async_trait]
pub trait PhonehomeTransport: Send + Sync {
    async fn send(&self, request: &PhonehomeRequest) -> Result<PhonehomeResponse, CoreError>;
}
