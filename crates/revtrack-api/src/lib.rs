//! revtrack-api: Shared API types and schemas
//!
//! Contains the phonehome wire contract shared by the server, the agent and
//! the operator CLI.

pub mod error;
pub mod requests;
pub mod responses;

pub use error::ValidationError;
pub use requests::{IpList, PhonehomeRequest};
pub use responses::{HealthResponse, PhonehomeResponse};
