//! revtrack-client: HTTP client library
//!
//! Talks to the revtrack resolution endpoint.
//!
//! # Examples
//!
//! ```no_run
//! use revtrack_api::PhonehomeRequest;
//! use revtrack_client::HttpClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new("http://localhost:8080/phonehome")?;
//!
//! let report = PhonehomeRequest::new("web", "web1.example.com")
//!     .with_git_hash(Some("4f2a9c1".to_string()));
//! let response = client.phonehome(&report).await?;
//!
//! if let Some(target) = response.git_hash {
//!     println!("target revision: {target}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod http;

pub use error::{ClientError, Result};
pub use http::HttpClient;
