//! revtrack-exec: Local command execution
//!
//! Runs the external revision lookup and update commands on the client host.

pub mod command;
pub mod error;
pub mod local;
pub mod result;
pub mod traits;

pub use command::CommandSpec;
pub use error::ExecError;
pub use local::LocalRunner;
pub use result::CommandResult;
pub use traits::CommandRunner;
