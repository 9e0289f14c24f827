//! Command description passed to a `CommandRunner`

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ExecError;

/// Program, arguments and working directory of a command
///
/// Arguments are passed to the program as-is; no shell is involved unless
/// the spec is built with [`CommandSpec::shell`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Program to execute
    pub program: String,
    /// Positional arguments
    #[serde(default)]
    pub args: Vec<String>,
    /// Working directory (inherits the caller's when unset)
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    /// Create a spec for `program` with no arguments
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Run `cmd` through `sh -c`
    pub fn shell(cmd: impl Into<String>) -> Self {
        Self::new("sh").arg("-c").arg(cmd)
    }

    /// Build a spec from an argv list such as `["git", "log", "-n", "1"]`
    ///
    /// # Errors
    /// Returns `ExecError::InvalidCommand` if the list is empty
    pub fn from_argv(argv: &[String]) -> Result<Self, ExecError> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| ExecError::InvalidCommand("empty argument list".to_string()))?;
        Ok(Self::new(program.clone()).args(args.iter().cloned()))
    }

    /// Append one argument
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory
    #[must_use]
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_argv() {
        let argv = vec!["git".to_string(), "log".to_string(), "-n".to_string()];
        let spec = CommandSpec::from_argv(&argv).unwrap();

        assert_eq!(spec.program, "git");
        assert_eq!(spec.args, vec!["log", "-n"]);
        assert_eq!(spec.to_string(), "git log -n");
    }

    #[test]
    fn test_from_empty_argv() {
        assert!(matches!(
            CommandSpec::from_argv(&[]),
            Err(ExecError::InvalidCommand(_))
        ));
    }
}
