//! Start a program with the loader search path pinned to one runtime copy.
//!
//! The variable is set on the child process only; this process's own
//! environment is never modified.

use crate::pattern::LibraryPattern;
use crate::Error;
use bon::Builder;
use camino::{Utf8Path, Utf8PathBuf};
use std::ffi::{OsStr, OsString};
use std::process::{Command, ExitStatus};
use tracing::debug;

pub const DEFAULT_SEARCH_PATH_VAR: &str = "LD_LIBRARY_PATH";

#[derive(Debug, Clone, Builder)]
pub struct LaunchConfig {
    /// Directory holding the runtime copy the program must load.
    #[builder(into)]
    library_dir: Utf8PathBuf,
    #[builder(into)]
    program: Utf8PathBuf,
    #[builder(default)]
    args: Vec<String>,
    #[builder(into, default = DEFAULT_SEARCH_PATH_VAR.to_string())]
    variable: String,
}

impl LaunchConfig {
    pub fn library_dir(&self) -> &Utf8Path {
        &self.library_dir
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Value of the search-path variable given its current value.
    pub fn search_path_value(&self, existing: Option<&OsStr>) -> OsString {
        let mut value = OsString::from(self.library_dir.as_str());
        if let Some(existing) = existing.filter(|v| !v.is_empty()) {
            value.push(":");
            value.push(existing);
        }
        value
    }

    /// Build the child command, reading the current value of the variable.
    pub fn command(&self) -> Command {
        let existing = std::env::var_os(&self.variable);
        self.command_with(existing.as_deref())
    }

    pub fn command_with(&self, existing: Option<&OsStr>) -> Command {
        let value = self.search_path_value(existing);
        debug!("{}={}", self.variable, value.to_string_lossy());

        let mut command = Command::new(self.program.as_std_path());
        command.args(&self.args).env(&self.variable, value);
        command
    }

    /// Run the program to completion.
    pub fn launch(&self) -> Result<ExitStatus, Error> {
        Ok(self.command().status()?)
    }

    /// Names in the library directory that match `pattern`.
    pub fn runtime_copies(&self, pattern: &LibraryPattern) -> Result<Vec<String>, Error> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.library_dir)? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                if pattern.matches(name) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}
