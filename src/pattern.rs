use crate::Error;
use regex::Regex;
use std::path::Path;

/// Library name searched for when none is given.
pub const DEFAULT_LIBRARY: &str = "libiomp5.so";

/// Matches a runtime library file name: a base name followed by an optional
/// numeric version suffix (`libgomp.so`, `libgomp.so.1`, `libgomp.so.1.0.0`).
#[derive(Debug, Clone)]
pub struct LibraryPattern {
    base: String,
    regex: Regex,
}

impl LibraryPattern {
    pub fn new(base: &str) -> Result<Self, Error> {
        let base = base.trim();
        if base.is_empty() || base.contains('/') {
            return Err(Error::Config(format!("invalid library name: {:?}", base)));
        }
        let regex = Regex::new(&format!(r"^{}(\.[0-9]+)*$", regex::escape(base)))?;
        Ok(Self {
            base: base.to_string(),
            regex,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    /// Match against the final component of `path`.
    pub fn matches_path(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| self.matches(name))
    }
}

impl Default for LibraryPattern {
    fn default() -> Self {
        Self {
            base: DEFAULT_LIBRARY.to_string(),
            regex: Regex::new(r"^libiomp5\.so(\.[0-9]+)*$").expect("static pattern"),
        }
    }
}
