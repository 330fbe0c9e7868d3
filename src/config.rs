//! Search roots for the library enumerator.
//!
//! Roots come from a built-in list of OS-convention directories plus the
//! user's home directory, or from a file written in `ld.so.conf` syntax.

use crate::Error;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::ops::Deref;
use tracing::{debug, warn};

/// Directories scanned when no roots are given explicitly.
pub const DEFAULT_ROOTS: &[&str] = &[
    "/lib",
    "/lib64",
    "/usr/lib",
    "/usr/lib64",
    "/usr/local/lib",
    "/opt",
];

/// Ordered list of directories to search recursively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRoots {
    roots: Vec<Utf8PathBuf>,
}

impl SearchRoots {
    pub fn new(roots: Vec<Utf8PathBuf>) -> Self {
        Self { roots }
    }

    /// The built-in OS roots, followed by `home` if given.
    pub fn system(home: Option<Utf8PathBuf>) -> Self {
        let mut roots: Vec<Utf8PathBuf> = DEFAULT_ROOTS.iter().map(Utf8PathBuf::from).collect();
        roots.extend(home);
        Self { roots }
    }

    /// Load roots from a file in `ld.so.conf` syntax.
    ///
    /// `include` directives are expanded with glob patterns; only matched
    /// files ending in `.conf` are read.
    pub fn from_file(path: &Utf8Path) -> Result<Self, Error> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read roots file {}: {}", path, e)))?;

        let mut roots = Vec::new();
        collect_roots(&content, &mut roots, 0)?;
        Ok(Self { roots })
    }

    pub fn push(&mut self, root: Utf8PathBuf) {
        self.roots.push(root);
    }
}

impl Default for SearchRoots {
    fn default() -> Self {
        let home = std::env::var("HOME")
            .ok()
            .filter(|h| !h.is_empty())
            .map(Utf8PathBuf::from);
        Self::system(home)
    }
}

impl Deref for SearchRoots {
    type Target = [Utf8PathBuf];

    fn deref(&self) -> &Self::Target {
        &self.roots
    }
}

enum Line<'a> {
    Root(Utf8PathBuf),
    Include(&'a str),
}

fn parse_lines(content: &str) -> impl Iterator<Item = Line<'_>> {
    content.lines().filter_map(|line| {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        match line.strip_prefix("include") {
            Some(rest) if rest.starts_with(char::is_whitespace) => Some(Line::Include(rest.trim())),
            _ => Some(Line::Root(Utf8PathBuf::from(line))),
        }
    })
}

// Include chains deeper than this are treated as a loop.
const MAX_INCLUDE_DEPTH: usize = 8;

fn collect_roots(content: &str, roots: &mut Vec<Utf8PathBuf>, depth: usize) -> Result<(), Error> {
    if depth > MAX_INCLUDE_DEPTH {
        return Err(Error::Config("include nesting too deep".to_string()));
    }

    for line in parse_lines(content) {
        match line {
            Line::Root(dir) => roots.push(dir),
            Line::Include(pattern) => {
                for entry in glob::glob(pattern)? {
                    match entry {
                        Ok(path) => {
                            if !path.is_file()
                                || path.extension().and_then(|s| s.to_str()) != Some("conf")
                            {
                                continue;
                            }
                            debug!("Including roots from {}", path.display());
                            let included = fs::read_to_string(&path).map_err(|e| {
                                Error::Config(format!(
                                    "Failed to read included file {}: {}",
                                    path.display(),
                                    e
                                ))
                            })?;
                            collect_roots(&included, roots, depth + 1)?;
                        }
                        Err(e) => {
                            warn!("Failed to process glob pattern {}: {}", pattern, e);
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
