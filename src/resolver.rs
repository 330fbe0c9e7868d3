//! Binary linkage resolver.
//!
//! Asks the system dependency lister (`ldd`) which files the dynamic loader
//! maps for an executable and picks out the runtime library among them.

use crate::library::LibraryInstance;
use crate::pattern::LibraryPattern;
use crate::strings::{Extractor, VersionInfo};
use crate::Error;
use bon::Builder;
use camino::{Utf8Path, Utf8PathBuf};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

pub const DEFAULT_LDD: &str = "ldd";

/// How the loader resolved one dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Path(Utf8PathBuf),
    /// `=> not found`
    NotFound,
    /// Provided by the kernel or loader without a backing file (vdso)
    Virtual,
}

/// One line of `ldd` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LddEntry {
    pub name: String,
    pub resolution: Resolution,
}

impl LddEntry {
    /// File name of the dependency, also for entries listed by absolute path.
    pub fn file_name(&self) -> &str {
        Utf8Path::new(&self.name).file_name().unwrap_or(&self.name)
    }
}

/// Parse `ldd` output.
///
/// ```text
///     linux-vdso.so.1 (0x00007ffd4a5f2000)
///     libiomp5.so => /opt/intel/lib/libiomp5.so (0x00007f0e1c000000)
///     libgomp.so.1 => not found
///     /lib64/ld-linux-x86-64.so.2 (0x00007f0e1c9a1000)
/// ```
pub fn parse_ldd_output(output: &str) -> Vec<LddEntry> {
    output.lines().filter_map(parse_ldd_line).collect()
}

fn parse_ldd_line(line: &str) -> Option<LddEntry> {
    let line = line.trim();
    if line.is_empty() || line.ends_with(':') {
        return None;
    }

    if let Some((name, target)) = line.split_once("=>") {
        let name = name.trim();
        let target = strip_address(target.trim());
        if name.is_empty() {
            return None;
        }
        let resolution = if target == "not found" {
            Resolution::NotFound
        } else if target.is_empty() {
            Resolution::Virtual
        } else {
            Resolution::Path(Utf8PathBuf::from(target))
        };
        return Some(LddEntry {
            name: name.to_string(),
            resolution,
        });
    }

    // Only lines carrying a load address are dependencies; this skips
    // messages such as "statically linked".
    let (name, _) = line.split_once(" (0x")?;
    let name = name.trim();
    let resolution = if name.starts_with('/') {
        Resolution::Path(Utf8PathBuf::from(name))
    } else {
        Resolution::Virtual
    };
    Some(LddEntry {
        name: name.to_string(),
        resolution,
    })
}

fn strip_address(target: &str) -> &str {
    match target.rfind(" (0x") {
        Some(idx) => target[..idx].trim(),
        None if target.starts_with("(0x") => "",
        None => target,
    }
}

/// Outcome of resolving the runtime library for one executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Linkage {
    /// The executable does not depend on the runtime library.
    NoDependency,
    /// The dependency is declared but the loader cannot find it.
    Unresolved { name: String },
    /// The loader provides the dependency without a backing file.
    Virtual { name: String },
    /// The loader maps this file.
    Resolved {
        name: String,
        library: LibraryInstance,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLinkage {
    pub target: Utf8PathBuf,
    pub linkage: Linkage,
}

impl ResolvedLinkage {
    pub fn resolved_path(&self) -> Option<&Utf8Path> {
        match &self.linkage {
            Linkage::Resolved { library, .. } => Some(&library.path),
            _ => None,
        }
    }

    pub fn version_info(&self) -> Option<VersionInfo> {
        match &self.linkage {
            Linkage::Resolved { library, .. } => Some(library.version_info()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Builder)]
pub struct Resolver {
    #[builder(default)]
    pattern: LibraryPattern,
    #[builder(default)]
    extractor: Extractor,
    /// Program used to list resolved dependencies.
    #[builder(into, default = DEFAULT_LDD.to_string())]
    ldd: String,
}

impl Resolver {
    pub fn resolve(&self, target: &Utf8Path) -> Result<ResolvedLinkage, Error> {
        validate_executable(target)?;

        let entries = self.list_dependencies(target)?;
        debug!("{} lists {} dependencies", target, entries.len());

        let mut matching = entries
            .into_iter()
            .filter(|entry| self.pattern.matches(entry.file_name()));

        let linkage = match matching.next() {
            None => Linkage::NoDependency,
            Some(entry) => {
                for extra in matching {
                    info!("Ignoring additional runtime dependency {}", extra.name);
                }
                match entry.resolution {
                    Resolution::Path(path) => Linkage::Resolved {
                        library: LibraryInstance::inspect(&path, &self.extractor),
                        name: entry.name,
                    },
                    Resolution::NotFound => Linkage::Unresolved { name: entry.name },
                    Resolution::Virtual => Linkage::Virtual { name: entry.name },
                }
            }
        };

        Ok(ResolvedLinkage {
            target: target.to_owned(),
            linkage,
        })
    }

    fn list_dependencies(&self, target: &Utf8Path) -> Result<Vec<LddEntry>, Error> {
        let output = Command::new(&self.ldd)
            .arg(target)
            .output()
            .map_err(|source| Error::LddSpawn {
                program: self.ldd.clone(),
                source,
            })?;

        if !output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            // glibc prints this on stdout, other implementations on stderr
            if stdout.contains("not a dynamic executable")
                || stderr.contains("not a dynamic executable")
            {
                return Ok(Vec::new());
            }
            return Err(Error::LddFailed {
                program: self.ldd.clone(),
                path: target.to_owned(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(parse_ldd_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Check that `path` is an existing regular file with an execute bit set.
pub fn validate_executable(path: &Utf8Path) -> Result<(), Error> {
    let invalid = |reason: &str| Error::InvalidTarget {
        path: path.to_owned(),
        reason: reason.to_string(),
    };

    let metadata = std::fs::metadata(Path::new(path)).map_err(|e| invalid(&e.to_string()))?;
    if !metadata.is_file() {
        return Err(invalid("not a regular file"));
    }
    if metadata.permissions().mode() & 0o111 == 0 {
        return Err(invalid("not executable"));
    }
    Ok(())
}
