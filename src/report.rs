//! Human-readable reports.
//!
//! Nothing here judges whether the resolved copy is the "right" one; the
//! report only lines the resolution up against the inventory.

use crate::library::LibraryInstance;
use crate::resolver::{Linkage, ResolvedLinkage};
use crate::scanner::canonical_or_self;
use std::fmt;

/// All copies found by one enumeration, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    library: String,
    entries: Vec<LibraryInstance>,
}

impl Inventory {
    pub fn new(library: impl Into<String>, entries: Vec<LibraryInstance>) -> Self {
        Self {
            library: library.into(),
            entries,
        }
    }

    pub fn entries(&self) -> &[LibraryInstance] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the entry for `linkage`'s resolved file, compared by exact
    /// path first and by canonical path second.
    pub fn position_of(&self, linkage: &ResolvedLinkage) -> Option<usize> {
        let path = linkage.resolved_path()?;
        if let Some(idx) = self.entries.iter().position(|e| e.path.as_path() == path) {
            return Some(idx);
        }
        let canonical = canonical_or_self(path);
        self.entries
            .iter()
            .position(|e| canonical_or_self(&e.path) == canonical)
    }
}

fn field(value: Option<&str>) -> &str {
    value.unwrap_or("(none)")
}

fn write_instance(f: &mut fmt::Formatter<'_>, lib: &LibraryInstance) -> fmt::Result {
    writeln!(f, "{}", lib.path)?;
    let arch = lib.arch.map(|a| a.to_string());
    writeln!(
        f,
        "    flavor: {}  soname: {}  arch: {}{}",
        lib.flavor,
        field(lib.soname.as_deref()),
        field(arch.as_deref()),
        if lib.is_symlink { "  (symlink)" } else { "" }
    )?;
    writeln!(f, "    version: {}", field(lib.version.as_deref()))?;
    writeln!(f, "    build:   {}", field(lib.build.as_deref()))
}

impl fmt::Display for Inventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return writeln!(f, "No copies of {} found.", self.library);
        }

        writeln!(
            f,
            "Found {} cop{} of {}:",
            self.entries.len(),
            if self.entries.len() == 1 { "y" } else { "ies" },
            self.library
        )?;
        for (idx, lib) in self.entries.iter().enumerate() {
            write!(f, "[{}] ", idx + 1)?;
            write_instance(f, lib)?;
        }
        Ok(())
    }
}

/// A resolution shown next to the inventory it is compared against.
pub struct LinkageReport<'a> {
    pub linkage: &'a ResolvedLinkage,
    pub inventory: &'a Inventory,
}

impl fmt::Display for LinkageReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = &self.linkage.target;
        match &self.linkage.linkage {
            Linkage::NoDependency => writeln!(
                f,
                "{} has no dependency on {}.",
                target, self.inventory.library
            ),
            Linkage::Unresolved { name } => writeln!(
                f,
                "{} depends on {}, but the dynamic loader cannot find it.",
                target, name
            ),
            Linkage::Virtual { name } => writeln!(
                f,
                "{} gets {} from the dynamic loader, with no file on disk to inspect.",
                target, name
            ),
            Linkage::Resolved { name, library } => {
                writeln!(f, "{} loads {} from:", target, name)?;
                write!(f, "    ")?;
                write_instance(f, library)?;
                match self.inventory.position_of(self.linkage) {
                    Some(idx) => writeln!(f, "    inventory: entry [{}]", idx + 1),
                    None => writeln!(f, "    inventory: not among the scanned copies"),
                }
            }
        }
    }
}
