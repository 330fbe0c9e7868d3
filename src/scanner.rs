//! Library enumerator.
//!
//! Walks each search root recursively and yields one [`LibraryInstance`] per
//! directory entry whose name matches the runtime library pattern.

use crate::config::SearchRoots;
use crate::library::LibraryInstance;
use crate::pattern::LibraryPattern;
use crate::strings::Extractor;
use bon::Builder;
use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, trace};
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone, Builder)]
pub struct Enumerator {
    roots: SearchRoots,
    #[builder(default)]
    pattern: LibraryPattern,
    #[builder(default)]
    extractor: Extractor,
}

impl Enumerator {
    /// Lazily enumerate matching libraries under all roots.
    ///
    /// Unreadable directories and entries are skipped.
    pub fn scan(&self) -> impl Iterator<Item = LibraryInstance> + '_ {
        deduplicate_roots(&self.roots)
            .into_iter()
            .flat_map(|root| {
                debug!("Scanning {}", root);
                WalkDir::new(root)
                    .follow_links(false)
                    .into_iter()
                    .filter_map(|entry| match entry {
                        Ok(entry) => Some(entry),
                        Err(e) => {
                            trace!("Skipping unreadable entry: {}", e);
                            None
                        }
                    })
            })
            .filter(|entry| self.is_candidate(entry))
            .filter_map(|entry| match Utf8PathBuf::try_from(entry.into_path()) {
                Ok(path) => Some(path),
                Err(e) => {
                    debug!("Skipping non UTF-8 path {}", e.as_path().display());
                    None
                }
            })
            .map(|path| LibraryInstance::inspect(&path, &self.extractor))
    }

    fn is_candidate(&self, entry: &DirEntry) -> bool {
        let file_type = entry.file_type();
        if !(file_type.is_file() || file_type.is_symlink()) {
            return false;
        }
        if !self.pattern.matches_path(entry.path()) {
            return false;
        }
        // Dangling symlinks and links to directories are not library copies.
        !file_type.is_symlink() || entry.path().is_file()
    }
}

/// Drop roots that do not exist, roots that resolve to a directory already
/// listed, and roots lying inside another root. Order is preserved; the first
/// spelling of a directory wins.
pub fn deduplicate_roots(roots: &[Utf8PathBuf]) -> Vec<Utf8PathBuf> {
    let mut existing: Vec<(&Utf8PathBuf, Utf8PathBuf)> = Vec::new();
    for root in roots {
        if !root.is_dir() {
            debug!("Search root {} does not exist, skipping", root);
            continue;
        }
        let canonical = canonical_or_self(root);
        if existing.iter().any(|(_, seen)| *seen == canonical) {
            debug!("Search root {} already listed", root);
            continue;
        }
        existing.push((root, canonical));
    }

    existing
        .iter()
        .filter(|(root, canonical)| {
            let covering = existing
                .iter()
                .find(|(_, other)| other != canonical && canonical.starts_with(other));
            match covering {
                Some((outer, _)) => {
                    debug!("Search root {} is inside {}", root, outer);
                    false
                }
                None => true,
            }
        })
        .map(|(root, _)| (*root).clone())
        .collect()
}

pub(crate) fn canonical_or_self(path: &Utf8Path) -> Utf8PathBuf {
    path.canonicalize_utf8().unwrap_or_else(|_| path.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn utf8_tempdir() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        (dir, path)
    }

    fn enumerator(roots: Vec<Utf8PathBuf>, name: &str) -> Enumerator {
        Enumerator::builder()
            .roots(SearchRoots::new(roots))
            .pattern(LibraryPattern::new(name).unwrap())
            .build()
    }

    #[test]
    fn empty_roots_yield_nothing() {
        let (_guard, dir) = utf8_tempdir();
        fs::write(dir.join("libc.so.6"), b"not it").unwrap();

        let found: Vec<_> = enumerator(vec![dir], "libiomp5.so").scan().collect();
        assert!(found.is_empty());
    }

    #[test]
    fn finds_nested_copies() {
        let (_guard, dir) = utf8_tempdir();
        fs::create_dir_all(dir.join("a/b/c")).unwrap();
        fs::write(dir.join("libgomp.so.1"), b"\0GNU OpenMP version 1\0").unwrap();
        fs::write(dir.join("a/b/c/libgomp.so"), b"\0GNU OpenMP version 2\0").unwrap();
        fs::write(dir.join("a/libgomp.a"), b"static").unwrap();

        let mut found: Vec<_> = enumerator(vec![dir.clone()], "libgomp.so").scan().collect();
        found.sort_by(|a, b| a.path.cmp(&b.path));

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].path, dir.join("a/b/c/libgomp.so"));
        assert_eq!(found[0].version.as_deref(), Some("GNU OpenMP version 2"));
        assert_eq!(found[1].path, dir.join("libgomp.so.1"));
        assert_eq!(found[1].version.as_deref(), Some("GNU OpenMP version 1"));
    }

    #[test]
    fn missing_roots_are_skipped() {
        let (_guard, dir) = utf8_tempdir();
        fs::write(dir.join("libiomp5.so"), b"").unwrap();

        let found: Vec<_> = enumerator(
            vec![dir.join("does-not-exist"), dir.clone()],
            "libiomp5.so",
        )
        .scan()
        .collect();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn duplicate_roots_scanned_once() {
        let (_guard, dir) = utf8_tempdir();
        fs::create_dir(dir.join("lib")).unwrap();
        std::os::unix::fs::symlink(dir.join("lib"), dir.join("lib64")).unwrap();
        fs::write(dir.join("lib/libiomp5.so"), b"").unwrap();

        let roots = vec![dir.join("lib"), dir.join("lib64"), dir.join("lib")];
        assert_eq!(deduplicate_roots(&roots), vec![dir.join("lib")]);

        let found: Vec<_> = enumerator(roots, "libiomp5.so").scan().collect();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn nested_roots_scanned_once() {
        let (_guard, dir) = utf8_tempdir();
        fs::create_dir(dir.join("intel")).unwrap();
        fs::write(dir.join("intel/libiomp5.so"), b"").unwrap();

        let inner_first = vec![dir.join("intel"), dir.clone()];
        assert_eq!(deduplicate_roots(&inner_first), vec![dir.clone()]);

        let outer_first = vec![dir.clone(), dir.join("intel")];
        assert_eq!(deduplicate_roots(&outer_first), vec![dir.clone()]);

        let found: Vec<_> = enumerator(outer_first, "libiomp5.so").scan().collect();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn sibling_with_common_name_prefix_is_kept() {
        let (_guard, dir) = utf8_tempdir();
        fs::create_dir(dir.join("lib")).unwrap();
        fs::create_dir(dir.join("lib64")).unwrap();

        let roots = vec![dir.join("lib"), dir.join("lib64")];
        assert_eq!(deduplicate_roots(&roots), roots);
    }

    #[test]
    fn dangling_symlink_is_ignored() {
        let (_guard, dir) = utf8_tempdir();
        std::os::unix::fs::symlink(dir.join("gone.so"), dir.join("libiomp5.so")).unwrap();

        let found: Vec<_> = enumerator(vec![dir], "libiomp5.so").scan().collect();
        assert!(found.is_empty());
    }

    #[test]
    fn scan_yields_incrementally() {
        let (_guard, dir) = utf8_tempdir();
        for i in 0..5 {
            fs::write(dir.join(format!("libomp.so.{}", i)), b"").unwrap();
        }

        let e = enumerator(vec![dir], "libomp.so");
        let mut iter = e.scan();
        assert!(iter.next().is_some());
        assert_eq!(iter.count(), 4);
    }
}
