use crate::elf::{read_identity, ElfArch, RuntimeFlavor};
use crate::strings::{Extractor, VersionInfo};
use camino::{Utf8Path, Utf8PathBuf};
use memmap2::Mmap;
use std::fs::File;
use tracing::debug;

/// One copy of the runtime library found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryInstance {
    pub path: Utf8PathBuf,
    pub is_symlink: bool,
    pub version: Option<String>,
    pub build: Option<String>,
    pub soname: Option<String>,
    pub arch: Option<ElfArch>,
    pub flavor: RuntimeFlavor,
}

impl LibraryInstance {
    /// Inspect the file at `path`.
    ///
    /// Never fails: a file that cannot be opened, mapped or parsed yields an
    /// instance with empty version, build and ELF fields.
    pub fn inspect(path: &Utf8Path, extractor: &Extractor) -> Self {
        let is_symlink = std::fs::symlink_metadata(path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false);

        let (info, identity) = match map_file(path) {
            Ok(mmap) => (extractor.extract(&mmap), read_identity(&mmap)),
            Err(e) => {
                debug!("No version info for {}: {}", path, e);
                (VersionInfo::default(), None)
            }
        };

        let name = path.file_name().unwrap_or(path.as_str());
        let soname = identity.as_ref().and_then(|id| id.soname.clone());
        let flavor = RuntimeFlavor::from_name(soname.as_deref().unwrap_or(name));

        Self {
            path: path.to_owned(),
            is_symlink,
            version: info.version,
            build: info.build,
            soname,
            arch: identity.map(|id| id.arch),
            flavor,
        }
    }

    pub fn version_info(&self) -> VersionInfo {
        VersionInfo {
            version: self.version.clone(),
            build: self.build.clone(),
        }
    }
}

fn map_file(path: &Utf8Path) -> std::io::Result<Mmap> {
    let file = File::open(path)?;
    // The mapping is read-only and dropped before this inspection returns.
    unsafe { Mmap::map(&file) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf8_tempdir() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        (dir, path)
    }

    #[test]
    fn inspect_extracts_strings() {
        let (_guard, dir) = utf8_tempdir();
        let lib = dir.join("libiomp5.so");
        std::fs::write(&lib, b"\0Intel(R) OMP version: 5.0.20230609\0junk\0").unwrap();

        let instance = LibraryInstance::inspect(&lib, &Extractor::default());
        assert_eq!(instance.path, lib);
        assert!(!instance.is_symlink);
        assert_eq!(
            instance.version.as_deref(),
            Some("Intel(R) OMP version: 5.0.20230609")
        );
        assert_eq!(instance.build, None);
        assert_eq!(instance.soname, None);
        assert_eq!(instance.arch, None);
        assert_eq!(instance.flavor, RuntimeFlavor::Intel);
    }

    #[test]
    fn unreadable_file_yields_empty_fields() {
        let (_guard, dir) = utf8_tempdir();
        let missing = dir.join("libgomp.so.1");

        let instance = LibraryInstance::inspect(&missing, &Extractor::default());
        assert!(instance.version_info().is_empty());
        assert_eq!(instance.flavor, RuntimeFlavor::Gnu);
    }

    #[test]
    fn symlink_is_flagged_and_read_through() {
        let (_guard, dir) = utf8_tempdir();
        let real = dir.join("libomp.so.5");
        std::fs::write(&real, b"\0LLVM OMP version: 5.0.20140926\0").unwrap();
        let link = dir.join("libomp.so");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let instance = LibraryInstance::inspect(&link, &Extractor::default());
        assert!(instance.is_symlink);
        assert_eq!(
            instance.version.as_deref(),
            Some("LLVM OMP version: 5.0.20140926")
        );
        assert_eq!(instance.flavor, RuntimeFlavor::Llvm);
    }

    #[test]
    fn empty_file_is_not_an_error() {
        let (_guard, dir) = utf8_tempdir();
        let lib = dir.join("libiomp5.so");
        std::fs::write(&lib, b"").unwrap();

        let instance = LibraryInstance::inspect(&lib, &Extractor::default());
        assert!(instance.version_info().is_empty());
    }
}
