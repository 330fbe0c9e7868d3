//! Version and build text extraction.
//!
//! Mirrors `strings(1)`: the file is split into maximal runs of printable
//! ASCII, and the first run matching each pattern is kept.

use crate::Error;
use regex::{Regex, RegexBuilder};

/// Shortest run of printable bytes treated as text.
pub const MIN_STRING_LEN: usize = 4;

pub const DEFAULT_VERSION_PATTERN: &str = r"(omp|openmp).*version";
pub const DEFAULT_BUILD_PATTERN: &str = r"(omp|openmp).*build";

/// Version and build lines found in a file. Either may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionInfo {
    pub version: Option<String>,
    pub build: Option<String>,
}

impl VersionInfo {
    pub fn is_empty(&self) -> bool {
        self.version.is_none() && self.build.is_none()
    }
}

/// Pair of independent patterns applied to a file's printable text.
#[derive(Debug, Clone)]
pub struct Extractor {
    version: Regex,
    build: Regex,
}

impl Extractor {
    /// Build an extractor from two case-insensitive regular expressions.
    pub fn new(version: &str, build: &str) -> Result<Self, Error> {
        Ok(Self {
            version: case_insensitive(version)?,
            build: case_insensitive(build)?,
        })
    }

    pub fn extract(&self, data: &[u8]) -> VersionInfo {
        let mut info = VersionInfo::default();

        for text in printable_strings(data, MIN_STRING_LEN) {
            if info.version.is_none() && self.version.is_match(text) {
                info.version = Some(text.to_string());
            }
            if info.build.is_none() && self.build.is_match(text) {
                info.build = Some(text.to_string());
            }
            if info.version.is_some() && info.build.is_some() {
                break;
            }
        }

        info
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(DEFAULT_VERSION_PATTERN, DEFAULT_BUILD_PATTERN).expect("static patterns")
    }
}

fn case_insensitive(pattern: &str) -> Result<Regex, Error> {
    Ok(RegexBuilder::new(pattern).case_insensitive(true).build()?)
}

fn is_printable(b: u8) -> bool {
    b == b'\t' || (0x20..=0x7e).contains(&b)
}

/// Iterate over trimmed runs of printable ASCII at least `min_len` bytes long.
pub fn printable_strings(data: &[u8], min_len: usize) -> impl Iterator<Item = &str> {
    data.split(|b| !is_printable(*b))
        .filter(move |run| run.len() >= min_len)
        // printable ASCII is always valid UTF-8
        .filter_map(|run| std::str::from_utf8(run).ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTEL_BLOB: &[u8] = b"\x7fELF\x02\x01\x01\0\0\0GOMP_1.0\0\x01\x02\
        Intel(R) OMP version: 5.0.20230609\0\xff\xfe\
        Intel(R) OMP library type: performance\0\
        Intel(R) OMP build time: no_timestamp\0\
        Intel(R) OMP version: 4.5.0\0";

    #[test]
    fn printable_runs_follow_strings_convention() {
        let data = b"abc\0defg\x01  hijk  \n\x80lmnopq";
        let runs: Vec<_> = printable_strings(data, 4).collect();
        assert_eq!(runs, vec!["defg", "hijk", "lmnopq"]);
    }

    #[test]
    fn first_match_of_each_pattern_wins() {
        let info = Extractor::default().extract(INTEL_BLOB);
        assert_eq!(
            info.version.as_deref(),
            Some("Intel(R) OMP version: 5.0.20230609")
        );
        assert_eq!(
            info.build.as_deref(),
            Some("Intel(R) OMP build time: no_timestamp")
        );
    }

    #[test]
    fn patterns_are_case_insensitive() {
        let info = Extractor::default().extract(b"\0LLVM OMP VERSION: 5.0.20140926\0");
        assert_eq!(info.version.as_deref(), Some("LLVM OMP VERSION: 5.0.20140926"));
        assert_eq!(info.build, None);
    }

    #[test]
    fn absent_text_is_empty_not_error() {
        let info = Extractor::default().extract(b"\0\x01\x02 no runtime here \0");
        assert!(info.is_empty());
        assert!(Extractor::default().extract(&[]).is_empty());
    }

    #[test]
    fn custom_patterns() {
        let extractor = Extractor::new(r"^GOMP_\d", r"^GCC: ").unwrap();
        let info = extractor.extract(b"\0GOMP_4.5\0GCC: (GNU) 13.2.0\0");
        assert_eq!(info.version.as_deref(), Some("GOMP_4.5"));
        assert_eq!(info.build.as_deref(), Some("GCC: (GNU) 13.2.0"));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        assert!(matches!(Extractor::new("(", "x"), Err(Error::Regex(_))));
    }

    #[test]
    fn extraction_is_idempotent() {
        let extractor = Extractor::default();
        assert_eq!(extractor.extract(INTEL_BLOB), extractor.extract(INTEL_BLOB));
    }
}
