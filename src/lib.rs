// omp-probe - OpenMP runtime copy inspector
// MIT, 2025

//! Find out which copies of an OpenMP runtime library live on a machine and
//! which one the dynamic loader picks for a given executable.
//!
//! Mixing two builds of the runtime in one process (say, a GCC-built shared
//! library next to a vendor-compiled application) leads to hard to diagnose
//! failures. This crate only inspects and reports; it never tries to make
//! such a mix safe.
//!
//! - [`Enumerator`] walks search roots and yields every copy with its embedded
//!   version and build strings
//! - [`Resolver`] asks `ldd` which copy an executable actually loads
//! - [`LaunchConfig`] starts a program with the loader search path pinned
//!
//! # Example: Inventory and resolution
//!
//! ```no_run
//! use camino::Utf8Path;
//! use omp_probe::{Enumerator, Inventory, LinkageReport, Resolver, SearchRoots};
//!
//! let enumerator = Enumerator::builder().roots(SearchRoots::default()).build();
//! let inventory = Inventory::new("libiomp5.so", enumerator.scan().collect());
//! print!("{}", inventory);
//!
//! let linkage = Resolver::builder().build().resolve(Utf8Path::new("/usr/bin/app"))?;
//! print!("{}", LinkageReport { linkage: &linkage, inventory: &inventory });
//! # Ok::<(), omp_probe::Error>(())
//! ```

pub mod config;
pub mod elf;
pub mod error;
pub mod launch;
pub mod library;
pub mod logging;
pub mod pattern;
pub mod report;
pub mod resolver;
pub mod scanner;
pub mod strings;

pub use config::SearchRoots;
pub use elf::{ElfArch, RuntimeFlavor};
pub use error::Error;
pub use launch::LaunchConfig;
pub use library::LibraryInstance;
pub use pattern::LibraryPattern;
pub use report::{Inventory, LinkageReport};
pub use resolver::{Linkage, ResolvedLinkage, Resolver};
pub use scanner::Enumerator;
pub use strings::{Extractor, VersionInfo};
