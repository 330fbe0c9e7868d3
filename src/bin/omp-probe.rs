use bpaf::Bpaf;
use camino::Utf8PathBuf;
use omp_probe::logging::init_logging;
use omp_probe::pattern::DEFAULT_LIBRARY;
use omp_probe::resolver::DEFAULT_LDD;
use omp_probe::strings::{DEFAULT_BUILD_PATTERN, DEFAULT_VERSION_PATTERN};
use omp_probe::{
    Enumerator, Error, Extractor, Inventory, LibraryPattern, LinkageReport, Resolver, SearchRoots,
};
use std::process::ExitCode;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Bpaf)]
#[bpaf(options)]
struct Options {
    #[bpaf(short, long)]
    /// Verbose output
    verbose: bool,

    #[bpaf(long("root"), argument("DIR"))]
    /// Search root, may be repeated (replaces the default roots)
    roots: Vec<Utf8PathBuf>,

    #[bpaf(long, argument("FILE"))]
    /// Read search roots from a file in ld.so.conf syntax
    roots_file: Option<Utf8PathBuf>,

    #[bpaf(long, argument("NAME"), fallback(DEFAULT_LIBRARY.to_string()))]
    /// Runtime library base name
    name: String,

    #[bpaf(long, argument("REGEX"), fallback(DEFAULT_VERSION_PATTERN.to_string()))]
    /// Pattern selecting the version line
    version_pattern: String,

    #[bpaf(long, argument("REGEX"), fallback(DEFAULT_BUILD_PATTERN.to_string()))]
    /// Pattern selecting the build line
    build_pattern: String,

    #[bpaf(long, argument("PROGRAM"), fallback(DEFAULT_LDD.to_string()))]
    /// Program listing resolved shared library dependencies
    ldd: String,

    #[bpaf(positional("EXECUTABLE"))]
    /// Executable whose runtime library resolution is checked
    target: Option<Utf8PathBuf>,
}

fn main() -> ExitCode {
    let options = options().run();

    // Initialize logging system
    init_logging(options.verbose);

    match run(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(options: &Options) -> Result<(), Error> {
    let roots = search_roots(options)?;
    debug!("Search roots: {:?}", &*roots);

    let pattern = LibraryPattern::new(&options.name)?;
    let extractor = Extractor::new(&options.version_pattern, &options.build_pattern)?;

    let enumerator = Enumerator::builder()
        .roots(roots)
        .pattern(pattern.clone())
        .extractor(extractor.clone())
        .build();
    let inventory = Inventory::new(pattern.base(), enumerator.scan().collect());
    print!("{}", inventory);

    let Some(target) = &options.target else {
        return Ok(());
    };

    if inventory.is_empty() {
        info!("Nothing to compare against, skipping {}", target);
        return Ok(());
    }

    let resolver = Resolver::builder()
        .pattern(pattern)
        .extractor(extractor)
        .ldd(options.ldd.clone())
        .build();
    let linkage = resolver.resolve(target)?;

    println!();
    print!(
        "{}",
        LinkageReport {
            linkage: &linkage,
            inventory: &inventory,
        }
    );

    Ok(())
}

fn search_roots(options: &Options) -> Result<SearchRoots, Error> {
    let mut roots = match &options.roots_file {
        Some(path) => {
            info!("Loading search roots from: {}", path);
            SearchRoots::from_file(path)?
        }
        None if options.roots.is_empty() => return Ok(SearchRoots::default()),
        None => SearchRoots::new(Vec::new()),
    };

    for root in &options.roots {
        roots.push(root.clone());
    }
    Ok(roots)
}
