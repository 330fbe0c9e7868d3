use anyhow::Context;
use bpaf::Bpaf;
use camino::Utf8PathBuf;
use omp_probe::launch::DEFAULT_SEARCH_PATH_VAR;
use omp_probe::logging::init_logging;
use omp_probe::pattern::DEFAULT_LIBRARY;
use omp_probe::{LaunchConfig, LibraryPattern};
use std::process::ExitCode;
use tracing::{info, warn};

#[derive(Debug, Clone, Bpaf)]
#[bpaf(options)]
struct Options {
    #[bpaf(short, long)]
    /// Verbose output
    verbose: bool,

    #[bpaf(short('L'), long, argument("DIR"))]
    /// Directory holding the runtime library copy to load
    lib_dir: Utf8PathBuf,

    #[bpaf(long, argument("NAME"), fallback(DEFAULT_LIBRARY.to_string()))]
    /// Runtime library base name expected in DIR
    name: String,

    #[bpaf(long("var"), argument("VAR"), fallback(DEFAULT_SEARCH_PATH_VAR.to_string()))]
    /// Loader search path variable
    variable: String,

    #[bpaf(positional("PROGRAM"))]
    /// Program to start
    program: Utf8PathBuf,

    #[bpaf(any("ARG", Some), many)]
    /// Arguments passed to the program as given, dashes included.
    /// Put `--` before PROGRAM when they clash with the options above
    args: Vec<String>,
}

fn main() -> anyhow::Result<ExitCode> {
    let options = options().run();

    init_logging(options.verbose);

    let pattern = LibraryPattern::new(&options.name)?;
    let config = LaunchConfig::builder()
        .library_dir(options.lib_dir.clone())
        .program(options.program.clone())
        .args(options.args)
        .variable(options.variable)
        .build();

    let copies = config
        .runtime_copies(&pattern)
        .with_context(|| format!("Cannot read library directory {}", options.lib_dir))?;
    if copies.is_empty() {
        warn!(
            "No {} in {}; the loader falls back to its default search order",
            pattern.base(),
            options.lib_dir
        );
    } else {
        info!(
            "Pinning {} to {} ({})",
            config.variable(),
            config.library_dir(),
            copies.join(", ")
        );
    }

    let status = config
        .launch()
        .with_context(|| format!("Failed to start {}", options.program))?;

    // Killed by a signal: no exit code to forward
    Ok(status
        .code()
        .map(|code| ExitCode::from(code as u8))
        .unwrap_or(ExitCode::FAILURE))
}
