//! Command: print version information.

/// The version string, preferring the one stamped in at build time.
#[must_use]
pub fn version() -> &'static str {
    option_env!("RECON_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the recon version to stdout.
#[allow(clippy::print_stdout)]
pub fn run() {
    println!("recon {}", version());
}
