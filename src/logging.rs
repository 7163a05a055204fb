//! Tracing setup shared by both binaries.

use tracing_subscriber::EnvFilter;

/// Which binary is initializing logging.
///
/// The server logs model lifecycle events at info, so it starts one level
/// chattier than the export CLI, which reports to the user on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogProfile {
    Server,
    Cli,
}

/// Pick the filter directive for a verbosity count.
#[must_use]
pub fn filter_directive(profile: LogProfile, verbose: u8) -> &'static str {
    match (profile, verbose) {
        (LogProfile::Server, 0) => "info,tower_http=warn",
        (LogProfile::Cli, 0) => "warn",
        (LogProfile::Server, 1) => "debug,tower_http=info",
        (LogProfile::Cli, 1) => "info",
        (_, 2) => "debug,rusqlite=info",
        _ => "trace",
    }
}

/// Install the global tracing subscriber.
///
/// Honors `RUST_LOG` when set; otherwise uses the verbosity flag.
/// Quiet mode installs nothing.
pub fn init_tracing(profile: LogProfile, verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(filter_directive(profile, verbose))
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match profile {
        LogProfile::Server => builder.init(),
        LogProfile::Cli => builder.without_time().init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_levels() {
        assert_eq!(filter_directive(LogProfile::Cli, 0), "warn");
        assert!(filter_directive(LogProfile::Server, 0).starts_with("info"));
        assert_eq!(filter_directive(LogProfile::Cli, 2), "debug,rusqlite=info");
        assert_eq!(filter_directive(LogProfile::Server, 7), "trace");
    }
}
