use std::path::PathBuf;

use clap::Parser;

use super::logging::LogDestination;

/// Render the Bugzilla button for a Sentry issue page.
#[derive(Debug, Parser)]
#[command(name = "bugbridge", version)]
pub struct Cli {
    /// Location of the Sentry page, e.g. https://sentry.prod.mozaws.net/operations/nightly-js-errors/issues/123/
    pub url: String,

    /// RON file overriding tracker and fetch settings.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// HTML snapshot of the page. Defaults to a bare action bar.
    #[arg(long, value_name = "FILE")]
    pub page: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogDestination::Terminal)]
    pub log: LogDestination,

    /// Enable debug logging.
    #[arg(long)]
    pub verbose: bool,

    /// Read further in-page navigations from stdin, one URL per line.
    #[arg(long)]
    pub follow: bool,

    /// Give up after this many seconds.
    #[arg(long, value_name = "SECS", default_value_t = 60)]
    pub timeout_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_defaults() {
        let cli = Cli::try_parse_from(["bugbridge", "https://example.com/issues/1/"]).unwrap();
        assert_eq!(cli.url, "https://example.com/issues/1/");
        assert_eq!(cli.log, LogDestination::Terminal);
        assert_eq!(cli.timeout_secs, 60);
        assert!(!cli.follow);
        assert!(cli.config.is_none());
    }

    #[test]
    fn parses_all_flags() {
        let cli = Cli::try_parse_from([
            "bugbridge",
            "--config",
            "bridge.ron",
            "--page",
            "snapshot.html",
            "--log",
            "both",
            "--follow",
            "--timeout-secs",
            "5",
            "https://example.com/issues/1/",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("bridge.ron")));
        assert_eq!(cli.page, Some(PathBuf::from("snapshot.html")));
        assert_eq!(cli.log, LogDestination::Both);
        assert!(cli.follow);
        assert_eq!(cli.timeout_secs, 5);
    }

    #[test]
    fn requires_a_url() {
        assert!(Cli::try_parse_from(["bugbridge"]).is_err());
    }
}
