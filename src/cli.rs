// src/cli.rs

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "webvuln-scanner",
    version,
    about = "Scans a web target for common security misconfigurations"
)]
pub struct Args {
    /// Target URL. When given, one scan runs headless and the JSON report is
    /// printed to stdout; without it the interactive UI starts.
    pub url: Option<String>,

    /// Overall scan deadline in seconds
    #[clap(short, long)]
    pub deadline: Option<u64>,

    /// Path to a JSON configuration file
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[clap(short, long)]
    pub pretty: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_arguments() {
        let args = Args::parse_from(["webvuln-scanner", "example.com", "--deadline", "30", "--pretty"]);
        assert_eq!(args.url.as_deref(), Some("example.com"));
        assert_eq!(args.deadline, Some(30));
        assert!(args.pretty);
        assert!(args.config.is_none());
    }

    #[test]
    fn no_url_means_interactive() {
        let args = Args::parse_from(["webvuln-scanner"]);
        assert!(args.url.is_none());
    }
}
