//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use aptnotes_core::{DEFAULT_CATALOG_URL, DEFAULT_CONCURRENCY, OutputFormat};

/// Download, verify and (optionally) parse the APTnotes report collection.
///
/// Every report listed in the APTnotes index is resolved through its Box
/// landing page, fetched, checked against the published SHA-1 and stored
/// in the chosen format.
#[derive(Parser, Debug)]
#[command(name = "aptnotes-download")]
#[command(author, version, about)]
pub struct Args {
    /// Output format
    #[arg(short, long, value_enum)]
    pub format: OutputFormat,

    /// Output path of file or directory (relative paths resolve against the current directory)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Number of reports to download (0 for all)
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Number of parallel downloads (1-100)
    #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub parallel: u8,

    /// Base URL of a Tika server used to extract text and metadata
    #[arg(long, env = "APTNOTES_TIKA_URL")]
    pub tika_url: Option<String>,

    /// Location of the APTnotes JSON index
    #[arg(long, default_value = DEFAULT_CATALOG_URL)]
    pub catalog_url: String,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const REQUIRED: [&str; 5] = ["aptnotes-download", "-f", "json", "-o", "out.json"];

    fn parse(extra: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(REQUIRED.iter().chain(extra.iter()))
    }

    #[test]
    fn test_cli_required_args_parse_successfully() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.output, PathBuf::from("out.json"));
        assert_eq!(args.limit, None);
        assert_eq!(args.parallel, 10);
        assert_eq!(args.catalog_url, DEFAULT_CATALOG_URL);
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
    }

    #[test]
    fn test_cli_missing_format_rejected() {
        let err = Args::try_parse_from(["aptnotes-download", "-o", "x"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_missing_output_rejected() {
        let err = Args::try_parse_from(["aptnotes-download", "-f", "pdf"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_unknown_format_rejected() {
        let err =
            Args::try_parse_from(["aptnotes-download", "-f", "xml", "-o", "x"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn test_cli_every_format_accepted() {
        for (name, format) in [
            ("sqlite", OutputFormat::Sqlite),
            ("pdf", OutputFormat::Pdf),
            ("json", OutputFormat::Json),
            ("csv", OutputFormat::Csv),
        ] {
            let args =
                Args::try_parse_from(["aptnotes-download", "--format", name, "--output", "o"])
                    .unwrap();
            assert_eq!(args.format, format);
        }
    }

    #[test]
    fn test_cli_limit_short_and_long() {
        assert_eq!(parse(&["-l", "5"]).unwrap().limit, Some(5));
        assert_eq!(parse(&["--limit", "0"]).unwrap().limit, Some(0));
    }

    #[test]
    fn test_cli_parallel_bounds() {
        assert_eq!(parse(&["-p", "1"]).unwrap().parallel, 1);
        assert_eq!(parse(&["--parallel", "100"]).unwrap().parallel, 100);
        assert_eq!(
            parse(&["-p", "0"]).unwrap_err().kind(),
            clap::error::ErrorKind::ValueValidation
        );
        assert_eq!(
            parse(&["-p", "101"]).unwrap_err().kind(),
            clap::error::ErrorKind::ValueValidation
        );
    }

    #[test]
    fn test_cli_tika_and_catalog_urls() {
        let args = parse(&[
            "--tika-url",
            "http://localhost:9998",
            "--catalog-url",
            "http://127.0.0.1:8080/index.json",
        ])
        .unwrap();
        assert_eq!(args.tika_url.as_deref(), Some("http://localhost:9998"));
        assert_eq!(args.catalog_url, "http://127.0.0.1:8080/index.json");
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        assert_eq!(parse(&["-v"]).unwrap().verbose, 1);
        assert_eq!(parse(&["-vv"]).unwrap().verbose, 2);
        assert_eq!(parse(&["--verbose", "--verbose"]).unwrap().verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        assert!(parse(&["-q"]).unwrap().quiet);
        assert!(parse(&["--quiet"]).unwrap().quiet);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["aptnotes-download", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let err = Args::try_parse_from(["aptnotes-download", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}
