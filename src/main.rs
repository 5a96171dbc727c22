//! CLI entry point for aptnotes-download.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use aptnotes_core::{
    BoxSharedItemResolver, Extraction, HttpClient, Pipeline, PipelineConfig, TikaExtractor,
};
use clap::Parser;
use tracing::{debug, info};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let output_path = ensure_absolute(&args.output)?;
    let config = PipelineConfig::new(args.format, &output_path)
        .with_limit(args.limit)
        .with_concurrency(usize::from(args.parallel))
        .with_catalog_url(args.catalog_url.clone());

    let extraction = match args.tika_url.as_deref() {
        Some(tika_url) => {
            let client = HttpClient::with_timeouts(
                config.connect_timeout_secs,
                config.read_timeout_secs,
            )?;
            let tika = TikaExtractor::new(client, tika_url)
                .with_context(|| format!("invalid Tika URL: {tika_url}"))?;
            debug!(endpoint = tika.endpoint(), "extraction enabled");
            Extraction::available(tika)
        }
        None => Extraction::NotConfigured,
    };

    let pipeline = Pipeline::new(config, Arc::new(BoxSharedItemResolver::new()), extraction)?;
    let outcome = pipeline.run().await?;

    info!(
        written = outcome.written,
        dropped = outcome.dropped(),
        path = %display_path(&output_path),
        "saved {} of {} report(s) as {}",
        outcome.written,
        outcome.candidates,
        args.format
    );

    Ok(())
}

/// Resolves relative output paths against the current directory.
fn ensure_absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("cannot determine current directory")?;
    Ok(cwd.join(path))
}

/// Shows `path` relative to the current directory when it lies below it.
fn display_path(path: &Path) -> String {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf))
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_absolute_keeps_absolute() {
        let path = std::env::temp_dir().join("out.json");
        assert_eq!(ensure_absolute(&path).unwrap(), path);
    }

    #[test]
    fn test_ensure_absolute_joins_cwd() {
        let resolved = ensure_absolute(Path::new("reports")).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("reports"));
    }

    #[test]
    fn test_display_path_relative_to_cwd() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(
            display_path(&cwd.join("a").join("b.csv")),
            Path::new("a").join("b.csv").display().to_string()
        );
    }
}
