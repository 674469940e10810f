//! # routedeck
//!
//! Terminal dashboard for invoice routing decisions.
//!
//! Fetches classified decisions from the routing backend (or replays a
//! JSONL decision log) and renders cross-filterable aggregation charts.
//!
//! ## Commands
//! - `dash` - Interactive dashboard with keyboard-driven cross-filtering
//! - `summary` - One-shot aggregation summary, as tables or JSON

pub mod summary;
pub mod tui;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use routedeck_core::config::{DashConfig, SourceKind};
use routedeck_core::filters::{FilterKey, Filters};
use routedeck_core::observability;
use routedeck_core::source::{DecisionSource, FileSource, HttpSource};

#[derive(Parser, Debug)]
#[command(name = "routedeck")]
#[command(about = "routedeck - Invoice Routing Decisions Dashboard")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the interactive dashboard
    Dash {
        /// Path to configuration file
        #[arg(short, long, default_value = "configs/routedeck.toml")]
        config: String,

        /// Routing backend base URL (overrides config)
        #[arg(long)]
        base_url: Option<String>,

        /// Read a JSONL decision log instead of calling the backend
        #[arg(long)]
        file: Option<PathBuf>,

        /// Start with a filter applied, e.g. --filter region=EMEA (repeatable)
        #[arg(long = "filter", value_name = "KEY=VALUE")]
        filters: Vec<String>,
    },

    /// Print aggregation tables once and exit
    Summary {
        /// Path to configuration file
        #[arg(short, long, default_value = "configs/routedeck.toml")]
        config: String,

        /// Routing backend base URL (overrides config)
        #[arg(long)]
        base_url: Option<String>,

        /// Read a JSONL decision log instead of calling the backend
        #[arg(long)]
        file: Option<PathBuf>,

        /// Filter before aggregating, e.g. --filter country=US (repeatable)
        #[arg(long = "filter", value_name = "KEY=VALUE")]
        filters: Vec<String>,

        /// Emit JSON instead of tables
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

/// Main entry point for the dashboard binary
pub fn run() -> anyhow::Result<()> {
    let rt = create_runtime()?;
    rt.block_on(async_main())
}

fn create_runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create runtime: {}", e))
}

async fn async_main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize observability
    let _guards = observability::init_tracing("routedeck");

    match cli.command {
        Commands::Dash {
            config,
            base_url,
            file,
            filters,
        } => {
            let source = build_source(&config, base_url.as_deref(), file.as_deref())?;
            let filters = parse_filter_args(&filters)?;
            info!(source = %source.describe(), "starting dashboard");
            tui::run_dash(source, filters).await
        }
        Commands::Summary {
            config,
            base_url,
            file,
            filters,
            json,
        } => {
            let source = build_source(&config, base_url.as_deref(), file.as_deref())?;
            let filters = parse_filter_args(&filters)?;
            summary::run_summary(source, filters, json).await
        }
    }
}

/// Resolve the decision source from config plus CLI overrides.
///
/// `--file` wins over `--base-url`, which wins over the config file.
fn build_source(
    config_path: &str,
    base_url: Option<&str>,
    file: Option<&Path>,
) -> anyhow::Result<Arc<dyn DecisionSource>> {
    if let Some(path) = file {
        return Ok(Arc::new(FileSource::new(path)));
    }
    if let Some(url) = base_url {
        return Ok(Arc::new(HttpSource::new(url)));
    }

    let config = DashConfig::load(config_path)?;
    match config.data.source {
        SourceKind::File => {
            let path = config.data.decisions_file.ok_or_else(|| {
                anyhow::anyhow!(
                    "data.source = \"file\" requires data.decisions_file in {}",
                    config_path
                )
            })?;
            Ok(Arc::new(FileSource::new(path)))
        }
        SourceKind::Http => Ok(Arc::new(HttpSource::new(config.backend.base_url))),
    }
}

/// Parse repeated `--filter key=value` arguments into a validated set.
fn parse_filter_args(args: &[String]) -> anyhow::Result<Filters> {
    let mut filters = Filters::new();
    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("invalid filter '{}': expected key=value", arg))?;
        let key: FilterKey = key.trim().parse()?;
        filters.set(key, value.trim())?;
    }
    Ok(filters)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_dash_with_overrides() {
        let cli = Cli::try_parse_from([
            "routedeck",
            "dash",
            "--base-url",
            "http://staging:9000",
            "--filter",
            "region=EMEA",
            "--filter",
            "confidence_band=high",
        ])
        .unwrap();

        match cli.command {
            Commands::Dash {
                base_url,
                file,
                filters,
                ..
            } => {
                assert_eq!(base_url.as_deref(), Some("http://staging:9000"));
                assert!(file.is_none());
                assert_eq!(filters, vec!["region=EMEA", "confidence_band=high"]);
            }
            other => panic!("expected dash command, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_parses_summary_json() {
        let cli = Cli::try_parse_from([
            "routedeck",
            "summary",
            "--file",
            "out/decisions.jsonl",
            "--json",
        ])
        .unwrap();

        match cli.command {
            Commands::Summary { file, json, .. } => {
                assert_eq!(file.as_deref(), Some(Path::new("out/decisions.jsonl")));
                assert!(json);
            }
            other => panic!("expected summary command, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_filter_args() {
        let filters = parse_filter_args(&[
            "country=US".to_string(),
            "confidence_band=high".to_string(),
        ])
        .unwrap();

        assert_eq!(
            filters.active(),
            vec![
                (FilterKey::Country, "US".to_string()),
                (FilterKey::ConfidenceBand, "high".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_filter_args_rejects_bad_shape() {
        let err = parse_filter_args(&["region".to_string()]).unwrap_err();
        assert!(err.to_string().contains("key=value"));
    }

    #[test]
    fn test_parse_filter_args_rejects_unknown_key() {
        let err = parse_filter_args(&["vendor=ACME".to_string()]).unwrap_err();
        assert!(err.to_string().contains("vendor"));
    }

    #[test]
    fn test_build_source_file_override_wins() {
        let source = build_source(
            "configs/absent.toml",
            Some("http://ignored:1"),
            Some(Path::new("out/decisions.jsonl")),
        )
        .unwrap();
        assert_eq!(source.describe(), "file:out/decisions.jsonl");
    }

    #[test]
    fn test_build_source_base_url_override() {
        let source =
            build_source("configs/absent.toml", Some("http://staging:9000"), None).unwrap();
        assert_eq!(source.describe(), "http://staging:9000");
    }

    #[test]
    fn test_build_source_defaults_to_local_backend() {
        let source = build_source("configs/absent.toml", None, None).unwrap();
        assert_eq!(source.describe(), "http://localhost:8000");
    }

    #[test]
    fn test_build_source_file_kind_requires_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routedeck.toml");
        std::fs::write(&path, "[data]\nsource = \"file\"\n").unwrap();

        // `Arc<dyn DecisionSource>` has no Debug impl, so take the error side
        // without `unwrap_err`.
        let err = build_source(path.to_str().unwrap(), None, None)
            .err()
            .expect("file source without decisions_file should be rejected");
        assert!(err.to_string().contains("decisions_file"));
    }

    #[test]
    fn test_build_source_honors_config_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routedeck.toml");
        std::fs::write(
            &path,
            "[data]\nsource = \"file\"\ndecisions_file = \"out/decisions.jsonl\"\n",
        )
        .unwrap();

        let source = build_source(path.to_str().unwrap(), None, None).unwrap();
        assert_eq!(source.describe(), "file:out/decisions.jsonl");
    }
}
