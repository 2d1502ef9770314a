//! CLI entry point for `retag` — reports devices with no detection history
//! over a date window and marks the safe ones with a fresh grouping tag so
//! they can be moved into a tagging group.
//!
//! Exit codes:
//! - 0: success
//! - 1: runtime error (config, auth failure, API error)
//! - 2: argument validation error (clap handles this automatically)

use std::process::ExitCode;

use chrono::Local;
use clap::Parser;

use falcon_admin::auth::TokenProvider;
use falcon_admin::client::FalconClient;
use falcon_admin::config::Config;
use falcon_admin::detects;
use falcon_admin::error::Result;
use falcon_admin::hosts::{self, TagAction};
use falcon_admin::logging::init_file_logging;
use falcon_admin::retag::{classify, generate_tag, render_table, DateWindow};

const LOG_FILE: &str = "retag.log";

#[derive(Parser)]
#[command(version, about = "Tag devices with no recent detections for group moving")]
struct Cli {
    /// Log API interactions at debug level.
    #[arg(long)]
    debug: bool,

    /// Print the report without applying any tag.
    #[arg(long)]
    dry_run: bool,

    /// Relative lookback window in days. Ignored when --from or --to is given.
    #[arg(short, long, default_value_t = 7)]
    days: i64,

    /// Explicit lower bound (YYYY-MM-DD) for first-seen/last-behavior.
    #[arg(short, long)]
    from: Option<String>,

    /// Explicit upper bound (YYYY-MM-DD). Alone, the lower bound defaults
    /// to 1970-01-01.
    #[arg(short = 't', long)]
    to: Option<String>,

    /// Only consider devices belonging to this host group.
    #[arg(short, long)]
    group: Option<String>,

    /// Path to the configuration file.
    #[arg(long, env = "FALCON_ADMIN_CONFIG")]
    config: Option<std::path::PathBuf>,
}

async fn run(args: &Cli) -> Result<()> {
    let cfg = Config::load(args.config.as_deref())?;

    let today = Local::now().date_naive();
    let window = DateWindow::resolve(args.days, args.from.as_deref(), args.to.as_deref(), today);
    let f_dev = window.device_filter();
    let f_det = window.detection_filter();
    println!("(>) device filter: {f_dev}");
    println!("(>) detection filter: {f_det}");
    tracing::info!(device_filter = %f_dev, detection_filter = %f_det, "resolved date window");

    let tp = TokenProvider::new(&cfg.base_url, &cfg.client_id, &cfg.client_secret);
    let client = FalconClient::with_base_url(tp, &cfg.base_url);

    // Devices first seen in the window, newest first.
    let device_ids =
        hosts::query_devices_by_filter(&client, Some(&f_dev), Some("first_seen.desc")).await?;
    tracing::info!(count = device_ids.len(), "devices in window");
    let devices = hosts::get_device_details(&client, &device_ids).await?;

    // Detections active in the window.
    let detection_ids = detects::query_detects(&client, Some(&f_det), None).await?;
    tracing::info!(count = detection_ids.len(), "detections in window");
    let detections = detects::get_detect_summaries(&client, &detection_ids).await?;

    let report = classify(
        &devices,
        &detections,
        args.group.as_deref(),
        &cfg.tag_namespace,
    );
    println!("{}", render_table(&report.rows));

    let tag = generate_tag(&cfg.tag_namespace, today, &mut rand::rng());
    if args.dry_run {
        println!(
            "(*) Dry run: {} device(s) would be tagged with {tag}",
            report.safe_ids.len()
        );
        return Ok(());
    }

    if report.safe_ids.is_empty() {
        println!("(*) No safe devices to tag");
        return Ok(());
    }

    let tags = vec![tag.clone()];
    let results =
        hosts::update_device_tags(&client, TagAction::Add, &report.safe_ids, &tags).await?;
    tracing::info!(tag = %tag, devices = results.len(), "applied grouping tag");
    println!("(*) You can safely move hosts with tag: {tag}");

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();

    if let Err(e) = init_file_logging(LOG_FILE, args.debug) {
        eprintln!("Warning: {e}");
    }

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "retag run failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_seven_day_lookback() {
        let cli = Cli::try_parse_from(["retag"]).expect("no flags should parse");
        assert_eq!(cli.days, 7);
        assert!(cli.from.is_none());
        assert!(cli.to.is_none());
        assert!(cli.group.is_none());
        assert!(!cli.dry_run);
    }

    #[test]
    fn short_flags_map_to_expected_fields() {
        let cli = Cli::try_parse_from([
            "retag", "-d", "14", "-f", "2026-08-01", "-t", "2026-08-15", "-g", "group-a",
        ])
        .unwrap();
        assert_eq!(cli.days, 14);
        assert_eq!(cli.from.as_deref(), Some("2026-08-01"));
        assert_eq!(cli.to.as_deref(), Some("2026-08-15"));
        assert_eq!(cli.group.as_deref(), Some("group-a"));
    }

    #[test]
    fn dry_run_and_debug_are_long_only() {
        let cli = Cli::try_parse_from(["retag", "--dry-run", "--debug"]).unwrap();
        assert!(cli.dry_run);
        assert!(cli.debug);
    }

    #[test]
    fn non_numeric_days_is_rejected() {
        assert!(Cli::try_parse_from(["retag", "--days", "soon"]).is_err());
    }
}
