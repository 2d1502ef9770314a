//! CLI entry point for `runscript` — executes a cloud-stored script on
//! every device listed in an input file, one real-time-response session at
//! a time.
//!
//! Per device: open a session, submit the `runscript` command, poll for
//! completion (bounded; giving up is not fatal), tear down the session, and
//! pause before the next device to avoid overwhelming the remote-response
//! backend. A teardown failure is reported and the loop continues.
//!
//! Exit codes:
//! - 0: success
//! - 1: missing device file, config error, or API error
//! - 2: argument validation error (clap handles this automatically)

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use falcon_admin::auth::TokenProvider;
use falcon_admin::client::FalconClient;
use falcon_admin::config::Config;
use falcon_admin::error::Result;
use falcon_admin::logging::init_file_logging;
use falcon_admin::rtr::{self, PollConfig, PollOutcome};

const LOG_FILE: &str = "runscript.log";

/// Pause between devices. Pacing for the remote-response backend, not a
/// correctness requirement.
const INTER_DEVICE_DELAY: Duration = Duration::from_secs(2);

#[derive(Parser)]
#[command(version, about = "Run a cloud script on a list of devices via RTR")]
struct Cli {
    /// Log API interactions at debug level.
    #[arg(long)]
    debug: bool,

    /// Print the command per device without opening any session.
    #[arg(long)]
    dry_run: bool,

    /// Name of the cloud-stored script to execute.
    #[arg(short, long)]
    script: String,

    /// Parameter string passed to the script.
    #[arg(short = 'p', long, default_value = "", allow_hyphen_values = true)]
    script_params: String,

    /// Path to a file with one device ID per line.
    #[arg(short, long)]
    devices: std::path::PathBuf,

    /// Path to the configuration file.
    #[arg(long, env = "FALCON_ADMIN_CONFIG")]
    config: Option<std::path::PathBuf>,
}

/// Reads the device-ID list: one ID per line, whitespace-trimmed, blank
/// lines skipped.
fn read_device_ids(path: &std::path::Path) -> std::io::Result<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Runs the script on one device through a full session lifecycle.
/// Returns the session outcome; teardown failures are reported inline and
/// do not fail the device.
async fn run_on_device(client: &FalconClient, device_id: &str, command_line: &str) -> Result<()> {
    let session = rtr::init_session(client, device_id).await?;
    println!("(*) RTR session ID: {}", session.session_id);
    tracing::debug!(device_id, session_id = %session.session_id, "session opened");

    let command =
        rtr::execute_admin_command(client, &session.session_id, "runscript", command_line).await?;
    tracing::debug!(cloud_request_id = %command.cloud_request_id, "command submitted");

    match rtr::poll_command(client, &command.cloud_request_id, &PollConfig::default()).await? {
        PollOutcome::Completed(status) => {
            if !status.stdout.is_empty() {
                println!("{}", status.stdout);
            }
            if !status.stderr.is_empty() {
                eprintln!("{}", status.stderr);
            }
        }
        PollOutcome::TimedOut(last) => {
            // Outcome unknown, not failure: the command may still finish on
            // the device after we stop watching.
            println!("(!) Command still running after poll limit; outcome unknown");
            if let Some(status) = last {
                tracing::warn!(
                    stdout = %status.stdout,
                    stderr = %status.stderr,
                    "last observed command status"
                );
            }
        }
    }

    match rtr::delete_session(client, &session.session_id).await {
        Ok(()) => println!("(*) RTR session successfully deleted"),
        Err(e) => {
            println!("(!) RTR session not deleted: {e}");
            tracing::warn!(session_id = %session.session_id, error = %e, "session teardown failed");
        }
    }

    Ok(())
}

async fn run(args: &Cli) -> Result<()> {
    let cfg = Config::load(args.config.as_deref())?;

    let ids = read_device_ids(&args.devices).map_err(|e| {
        falcon_admin::error::FalconError::Config(format!(
            "cannot read device file {}: {e}",
            args.devices.display()
        ))
    })?;

    let command_line = rtr::runscript_command_line(&args.script, &args.script_params);

    if args.dry_run {
        for device_id in &ids {
            println!("(*) Device ID: {device_id}");
            println!("    would run: {command_line}");
        }
        return Ok(());
    }

    let tp = TokenProvider::new(&cfg.base_url, &cfg.client_id, &cfg.client_secret);
    let client = FalconClient::with_base_url(tp, &cfg.base_url);

    for (i, device_id) in ids.iter().enumerate() {
        println!("(*) Device ID: {device_id}");
        run_on_device(&client, device_id, &command_line).await?;

        if i + 1 < ids.len() {
            tokio::time::sleep(INTER_DEVICE_DELAY).await;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();

    if let Err(e) = init_file_logging(LOG_FILE, args.debug) {
        eprintln!("Warning: {e}");
    }

    if !args.devices.is_file() {
        eprintln!("(!) File does not exist: {}", args.devices.display());
        return ExitCode::FAILURE;
    }

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "runscript run failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
