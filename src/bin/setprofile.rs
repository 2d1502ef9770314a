//! CLI entry point for `setprofile` — assigns a configured role profile to
//! a single user or to every row of a CSV file.
//!
//! Per user: resolve the username to its UUID, revoke every currently held
//! role, grant the profile's role set, then re-fetch and display the
//! result. `--dry-run` performs the lookups and prints but skips both the
//! revoke and the grant.
//!
//! CSV rows are `username,profile` with no header. A malformed row is
//! reported and skipped; the run continues with the remaining rows.

use std::process::ExitCode;

use clap::Parser;

use falcon_admin::auth::TokenProvider;
use falcon_admin::client::FalconClient;
use falcon_admin::config::Config;
use falcon_admin::error::{FalconError, Result};
use falcon_admin::logging::init_file_logging;
use falcon_admin::users;

const LOG_FILE: &str = "setprofile.log";

#[derive(Parser)]
#[command(version, about = "Assign a permission-role profile to user accounts")]
struct Cli {
    /// Log API interactions at debug level.
    #[arg(long)]
    debug: bool,

    /// Look everything up and print, but change no roles.
    #[arg(long)]
    dry_run: bool,

    /// Username (email) to update. Mutually exclusive with --csv-file in
    /// effect: the CSV wins when both are given.
    #[arg(short, long)]
    user: Option<String>,

    /// Profile to assign. Must be configured; defaults to the configured
    /// default profile.
    #[arg(short, long)]
    profile: Option<String>,

    /// CSV file with one `username,profile` row per user, no header.
    #[arg(short = 'f', long)]
    csv_file: Option<std::path::PathBuf>,

    /// Path to the configuration file.
    #[arg(long, env = "FALCON_ADMIN_CONFIG")]
    config: Option<std::path::PathBuf>,
}

/// Applies one profile to one user: revoke current roles, grant the
/// profile's set, re-fetch for display. Dry-run stops after the lookups.
async fn set_user_profile(
    client: &FalconClient,
    cfg: &Config,
    user: &str,
    profile: &str,
    dry_run: bool,
) -> Result<()> {
    // Validate the profile before touching the user's roles, so a typo
    // cannot strip an account and then fail to re-grant.
    let new_roles = cfg.profile_roles(profile)?;

    println!("(*) Username: {user}");
    let uuids = users::retrieve_user_uuid(client, user).await?;
    let user_uuid = uuids.first().ok_or_else(|| {
        FalconError::Config(format!("no account found for username '{user}'"))
    })?;
    println!("(*) UUID: {user_uuid}");

    let roles = users::get_user_role_ids(client, user_uuid).await?;
    if !roles.is_empty() {
        println!("(*) Current roles: {}", roles.join(", "));
        if !dry_run {
            users::revoke_user_role_ids(client, user_uuid, &roles).await?;
        }
    }

    println!("(*) Profile: {profile}");
    if !dry_run {
        users::grant_user_role_ids(client, user_uuid, new_roles).await?;
        let roles = users::get_user_role_ids(client, user_uuid).await?;
        println!("(*) New roles: {}", roles.join(", "));
    }

    tracing::info!(user, profile, dry_run, "profile applied");
    Ok(())
}

async fn run(args: &Cli) -> Result<()> {
    let cfg = Config::load(args.config.as_deref())?;

    let tp = TokenProvider::new(&cfg.base_url, &cfg.client_id, &cfg.client_secret);
    let client = FalconClient::with_base_url(tp, &cfg.base_url);

    if let Some(csv_path) = &args.csv_file {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(csv_path)
            .map_err(|e| {
                FalconError::Config(format!("cannot read {}: {e}", csv_path.display()))
            })?;

        for (i, record) in reader.records().enumerate() {
            let row = i + 1;
            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("(!) Row {row}: unreadable, skipping ({e})");
                    continue;
                }
            };
            let (user, profile) = match (record.get(0), record.get(1)) {
                (Some(u), Some(p)) if !u.trim().is_empty() && !p.trim().is_empty() => {
                    (u.trim().to_string(), p.trim().to_string())
                }
                _ => {
                    eprintln!("(!) Row {row}: expected 'username,profile', skipping");
                    continue;
                }
            };

            set_user_profile(&client, &cfg, &user, &profile, args.dry_run).await?;
            println!("---");
        }
        return Ok(());
    }

    if let Some(user) = &args.user {
        let profile = args
            .profile
            .clone()
            .or_else(|| cfg.profiles.default.clone())
            .ok_or_else(|| {
                FalconError::Config(
                    "no --profile given and no default profile configured".to_string(),
                )
            })?;
        return set_user_profile(&client, &cfg, user, &profile, args.dry_run).await;
    }

    println!("Error: bad arguments, give --user or --csv-file");
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
            tracing::error!(error = %e, "setprofile run failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
