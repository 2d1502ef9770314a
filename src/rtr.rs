//! Real-time-response (RTR) session management and command polling.
//!
//! The remote-script workflow is a strictly serial per-device sequence:
//!
//! 1. [`init_session`] — open a vendor-managed channel to one device.
//! 2. [`execute_admin_command`] — submit a command; returns a cloud request
//!    ID, the asynchronous job handle.
//! 3. [`poll_command`] — poll the command status a bounded number of times.
//! 4. [`delete_session`] — explicit teardown.
//!
//! Polling is deliberately forgiving: exceeding the attempt limit is *not*
//! an error. The command may still complete on the device afterwards, so
//! the loop returns [`PollOutcome::TimedOut`] with the last observed status
//! and leaves the interpretation to the caller ("unknown outcome", never
//! "failure").

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::client::FalconClient;
use crate::error::{FalconError, Result};

// ── Request / response types ───────────────────────────────────────────

/// Request body for session initialization.
#[derive(Debug, Serialize)]
struct InitSessionBody<'a> {
    device_id: &'a str,
    queue_offline: bool,
}

/// An open RTR session, bound to one device.
#[derive(Debug, Clone, Deserialize)]
pub struct RtrSession {
    /// Session identifier used for command execution and teardown.
    pub session_id: String,

    /// Cloud scripts available to this session. Opaque to these tools.
    #[serde(default)]
    pub scripts: Vec<serde_json::Value>,
}

/// Request body for admin-command execution.
#[derive(Debug, Serialize)]
struct ExecCommandBody<'a> {
    base_command: &'a str,
    command_string: &'a str,
    session_id: &'a str,
}

/// An in-flight command, identified by its cloud request ID.
#[derive(Debug, Clone, Deserialize)]
pub struct RtrCommand {
    /// Handle used to poll the command's status.
    pub cloud_request_id: String,

    /// The session the command is running in, when echoed back.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// One status snapshot of an in-flight command.
#[derive(Debug, Clone, Deserialize)]
pub struct RtrCommandStatus {
    /// Whether the command has finished executing on the device.
    #[serde(default)]
    pub complete: bool,

    /// Captured standard output, available once the command completes.
    #[serde(default)]
    pub stdout: String,

    /// Captured standard error.
    #[serde(default)]
    pub stderr: String,
}

// ── Polling configuration ──────────────────────────────────────────────

/// Controls the bounded status-poll loop for an in-flight RTR command.
///
/// Defaults match the production pacing: 2 seconds between attempts and at
/// most 7 attempts (one initial check plus 6 retries). Exceeding the limit
/// is not an error; see [`PollOutcome::TimedOut`].
#[derive(Clone)]
pub struct PollConfig {
    /// Delay between consecutive status checks.
    pub interval: Duration,
    /// Total number of status checks before giving up.
    pub max_attempts: u32,
}

impl PollConfig {
    /// Creates a config with an explicit interval and attempt limit.
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        PollConfig {
            interval,
            max_attempts,
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig {
            interval: Duration::from_secs(2),
            max_attempts: 7,
        }
    }
}

/// Result of a bounded poll.
#[derive(Debug)]
pub enum PollOutcome {
    /// The command finished; captured output is attached.
    Completed(RtrCommandStatus),
    /// The attempt limit was reached without completion. The command's
    /// actual state on the device is unknown. Carries the last observed
    /// status (if any poll returned a resource) for diagnostics.
    TimedOut(Option<RtrCommandStatus>),
}

// ── Endpoint functions ─────────────────────────────────────────────────

/// Opens an RTR session against a single device.
///
/// # Errors
///
/// - `FalconError::Api` — non-2xx status (e.g. the device is offline and
///   offline queueing is disabled), or a 2xx response with no session in
///   `resources`.
pub async fn init_session(client: &FalconClient, device_id: &str) -> Result<RtrSession> {
    let body = InitSessionBody {
        device_id,
        queue_offline: false,
    };
    let resp = client
        .post::<_, RtrSession>("/real-time-response/entities/sessions/v1", &[], &body)
        .await?;
    resp.resources
        .into_iter()
        .next()
        .ok_or_else(|| FalconError::Api {
            status: reqwest::StatusCode::OK,
            message: format!("no session returned for device {device_id}"),
        })
}

/// Submits an admin command (e.g. `runscript`) on an open session.
/// Returns the cloud request ID used to poll for completion. A session
/// holds at most one in-flight command.
pub async fn execute_admin_command(
    client: &FalconClient,
    session_id: &str,
    base_command: &str,
    command_string: &str,
) -> Result<RtrCommand> {
    let body = ExecCommandBody {
        base_command,
        command_string,
        session_id,
    };
    let resp = client
        .post::<_, RtrCommand>("/real-time-response/entities/admin-command/v1", &[], &body)
        .await?;
    resp.resources
        .into_iter()
        .next()
        .ok_or_else(|| FalconError::Api {
            status: reqwest::StatusCode::OK,
            message: format!("no command returned for session {session_id}"),
        })
}

/// Polls an in-flight command until it completes or the attempt limit is
/// reached.
///
/// Each attempt fetches the status with `sequence_id=0` and checks the
/// `complete` flag on the first result entry. Attempts are separated by
/// `config.interval`; no delay follows the final attempt.
///
/// # Errors
///
/// Only transport/API errors are returned. Reaching the attempt limit is a
/// normal outcome ([`PollOutcome::TimedOut`]), not an error.
pub async fn poll_command(
    client: &FalconClient,
    cloud_request_id: &str,
    config: &PollConfig,
) -> Result<PollOutcome> {
    let query = [
        ("cloud_request_id", cloud_request_id.to_string()),
        ("sequence_id", "0".to_string()),
    ];

    let mut last: Option<RtrCommandStatus> = None;
    for attempt in 1..=config.max_attempts {
        let resp = client
            .get::<RtrCommandStatus>("/real-time-response/entities/admin-command/v1", &query)
            .await?;

        if let Some(status) = resp.resources.into_iter().next() {
            if status.complete {
                return Ok(PollOutcome::Completed(status));
            }
            last = Some(status);
        }

        tracing::debug!(
            cloud_request_id,
            attempt,
            max = config.max_attempts,
            "command not complete yet"
        );

        if attempt < config.max_attempts {
            tokio::time::sleep(config.interval).await;
        }
    }

    tracing::warn!(
        cloud_request_id,
        attempts = config.max_attempts,
        "gave up polling; command outcome unknown"
    );
    Ok(PollOutcome::TimedOut(last))
}

/// Tears down an RTR session. Callers in the per-device loop treat a
/// failure here as non-fatal and continue with the next device.
pub async fn delete_session(client: &FalconClient, session_id: &str) -> Result<()> {
    let query = [("session_id", session_id.to_string())];
    client
        .delete::<serde_json::Value>("/real-time-response/entities/sessions/v1", &query)
        .await?;
    Ok(())
}

/// Builds the `runscript` command line for a cloud-stored script and its
/// parameter string. The double space before `-CommandLine` matches the
/// vendor's documented invocation format.
pub fn runscript_command_line(script: &str, params: &str) -> String {
    format!("runscript -CloudFile=\"{script}\"  -CommandLine=\"{params}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_deserializes_from_init_response() {
        let json = r#"{
            "session_id": "5d914e0e-0093-4d2c-8b2c-73a7a2d3e9b4",
            "scripts": [{"command": "runscript"}],
            "existing_aid_sessions": 1
        }"#;
        let session: RtrSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.session_id, "5d914e0e-0093-4d2c-8b2c-73a7a2d3e9b4");
        assert_eq!(session.scripts.len(), 1);
    }

    #[test]
    fn command_deserializes_cloud_request_id() {
        let json = r#"{
            "cloud_request_id": "req-abc-123",
            "session_id": "sess-1",
            "queued_command_offline": false
        }"#;
        let cmd: RtrCommand = serde_json::from_str(json).unwrap();
        assert_eq!(cmd.cloud_request_id, "req-abc-123");
        assert_eq!(cmd.session_id.as_deref(), Some("sess-1"));
    }

    #[test]
    fn command_status_defaults_when_incomplete() {
        // An in-flight command may report only the complete flag.
        let status: RtrCommandStatus = serde_json::from_str(r#"{"complete": false}"#).unwrap();
        assert!(!status.complete);
        assert!(status.stdout.is_empty());
        assert!(status.stderr.is_empty());
    }

    #[test]
    fn command_status_carries_captured_output() {
        let json = r#"{
            "complete": true,
            "stdout": "C:\\Users\\admin",
            "stderr": "warning: slow disk"
        }"#;
        let status: RtrCommandStatus = serde_json::from_str(json).unwrap();
        assert!(status.complete);
        assert_eq!(status.stdout, "C:\\Users\\admin");
        assert_eq!(status.stderr, "warning: slow disk");
    }

    #[test]
    fn poll_config_default_matches_production_pacing() {
        let config = PollConfig::default();
        assert_eq!(config.interval, Duration::from_secs(2));
        assert_eq!(config.max_attempts, 7);
    }

    #[test]
    fn runscript_command_line_format() {
        let line = runscript_command_line("cleanup.ps1", "-Force -Days 30");
        assert_eq!(
            line,
            "runscript -CloudFile=\"cleanup.ps1\"  -CommandLine=\"-Force -Days 30\""
        );
    }

    #[test]
    fn runscript_command_line_empty_params() {
        let line = runscript_command_line("inventory.sh", "");
        assert_eq!(line, "runscript -CloudFile=\"inventory.sh\"  -CommandLine=\"\"");
    }
}
