//! Date-window filters, tag generation, and safe/unsafe classification for
//! the device retagging workflow.
//!
//! Everything here is pure so the workflow's decision logic can be tested
//! without a mock server. The `retag` binary wires these functions to the
//! API calls in [`crate::hosts`] and [`crate::detects`].
//!
//! Idempotency rule: a device carrying *any* tag under the reserved
//! namespace has already been processed by a previous run and is skipped,
//! so repeated runs against an unchanged fleet tag nothing twice.

use chrono::NaiveDate;
use rand::Rng;
use serde::Serialize;

use crate::detects::DetectionSummary;
use crate::hosts::Device;

/// Lower-bound sentinel used when only an upper bound is given.
const EPOCH_DATE: &str = "1970-01-01";

// ── Date window ────────────────────────────────────────────────────────

/// A resolved date window for the device/detection filters. Bounds are kept
/// as `YYYY-MM-DD` strings because they are passed verbatim into FQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateWindow {
    /// Inclusive lower bound, `YYYY-MM-DD`.
    pub from: String,
    /// Inclusive upper bound. `None` means an open upper bound (the
    /// relative "days ago" form).
    pub to: Option<String>,
}

impl DateWindow {
    /// Resolves the window from CLI arguments.
    ///
    /// Explicit dates take precedence over the relative form:
    /// - only `to` given → `from` defaults to `1970-01-01`;
    /// - `from` given without `to` → `to` defaults to today;
    /// - neither given → lower bound is today minus `days`, no upper bound.
    pub fn resolve(days: i64, from: Option<&str>, to: Option<&str>, today: NaiveDate) -> Self {
        match (from, to) {
            (None, Some(to)) => DateWindow {
                from: EPOCH_DATE.to_string(),
                to: Some(to.to_string()),
            },
            (Some(from), to) => DateWindow {
                from: from.to_string(),
                to: Some(
                    to.map(str::to_string)
                        .unwrap_or_else(|| today.format("%Y-%m-%d").to_string()),
                ),
            },
            (None, None) => DateWindow {
                from: (today - chrono::Duration::days(days))
                    .format("%Y-%m-%d")
                    .to_string(),
                to: None,
            },
        }
    }

    /// FQL filter over the given timestamp field, e.g.
    /// `first_seen:>='2026-08-23'` or
    /// `first_seen:>='2026-08-01'+first_seen:<='2026-08-30'`.
    pub fn filter(&self, field: &str) -> String {
        match &self.to {
            Some(to) => format!("{field}:>='{}'+{field}:<='{to}'", self.from),
            None => format!("{field}:>='{}'", self.from),
        }
    }

    /// Filter on device first-seen timestamps.
    pub fn device_filter(&self) -> String {
        self.filter("first_seen")
    }

    /// Filter on detection last-behavior timestamps.
    pub fn detection_filter(&self) -> String {
        self.filter("last_behavior")
    }
}

// ── Tag generation ─────────────────────────────────────────────────────

const SALT_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const SALT_LEN: usize = 4;

/// Generates a fresh grouping tag: `{namespace}-{YYYYMMDD}-{salt}` where the
/// salt is 4 random lowercase-alphanumeric characters. The salt keeps tags
/// from distinct runs on the same day distinguishable.
pub fn generate_tag<R: Rng>(namespace: &str, today: NaiveDate, rng: &mut R) -> String {
    let salt: String = (0..SALT_LEN)
        .map(|_| SALT_CHARSET[rng.random_range(0..SALT_CHARSET.len())] as char)
        .collect();
    format!("{namespace}-{}-{salt}", today.format("%Y%m%d"))
}

// ── Classification ─────────────────────────────────────────────────────

/// Per-device classification in the report table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    /// No detections in the window; eligible for tagging.
    Safe,
    /// At least one detection references this device.
    Unsafe,
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceStatus::Safe => write!(f, "safe"),
            DeviceStatus::Unsafe => write!(f, "unsafe"),
        }
    }
}

/// One row of the report table.
#[derive(Debug, Clone)]
pub struct ReportRow {
    /// Safe or unsafe classification.
    pub status: DeviceStatus,
    /// Number of detections referencing this device in the window.
    pub detections: usize,
    /// First-seen date (`YYYY-MM-DD`), or empty when unreported.
    pub first_seen: String,
    /// Hostname, or empty when unreported.
    pub hostname: String,
    /// Falcon device identifier.
    pub device_id: String,
}

/// The classification result: the printable rows plus the IDs eligible for
/// tagging.
#[derive(Debug, Default)]
pub struct RetagReport {
    /// One row per considered device, in input order.
    pub rows: Vec<ReportRow>,
    /// Device IDs classified safe, eligible for tagging.
    pub safe_ids: Vec<String>,
}

/// Classifies devices against the detections observed in the window.
///
/// A device is excluded from the report entirely when:
/// - `group` is given and the device is not a member, or
/// - it already carries a tag under `tag_namespace` (processed by a
///   previous run).
///
/// Remaining devices are `Unsafe` when any detection references their
/// device ID, otherwise `Safe` and collected into `safe_ids`.
pub fn classify(
    devices: &[Device],
    detections: &[DetectionSummary],
    group: Option<&str>,
    tag_namespace: &str,
) -> RetagReport {
    let mut report = RetagReport::default();

    for device in devices {
        if let Some(group) = group {
            if !device.groups.iter().any(|g| g == group) {
                continue;
            }
        }

        // Already marked for moving by a previous run.
        if device.tags.iter().any(|t| t.starts_with(tag_namespace)) {
            continue;
        }

        let n_detections = detections
            .iter()
            .filter(|d| {
                d.device
                    .as_ref()
                    .is_some_and(|dev| dev.device_id == device.device_id)
            })
            .count();

        let status = if n_detections > 0 {
            DeviceStatus::Unsafe
        } else {
            report.safe_ids.push(device.device_id.clone());
            DeviceStatus::Safe
        };

        let first_seen = device
            .first_seen
            .as_deref()
            .map(|ts| ts.chars().take(10).collect())
            .unwrap_or_default();

        report.rows.push(ReportRow {
            status,
            detections: n_detections,
            first_seen,
            hostname: device.hostname.clone().unwrap_or_default(),
            device_id: device.device_id.clone(),
        });
    }

    report
}

// ── Table rendering ────────────────────────────────────────────────────

const HEADERS: [&str; 5] = ["Status", "Detections", "First Seen", "Hostname", "Device ID"];

/// Renders the report rows as a column-aligned text table with a header
/// and a dashed separator line.
pub fn render_table(rows: &[ReportRow]) -> String {
    let cells: Vec<[String; 5]> = rows
        .iter()
        .map(|r| {
            [
                r.status.to_string(),
                r.detections.to_string(),
                r.first_seen.clone(),
                r.hostname.clone(),
                r.device_id.clone(),
            ]
        })
        .collect();

    let mut widths: [usize; 5] = [0; 5];
    for (i, h) in HEADERS.iter().enumerate() {
        widths[i] = h.len();
    }
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let mut out = String::new();
    let format_row = |cols: &[String; 5]| -> String {
        cols.iter()
            .enumerate()
            .map(|(i, c)| format!("{:<width$}", c, width = widths[i]))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let header: [String; 5] = HEADERS.map(str::to_string);
    out.push_str(&format_row(&header));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in &cells {
        out.push('\n');
        out.push_str(&format_row(row));
    }

    out
}
