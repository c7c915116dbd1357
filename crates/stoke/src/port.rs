//! Port availability probing.

use anyhow::{bail, Result};
use tokio::net::TcpListener;
use tokio::process::Command;

/// Find the next free port at or above `desired` on `host`.
///
/// The desired port itself is returned when a bind probe succeeds. Runs
/// before the real listener binds, so a small race window exists; the
/// launcher handles a failed bind by logging and stopping.
pub async fn resolve_port(host: &str, desired: u16) -> Result<u16> {
    let mut candidate = desired;
    loop {
        if TcpListener::bind((host, candidate)).await.is_ok() {
            return Ok(candidate);
        }
        match candidate.checked_add(1) {
            Some(next) => candidate = next,
            None => bail!("No free port found at or above {desired} on {host}"),
        }
    }
}

/// Best-effort lookup of whatever is listening on `port`.
///
/// Shells out to `lsof`; returns None when that is unavailable or finds
/// nothing. Diagnostic text only.
pub async fn process_for_port(port: u16) -> Option<String> {
    let output = Command::new("lsof")
        .args(["-i", &format!(":{port}"), "-P", "-n", "-sTCP:LISTEN", "-Fcp"])
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    parse_lsof_fields(&String::from_utf8_lossy(&output.stdout))
}

fn parse_lsof_fields(raw: &str) -> Option<String> {
    let mut pid = None;
    let mut command = None;
    for line in raw.lines() {
        if let Some(rest) = line.strip_prefix('p') {
            pid.get_or_insert_with(|| rest.to_string());
        } else if let Some(rest) = line.strip_prefix('c') {
            command.get_or_insert_with(|| rest.to_string());
        }
    }
    Some(format!("{} (pid {})", command?, pid?))
}
