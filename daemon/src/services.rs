//! OS service listing (systemd)

use crate::error::ServiceError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub unit: String,
    pub load: String,
    pub active: String,
    pub sub: String,
    pub description: String,
}

/// Parses `systemctl list-units` tabular output. The header row, blank lines,
/// the legend after the table and leading status bullets are dropped.
pub fn parse_service_listing(output: &str) -> Vec<ServiceRecord> {
    let mut services = Vec::new();
    for line in output.lines() {
        let line = line.trim().trim_start_matches(['●', '*', '○', '×']).trim_start();
        if line.is_empty() {
            // Everything after the first blank line is the legend.
            if !services.is_empty() {
                break;
            }
            continue;
        }
        if line.starts_with("UNIT ") {
            continue;
        }
        let mut parts = line.split_whitespace();
        let (Some(unit), Some(load), Some(active), Some(sub)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            continue;
        };
        if !unit.contains('.') {
            continue;
        }
        services.push(ServiceRecord {
            unit: unit.to_string(),
            load: load.to_string(),
            active: active.to_string(),
            sub: sub.to_string(),
            description: parts.collect::<Vec<_>>().join(" "),
        });
    }
    services
}

#[cfg(unix)]
pub async fn list_services(timeout: Duration) -> Result<Vec<ServiceRecord>, ServiceError> {
    use std::process::Stdio;
    use tokio::process::Command;

    let child = Command::new("systemctl")
        .args(["list-units", "--type=service", "--all", "--no-pager", "--plain"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(ServiceError::Spawn)?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| ServiceError::Timeout { timeout })?
        .map_err(ServiceError::Spawn)?;

    if !output.status.success() {
        return Err(ServiceError::CommandFailed {
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(parse_service_listing(&String::from_utf8_lossy(&output.stdout)))
}

#[cfg(not(unix))]
pub async fn list_services(_timeout: Duration) -> Result<Vec<ServiceRecord>, ServiceError> {
    Err(ServiceError::UnsupportedPlatform {
        os: std::env::consts::OS,
    })
}
