// --check-config: resolve, probe, report

use anyhow::{Context, Result};
use sonarqube_sdk::api::system::ConnectivityReport;
use sonarqube_sdk::SonarClient;
use std::io::Write;

/// Probe the backend once and print the report as JSON on `out`.
/// Returns whether the backend answered and accepted the credentials.
pub async fn run(client: &SonarClient, out: &mut impl Write) -> Result<bool> {
    let report = client.check_connectivity().await;
    write_report(&report, out)?;

    if report.is_ok() {
        tracing::info!(base_url = %report.base_url, "Backend reachable");
        Ok(true)
    } else if report.reachable {
        tracing::error!(
            base_url = %report.base_url,
            auth_mode = %report.auth_mode,
            "Backend rejected the credentials: {}",
            report.error.as_deref().unwrap_or("unknown error")
        );
        Ok(false)
    } else {
        tracing::error!(
            base_url = %report.base_url,
            "Backend unreachable: {}",
            report.error.as_deref().unwrap_or("unknown error")
        );
        Ok(false)
    }
}

fn write_report(report: &ConnectivityReport, out: &mut impl Write) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to encode report")?;
    writeln!(out, "{}", json).context("Failed to write report")?;
    Ok(())
}
