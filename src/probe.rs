//! Live endpoint probing.
//!
//! Probing is read-only by construction: only GET routes without path
//! parameters are ever requested, so a probe can never mutate the system
//! under audit. Requests run concurrently with a fixed bound and a per-request
//! timeout, and no request is retried.

use std::time::Duration;

use futures::{stream, StreamExt};

use crate::audit::types::{AuditKind, Finding, Severity};
use crate::config::AuditConfig;
use crate::extract::Route;

const CONCURRENT_PROBES: usize = 8;
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Routes eligible for probing: GET, no path parameters.
pub fn probe_targets<'r>(routes: &'r [Route]) -> Vec<&'r Route> {
    routes
        .iter()
        .filter(|r| r.method == "GET" && !r.path.contains('{'))
        .collect()
}

/// Probe every eligible route against the configured base URL.
pub fn probe_routes(config: &AuditConfig, routes: &[Route]) -> Vec<Finding> {
    let targets = probe_targets(routes);
    if targets.is_empty() {
        return Vec::new();
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            return vec![Finding::new(
                AuditKind::Endpoints,
                Severity::Info,
                ".",
                0,
                format!("Live probe skipped: could not start async runtime: {}", e),
                "",
            )]
        }
    };

    runtime.block_on(probe_all(config, &targets))
}

async fn probe_all(config: &AuditConfig, targets: &[&Route]) -> Vec<Finding> {
    let client = match reqwest::Client::builder().timeout(PROBE_TIMEOUT).build() {
        Ok(c) => c,
        Err(e) => {
            return vec![Finding::new(
                AuditKind::Endpoints,
                Severity::Info,
                ".",
                0,
                format!("Live probe skipped: could not build HTTP client: {}", e),
                "",
            )]
        }
    };

    stream::iter(targets.iter().map(|route| {
        let client = client.clone();
        let url = format!("{}{}", config.base_url, route.path);
        async move { probe_one(&client, &url, route).await }
    }))
    .buffer_unordered(CONCURRENT_PROBES)
    .filter_map(|f| async move { f })
    .collect()
    .await
}

async fn probe_one(client: &reqwest::Client, url: &str, route: &Route) -> Option<Finding> {
    match client.get(url).send().await {
        Ok(resp) => {
            let status = resp.status();
            if status.is_server_error() {
                Some(Finding::new(
                    AuditKind::Endpoints,
                    Severity::Error,
                    route.file.clone(),
                    route.line,
                    format!("Live GET {} returned {}", route.path, status.as_u16()),
                    "Check the handler for server-side failures",
                ))
            } else if status.as_u16() == 404 {
                Some(Finding::new(
                    AuditKind::Endpoints,
                    Severity::Warning,
                    route.file.clone(),
                    route.line,
                    format!("Live GET {} returned 404; declared route is not served", route.path),
                    "Confirm the route is registered with the running server",
                ))
            } else {
                None
            }
        }
        Err(e) if e.is_timeout() => Some(Finding::new(
            AuditKind::Endpoints,
            Severity::Warning,
            route.file.clone(),
            route.line,
            format!(
                "Live GET {} timed out after {}s",
                route.path,
                PROBE_TIMEOUT.as_secs()
            ),
            "Check server responsiveness under load",
        )),
        Err(e) => Some(Finding::new(
            AuditKind::Endpoints,
            Severity::Warning,
            route.file.clone(),
            route.line,
            format!("Live GET {} failed: server unreachable ({})", route.path, e),
            "Confirm the server is running at the configured base URL",
        )),
    }
}
