//! Pure normalization helpers for raw cluster data
//!
//! Converts Kubernetes resource quantities, timestamps, labels, and image
//! references into the stable textual/numeric forms the rest of the
//! analyzer consumes. Everything here is side-effect free.

use chrono::Duration;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use std::collections::BTreeMap;

/// Label prefix that marks a node role (e.g. `node-role.kubernetes.io/control-plane`)
const ROLE_LABEL_PREFIX: &str = "node-role.kubernetes.io/";

/// Format an elapsed duration as a single coarsest unit
///
/// `"{N}d"` if at least one day, else `"{N}h"`, else `"{N}m"`, else `"{N}s"`.
/// Never combines units (matches kubectl's AGE column behavior).
pub fn format_age(elapsed: Duration) -> String {
    if elapsed.num_days() >= 1 {
        format!("{}d", elapsed.num_days())
    } else if elapsed.num_hours() >= 1 {
        format!("{}h", elapsed.num_hours())
    } else if elapsed.num_minutes() >= 1 {
        format!("{}m", elapsed.num_minutes())
    } else {
        format!("{}s", elapsed.num_seconds().max(0))
    }
}

/// Format a byte count using binary (1024-based) units
///
/// Values under 1024 render as whole bytes with no decimal; everything else
/// gets one decimal place and a binary-prefix suffix.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["Ki", "Mi", "Gi", "Ti", "Pi", "Ei"];

    if bytes < 1024 {
        return format!("{}B", bytes);
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1}{}", value, UNITS[unit])
}

/// Extract node roles from labels
///
/// Every label key carrying the `node-role.kubernetes.io/` prefix contributes
/// its suffix as a role name, comma-joined in encounter order. Nodes without
/// any role label are workers.
pub fn extract_roles(labels: &BTreeMap<String, String>) -> String {
    let roles: Vec<&str> = labels
        .keys()
        .filter_map(|key| key.strip_prefix(ROLE_LABEL_PREFIX))
        .filter(|role| !role.is_empty())
        .collect();

    if roles.is_empty() {
        "worker".to_string()
    } else {
        roles.join(",")
    }
}

/// Extract a version tag from a container image reference
///
/// The substring after the last colon is the tag. `latest` (and an absent
/// tag) means the version is unknown and must not be reported as real.
pub fn version_from_image(image: &str) -> Option<String> {
    let tag = image.rsplit(':').next()?;
    // No colon at all means rsplit returned the whole image reference
    if tag == image || tag == "latest" || tag.is_empty() {
        return None;
    }
    // A colon inside a registry port (e.g. "registry:5000/app") is not a tag
    if tag.contains('/') {
        return None;
    }
    Some(tag.to_string())
}

/// Parse a CPU quantity into millicores
///
/// Handles plain cores (`"2"`, `"0.5"`) and the `m` suffix (`"250m"`).
/// Unparsable input defaults to 0 rather than propagating an error.
pub fn parse_cpu_millis(quantity: &Quantity) -> i64 {
    let raw = quantity.0.trim();
    if let Some(millis) = raw.strip_suffix('m') {
        return millis.parse::<i64>().unwrap_or(0);
    }
    raw.parse::<f64>()
        .map(|cores| (cores * 1000.0).round() as i64)
        .unwrap_or(0)
}

/// Parse a memory quantity into bytes
///
/// Handles binary suffixes (`Ki`, `Mi`, `Gi`, `Ti`), decimal suffixes
/// (`k`, `M`, `G`, `T`), and plain byte counts. Unparsable input defaults
/// to 0.
pub fn parse_memory_bytes(quantity: &Quantity) -> u64 {
    let raw = quantity.0.trim();

    let suffixes: &[(&str, u64)] = &[
        ("Ki", 1 << 10),
        ("Mi", 1 << 20),
        ("Gi", 1 << 30),
        ("Ti", 1u64 << 40),
        ("Pi", 1u64 << 50),
        ("k", 1_000),
        ("M", 1_000_000),
        ("G", 1_000_000_000),
        ("T", 1_000_000_000_000),
    ];

    for (suffix, multiplier) in suffixes {
        if let Some(value) = raw.strip_suffix(suffix) {
            return value
                .parse::<f64>()
                .map(|v| (v * *multiplier as f64) as u64)
                .unwrap_or(0);
        }
    }

    raw.parse::<u64>().unwrap_or(0)
}

/// Format millicores for display
///
/// Whole-or-fractional cores at one decimal once at least one core,
/// otherwise the raw millicore count.
pub fn format_cpu(millis: i64) -> String {
    if millis >= 1000 {
        format!("{:.1}", millis as f64 / 1000.0)
    } else {
        format!("{}m", millis)
    }
}

/// Parse the numeric part of an API server version field
///
/// Managed platforms report minors like `"25+"`; only the leading digits
/// count. Unparsable input defaults to 0.
pub fn parse_version_component(raw: &str) -> u32 {
    let digits: String = raw.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}
