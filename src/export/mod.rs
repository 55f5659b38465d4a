//! Export rendering for the gathered snapshot
//!
//! Serializes an `ExportBundle` to JSON, per-dataset CSV, or Prometheus
//! metrics-exposition text. Owns filename defaulting and output-directory
//! creation. Every field of the bundle is independently optional; absent
//! fields are omitted from JSON output entirely.

pub mod csv;
pub mod prometheus;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default output directory, created on demand
pub const DEFAULT_EXPORT_DIR: &str = "./exports";

/// An export call failed against the filesystem
///
/// Wraps the target path; aborts only the failing call. A partially
/// written file may remain and is not cleaned up.
#[derive(Debug, Error)]
#[error("export to {} failed: {source}", path.display())]
pub struct ExportError {
    pub path: PathBuf,
    #[source]
    pub source: anyhow::Error,
}

/// Aggregate cluster gauge values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterMetrics {
    pub total_nodes: usize,
    pub total_pods: usize,
    pub cpu_capacity_cores: f64,
    pub memory_capacity_bytes: u64,
}

/// Per-node metric row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeMetrics {
    pub node: String,
    pub status: String,
    pub cpu_usage: f64,
    pub cpu_usage_percent: f64,
    pub memory_usage: f64,
    pub memory_usage_percent: f64,
    pub cpu_capacity: f64,
    pub memory_capacity: f64,
}

/// Per-pod metric row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodMetrics {
    pub pod: String,
    pub namespace: String,
    pub node: String,
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub cpu_requests: f64,
    pub memory_requests: f64,
    pub cpu_limits: f64,
    pub memory_limits: f64,
    pub restart_count: i32,
}

/// One cost line, shared by the node and namespace blocks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostEntry {
    pub name: String,
    pub cpu_cost: f64,
    pub memory_cost: f64,
    pub total_cost: f64,
}

/// Cost analysis: node costs plus namespace costs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostAnalysis {
    pub node_costs: Vec<CostEntry>,
    pub namespace_costs: Vec<CostEntry>,
}

/// Aggregate log findings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogAnalysis {
    pub error_count: usize,
    pub warning_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pods_with_errors: Vec<String>,
}

/// One right-sizing observation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceUtilization {
    pub resource_type: String,
    pub name: String,
    pub namespace: String,
    pub cpu_utilization: f64,
    pub memory_utilization: f64,
    pub recommendation: String,
}

/// One cluster event row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterEvent {
    pub timestamp: Option<DateTime<Utc>>,
    pub event_type: String,
    pub severity: String,
    pub reason: String,
    pub object: String,
    pub namespace: String,
    pub message: String,
    pub count: i32,
    pub component: String,
}

/// The exportable snapshot
///
/// All fields independently optional; what was not gathered is simply
/// absent from the output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_metrics: Option<ClusterMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_metrics: Option<Vec<NodeMetrics>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_metrics: Option<Vec<PodMetrics>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_analysis: Option<CostAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_analysis: Option<LogAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utilizations: Option<Vec<ResourceUtilization>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<ClusterEvent>>,
}

/// Resolve the target path for an export call
///
/// Creates the output directory recursively. A missing filename becomes
/// `<dataset>-<YYYY-MM-DD-HH-MM-SS>.<ext>`; a supplied filename without the
/// right extension gets it appended.
pub fn resolve_target(
    output_dir: &Path,
    filename: Option<&str>,
    dataset: &str,
    extension: &str,
) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(output_dir).map_err(|e| ExportError {
        path: output_dir.to_path_buf(),
        source: anyhow::Error::new(e).context("Failed to create output directory"),
    })?;

    let name = match filename {
        Some(name) => default_extension(name, extension),
        None => format!(
            "{}-{}.{}",
            dataset,
            Utc::now().format("%Y-%m-%d-%H-%M-%S"),
            extension
        ),
    };
    Ok(output_dir.join(name))
}

fn default_extension(filename: &str, extension: &str) -> String {
    let suffix = format!(".{}", extension);
    if filename.ends_with(&suffix) {
        filename.to_string()
    } else {
        format!("{}{}", filename, suffix)
    }
}

/// Write the whole bundle as two-space-indented JSON
pub fn write_json(
    bundle: &ExportBundle,
    output_dir: &Path,
    filename: Option<&str>,
) -> Result<PathBuf, ExportError> {
    let path = resolve_target(output_dir, filename, "cluster-report", "json")?;
    let json = render_json(bundle).map_err(|e| ExportError {
        path: path.clone(),
        source: e,
    })?;
    std::fs::write(&path, json).map_err(|e| ExportError {
        path: path.clone(),
        source: anyhow::Error::new(e).context("Failed to write JSON export"),
    })?;
    tracing::info!("Wrote JSON export to {}", path.display());
    Ok(path)
}

/// Render the bundle as a JSON string (two-space indent, trailing newline)
pub fn render_json(bundle: &ExportBundle) -> anyhow::Result<String> {
    let mut json =
        serde_json::to_string_pretty(bundle).context("Failed to encode export bundle")?;
    json.push('\n');
    Ok(json)
}
