//! Metrics-exposition text rendering
//!
//! Emits the standard two-line `# HELP` / `# TYPE` preamble per metric,
//! all gauges, one sample per series with a trailing Unix-second
//! timestamp. Per-node and per-pod series carry the entity name as a
//! label.

use crate::export::{resolve_target, ExportBundle, ExportError};
use chrono::Utc;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Write the bundle's populated metric categories as exposition text
pub fn write_metrics(
    bundle: &ExportBundle,
    output_dir: &Path,
    filename: Option<&str>,
) -> Result<PathBuf, ExportError> {
    let path = resolve_target(output_dir, filename, "cluster-metrics", "prom")?;
    let contents = render_metrics(bundle);
    std::fs::write(&path, contents).map_err(|e| ExportError {
        path: path.clone(),
        source: anyhow::Error::new(e).context("Failed to write metrics export"),
    })?;
    tracing::info!("Wrote metrics export to {}", path.display());
    Ok(path)
}

/// Render the bundle's populated metric categories as exposition text
pub fn render_metrics(bundle: &ExportBundle) -> String {
    let stamp = bundle.timestamp.unwrap_or_else(Utc::now).timestamp();
    let mut out = String::new();

    if let Some(cluster) = &bundle.cluster_metrics {
        gauge(
            &mut out,
            "cluster_nodes_total",
            "Total number of nodes in the cluster",
            &[("", cluster.total_nodes as f64)],
            stamp,
        );
        gauge(
            &mut out,
            "cluster_pods_total",
            "Total number of pods in the cluster",
            &[("", cluster.total_pods as f64)],
            stamp,
        );
        gauge(
            &mut out,
            "cluster_cpu_capacity_cores",
            "Total CPU capacity of the cluster in cores",
            &[("", cluster.cpu_capacity_cores)],
            stamp,
        );
        gauge(
            &mut out,
            "cluster_memory_capacity_bytes",
            "Total memory capacity of the cluster in bytes",
            &[("", cluster.memory_capacity_bytes as f64)],
            stamp,
        );
    }

    if let Some(nodes) = &bundle.node_metrics {
        let cpu: Vec<(String, f64)> = nodes
            .iter()
            .map(|n| (format!("node=\"{}\"", n.node), n.cpu_usage))
            .collect();
        labeled_gauge(&mut out, "node_cpu_usage_cores", "Node CPU usage in cores", &cpu, stamp);

        let memory: Vec<(String, f64)> = nodes
            .iter()
            .map(|n| (format!("node=\"{}\"", n.node), n.memory_usage))
            .collect();
        labeled_gauge(
            &mut out,
            "node_memory_usage_bytes",
            "Node memory usage in bytes",
            &memory,
            stamp,
        );
    }

    if let Some(pods) = &bundle.pod_metrics {
        let restarts: Vec<(String, f64)> = pods
            .iter()
            .map(|p| {
                (
                    format!("pod=\"{}\",namespace=\"{}\"", p.pod, p.namespace),
                    p.restart_count as f64,
                )
            })
            .collect();
        labeled_gauge(
            &mut out,
            "pod_restart_count",
            "Pod container restart count",
            &restarts,
            stamp,
        );
    }

    if let Some(logs) = &bundle.log_analysis {
        gauge(
            &mut out,
            "log_errors_total",
            "Error lines found during log analysis",
            &[("", logs.error_count as f64)],
            stamp,
        );
        gauge(
            &mut out,
            "log_warnings_total",
            "Warning lines found during log analysis",
            &[("", logs.warning_count as f64)],
            stamp,
        );
    }

    out
}

fn gauge(out: &mut String, name: &str, help: &str, samples: &[(&str, f64)], stamp: i64) {
    let owned: Vec<(String, f64)> = samples
        .iter()
        .map(|(labels, value)| (labels.to_string(), *value))
        .collect();
    labeled_gauge(out, name, help, &owned, stamp);
}

/// Emit one metric family: help line, type line, one sample per series
fn labeled_gauge(out: &mut String, name: &str, help: &str, samples: &[(String, f64)], stamp: i64) {
    if samples.is_empty() {
        return;
    }
    let _ = writeln!(out, "# HELP {} {}", name, help);
    let _ = writeln!(out, "# TYPE {} gauge", name);
    for (labels, value) in samples {
        if labels.is_empty() {
            let _ = writeln!(out, "{} {} {}", name, format_value(*value), stamp);
        } else {
            let _ = writeln!(out, "{}{{{}}} {} {}", name, labels, format_value(*value), stamp);
        }
    }
}

/// Integral gauges print without a decimal point, everything else as-is
fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{ClusterMetrics, NodeMetrics};
    use chrono::TimeZone;

    fn bundle() -> ExportBundle {
        ExportBundle {
            timestamp: Some(chrono::Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()),
            cluster_metrics: Some(ClusterMetrics {
                total_nodes: 3,
                total_pods: 42,
                cpu_capacity_cores: 12.0,
                memory_capacity_bytes: 1024,
            }),
            node_metrics: Some(vec![NodeMetrics {
                node: "node-1".to_string(),
                status: "Ready".to_string(),
                cpu_usage: 1.5,
                cpu_usage_percent: 0.0,
                memory_usage: 0.0,
                memory_usage_percent: 0.0,
                cpu_capacity: 4.0,
                memory_capacity: 0.0,
            }]),
            ..Default::default()
        }
    }

    #[test]
    fn test_help_and_type_preamble_per_metric() {
        let text = render_metrics(&bundle());
        assert!(text.contains("# HELP cluster_nodes_total Total number of nodes in the cluster"));
        assert!(text.contains("# TYPE cluster_nodes_total gauge"));
        assert!(text.contains("# TYPE node_cpu_usage_cores gauge"));
    }

    #[test]
    fn test_samples_carry_timestamp_and_labels() {
        let stamp = chrono::Utc
            .with_ymd_and_hms(2024, 6, 1, 0, 0, 0)
            .unwrap()
            .timestamp();
        let text = render_metrics(&bundle());
        assert!(text.contains(&format!("cluster_nodes_total 3 {}", stamp)));
        assert!(text.contains(&format!("node_cpu_usage_cores{{node=\"node-1\"}} 1.5 {}", stamp)));
    }

    #[test]
    fn test_every_sample_line_ends_with_the_timestamp() {
        let text = render_metrics(&bundle());
        for line in text.lines().filter(|l| !l.starts_with('#')) {
            let last = line.rsplit(' ').next().unwrap();
            assert!(last.parse::<i64>().is_ok(), "no trailing timestamp: {}", line);
        }
    }

    #[test]
    fn test_empty_bundle_renders_nothing() {
        assert_eq!(render_metrics(&ExportBundle::default()), "");
    }
}
