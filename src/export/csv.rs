//! Per-dataset CSV rendering
//!
//! One dataset per call, each with its fixed header row. Floats are
//! formatted to two decimal places, integers as plain decimal. Cost
//! analysis renders as two titled blocks separated by a blank row.

use crate::export::{resolve_target, ClusterEvent, CostAnalysis, ExportBundle, ExportError};
use std::path::{Path, PathBuf};

/// Datasets exportable as CSV
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvDataset {
    NodeMetrics,
    PodMetrics,
    CostAnalysis,
    Utilization,
    Events,
}

impl CsvDataset {
    /// Dataset name used in default filenames
    pub fn name(&self) -> &'static str {
        match self {
            CsvDataset::NodeMetrics => "node-metrics",
            CsvDataset::PodMetrics => "pod-metrics",
            CsvDataset::CostAnalysis => "cost-analysis",
            CsvDataset::Utilization => "utilization",
            CsvDataset::Events => "events",
        }
    }
}

/// Write one dataset from the bundle as CSV
pub fn write_csv(
    bundle: &ExportBundle,
    dataset: CsvDataset,
    output_dir: &Path,
    filename: Option<&str>,
) -> Result<PathBuf, ExportError> {
    let path = resolve_target(output_dir, filename, dataset.name(), "csv")?;
    let contents = render_csv(bundle, dataset).map_err(|e| ExportError {
        path: path.clone(),
        source: e,
    })?;
    std::fs::write(&path, contents).map_err(|e| ExportError {
        path: path.clone(),
        source: anyhow::Error::new(e).context("Failed to write CSV export"),
    })?;
    tracing::info!("Wrote {} CSV to {}", dataset.name(), path.display());
    Ok(path)
}

/// Render one dataset from the bundle as a CSV string
pub fn render_csv(bundle: &ExportBundle, dataset: CsvDataset) -> anyhow::Result<String> {
    match dataset {
        CsvDataset::NodeMetrics => {
            let rows = bundle
                .node_metrics
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("Bundle has no node metrics"))?;
            let mut out = String::from(
                "Node,Status,CPU_Usage,CPU_Usage_Percent,Memory_Usage,Memory_Usage_Percent,CPU_Capacity,Memory_Capacity\n",
            );
            for row in rows {
                out.push_str(&format!(
                    "{},{},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2}\n",
                    escape(&row.node),
                    escape(&row.status),
                    row.cpu_usage,
                    row.cpu_usage_percent,
                    row.memory_usage,
                    row.memory_usage_percent,
                    row.cpu_capacity,
                    row.memory_capacity,
                ));
            }
            Ok(out)
        }
        CsvDataset::PodMetrics => {
            let rows = bundle
                .pod_metrics
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("Bundle has no pod metrics"))?;
            let mut out = String::from(
                "Pod,Namespace,Node,CPU_Usage,Memory_Usage,CPU_Requests,Memory_Requests,CPU_Limits,Memory_Limits,Restart_Count\n",
            );
            for row in rows {
                out.push_str(&format!(
                    "{},{},{},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{}\n",
                    escape(&row.pod),
                    escape(&row.namespace),
                    escape(&row.node),
                    row.cpu_usage,
                    row.memory_usage,
                    row.cpu_requests,
                    row.memory_requests,
                    row.cpu_limits,
                    row.memory_limits,
                    row.restart_count,
                ));
            }
            Ok(out)
        }
        CsvDataset::CostAnalysis => {
            let costs = bundle
                .cost_analysis
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("Bundle has no cost analysis"))?;
            Ok(render_cost_csv(costs))
        }
        CsvDataset::Utilization => {
            let rows = bundle
                .utilizations
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("Bundle has no utilization data"))?;
            let mut out = String::from(
                "Type,Name,Namespace,CPU_Utilization,Memory_Utilization,Recommendation\n",
            );
            for row in rows {
                out.push_str(&format!(
                    "{},{},{},{:.2},{:.2},{}\n",
                    escape(&row.resource_type),
                    escape(&row.name),
                    escape(&row.namespace),
                    row.cpu_utilization,
                    row.memory_utilization,
                    escape(&row.recommendation),
                ));
            }
            Ok(out)
        }
        CsvDataset::Events => {
            let rows = bundle
                .events
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("Bundle has no events"))?;
            let mut out = String::from(
                "Timestamp,Type,Severity,Reason,Object,Namespace,Message,Count,Component\n",
            );
            for row in rows {
                out.push_str(&event_row(row));
            }
            Ok(out)
        }
    }
}

/// Cost analysis block layout
///
/// Two titled blocks sharing one header row: the marker for node costs,
/// the header, the node rows, one blank row, the namespace marker, then
/// the namespace rows.
fn render_cost_csv(costs: &CostAnalysis) -> String {
    let mut out = String::from("=== Node Costs ===\n");
    out.push_str("Name,CPU_Cost,Memory_Cost,Total_Cost\n");
    for entry in &costs.node_costs {
        out.push_str(&format!(
            "{},{:.2},{:.2},{:.2}\n",
            escape(&entry.name),
            entry.cpu_cost,
            entry.memory_cost,
            entry.total_cost,
        ));
    }
    out.push('\n');
    out.push_str("=== Namespace Costs ===\n");
    for entry in &costs.namespace_costs {
        out.push_str(&format!(
            "{},{:.2},{:.2},{:.2}\n",
            escape(&entry.name),
            entry.cpu_cost,
            entry.memory_cost,
            entry.total_cost,
        ));
    }
    out
}

fn event_row(event: &ClusterEvent) -> String {
    let timestamp = event
        .timestamp
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default();
    format!(
        "{},{},{},{},{},{},{},{},{}\n",
        timestamp,
        escape(&event.event_type),
        escape(&event.severity),
        escape(&event.reason),
        escape(&event.object),
        escape(&event.namespace),
        escape(&event.message),
        event.count,
        escape(&event.component),
    )
}

/// Quote a field when it would break the row shape
fn escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{CostEntry, NodeMetrics, ResourceUtilization};

    fn node_row(name: &str) -> NodeMetrics {
        NodeMetrics {
            node: name.to_string(),
            status: "Ready".to_string(),
            cpu_usage: 0.5,
            cpu_usage_percent: 12.5,
            memory_usage: 2.0,
            memory_usage_percent: 25.0,
            cpu_capacity: 4.0,
            memory_capacity: 16.0,
        }
    }

    #[test]
    fn test_node_metrics_header_and_row_count() {
        let bundle = ExportBundle {
            node_metrics: Some(vec![node_row("a"), node_row("b"), node_row("c")]),
            ..Default::default()
        };
        let csv = render_csv(&bundle, CsvDataset::NodeMetrics).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "Node,Status,CPU_Usage,CPU_Usage_Percent,Memory_Usage,Memory_Usage_Percent,CPU_Capacity,Memory_Capacity"
        );
        assert_eq!(lines[1], "a,Ready,0.50,12.50,2.00,25.00,4.00,16.00");
    }

    #[test]
    fn test_cost_csv_block_arithmetic() {
        let entry = |name: &str| CostEntry {
            name: name.to_string(),
            cpu_cost: 10.0,
            memory_cost: 5.5,
            total_cost: 15.5,
        };
        let bundle = ExportBundle {
            cost_analysis: Some(CostAnalysis {
                node_costs: vec![entry("node-1"), entry("node-2")],
                namespace_costs: vec![entry("default")],
            }),
            ..Default::default()
        };

        let csv = render_csv(&bundle, CsvDataset::CostAnalysis).unwrap();
        let lines: Vec<&str> = csv.split('\n').collect();
        // 2 markers + 1 header + 3 records + 1 blank separator + trailing newline split
        assert_eq!(lines[0], "=== Node Costs ===");
        assert_eq!(lines[1], "Name,CPU_Cost,Memory_Cost,Total_Cost");
        assert_eq!(lines[2], "node-1,10.00,5.50,15.50");
        assert_eq!(lines[4], "");
        assert_eq!(lines[5], "=== Namespace Costs ===");
        assert_eq!(lines[6], "default,10.00,5.50,15.50");

        let non_empty = csv.lines().filter(|l| !l.is_empty()).count();
        let blanks = csv.lines().filter(|l| l.is_empty()).count();
        assert_eq!(non_empty, 3 + 1 + 2); // records + header + markers
        assert_eq!(blanks, 1);
    }

    #[test]
    fn test_utilization_header_exact() {
        let bundle = ExportBundle {
            utilizations: Some(vec![ResourceUtilization {
                resource_type: "Deployment".to_string(),
                name: "web".to_string(),
                namespace: "default".to_string(),
                cpu_utilization: 45.0,
                memory_utilization: 80.125,
                recommendation: "Right-size memory".to_string(),
            }]),
            ..Default::default()
        };
        let csv = render_csv(&bundle, CsvDataset::Utilization).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "Type,Name,Namespace,CPU_Utilization,Memory_Utilization,Recommendation"
        );
        // 80.125 is exact in binary and rounds half to even
        assert_eq!(lines[1], "Deployment,web,default,45.00,80.12,Right-size memory");
    }

    #[test]
    fn test_events_timestamp_profile_and_escaping() {
        use chrono::TimeZone;
        let bundle = ExportBundle {
            events: Some(vec![ClusterEvent {
                timestamp: Some(chrono::Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap()),
                event_type: "Warning".to_string(),
                severity: "Medium".to_string(),
                reason: "FailedScheduling".to_string(),
                object: "Pod/web-1".to_string(),
                namespace: "default".to_string(),
                message: "0/3 nodes available, taints".to_string(),
                count: 4,
                component: "scheduler".to_string(),
            }]),
            ..Default::default()
        };
        let csv = render_csv(&bundle, CsvDataset::Events).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("2024-06-01 12:30:00,Warning,Medium,FailedScheduling"));
        // Message with a comma is quoted so the row keeps nine fields
        assert!(lines[1].contains("\"0/3 nodes available, taints\""));
    }

    #[test]
    fn test_missing_dataset_is_an_error() {
        let bundle = ExportBundle::default();
        assert!(render_csv(&bundle, CsvDataset::PodMetrics).is_err());
    }
}
