//! CLI command handlers

use crate::analyzer::{analyze, AnalysisReport};
use crate::config::Config;
use crate::export::csv::{write_csv, CsvDataset};
use crate::export::prometheus::write_metrics;
use crate::export::{
    write_json, ClusterEvent, ClusterMetrics, ExportBundle, NodeMetrics, PodMetrics,
};
use crate::facts::{FactBundle, FactGatherer};
use crate::report::render_table;
use anyhow::Result;
use clap::ValueEnum;
use std::path::Path;

/// Export output formats
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
    Prometheus,
}

/// CSV dataset selection on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DatasetArg {
    NodeMetrics,
    PodMetrics,
    CostAnalysis,
    Utilization,
    Events,
}

impl From<DatasetArg> for CsvDataset {
    fn from(arg: DatasetArg) -> Self {
        match arg {
            DatasetArg::NodeMetrics => CsvDataset::NodeMetrics,
            DatasetArg::PodMetrics => CsvDataset::PodMetrics,
            DatasetArg::CostAnalysis => CsvDataset::CostAnalysis,
            DatasetArg::Utilization => CsvDataset::Utilization,
            DatasetArg::Events => CsvDataset::Events,
        }
    }
}

/// Arguments for the export command
#[derive(Debug)]
pub struct ExportArgs {
    pub format: ExportFormat,
    pub dataset: Option<DatasetArg>,
    pub output_dir: Option<String>,
    pub file: Option<String>,
}

/// Gather, analyze, and print the cluster health report
pub async fn run_analyze(
    client: kube::Client,
    config: &Config,
    recommendations_only: bool,
) -> Result<()> {
    let gatherer = FactGatherer::new(client);
    let bundle = gatherer.gather_all().await;
    let report = analyze(&bundle);

    if !recommendations_only {
        print_facts(&bundle, config);
    }
    print_recommendations(&report);
    Ok(())
}

fn print_facts(bundle: &FactBundle, config: &Config) {
    if let Ok(summary) = &bundle.summary {
        println!("Cluster Summary");
        print!(
            "{}",
            render_table(
                &["Nodes", "Pods", "CPU (cores)", "Memory"],
                &[vec![
                    summary.total_nodes.to_string(),
                    summary.total_pods.to_string(),
                    summary.cpu_cores(),
                    summary.memory_display(),
                ]],
            )
        );
        println!();
    }

    if let Ok(nodes) = &bundle.nodes {
        let rows: Vec<Vec<String>> = nodes
            .iter()
            .map(|n| {
                vec![
                    n.name.clone(),
                    n.status.to_string(),
                    n.roles.clone(),
                    n.age.clone(),
                    n.cpu_capacity.clone(),
                    n.memory_capacity.clone(),
                ]
            })
            .collect();
        println!("Nodes");
        print!(
            "{}",
            render_table(&["Name", "Status", "Roles", "Age", "CPU", "Memory"], &rows)
        );
        println!();
    }

    if let (Ok(pods), false) = (&bundle.pods, config.skip_pod_table) {
        let rows: Vec<Vec<String>> = pods
            .iter()
            .map(|p| {
                vec![
                    p.namespace.clone(),
                    p.name.clone(),
                    p.phase.clone(),
                    p.restarts.to_string(),
                    p.node.clone(),
                ]
            })
            .collect();
        println!("Pods");
        print!(
            "{}",
            render_table(&["Namespace", "Name", "Phase", "Restarts", "Node"], &rows)
        );
        println!();
    }

    if let Ok(components) = &bundle.components {
        let rows: Vec<Vec<String>> = components
            .iter()
            .map(|c| {
                vec![
                    c.namespace.clone(),
                    c.name.clone(),
                    c.version.clone().unwrap_or_else(|| "unknown".to_string()),
                    c.status.clone(),
                    c.source.to_string(),
                ]
            })
            .collect();
        println!("Components");
        print!(
            "{}",
            render_table(
                &["Namespace", "Name", "Version", "Status", "Source"],
                &rows
            )
        );
        println!();
    }

    if let Ok(version) = &bundle.version {
        println!(
            "Platform version: {} ({}.{})\n",
            version.git_version, version.major, version.minor
        );
    }
}

fn print_recommendations(report: &AnalysisReport) {
    if report.recommendations.is_empty() {
        println!("No recommendations - cluster looks healthy");
    } else {
        let rows: Vec<Vec<String>> = report
            .recommendations
            .iter()
            .map(|r| {
                vec![
                    r.severity.to_string(),
                    r.rec_type.clone(),
                    r.title.clone(),
                    r.action.clone(),
                ]
            })
            .collect();
        println!("Recommendations");
        print!(
            "{}",
            render_table(&["Severity", "Type", "Title", "Action"], &rows)
        );
    }

    for skipped in &report.skipped {
        eprintln!(
            "note: {} rules skipped ({})",
            skipped.group, skipped.reason
        );
    }
}

/// Gather facts and write one export file
pub async fn run_export(client: kube::Client, config: &Config, args: ExportArgs) -> Result<()> {
    let gatherer = FactGatherer::new(client);
    let bundle = gatherer.gather_all().await;
    let events = match gatherer.events().await {
        Ok(events) => Some(events),
        Err(e) => {
            tracing::warn!("{}", e);
            None
        }
    };
    let export = build_export_bundle(&bundle, events.as_deref());

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| config.export_dir.clone());
    let output_dir = Path::new(&output_dir);

    let path = match args.format {
        ExportFormat::Json => write_json(&export, output_dir, args.file.as_deref())?,
        ExportFormat::Csv => {
            let dataset = args.dataset.unwrap_or(DatasetArg::NodeMetrics);
            write_csv(&export, dataset.into(), output_dir, args.file.as_deref())?
        }
        ExportFormat::Prometheus => write_metrics(&export, output_dir, args.file.as_deref())?,
    };

    println!("Exported to {}", path.display());
    Ok(())
}

/// Shape the gathered facts into an export bundle
///
/// Only what was actually gathered is populated; usage figures need a
/// metrics pipeline this tool does not run, so they stay at zero.
pub fn build_export_bundle(
    bundle: &FactBundle,
    events: Option<&[crate::facts::EventFact]>,
) -> ExportBundle {
    let mut export = ExportBundle {
        timestamp: Some(chrono::Utc::now()),
        ..Default::default()
    };

    if let Ok(summary) = &bundle.summary {
        export.cluster_metrics = Some(ClusterMetrics {
            total_nodes: summary.total_nodes,
            total_pods: summary.total_pods,
            cpu_capacity_cores: summary.total_cpu_millis as f64 / 1000.0,
            memory_capacity_bytes: summary.total_memory_bytes,
        });
    }

    if let Ok(nodes) = &bundle.nodes {
        export.node_metrics = Some(
            nodes
                .iter()
                .map(|n| NodeMetrics {
                    node: n.name.clone(),
                    status: n.status.to_string(),
                    cpu_usage: 0.0,
                    cpu_usage_percent: 0.0,
                    memory_usage: 0.0,
                    memory_usage_percent: 0.0,
                    cpu_capacity: n.cpu_capacity_millis as f64 / 1000.0,
                    memory_capacity: n.memory_capacity_bytes as f64,
                })
                .collect(),
        );
    }

    if let Ok(pods) = &bundle.pods {
        export.pod_metrics = Some(
            pods.iter()
                .map(|p| PodMetrics {
                    pod: p.name.clone(),
                    namespace: p.namespace.clone(),
                    node: p.node.clone(),
                    cpu_usage: 0.0,
                    memory_usage: 0.0,
                    cpu_requests: 0.0,
                    memory_requests: 0.0,
                    cpu_limits: 0.0,
                    memory_limits: 0.0,
                    restart_count: p.restarts,
                })
                .collect(),
        );
    }

    if let Some(events) = events {
        export.events = Some(events.iter().map(cluster_event).collect());
    }

    export
}

fn cluster_event(event: &crate::facts::EventFact) -> ClusterEvent {
    // Kubernetes events only distinguish Normal from Warning
    let severity = if event.event_type == "Warning" {
        "Medium"
    } else {
        "Low"
    };

    ClusterEvent {
        timestamp: event.timestamp,
        event_type: event.event_type.clone(),
        severity: severity.to_string(),
        reason: event.reason.clone(),
        object: event.object.clone(),
        namespace: event.namespace.clone(),
        message: event.message.clone(),
        count: event.count,
        component: event.component.clone(),
    }
}
