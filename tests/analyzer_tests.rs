//! End-to-end analyzer scenarios
//!
//! These exercise the full rule engine over assembled fact bundles,
//! including the failure-isolation contract: a category that could not be
//! gathered contributes no recommendations and is recorded as skipped.

use clusterlens::analyzer::analyze;
use clusterlens::facts::{
    ClusterSummaryFact, ComponentFact, ComponentSource, FactBundle, GatherError, NodeFact,
    NodeStatus, PodFact, VersionFact,
};

fn summary(nodes: usize, pods: usize) -> ClusterSummaryFact {
    ClusterSummaryFact {
        total_nodes: nodes,
        total_pods: pods,
        total_cpu_millis: 4000 * nodes as i64,
        total_memory_bytes: 16 * 1024 * 1024 * 1024 * nodes as u64,
    }
}

fn healthy_node(name: &str) -> NodeFact {
    NodeFact {
        name: name.to_string(),
        status: NodeStatus::Ready,
        roles: "worker".to_string(),
        age: "30d".to_string(),
        cpu_capacity: "4.0".to_string(),
        memory_capacity: "16.0Gi".to_string(),
        cpu_capacity_millis: 4000,
        memory_capacity_bytes: 16 * 1024 * 1024 * 1024,
    }
}

fn running_pod(name: &str) -> PodFact {
    PodFact {
        name: name.to_string(),
        namespace: "default".to_string(),
        phase: "Running".to_string(),
        restarts: 0,
        node: "node-1".to_string(),
    }
}

fn metrics_server() -> ComponentFact {
    ComponentFact {
        name: "metrics-server".to_string(),
        namespace: "kube-system".to_string(),
        version: Some("v0.7.1".to_string()),
        status: "Ready (1/1)".to_string(),
        source: ComponentSource::Deployment,
    }
}

fn current_version() -> VersionFact {
    VersionFact {
        major: 1,
        minor: 30,
        git_version: "v1.30.2".to_string(),
    }
}

fn bundle() -> FactBundle {
    FactBundle {
        summary: Ok(summary(3, 40)),
        nodes: Ok(vec![
            healthy_node("node-1"),
            healthy_node("node-2"),
            healthy_node("node-3"),
        ]),
        pods: Ok(vec![running_pod("web-1"), running_pod("web-2")]),
        components: Ok(vec![metrics_server()]),
        version: Ok(current_version()),
    }
}

fn titles(report: &clusterlens::AnalysisReport) -> Vec<&str> {
    report
        .recommendations
        .iter()
        .map(|r| r.title.as_str())
        .collect()
}

#[test]
fn healthy_cluster_yields_no_recommendations() {
    let report = analyze(&bundle());
    assert!(report.recommendations.is_empty(), "{:?}", titles(&report));
    assert!(report.skipped.is_empty());
}

#[test]
fn small_dense_cluster_triggers_both_topology_rules() {
    let mut facts = bundle();
    facts.summary = Ok(summary(2, 120));

    let report = analyze(&facts);
    let titles = titles(&report);
    assert!(titles.contains(&"Low Node Count"));
    assert!(titles.contains(&"High Pod Density"));
}

#[test]
fn missing_metrics_server_reported_exactly_once() {
    let mut facts = bundle();
    facts.components = Ok(vec![ComponentFact {
        name: "coredns".to_string(),
        namespace: "kube-system".to_string(),
        version: None,
        status: "Ready (2/2)".to_string(),
        source: ComponentSource::Deployment,
    }]);

    let report = analyze(&facts);
    let count = report
        .recommendations
        .iter()
        .filter(|r| r.title == "Metrics Server Not Found")
        .count();
    assert_eq!(count, 1);
}

#[test]
fn failed_gather_skips_only_its_group() {
    let mut facts = bundle();
    facts.summary = Ok(summary(2, 10)); // would trigger Low Node Count
    facts.pods = Err(GatherError::new("pods", anyhow::anyhow!("api timeout")));

    let report = analyze(&facts);
    assert!(titles(&report).contains(&"Low Node Count"));
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].group, "pods");
    assert!(report.skipped[0].reason.contains("pods"));
}

#[test]
fn every_group_failing_yields_empty_report_with_full_skip_list() {
    let facts = FactBundle {
        summary: Err(GatherError::new("cluster summary", anyhow::anyhow!("down"))),
        nodes: Err(GatherError::new("nodes", anyhow::anyhow!("down"))),
        pods: Err(GatherError::new("pods", anyhow::anyhow!("down"))),
        components: Err(GatherError::new("components", anyhow::anyhow!("down"))),
        version: Err(GatherError::new("platform version", anyhow::anyhow!("down"))),
    };

    let report = analyze(&facts);
    assert!(report.recommendations.is_empty());
    assert_eq!(report.skipped.len(), 5);
}

#[test]
fn recommendations_accumulate_across_groups_in_order() {
    let mut facts = bundle();
    facts.summary = Ok(summary(1, 80));
    facts.nodes = Ok(vec![NodeFact {
        status: NodeStatus::NotReady,
        ..healthy_node("node-1")
    }]);
    facts.version = Ok(VersionFact {
        major: 1,
        minor: 24,
        git_version: "v1.24.0".to_string(),
    });

    let report = analyze(&facts);
    let titles = titles(&report);
    // Topology first, then nodes, then version - group evaluation order
    let low = titles.iter().position(|t| *t == "Low Node Count").unwrap();
    let not_ready = titles.iter().position(|t| *t == "Nodes Not Ready").unwrap();
    let outdated = titles
        .iter()
        .position(|t| *t == "Outdated Kubernetes Version")
        .unwrap();
    assert!(low < not_ready && not_ready < outdated);
}
