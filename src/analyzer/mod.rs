//! Recommendation rule engine
//!
//! Five independent, stateless rule groups over the gathered fact bundle.
//! A category whose gather failed contributes zero recommendations; the
//! failure is recorded per group instead of aborting the pass. This
//! best-effort isolation is a first-class contract, not an accident.

use crate::facts::{
    ClusterSummaryFact, ComponentFact, FactBundle, NodeFact, NodeStatus, PodFact, VersionFact,
};
use serde::{Deserialize, Serialize};

/// Recommendation severity, informational only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "Low"),
            Severity::Medium => write!(f, "Medium"),
            Severity::High => write!(f, "High"),
        }
    }
}

/// One emitted finding
///
/// This is the public wire contract of the analyzer; field names are
/// PascalCase on the wire and `Link` is omitted when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Recommendation {
    #[serde(rename = "Type")]
    pub rec_type: String,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// A rule group that contributed nothing because its facts were missing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedGroup {
    pub group: String,
    pub reason: String,
}

/// Result of one analysis pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub recommendations: Vec<Recommendation>,
    /// Groups skipped because their fact category could not be gathered
    pub skipped: Vec<SkippedGroup>,
}

/// Run every rule group over the bundle, accumulating in group order
pub fn analyze(bundle: &FactBundle) -> AnalysisReport {
    let mut report = AnalysisReport::default();

    run_group(&mut report, "topology", &bundle.summary, check_topology);
    run_group(&mut report, "nodes", &bundle.nodes, |nodes: &Vec<NodeFact>| {
        check_nodes(nodes)
    });
    run_group(&mut report, "pods", &bundle.pods, |pods: &Vec<PodFact>| {
        check_pods(pods)
    });
    run_group(
        &mut report,
        "components",
        &bundle.components,
        |components: &Vec<ComponentFact>| check_components(components),
    );
    run_group(&mut report, "version", &bundle.version, check_version);

    report
}

fn run_group<T>(
    report: &mut AnalysisReport,
    group: &'static str,
    facts: &Result<T, crate::facts::GatherError>,
    rule: impl Fn(&T) -> Vec<Recommendation>,
) {
    match facts {
        Ok(facts) => report.recommendations.extend(rule(facts)),
        Err(e) => {
            tracing::warn!("Skipping {} rules: {}", group, e);
            report.skipped.push(SkippedGroup {
                group: group.to_string(),
                reason: e.to_string(),
            });
        }
    }
}

/// Topology rules: node count and pod density
pub fn check_topology(summary: &ClusterSummaryFact) -> Vec<Recommendation> {
    let mut recs = Vec::new();

    if summary.total_nodes < 3 {
        recs.push(Recommendation {
            rec_type: "Topology".to_string(),
            severity: Severity::Medium,
            title: "Low Node Count".to_string(),
            description: format!(
                "Cluster has only {} node(s); losing one risks an availability gap",
                summary.total_nodes
            ),
            action: "Add nodes to reach at least 3 for resilience".to_string(),
            link: None,
        });
    }

    if summary.total_pods > 50 * summary.total_nodes {
        recs.push(Recommendation {
            rec_type: "Topology".to_string(),
            severity: Severity::Medium,
            title: "High Pod Density".to_string(),
            description: format!(
                "{} pods across {} node(s) exceeds 50 pods per node",
                summary.total_pods, summary.total_nodes
            ),
            action: "Scale out the node pool or rebalance workloads".to_string(),
            link: None,
        });
    }

    recs
}

/// Node rules: readiness and age
pub fn check_nodes(nodes: &[NodeFact]) -> Vec<Recommendation> {
    let mut recs = Vec::new();

    let not_ready = nodes
        .iter()
        .filter(|n| n.status == NodeStatus::NotReady)
        .count();
    if not_ready > 0 {
        recs.push(Recommendation {
            rec_type: "Nodes".to_string(),
            severity: Severity::High,
            title: "Nodes Not Ready".to_string(),
            description: format!("{} node(s) are not in Ready state", not_ready),
            action: "Inspect kubelet status and node conditions".to_string(),
            link: None,
        });
    }

    let old = nodes.iter().filter(|n| node_is_old(&n.age)).count();
    if old > 0 {
        recs.push(Recommendation {
            rec_type: "Nodes".to_string(),
            severity: Severity::Low,
            title: "Old Nodes Detected".to_string(),
            description: format!("{} node(s) are older than a year", old),
            action: "Plan a node rotation to pick up OS and kubelet updates".to_string(),
            link: None,
        });
    }

    recs
}

/// A node is old when its age string is in days and exceeds 365
fn node_is_old(age: &str) -> bool {
    age.strip_suffix('d')
        .and_then(|days| days.parse::<u64>().ok())
        .map(|days| days > 365)
        .unwrap_or(false)
}

/// Pod rules: failures, restart churn, terminating backlog
pub fn check_pods(pods: &[PodFact]) -> Vec<Recommendation> {
    let mut recs = Vec::new();

    let failed = pods
        .iter()
        .filter(|p| {
            let phase = p.phase.to_lowercase();
            phase.contains("failed") || phase.contains("error")
        })
        .count();
    if failed > 0 {
        recs.push(Recommendation {
            rec_type: "Pods".to_string(),
            severity: Severity::Medium,
            title: "Failed Pods Detected".to_string(),
            description: format!("{} pod(s) are in a failed or errored phase", failed),
            action: "Check pod events and container logs, then delete or redeploy".to_string(),
            link: None,
        });
    }

    let restarting = pods.iter().filter(|p| p.restarts > 10).count();
    if restarting > 0 {
        recs.push(Recommendation {
            rec_type: "Pods".to_string(),
            severity: Severity::Medium,
            title: "High Restart Count Pods".to_string(),
            description: format!("{} pod(s) have restarted more than 10 times", restarting),
            action: "Investigate crash loops and resource limits".to_string(),
            link: None,
        });
    }

    let terminating = pods
        .iter()
        .filter(|p| p.phase.to_lowercase().contains("terminating"))
        .count();
    if terminating > 5 {
        recs.push(Recommendation {
            rec_type: "Pods".to_string(),
            severity: Severity::Low,
            title: "Many Terminating Pods".to_string(),
            description: format!("{} pod(s) are stuck terminating", terminating),
            action: "Look for finalizers or unresponsive nodes holding deletions".to_string(),
            link: None,
        });
    }

    recs
}

/// Component rules: metrics-server presence and component readiness
pub fn check_components(components: &[ComponentFact]) -> Vec<Recommendation> {
    let mut recs = Vec::new();

    let has_metrics_server = components
        .iter()
        .any(|c| c.name.contains("metrics-server"));
    if !has_metrics_server {
        recs.push(Recommendation {
            rec_type: "Components".to_string(),
            severity: Severity::Medium,
            title: "Metrics Server Not Found".to_string(),
            description: "No metrics-server component is installed".to_string(),
            action: "Install metrics-server to enable resource metrics and HPA".to_string(),
            link: Some(
                "https://github.com/kubernetes-sigs/metrics-server".to_string(),
            ),
        });
    }

    let not_ready = components
        .iter()
        .filter(|c| c.status.to_lowercase().contains("not ready"))
        .count();
    if not_ready > 0 {
        recs.push(Recommendation {
            rec_type: "Components".to_string(),
            severity: Severity::Medium,
            title: "Components Not Ready".to_string(),
            description: format!("{} component(s) report a not-ready status", not_ready),
            action: "Check the listed components' workloads and events".to_string(),
            link: None,
        });
    }

    recs
}

/// Version rules: numeric comparison against supported minors
pub fn check_version(version: &VersionFact) -> Vec<Recommendation> {
    let mut recs = Vec::new();

    if version.major == 1 && version.minor < 25 {
        recs.push(Recommendation {
            rec_type: "Version".to_string(),
            severity: Severity::High,
            title: "Outdated Kubernetes Version".to_string(),
            description: format!(
                "Cluster runs {} which is past end of support",
                version.git_version
            ),
            action: "Upgrade to a supported Kubernetes minor".to_string(),
            link: Some("https://kubernetes.io/releases/".to_string()),
        });
    } else if version.major == 1 && version.minor < 27 {
        recs.push(Recommendation {
            rec_type: "Version".to_string(),
            severity: Severity::Low,
            title: "Consider Version Upgrade".to_string(),
            description: format!(
                "Cluster runs {} which approaches end of support",
                version.git_version
            ),
            action: "Schedule an upgrade during the next maintenance window".to_string(),
            link: Some("https://kubernetes.io/releases/".to_string()),
        });
    }

    recs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(nodes: usize, pods: usize) -> ClusterSummaryFact {
        ClusterSummaryFact {
            total_nodes: nodes,
            total_pods: pods,
            total_cpu_millis: 0,
            total_memory_bytes: 0,
        }
    }

    fn node(status: NodeStatus, age: &str) -> NodeFact {
        NodeFact {
            name: "node".to_string(),
            status,
            roles: "worker".to_string(),
            age: age.to_string(),
            cpu_capacity: "4.0".to_string(),
            memory_capacity: "16.0Gi".to_string(),
            cpu_capacity_millis: 4000,
            memory_capacity_bytes: 16 * 1024 * 1024 * 1024,
        }
    }

    fn pod(phase: &str, restarts: i32) -> PodFact {
        PodFact {
            name: "pod".to_string(),
            namespace: "default".to_string(),
            phase: phase.to_string(),
            restarts,
            node: "node".to_string(),
        }
    }

    fn titles(recs: &[Recommendation]) -> Vec<&str> {
        recs.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn test_low_node_count_strict_boundary() {
        assert!(titles(&check_topology(&summary(2, 0))).contains(&"Low Node Count"));
        assert!(!titles(&check_topology(&summary(3, 0))).contains(&"Low Node Count"));
    }

    #[test]
    fn test_pod_density_strict_boundary() {
        assert!(titles(&check_topology(&summary(2, 101))).contains(&"High Pod Density"));
        // Exactly 50 per node does not trigger
        assert!(!titles(&check_topology(&summary(2, 100))).contains(&"High Pod Density"));
    }

    #[test]
    fn test_nodes_not_ready_high_severity() {
        let nodes = vec![node(NodeStatus::Ready, "10d"), node(NodeStatus::NotReady, "10d")];
        let recs = check_nodes(&nodes);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].title, "Nodes Not Ready");
        assert_eq!(recs[0].severity, Severity::High);
    }

    #[test]
    fn test_old_node_boundary_is_strictly_greater() {
        assert!(titles(&check_nodes(&[node(NodeStatus::Ready, "400d")]))
            .contains(&"Old Nodes Detected"));
        assert!(!titles(&check_nodes(&[node(NodeStatus::Ready, "365d")]))
            .contains(&"Old Nodes Detected"));
        // Hour-denominated ages never count
        assert!(!titles(&check_nodes(&[node(NodeStatus::Ready, "9000h")]))
            .contains(&"Old Nodes Detected"));
    }

    #[test]
    fn test_restart_count_boundary() {
        assert!(titles(&check_pods(&[pod("Running", 11)]))
            .contains(&"High Restart Count Pods"));
        assert!(!titles(&check_pods(&[pod("Running", 10)]))
            .contains(&"High Restart Count Pods"));
    }

    #[test]
    fn test_failed_pod_phase_substring_case_insensitive() {
        assert!(titles(&check_pods(&[pod("Failed", 0)])).contains(&"Failed Pods Detected"));
        assert!(titles(&check_pods(&[pod("ImagePullError", 0)]))
            .contains(&"Failed Pods Detected"));
        assert!(!titles(&check_pods(&[pod("Running", 0)])).contains(&"Failed Pods Detected"));
    }

    #[test]
    fn test_terminating_pods_boundary() {
        let five: Vec<PodFact> = (0..5).map(|_| pod("Terminating", 0)).collect();
        assert!(!titles(&check_pods(&five)).contains(&"Many Terminating Pods"));

        let six: Vec<PodFact> = (0..6).map(|_| pod("Terminating", 0)).collect();
        assert!(titles(&check_pods(&six)).contains(&"Many Terminating Pods"));
    }

    #[test]
    fn test_metrics_server_detection() {
        let absent = check_components(&[]);
        assert!(titles(&absent).contains(&"Metrics Server Not Found"));

        let present = check_components(&[ComponentFact {
            name: "metrics-server".to_string(),
            namespace: "kube-system".to_string(),
            version: Some("v0.7.1".to_string()),
            status: "Ready (1/1)".to_string(),
            source: crate::facts::ComponentSource::Deployment,
        }]);
        assert!(!titles(&present).contains(&"Metrics Server Not Found"));
    }

    #[test]
    fn test_version_thresholds() {
        let old = check_version(&VersionFact {
            major: 1,
            minor: 24,
            git_version: "v1.24.17".to_string(),
        });
        assert_eq!(old[0].title, "Outdated Kubernetes Version");
        assert_eq!(old[0].severity, Severity::High);

        let aging = check_version(&VersionFact {
            major: 1,
            minor: 26,
            git_version: "v1.26.9".to_string(),
        });
        assert_eq!(aging[0].title, "Consider Version Upgrade");
        assert_eq!(aging[0].severity, Severity::Low);

        let current = check_version(&VersionFact {
            major: 1,
            minor: 27,
            git_version: "v1.27.3".to_string(),
        });
        assert!(current.is_empty());
    }

    #[test]
    fn test_report_round_trips_through_json() {
        let report = AnalysisReport {
            recommendations: Vec::new(),
            skipped: vec![SkippedGroup {
                group: "pods".to_string(),
                reason: "failed to gather pods: down".to_string(),
            }],
        };

        let json = serde_json::to_string(&report).unwrap();
        let decoded: AnalysisReport = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.skipped.len(), 1);
        assert_eq!(decoded.skipped[0].group, "pods");
    }

    #[test]
    fn test_recommendation_wire_format() {
        let rec = Recommendation {
            rec_type: "Version".to_string(),
            severity: Severity::High,
            title: "Outdated Kubernetes Version".to_string(),
            description: "desc".to_string(),
            action: "act".to_string(),
            link: None,
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["Type"], "Version");
        assert_eq!(json["Severity"], "High");
        // Absent link is omitted, not null
        assert!(json.get("Link").is_none());
    }
}
