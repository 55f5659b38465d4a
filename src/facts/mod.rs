//! Cluster fact model
//!
//! Facts are normalized, read-only snapshots of one cluster entity's current
//! state. The gatherer produces them fresh on every call; the analyzer and
//! the export renderer each hold an independent read-only view.

pub mod gather;
pub mod normalize;
pub mod resolve;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use gather::FactGatherer;
pub use resolve::resolve_components;

/// One external list-style query failed
///
/// Carries the resource kind whose query failed so callers (and the
/// analyzer's skip bookkeeping) can identify the gap.
#[derive(Debug, Error)]
#[error("failed to gather {kind}: {source}")]
pub struct GatherError {
    /// Resource kind of the failed query (e.g. "nodes", "pods")
    pub kind: &'static str,
    #[source]
    pub source: anyhow::Error,
}

impl GatherError {
    pub fn new(kind: &'static str, source: anyhow::Error) -> Self {
        Self { kind, source }
    }
}

/// Node readiness: exactly one of Ready or NotReady
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeStatus {
    Ready,
    NotReady,
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeStatus::Ready => write!(f, "Ready"),
            NodeStatus::NotReady => write!(f, "NotReady"),
        }
    }
}

/// One cluster node snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeFact {
    pub name: String,
    pub status: NodeStatus,
    /// Comma-joined role names; "worker" when no role label is present
    pub roles: String,
    /// Coarsest-unit age string (e.g. "400d", "6h")
    pub age: String,
    /// CPU capacity in cores (e.g. "4.0")
    pub cpu_capacity: String,
    /// Memory capacity rendered with binary units (e.g. "16.0Gi")
    pub memory_capacity: String,
    pub cpu_capacity_millis: i64,
    pub memory_capacity_bytes: u64,
}

/// One pod snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodFact {
    pub name: String,
    pub namespace: String,
    /// Lifecycle phase; "Terminating" overrides the reported phase whenever
    /// a deletion timestamp exists
    pub phase: String,
    /// Restart count summed across all containers
    pub restarts: i32,
    /// Owning node name, empty if unscheduled
    pub node: String,
}

/// Aggregate cluster counts, recomputed fresh per call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSummaryFact {
    pub total_nodes: usize,
    pub total_pods: usize,
    pub total_cpu_millis: i64,
    pub total_memory_bytes: u64,
}

impl ClusterSummaryFact {
    /// Total CPU in whole cores, one decimal place
    pub fn cpu_cores(&self) -> String {
        format!("{:.1}", self.total_cpu_millis as f64 / 1000.0)
    }

    /// Total memory with binary units
    pub fn memory_display(&self) -> String {
        normalize::format_bytes(self.total_memory_bytes)
    }
}

/// Discovery mechanism a component fact came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentSource {
    Deployment,
    StatefulSet,
    DaemonSet,
    HelmRelease,
}

impl std::fmt::Display for ComponentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComponentSource::Deployment => write!(f, "Deployment"),
            ComponentSource::StatefulSet => write!(f, "StatefulSet"),
            ComponentSource::DaemonSet => write!(f, "DaemonSet"),
            ComponentSource::HelmRelease => write!(f, "HelmRelease"),
        }
    }
}

/// One installed component, possibly seen through multiple discovery passes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentFact {
    pub name: String,
    pub namespace: String,
    /// Version tag if one could be determined ("latest" never counts)
    pub version: Option<String>,
    pub status: String,
    pub source: ComponentSource,
}

impl ComponentFact {
    /// Dedup key identifying "the same" component across sources
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

/// Platform version as parsed integers; unparsable components are 0
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionFact {
    pub major: u32,
    pub minor: u32,
    pub git_version: String,
}

/// One cluster event, feeding the events export dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventFact {
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,
    pub event_type: String,
    pub reason: String,
    pub object: String,
    pub namespace: String,
    pub message: String,
    pub count: i32,
    pub component: String,
}

/// Per-category gather outcomes for one analysis pass
///
/// Each category fails independently; a failed category is carried as its
/// error so downstream consumers can skip it without losing the reason.
#[derive(Debug)]
pub struct FactBundle {
    pub summary: Result<ClusterSummaryFact, GatherError>,
    pub nodes: Result<Vec<NodeFact>, GatherError>,
    pub pods: Result<Vec<PodFact>, GatherError>,
    pub components: Result<Vec<ComponentFact>, GatherError>,
    pub version: Result<VersionFact, GatherError>,
}
