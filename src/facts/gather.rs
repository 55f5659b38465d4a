//! Cluster fact gathering
//!
//! Six independent list-style queries against the Kubernetes API, each
//! shaping raw resources into the fact model. The gatherer performs no
//! retry and no caching; every invocation is a single external call chain,
//! and a failure in one category never blocks the others.

use crate::facts::normalize::{
    extract_roles, format_age, format_bytes, format_cpu, parse_cpu_millis, parse_memory_bytes,
    parse_version_component, version_from_image,
};
use crate::facts::{
    ClusterSummaryFact, ComponentFact, ComponentSource, EventFact, FactBundle, GatherError,
    NodeFact, NodeStatus, PodFact, VersionFact,
};
use anyhow::{Context, Result};
use base64::Engine;
use chrono::{DateTime, Utc};
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{Event, Node, Pod, Secret};
use kube::api::{Api, ListParams};
use std::collections::HashMap;
use std::io::Read;

/// Helm v3 stores release payloads in Secrets of this type
const HELM_SECRET_TYPE: &str = "helm.sh/release.v1";

/// Gathers fact snapshots from a live cluster
///
/// Holds only the client; all state is produced fresh per call.
pub struct FactGatherer {
    client: kube::Client,
}

impl FactGatherer {
    pub fn new(client: kube::Client) -> Self {
        Self { client }
    }

    /// Run all five fact queries, recording per-category outcomes
    ///
    /// The queries are independent and fan out concurrently; a failed
    /// category is carried as its error rather than aborting the bundle.
    pub async fn gather_all(&self) -> FactBundle {
        let (summary, nodes, pods, components, version) = futures::join!(
            self.summary(),
            self.nodes(),
            self.pods(),
            self.components(),
            self.platform_version(),
        );

        for err in [
            summary.as_ref().err().map(|e| e.to_string()),
            nodes.as_ref().err().map(|e| e.to_string()),
            pods.as_ref().err().map(|e| e.to_string()),
            components.as_ref().err().map(|e| e.to_string()),
            version.as_ref().err().map(|e| e.to_string()),
        ]
        .into_iter()
        .flatten()
        {
            tracing::warn!("{}", err);
        }

        FactBundle {
            summary,
            nodes,
            pods,
            components,
            version,
        }
    }

    /// Aggregate node/pod counts and capacity totals
    pub async fn summary(&self) -> Result<ClusterSummaryFact, GatherError> {
        let nodes: Api<Node> = Api::all(self.client.clone());
        let pods: Api<Pod> = Api::all(self.client.clone());

        let node_list = nodes
            .list(&ListParams::default())
            .await
            .map_err(|e| GatherError::new("cluster summary", e.into()))?;
        let pod_list = pods
            .list(&ListParams::default())
            .await
            .map_err(|e| GatherError::new("cluster summary", e.into()))?;

        let mut total_cpu_millis = 0;
        let mut total_memory_bytes = 0;
        for node in &node_list.items {
            if let Some(capacity) = node.status.as_ref().and_then(|s| s.capacity.as_ref()) {
                if let Some(cpu) = capacity.get("cpu") {
                    total_cpu_millis += parse_cpu_millis(cpu);
                }
                if let Some(memory) = capacity.get("memory") {
                    total_memory_bytes += parse_memory_bytes(memory);
                }
            }
        }

        Ok(ClusterSummaryFact {
            total_nodes: node_list.items.len(),
            total_pods: pod_list.items.len(),
            total_cpu_millis,
            total_memory_bytes,
        })
    }

    /// Snapshot every node's readiness, roles, age, and capacity
    pub async fn nodes(&self) -> Result<Vec<NodeFact>, GatherError> {
        let api: Api<Node> = Api::all(self.client.clone());
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| GatherError::new("nodes", e.into()))?;

        let now = Utc::now();
        Ok(list.items.iter().map(|node| node_fact(node, now)).collect())
    }

    /// Snapshot every pod's phase, restarts, and owning node
    pub async fn pods(&self) -> Result<Vec<PodFact>, GatherError> {
        let api: Api<Pod> = Api::all(self.client.clone());
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| GatherError::new("pods", e.into()))?;

        Ok(list.items.iter().map(pod_fact).collect())
    }

    /// Discover installed components through both mechanisms
    ///
    /// Workload-shape inspection (Deployments, StatefulSets, DaemonSets
    /// across all namespaces) plus Helm release-manager metadata, merged
    /// into one deduplicated set.
    pub async fn components(&self) -> Result<Vec<ComponentFact>, GatherError> {
        let mut components = self
            .workload_components()
            .await
            .map_err(|e| GatherError::new("components", e))?;

        // A broken Helm storage read should not hide workload results
        match self.helm_components().await {
            Ok(mut helm) => components.append(&mut helm),
            Err(e) => tracing::warn!("Skipping Helm release discovery: {:#}", e),
        }

        Ok(crate::facts::resolve_components(components))
    }

    async fn workload_components(&self) -> Result<Vec<ComponentFact>> {
        let deployments: Api<Deployment> = Api::all(self.client.clone());
        let statefulsets: Api<StatefulSet> = Api::all(self.client.clone());
        let daemonsets: Api<DaemonSet> = Api::all(self.client.clone());

        let params = ListParams::default();
        let (deploy_list, sts_list, ds_list) = futures::try_join!(
            deployments.list(&params),
            statefulsets.list(&params),
            daemonsets.list(&params),
        )
        .context("Failed to list workloads")?;

        let mut components = Vec::new();
        for deploy in &deploy_list.items {
            let ready = deploy
                .status
                .as_ref()
                .and_then(|s| s.ready_replicas)
                .unwrap_or(0);
            let desired = deploy.spec.as_ref().and_then(|s| s.replicas).unwrap_or(1);
            let image = deploy
                .spec
                .as_ref()
                .and_then(|s| s.template.spec.as_ref())
                .and_then(|p| p.containers.first())
                .and_then(|c| c.image.as_deref());
            components.push(workload_component(
                deploy.metadata.name.as_deref().unwrap_or(""),
                deploy.metadata.namespace.as_deref().unwrap_or(""),
                ready,
                desired,
                image,
                ComponentSource::Deployment,
            ));
        }
        for sts in &sts_list.items {
            let ready = sts
                .status
                .as_ref()
                .and_then(|s| s.ready_replicas)
                .unwrap_or(0);
            let desired = sts.spec.as_ref().and_then(|s| s.replicas).unwrap_or(1);
            let image = sts
                .spec
                .as_ref()
                .and_then(|s| s.template.spec.as_ref())
                .and_then(|p| p.containers.first())
                .and_then(|c| c.image.as_deref());
            components.push(workload_component(
                sts.metadata.name.as_deref().unwrap_or(""),
                sts.metadata.namespace.as_deref().unwrap_or(""),
                ready,
                desired,
                image,
                ComponentSource::StatefulSet,
            ));
        }
        for ds in &ds_list.items {
            let ready = ds.status.as_ref().map(|s| s.number_ready).unwrap_or(0);
            let desired = ds
                .status
                .as_ref()
                .map(|s| s.desired_number_scheduled)
                .unwrap_or(0);
            let image = ds
                .spec
                .as_ref()
                .and_then(|s| s.template.spec.as_ref())
                .and_then(|p| p.containers.first())
                .and_then(|c| c.image.as_deref());
            components.push(workload_component(
                ds.metadata.name.as_deref().unwrap_or(""),
                ds.metadata.namespace.as_deref().unwrap_or(""),
                ready,
                desired,
                image,
                ComponentSource::DaemonSet,
            ));
        }

        Ok(components)
    }

    /// Discover components from Helm v3 storage Secrets
    ///
    /// Only the newest revision per release is decoded; the payload is
    /// base64 text of (usually gzipped) release JSON.
    async fn helm_components(&self) -> Result<Vec<ComponentFact>> {
        let secrets: Api<Secret> = Api::all(self.client.clone());
        let params = ListParams::default().fields(&format!("type={}", HELM_SECRET_TYPE));
        let list = secrets
            .list(&params)
            .await
            .context("Failed to list Helm storage Secrets")?;

        // Secret name format: sh.helm.release.v1.{releaseName}.v{revision}
        let mut latest: HashMap<(String, String), (u64, &Secret)> = HashMap::new();
        for secret in &list.items {
            let name = secret.metadata.name.as_deref().unwrap_or("");
            let namespace = secret.metadata.namespace.as_deref().unwrap_or("");
            let Some((release, revision)) = parse_helm_secret_name(name) else {
                tracing::debug!("Ignoring non-release Secret {}/{}", namespace, name);
                continue;
            };
            let key = (namespace.to_string(), release.to_string());
            match latest.get(&key) {
                Some((held, _)) if *held >= revision => {}
                _ => {
                    latest.insert(key, (revision, secret));
                }
            }
        }

        let mut components = Vec::new();
        for ((namespace, release), (revision, secret)) in latest {
            let payload = secret
                .data
                .as_ref()
                .and_then(|data| data.get("release"))
                .map(|bytes| bytes.0.as_slice());
            let Some(payload) = payload else {
                tracing::warn!(
                    "Helm Secret for {}/{} rev {} missing 'release' key",
                    namespace,
                    release,
                    revision
                );
                continue;
            };

            match decode_helm_release(payload) {
                Ok(release_json) => {
                    components.push(helm_component(&release_json, &release, &namespace));
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to decode Helm release {}/{}: {:#}",
                        namespace,
                        release,
                        e
                    );
                }
            }
        }

        Ok(components)
    }

    /// Query the API server's reported platform version
    pub async fn platform_version(&self) -> Result<VersionFact, GatherError> {
        let info = self
            .client
            .apiserver_version()
            .await
            .map_err(|e| GatherError::new("platform version", e.into()))?;

        Ok(VersionFact {
            major: parse_version_component(&info.major),
            minor: parse_version_component(&info.minor),
            git_version: info.git_version,
        })
    }

    /// List recent cluster events for the events export dataset
    pub async fn events(&self) -> Result<Vec<EventFact>, GatherError> {
        let api: Api<Event> = Api::all(self.client.clone());
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| GatherError::new("events", e.into()))?;

        Ok(list.items.iter().map(event_fact).collect())
    }
}

/// Shape one raw Node into a fact
fn node_fact(node: &Node, now: DateTime<Utc>) -> NodeFact {
    let ready = node
        .status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .map(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "Ready" && c.status == "True")
        })
        .unwrap_or(false);

    let age = node
        .metadata
        .creation_timestamp
        .as_ref()
        .map(|t| format_age(now.signed_duration_since(t.0)))
        .unwrap_or_else(|| "unknown".to_string());

    let capacity = node.status.as_ref().and_then(|s| s.capacity.as_ref());
    let cpu_capacity_millis = capacity
        .and_then(|c| c.get("cpu"))
        .map(parse_cpu_millis)
        .unwrap_or(0);
    let memory_capacity_bytes = capacity
        .and_then(|c| c.get("memory"))
        .map(parse_memory_bytes)
        .unwrap_or(0);

    NodeFact {
        name: node.metadata.name.clone().unwrap_or_default(),
        status: if ready {
            NodeStatus::Ready
        } else {
            NodeStatus::NotReady
        },
        roles: extract_roles(node.metadata.labels.as_ref().unwrap_or(&Default::default())),
        age,
        cpu_capacity: format_cpu(cpu_capacity_millis),
        memory_capacity: format_bytes(memory_capacity_bytes),
        cpu_capacity_millis,
        memory_capacity_bytes,
    }
}

/// Shape one raw Pod into a fact
///
/// A deletion timestamp overrides the reported phase with "Terminating".
fn pod_fact(pod: &Pod) -> PodFact {
    let phase = if pod.metadata.deletion_timestamp.is_some() {
        "Terminating".to_string()
    } else {
        pod.status
            .as_ref()
            .and_then(|s| s.phase.clone())
            .unwrap_or_else(|| "Unknown".to_string())
    };

    let restarts = pod
        .status
        .as_ref()
        .and_then(|s| s.container_statuses.as_ref())
        .map(|statuses| statuses.iter().map(|c| c.restart_count).sum())
        .unwrap_or(0);

    PodFact {
        name: pod.metadata.name.clone().unwrap_or_default(),
        namespace: pod.metadata.namespace.clone().unwrap_or_default(),
        phase,
        restarts,
        node: pod
            .spec
            .as_ref()
            .and_then(|s| s.node_name.clone())
            .unwrap_or_default(),
    }
}

/// Shape one workload into a component fact
fn workload_component(
    name: &str,
    namespace: &str,
    ready: i32,
    desired: i32,
    image: Option<&str>,
    source: ComponentSource,
) -> ComponentFact {
    let status = if ready >= desired && desired > 0 {
        format!("Ready ({}/{})", ready, desired)
    } else {
        format!("Not Ready ({}/{})", ready, desired)
    };

    ComponentFact {
        name: name.to_string(),
        namespace: namespace.to_string(),
        version: image.and_then(version_from_image),
        status,
        source,
    }
}

/// Parse a Helm storage Secret name into (release name, revision)
fn parse_helm_secret_name(name: &str) -> Option<(&str, u64)> {
    let rest = name.strip_prefix("sh.helm.release.v1.")?;
    let (release, revision) = rest.rsplit_once(".v")?;
    let revision = revision.parse().ok()?;
    if release.is_empty() {
        return None;
    }
    Some((release, revision))
}

/// Decode a Helm release payload into its JSON representation
///
/// The Secret value is base64 text; the decoded bytes are gzipped JSON
/// when the gzip magic is present, plain JSON otherwise.
fn decode_helm_release(payload: &[u8]) -> Result<serde_json::Value> {
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .context("Failed to decode base64 release data")?;

    // Gzip magic bytes: 0x1f, 0x8b, 0x08
    let is_gzipped =
        decoded.len() >= 3 && decoded[0] == 0x1f && decoded[1] == 0x8b && decoded[2] == 0x08;

    let raw = if is_gzipped {
        let mut decoder = flate2::read::GzDecoder::new(&decoded[..]);
        let mut buf = Vec::new();
        decoder
            .read_to_end(&mut buf)
            .context("Failed to decompress gzip release data")?;
        buf
    } else {
        decoded
    };

    serde_json::from_slice(&raw).context("Failed to parse release JSON")
}

/// Shape a decoded Helm release into a component fact
fn helm_component(release: &serde_json::Value, name: &str, namespace: &str) -> ComponentFact {
    let version = release
        .get("chart")
        .and_then(|c| c.get("metadata"))
        .and_then(|m| m.get("version"))
        .and_then(|v| v.as_str())
        .map(|v| v.to_string());

    let status = release
        .get("info")
        .and_then(|i| i.get("status"))
        .and_then(|s| s.as_str())
        .unwrap_or("unknown")
        .to_string();

    ComponentFact {
        name: name.to_string(),
        namespace: namespace.to_string(),
        version,
        status,
        source: ComponentSource::HelmRelease,
    }
}

/// Shape one raw Event into a fact
fn event_fact(event: &Event) -> EventFact {
    let timestamp = event
        .last_timestamp
        .as_ref()
        .map(|t| t.0)
        .or_else(|| event.event_time.as_ref().map(|t| t.0))
        .or_else(|| event.metadata.creation_timestamp.as_ref().map(|t| t.0));

    let object = format!(
        "{}/{}",
        event.involved_object.kind.as_deref().unwrap_or(""),
        event.involved_object.name.as_deref().unwrap_or("")
    );

    EventFact {
        timestamp,
        event_type: event.type_.clone().unwrap_or_default(),
        reason: event.reason.clone().unwrap_or_default(),
        object,
        namespace: event.metadata.namespace.clone().unwrap_or_default(),
        message: event.message.clone().unwrap_or_default(),
        count: event.count.unwrap_or(1),
        component: event
            .source
            .as_ref()
            .and_then(|s| s.component.clone())
            .unwrap_or_default(),
    }
}
