//! Resource Topology Model
//!
//! Typed, read-only graph of the resources under maintenance:
//!
//! ```text
//! Region
//! ├── Database
//! ├── ContainerCluster (ECS) ── ContainerService
//! └── OrchestrationCluster (EKS) ── Namespace ─┬─ StatefulWorkload
//!                                              └─ ReplicatedWorkload
//! ```
//!
//! Every mapping is a `BTreeMap` keyed by identifier, so walking the graph is
//! always lexicographic and regenerating commands from the same snapshot is
//! byte-identical. The graph is built once by the loader and never mutated;
//! baseline counts recorded here are the restore targets.

use std::collections::BTreeMap;
use std::fmt;

use crate::types::EngineFamily;

/// An RDS database instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Database {
    pub identifier: String,
    /// Raw engine name from the snapshot (e.g. `aurora-postgresql`)
    pub engine: String,
    pub family: EngineFamily,
    pub engine_version: String,
    pub instance_class: String,
    /// Desired engine version after maintenance, if any
    pub target_engine_version: Option<String>,
    /// Desired instance class after maintenance, if any
    pub target_instance_class: Option<String>,
    pub endpoint: Option<String>,
    pub port: Option<u16>,
    pub database_name: Option<String>,
    pub maintenance_id: String,
}

impl Database {
    /// Host to connect to: the endpoint, or the identifier when none is recorded.
    pub fn host(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(&self.identifier)
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.family.default_port())
    }

    pub fn database_name(&self) -> &str {
        self.database_name
            .as_deref()
            .unwrap_or_else(|| self.family.default_database())
    }

    /// Target engine version, only when it differs from the current one.
    pub fn pending_engine_version(&self) -> Option<&str> {
        self.target_engine_version
            .as_deref()
            .filter(|target| *target != self.engine_version)
    }

    /// Target instance class, only when it differs from the current one.
    pub fn pending_instance_class(&self) -> Option<&str> {
        self.target_instance_class
            .as_deref()
            .filter(|target| *target != self.instance_class)
    }
}

impl fmt::Display for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Database({}, engine={} {}, class={})",
            self.identifier, self.engine, self.engine_version, self.instance_class
        )
    }
}

/// An ECS service with its desired task count at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerService {
    pub name: String,
    pub baseline_count: u32,
    pub maintenance_id: String,
}

impl fmt::Display for ContainerService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EcsService({}, desired={})", self.name, self.baseline_count)
    }
}

/// An ECS cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerCluster {
    pub name: String,
    pub services: BTreeMap<String, ContainerService>,
}

impl fmt::Display for ContainerCluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EcsCluster({}, services={})", self.name, self.services.len())
    }
}

/// A Kubernetes StatefulSet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatefulWorkload {
    pub name: String,
    pub baseline_replicas: u32,
    pub maintenance_id: String,
}

impl fmt::Display for StatefulWorkload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StatefulSet({}, replicas={})", self.name, self.baseline_replicas)
    }
}

/// A Kubernetes Deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicatedWorkload {
    pub name: String,
    pub baseline_replicas: u32,
    pub maintenance_id: String,
}

impl fmt::Display for ReplicatedWorkload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Deployment({}, replicas={})", self.name, self.baseline_replicas)
    }
}

/// A Kubernetes namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespace {
    pub name: String,
    pub statefulsets: BTreeMap<String, StatefulWorkload>,
    pub deployments: BTreeMap<String, ReplicatedWorkload>,
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Namespace({}, statefulsets={}, deployments={})",
            self.name,
            self.statefulsets.len(),
            self.deployments.len()
        )
    }
}

/// An EKS cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrchestrationCluster {
    pub name: String,
    pub namespaces: BTreeMap<String, Namespace>,
}

impl fmt::Display for OrchestrationCluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EksCluster({}, namespaces={})", self.name, self.namespaces.len())
    }
}

/// An AWS region and everything in scope inside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Region {
    pub name: String,
    pub databases: BTreeMap<String, Database>,
    pub ecs_clusters: BTreeMap<String, ContainerCluster>,
    pub eks_clusters: BTreeMap<String, OrchestrationCluster>,
}

impl Region {
    pub fn is_empty(&self) -> bool {
        self.databases.is_empty() && self.ecs_clusters.is_empty() && self.eks_clusters.is_empty()
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Region({})", self.name)
    }
}

/// A located ECS service: the region and cluster it lives in.
#[derive(Debug, Clone, Copy)]
pub struct EcsServiceRef<'a> {
    pub region: &'a Region,
    pub cluster: &'a ContainerCluster,
    pub service: &'a ContainerService,
}

/// A located Kubernetes workload.
#[derive(Debug, Clone, Copy)]
pub struct WorkloadRef<'a, W> {
    pub region: &'a Region,
    pub cluster: &'a OrchestrationCluster,
    pub namespace: &'a Namespace,
    pub workload: &'a W,
}

/// The whole in-scope topology for one maintenance id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    pub maintenance_id: String,
    pub regions: BTreeMap<String, Region>,
}

impl Topology {
    pub fn new(maintenance_id: impl Into<String>) -> Self {
        Self {
            maintenance_id: maintenance_id.into(),
            regions: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.regions.values().all(Region::is_empty)
    }

    /// All databases, region by region.
    pub fn databases(&self) -> impl Iterator<Item = (&Region, &Database)> {
        self.regions
            .values()
            .flat_map(|region| region.databases.values().map(move |db| (region, db)))
    }

    /// Databases of one engine family.
    pub fn databases_of(&self, family: EngineFamily) -> impl Iterator<Item = (&Region, &Database)> {
        self.databases().filter(move |(_, db)| db.family == family)
    }

    /// All ECS services, region by region and cluster by cluster.
    pub fn ecs_services(&self) -> impl Iterator<Item = EcsServiceRef<'_>> {
        self.regions.values().flat_map(|region| {
            region.ecs_clusters.values().flat_map(move |cluster| {
                cluster.services.values().map(move |service| EcsServiceRef {
                    region,
                    cluster,
                    service,
                })
            })
        })
    }

    fn namespaces(&self) -> impl Iterator<Item = (&Region, &OrchestrationCluster, &Namespace)> {
        self.regions.values().flat_map(|region| {
            region.eks_clusters.values().flat_map(move |cluster| {
                cluster
                    .namespaces
                    .values()
                    .map(move |namespace| (region, cluster, namespace))
            })
        })
    }

    /// All StatefulSets, region → cluster → namespace → name.
    pub fn statefulsets(&self) -> impl Iterator<Item = WorkloadRef<'_, StatefulWorkload>> {
        self.namespaces().flat_map(|(region, cluster, namespace)| {
            namespace.statefulsets.values().map(move |workload| WorkloadRef {
                region,
                cluster,
                namespace,
                workload,
            })
        })
    }

    /// All Deployments, region → cluster → namespace → name.
    pub fn deployments(&self) -> impl Iterator<Item = WorkloadRef<'_, ReplicatedWorkload>> {
        self.namespaces().flat_map(|(region, cluster, namespace)| {
            namespace.deployments.values().map(move |workload| WorkloadRef {
                region,
                cluster,
                namespace,
                workload,
            })
        })
    }

    /// Number of leaf resources in scope.
    pub fn resource_count(&self) -> usize {
        self.databases().count()
            + self.ecs_services().count()
            + self.statefulsets().count()
            + self.deployments().count()
    }

    /// Indented tree of the topology, one resource per line.
    pub fn detail_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for region in self.regions.values() {
            lines.push(format!("{}", region));
            for db in region.databases.values() {
                lines.push(format!("  {}", db));
            }
            for cluster in region.ecs_clusters.values() {
                lines.push(format!("  {}", cluster));
                for service in cluster.services.values() {
                    lines.push(format!("     {}", service));
                }
            }
            for cluster in region.eks_clusters.values() {
                lines.push(format!("  {}", cluster));
                for namespace in cluster.namespaces.values() {
                    lines.push(format!("    {}", namespace));
                    for statefulset in namespace.statefulsets.values() {
                        lines.push(format!("      {}", statefulset));
                    }
                    for deployment in namespace.deployments.values() {
                        lines.push(format!("      {}", deployment));
                    }
                }
            }
        }
        lines
    }
}
