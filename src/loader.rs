//! Resource Data Loader
//!
//! Reads a JSON resource snapshot and builds the [`Topology`] for one
//! maintenance id. Resources tagged with any other id are dropped while the
//! graph is built, so they are absent from the result rather than hidden.
//!
//! # Snapshot Format
//!
//! ```json
//! {
//!   "regions": [
//!     {
//!       "name": "ap-east-1",
//!       "databases": [
//!         { "identifier": "orders-db", "engine": "aurora-postgresql",
//!           "engine_version": "13.9", "instance_class": "db.r6g.large",
//!           "target_engine_version": "14.6", "maintenance_id": "MNT-1" }
//!       ],
//!       "ecs_clusters": [
//!         { "name": "web", "services": [
//!           { "name": "api", "desired_count": 3, "maintenance_id": "MNT-1" } ] }
//!       ],
//!       "eks_clusters": [
//!         { "name": "core", "namespaces": [
//!           { "name": "default",
//!             "statefulsets": [ { "name": "redis", "replicas": 3, "maintenance_id": "MNT-1" } ],
//!             "deployments": [ { "name": "web", "replicas": 2, "maintenance_id": "MNT-1" } ] } ] }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Leaf resources may carry an `operators` list. When it is non-empty only
//! those operators see the resource; the global view ignores it.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{MaintenanceError, Result};
use crate::topology::{
    ContainerCluster, ContainerService, Database, Namespace, OrchestrationCluster, Region,
    ReplicatedWorkload, StatefulWorkload, Topology,
};
use crate::types::EngineFamily;

// ============================================================================
// Snapshot Schema
// ============================================================================

/// Root of a resource snapshot document.
#[derive(Debug, Clone, Deserialize)]
pub struct Snapshot {
    pub regions: Vec<RegionRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegionRecord {
    pub name: String,
    #[serde(default)]
    pub databases: Vec<DatabaseRecord>,
    #[serde(default)]
    pub ecs_clusters: Vec<EcsClusterRecord>,
    #[serde(default)]
    pub eks_clusters: Vec<EksClusterRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseRecord {
    pub identifier: String,
    pub engine: String,
    pub engine_version: String,
    pub instance_class: String,
    #[serde(default)]
    pub target_engine_version: Option<String>,
    #[serde(default)]
    pub target_instance_class: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub database_name: Option<String>,
    pub maintenance_id: String,
    #[serde(default)]
    pub operators: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EcsClusterRecord {
    pub name: String,
    #[serde(default)]
    pub maintenance_id: Option<String>,
    #[serde(default)]
    pub services: Vec<EcsServiceRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EcsServiceRecord {
    pub name: String,
    pub desired_count: u32,
    pub maintenance_id: String,
    #[serde(default)]
    pub operators: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EksClusterRecord {
    pub name: String,
    #[serde(default)]
    pub maintenance_id: Option<String>,
    #[serde(default)]
    pub namespaces: Vec<NamespaceRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamespaceRecord {
    pub name: String,
    #[serde(default)]
    pub statefulsets: Vec<WorkloadRecord>,
    #[serde(default)]
    pub deployments: Vec<WorkloadRecord>,
}

/// StatefulSet or Deployment record.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkloadRecord {
    pub name: String,
    pub replicas: u32,
    pub maintenance_id: String,
    #[serde(default)]
    pub operators: Vec<String>,
}

impl Snapshot {
    /// Parse a snapshot document.
    pub fn from_json(content: &str) -> Result<Self> {
        let snapshot: Self = serde_json::from_str(content)?;
        Ok(snapshot)
    }

    /// Read and parse a snapshot file.
    pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).map_err(|e| MaintenanceError::io(&path, e))?;
        Self::from_json(&content)
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Builds topologies from snapshots.
pub struct ResourceDataLoader;

impl ResourceDataLoader {
    /// Load the global topology for `maintenance_id` from a snapshot file.
    pub fn load_from_file<P: AsRef<Path>>(path: P, maintenance_id: &str) -> Result<Topology> {
        let snapshot = Snapshot::read_from_file(&path)?;
        debug!("Loaded snapshot {:?} ({} regions)", path.as_ref(), snapshot.regions.len());
        Self::build(&snapshot, maintenance_id, None)
    }

    /// Load the topology one operator sees for `maintenance_id`.
    pub fn load_for_operator<P: AsRef<Path>>(
        path: P,
        maintenance_id: &str,
        operator: &str,
    ) -> Result<Topology> {
        let snapshot = Snapshot::read_from_file(&path)?;
        Self::build(&snapshot, maintenance_id, Some(operator))
    }

    /// Build a topology from an already parsed snapshot.
    ///
    /// With `operator` set, leaf resources assigned to other operators are
    /// left out. Whether the maintenance id is known is decided before that
    /// scoping, so an operator without assignments gets an empty topology
    /// instead of an error.
    ///
    /// # Errors
    ///
    /// - `MalformedSnapshot` on duplicate identifiers within one parent or an
    ///   unsupported database engine
    /// - `UnknownMaintenanceId` when nothing in the snapshot carries the id
    pub fn build(snapshot: &Snapshot, maintenance_id: &str, operator: Option<&str>) -> Result<Topology> {
        if maintenance_id.trim().is_empty() {
            return Err(MaintenanceError::UnknownMaintenanceId(maintenance_id.to_string()));
        }

        let mut topology = Topology::new(maintenance_id);
        let mut matched = false;
        let mut region_names = BTreeSet::new();

        for record in &snapshot.regions {
            ensure_unique(&mut region_names, &record.name, "region", "snapshot")?;

            let mut region = Region {
                name: record.name.clone(),
                ..Default::default()
            };

            let mut seen = BTreeSet::new();
            for db in &record.databases {
                ensure_unique(&mut seen, &db.identifier, "database", &record.name)?;
                if db.maintenance_id != maintenance_id {
                    continue;
                }
                matched = true;
                if visible_to(operator, &db.operators) {
                    region.databases.insert(db.identifier.clone(), database_from(db)?);
                }
            }

            let mut seen = BTreeSet::new();
            for cluster in &record.ecs_clusters {
                ensure_unique(&mut seen, &cluster.name, "ECS cluster", &record.name)?;
                let (kept, cluster_matched) = ecs_cluster_from(cluster, maintenance_id, operator)?;
                matched |= cluster_matched;
                if let Some(kept) = kept {
                    region.ecs_clusters.insert(kept.name.clone(), kept);
                }
            }

            let mut seen = BTreeSet::new();
            for cluster in &record.eks_clusters {
                ensure_unique(&mut seen, &cluster.name, "EKS cluster", &record.name)?;
                let (kept, cluster_matched) = eks_cluster_from(cluster, maintenance_id, operator)?;
                matched |= cluster_matched;
                if let Some(kept) = kept {
                    region.eks_clusters.insert(kept.name.clone(), kept);
                }
            }

            if !region.is_empty() {
                topology.regions.insert(region.name.clone(), region);
            }
        }

        if !matched {
            return Err(MaintenanceError::UnknownMaintenanceId(maintenance_id.to_string()));
        }

        info!(
            "Maintenance {}: {} resources in scope{}",
            maintenance_id,
            topology.resource_count(),
            operator.map(|op| format!(" for operator {}", op)).unwrap_or_default()
        );
        Ok(topology)
    }
}

fn ensure_unique(seen: &mut BTreeSet<String>, name: &str, kind: &str, parent: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(MaintenanceError::malformed(format!(
            "{} in {} has an empty name",
            kind, parent
        )));
    }
    if !seen.insert(name.to_string()) {
        return Err(MaintenanceError::malformed(format!(
            "duplicate {} '{}' in {}",
            kind, name, parent
        )));
    }
    Ok(())
}

fn visible_to(operator: Option<&str>, assigned: &[String]) -> bool {
    match operator {
        None => true,
        Some(_) if assigned.is_empty() => true,
        Some(op) => assigned.iter().any(|a| a == op),
    }
}

fn database_from(record: &DatabaseRecord) -> Result<Database> {
    let family = EngineFamily::from_engine(&record.engine).ok_or_else(|| {
        MaintenanceError::malformed(format!(
            "database '{}' has unsupported engine '{}'",
            record.identifier, record.engine
        ))
    })?;

    Ok(Database {
        identifier: record.identifier.clone(),
        engine: record.engine.clone(),
        family,
        engine_version: record.engine_version.clone(),
        instance_class: record.instance_class.clone(),
        target_engine_version: record.target_engine_version.clone(),
        target_instance_class: record.target_instance_class.clone(),
        endpoint: record.endpoint.clone(),
        port: record.port,
        database_name: record.database_name.clone(),
        maintenance_id: record.maintenance_id.clone(),
    })
}

/// Returns the kept cluster (if any) and whether anything in it matched the id.
fn ecs_cluster_from(
    record: &EcsClusterRecord,
    maintenance_id: &str,
    operator: Option<&str>,
) -> Result<(Option<ContainerCluster>, bool)> {
    let cluster_tagged = record.maintenance_id.as_deref() == Some(maintenance_id);
    let mut matched = cluster_tagged;
    let mut services = BTreeMap::new();
    let mut seen = BTreeSet::new();

    for service in &record.services {
        ensure_unique(&mut seen, &service.name, "ECS service", &record.name)?;
        if service.maintenance_id != maintenance_id {
            continue;
        }
        matched = true;
        if visible_to(operator, &service.operators) {
            services.insert(
                service.name.clone(),
                ContainerService {
                    name: service.name.clone(),
                    baseline_count: service.desired_count,
                    maintenance_id: service.maintenance_id.clone(),
                },
            );
        }
    }

    let kept = (cluster_tagged || !services.is_empty()).then(|| ContainerCluster {
        name: record.name.clone(),
        services,
    });
    Ok((kept, matched))
}

fn eks_cluster_from(
    record: &EksClusterRecord,
    maintenance_id: &str,
    operator: Option<&str>,
) -> Result<(Option<OrchestrationCluster>, bool)> {
    let cluster_tagged = record.maintenance_id.as_deref() == Some(maintenance_id);
    let mut matched = cluster_tagged;
    let mut namespaces = BTreeMap::new();
    let mut seen_namespaces = BTreeSet::new();

    for ns in &record.namespaces {
        ensure_unique(&mut seen_namespaces, &ns.name, "namespace", &record.name)?;

        let mut namespace = Namespace {
            name: ns.name.clone(),
            ..Default::default()
        };

        let mut seen = BTreeSet::new();
        for workload in &ns.statefulsets {
            ensure_unique(&mut seen, &workload.name, "statefulset", &ns.name)?;
            if workload.maintenance_id != maintenance_id {
                continue;
            }
            matched = true;
            if visible_to(operator, &workload.operators) {
                namespace.statefulsets.insert(
                    workload.name.clone(),
                    StatefulWorkload {
                        name: workload.name.clone(),
                        baseline_replicas: workload.replicas,
                        maintenance_id: workload.maintenance_id.clone(),
                    },
                );
            }
        }

        let mut seen = BTreeSet::new();
        for workload in &ns.deployments {
            ensure_unique(&mut seen, &workload.name, "deployment", &ns.name)?;
            if workload.maintenance_id != maintenance_id {
                continue;
            }
            matched = true;
            if visible_to(operator, &workload.operators) {
                namespace.deployments.insert(
                    workload.name.clone(),
                    ReplicatedWorkload {
                        name: workload.name.clone(),
                        baseline_replicas: workload.replicas,
                        maintenance_id: workload.maintenance_id.clone(),
                    },
                );
            }
        }

        if !namespace.statefulsets.is_empty() || !namespace.deployments.is_empty() {
            namespaces.insert(namespace.name.clone(), namespace);
        }
    }

    let kept = (cluster_tagged || !namespaces.is_empty()).then(|| OrchestrationCluster {
        name: record.name.clone(),
        namespaces,
    });
    Ok((kept, matched))
}
