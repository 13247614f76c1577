//! Typed kubectl commands for EKS workloads.
//!
//! Every command pins `--context` and `--namespace` explicitly so a line can
//! be pasted into any shell regardless of the operator's current kubeconfig.

use strum::Display;

use crate::config::MaintenanceConfig;
use crate::step_traits::CommandLine;
use crate::topology::{Topology, WorkloadRef};
use crate::types::CountMode;

/// Kubernetes resource type addressed by a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum WorkloadKind {
    StatefulSet,
    Deployment,
}

/// `kubectl scale <kind>/<name> --replicas=N`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleCommand {
    pub context: String,
    pub namespace: String,
    pub kind: WorkloadKind,
    pub name: String,
    pub replicas: u32,
}

impl CommandLine for ScaleCommand {
    fn program(&self) -> &'static str {
        "kubectl"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            "--context".to_string(),
            self.context.clone(),
            "--namespace".to_string(),
            self.namespace.clone(),
            "scale".to_string(),
            format!("{}/{}", self.kind, self.name),
            format!("--replicas={}", self.replicas),
        ]
    }
}

/// `kubectl rollout restart deployment/<name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolloutRestartCommand {
    pub context: String,
    pub namespace: String,
    pub name: String,
}

impl CommandLine for RolloutRestartCommand {
    fn program(&self) -> &'static str {
        "kubectl"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            "--context".to_string(),
            self.context.clone(),
            "--namespace".to_string(),
            self.namespace.clone(),
            "rollout".to_string(),
            "restart".to_string(),
            format!("{}/{}", WorkloadKind::Deployment, self.name),
        ]
    }
}

/// `kubectl rollout status deployment/<name>`, waiting up to the timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolloutStatusCommand {
    pub context: String,
    pub namespace: String,
    pub name: String,
    pub timeout_secs: u32,
}

impl CommandLine for RolloutStatusCommand {
    fn program(&self) -> &'static str {
        "kubectl"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            "--context".to_string(),
            self.context.clone(),
            "--namespace".to_string(),
            self.namespace.clone(),
            "rollout".to_string(),
            "status".to_string(),
            format!("{}/{}", WorkloadKind::Deployment, self.name),
            format!("--timeout={}s", self.timeout_secs),
        ]
    }
}

fn context_of<W>(config: &MaintenanceConfig, w: &WorkloadRef<'_, W>) -> String {
    config.kube_context(&w.region.name, &w.cluster.name)
}

pub fn has_statefulsets(topology: &Topology) -> bool {
    topology.statefulsets().next().is_some()
}

pub fn has_deployments(topology: &Topology) -> bool {
    topology.deployments().next().is_some()
}

pub fn scale_statefulsets(
    topology: &Topology,
    config: &MaintenanceConfig,
    mode: CountMode,
) -> Vec<ScaleCommand> {
    topology
        .statefulsets()
        .map(|w| ScaleCommand {
            context: context_of(config, &w),
            namespace: w.namespace.name.clone(),
            kind: WorkloadKind::StatefulSet,
            name: w.workload.name.clone(),
            replicas: mode.target(w.workload.baseline_replicas),
        })
        .collect()
}

pub fn scale_deployments(
    topology: &Topology,
    config: &MaintenanceConfig,
    mode: CountMode,
) -> Vec<ScaleCommand> {
    topology
        .deployments()
        .map(|w| ScaleCommand {
            context: context_of(config, &w),
            namespace: w.namespace.name.clone(),
            kind: WorkloadKind::Deployment,
            name: w.workload.name.clone(),
            replicas: mode.target(w.workload.baseline_replicas),
        })
        .collect()
}

pub fn restart_deployments(topology: &Topology, config: &MaintenanceConfig) -> Vec<RolloutRestartCommand> {
    topology
        .deployments()
        .map(|w| RolloutRestartCommand {
            context: context_of(config, &w),
            namespace: w.namespace.name.clone(),
            name: w.workload.name.clone(),
        })
        .collect()
}

pub fn query_deployment_status(topology: &Topology, config: &MaintenanceConfig) -> Vec<RolloutStatusCommand> {
    topology
        .deployments()
        .map(|w| RolloutStatusCommand {
            context: context_of(config, &w),
            namespace: w.namespace.name.clone(),
            name: w.workload.name.clone(),
            timeout_secs: config.rollout_timeout_secs,
        })
        .collect()
}
