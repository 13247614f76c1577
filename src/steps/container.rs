//! Typed commands for ECS services.
//!
//! | Step kind            | Command |
//! |----------------------|---------|
//! | `UpdateEcsTaskCount` | `aws ecs update-service ... --desired-count N` |
//! | `RestartEcsService`  | `aws ecs update-service ... --force-new-deployment` |
//! | `QueryEcsTaskStatus` | `aws ecs describe-services ... --output table` |

use crate::config::MaintenanceConfig;
use crate::step_traits::CommandLine;
use crate::topology::{EcsServiceRef, Topology};
use crate::types::CountMode;

/// JMESPath projection for the status table.
const SERVICE_STATUS_QUERY: &str =
    "services[].[serviceName,status,desiredCount,runningCount,pendingCount]";

fn aws_args(profile: &Option<String>, rest: &[&str]) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(profile) = profile {
        args.push("--profile".to_string());
        args.push(profile.clone());
    }
    args.extend(rest.iter().map(|s| s.to_string()));
    args
}

/// `aws ecs update-service --desired-count`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateServiceCountCommand {
    pub profile: Option<String>,
    pub region: String,
    pub cluster: String,
    pub service: String,
    pub desired_count: u32,
}

impl CommandLine for UpdateServiceCountCommand {
    fn program(&self) -> &'static str {
        "aws"
    }

    fn to_cli_args(&self) -> Vec<String> {
        let count = self.desired_count.to_string();
        aws_args(
            &self.profile,
            &[
                "ecs",
                "update-service",
                "--region",
                &self.region,
                "--cluster",
                &self.cluster,
                "--service",
                &self.service,
                "--desired-count",
                &count,
            ],
        )
    }
}

/// `aws ecs update-service --force-new-deployment`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForceNewDeploymentCommand {
    pub profile: Option<String>,
    pub region: String,
    pub cluster: String,
    pub service: String,
}

impl CommandLine for ForceNewDeploymentCommand {
    fn program(&self) -> &'static str {
        "aws"
    }

    fn to_cli_args(&self) -> Vec<String> {
        aws_args(
            &self.profile,
            &[
                "ecs",
                "update-service",
                "--region",
                &self.region,
                "--cluster",
                &self.cluster,
                "--service",
                &self.service,
                "--force-new-deployment",
            ],
        )
    }
}

/// `aws ecs describe-services` rendered as a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribeServiceCommand {
    pub profile: Option<String>,
    pub region: String,
    pub cluster: String,
    pub service: String,
}

impl CommandLine for DescribeServiceCommand {
    fn program(&self) -> &'static str {
        "aws"
    }

    fn to_cli_args(&self) -> Vec<String> {
        aws_args(
            &self.profile,
            &[
                "ecs",
                "describe-services",
                "--region",
                &self.region,
                "--cluster",
                &self.cluster,
                "--services",
                &self.service,
                "--query",
                SERVICE_STATUS_QUERY,
                "--output",
                "table",
            ],
        )
    }
}

pub fn has_services(topology: &Topology) -> bool {
    topology.ecs_services().next().is_some()
}

/// Desired-count changes; zero mode quiesces, restore mode returns to the baseline.
pub fn update_task_count(
    topology: &Topology,
    config: &MaintenanceConfig,
    mode: CountMode,
) -> Vec<UpdateServiceCountCommand> {
    topology
        .ecs_services()
        .map(|s: EcsServiceRef<'_>| UpdateServiceCountCommand {
            profile: config.aws_profile.clone(),
            region: s.region.name.clone(),
            cluster: s.cluster.name.clone(),
            service: s.service.name.clone(),
            desired_count: mode.target(s.service.baseline_count),
        })
        .collect()
}

pub fn restart_services(topology: &Topology, config: &MaintenanceConfig) -> Vec<ForceNewDeploymentCommand> {
    topology
        .ecs_services()
        .map(|s| ForceNewDeploymentCommand {
            profile: config.aws_profile.clone(),
            region: s.region.name.clone(),
            cluster: s.cluster.name.clone(),
            service: s.service.name.clone(),
        })
        .collect()
}

pub fn query_task_status(topology: &Topology, config: &MaintenanceConfig) -> Vec<DescribeServiceCommand> {
    topology
        .ecs_services()
        .map(|s| DescribeServiceCommand {
            profile: config.aws_profile.clone(),
            region: s.region.name.clone(),
            cluster: s.cluster.name.clone(),
            service: s.service.name.clone(),
        })
        .collect()
}
