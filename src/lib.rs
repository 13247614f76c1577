//! Cloud maintenance workflow engine
//!
//! This library plans maintenance windows across RDS databases, ECS services
//! and EKS workloads by generating an ordered, numbered set of command files
//! that an operator reviews and executes by hand. It never runs the commands.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod loader;
pub mod operator;
pub mod step_traits;
pub mod steps;
pub mod topology;
pub mod types;
pub mod writer;

// Re-export main types for convenience
pub use catalog::{CatalogEntry, MAINTENANCE_RUNBOOK};
pub use config::MaintenanceConfig;
pub use engine::pipeline::{PipelineReport, RealizedStep, plan_pipeline, run_pipeline};
pub use error::{MaintenanceError, Result};
pub use loader::{ResourceDataLoader, Snapshot};
pub use operator::OperatorContext;
pub use step_traits::{CommandLine, MaintenanceStep};
pub use steps::Step;
pub use topology::{
    ContainerCluster, ContainerService, Database, Namespace, OrchestrationCluster, Region,
    ReplicatedWorkload, StatefulWorkload, Topology,
};
pub use types::{CountMode, EngineFamily, StepKind};
