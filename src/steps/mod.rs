//! Runbook steps.
//!
//! A [`Step`] is one catalog entry bound to a step number and an operator.
//! The closed set of kinds is [`StepKind`]; each kind maps to one resource
//! category and one action, with the command builders living in:
//!
//! - `container`: ECS services
//! - `kubernetes`: EKS StatefulSets and Deployments
//! - `database`: RDS instances

pub mod container;
pub mod database;
pub mod kubernetes;

use std::path::{Path, PathBuf};

use crate::config::MaintenanceConfig;
use crate::error::{MaintenanceError, Result};
use crate::operator::OperatorContext;
use crate::step_traits::{MaintenanceStep, render_all};
use crate::types::{CountMode, EngineFamily, StepKind};

/// One runbook step, immutable once constructed.
#[derive(Debug, Clone)]
pub struct Step<'a> {
    kind: StepKind,
    mode: Option<CountMode>,
    description: String,
    step_no: u32,
    context: &'a OperatorContext,
    output_dir: PathBuf,
    config: &'a MaintenanceConfig,
}

impl<'a> Step<'a> {
    /// Bind a step kind to its number and operator.
    ///
    /// `mode` only matters for count updates; those default to restore when
    /// it is `None`.
    pub fn new(
        kind: StepKind,
        mode: Option<CountMode>,
        description: impl Into<String>,
        step_no: u32,
        context: &'a OperatorContext,
        config: &'a MaintenanceConfig,
    ) -> Self {
        Self {
            kind,
            mode,
            description: description.into(),
            step_no,
            context,
            output_dir: context.output_dir.clone(),
            config,
        }
    }

    /// Write into `output_dir` instead of the operator's directory.
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn kind(&self) -> StepKind {
        self.kind
    }

    /// Effective mode for count updates.
    pub fn mode(&self) -> CountMode {
        self.mode.unwrap_or_default()
    }
}

impl MaintenanceStep for Step<'_> {
    fn step_no(&self) -> u32 {
        self.step_no
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn eligible(&self) -> bool {
        let topology = &self.context.topology;
        match self.kind {
            StepKind::UpdateEcsTaskCount
            | StepKind::RestartEcsService
            | StepKind::QueryEcsTaskStatus => container::has_services(topology),
            StepKind::UpdateK8sStatefulSetReplicas => kubernetes::has_statefulsets(topology),
            StepKind::UpdateK8sDeploymentReplicas
            | StepKind::RestartK8sDeployment
            | StepKind::QueryK8sDeploymentStatus => kubernetes::has_deployments(topology),
            StepKind::DumpPgstats => database::has_family(topology, EngineFamily::Postgres),
            StepKind::DumpMysqlTableStatus => database::has_family(topology, EngineFamily::Mysql),
            StepKind::ModifyDatabaseEngineVersion => database::has_pending_versions(topology),
            StepKind::ModifyDatabaseClassType => database::has_pending_classes(topology),
            StepKind::QueryDatabaseStatus => database::has_databases(topology),
        }
    }

    fn generate_commands(&self) -> Result<Vec<String>> {
        if !self.eligible() {
            return Ok(Vec::new());
        }

        let topology = &self.context.topology;
        let config = self.config;
        let commands = match self.kind {
            StepKind::UpdateEcsTaskCount => {
                render_all(container::update_task_count(topology, config, self.mode()))
            }
            StepKind::UpdateK8sStatefulSetReplicas => {
                render_all(kubernetes::scale_statefulsets(topology, config, self.mode()))
            }
            StepKind::UpdateK8sDeploymentReplicas => {
                render_all(kubernetes::scale_deployments(topology, config, self.mode()))
            }
            StepKind::DumpPgstats => render_all(database::dump_pgstats(topology, config, self.step_no)),
            StepKind::DumpMysqlTableStatus => {
                render_all(database::dump_mysql_table_status(topology, config, self.step_no))
            }
            StepKind::ModifyDatabaseEngineVersion => {
                render_all(database::modify_engine_versions(topology, config)?)
            }
            StepKind::ModifyDatabaseClassType => {
                render_all(database::modify_instance_classes(topology, config)?)
            }
            StepKind::QueryDatabaseStatus => render_all(database::query_database_status(topology, config)),
            StepKind::RestartK8sDeployment => render_all(kubernetes::restart_deployments(topology, config)),
            StepKind::RestartEcsService => render_all(container::restart_services(topology, config)),
            StepKind::QueryK8sDeploymentStatus => {
                render_all(kubernetes::query_deployment_status(topology, config))
            }
            StepKind::QueryEcsTaskStatus => render_all(container::query_task_status(topology, config)),
        };

        // A command file holds one command per line; an identifier carrying a
        // line break would silently split a command in two.
        if let Some(bad) = commands.iter().find(|c| c.contains(&['\n', '\r'][..])) {
            return Err(MaintenanceError::step_generation(
                self.kind.to_string(),
                format!("resource record produced a multi-line command: {:?}", bad),
            ));
        }

        Ok(commands)
    }
}
