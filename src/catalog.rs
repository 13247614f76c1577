//! The maintenance runbook.
//!
//! A fixed, ordered list covering every resource category whether or not a
//! given maintenance touches it. The pipeline skips numbers for entries with
//! no work, so the realized numbering stays dense.
//!
//! Count updates appear twice: zero mode on the way in, restore mode on the
//! way out. Table dumps also appear twice, before and after the database
//! modifications, so the operator can compare them.

use crate::types::{CountMode, StepKind};

/// One runbook entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub kind: StepKind,
    /// Only set for count updates
    pub mode: Option<CountMode>,
    pub description: &'static str,
}

impl CatalogEntry {
    pub const fn new(kind: StepKind, description: &'static str) -> Self {
        Self {
            kind,
            mode: None,
            description,
        }
    }

    pub const fn with_mode(kind: StepKind, mode: CountMode, description: &'static str) -> Self {
        Self {
            kind,
            mode: Some(mode),
            description,
        }
    }
}

/// Ordered runbook for a maintenance window.
///
/// "restarting k8s deployment" and "restarting eks deployment" are the same
/// kind against the same resources; both entries are kept.
pub const MAINTENANCE_RUNBOOK: &[CatalogEntry] = &[
    CatalogEntry::with_mode(
        StepKind::UpdateEcsTaskCount,
        CountMode::Zero,
        "generate commands for updating ecs task count to 0",
    ),
    CatalogEntry::with_mode(
        StepKind::UpdateK8sStatefulSetReplicas,
        CountMode::Zero,
        "generate commands for updating k8s statefulset replicas to 0",
    ),
    CatalogEntry::with_mode(
        StepKind::UpdateK8sDeploymentReplicas,
        CountMode::Zero,
        "generate commands for updating k8s deployment replicas to 0",
    ),
    CatalogEntry::new(StepKind::DumpPgstats, "generate commands for dumping pgstats"),
    CatalogEntry::new(
        StepKind::DumpMysqlTableStatus,
        "generate commands for dumping mysql table status",
    ),
    CatalogEntry::new(
        StepKind::ModifyDatabaseEngineVersion,
        "generate commands for modifying database engine version",
    ),
    CatalogEntry::new(
        StepKind::ModifyDatabaseClassType,
        "generate commands for modifying database class type",
    ),
    CatalogEntry::new(
        StepKind::QueryDatabaseStatus,
        "generate commands for querying database status",
    ),
    CatalogEntry::new(
        StepKind::DumpMysqlTableStatus,
        "generate commands for dumping mysql table status",
    ),
    CatalogEntry::new(StepKind::DumpPgstats, "generate commands for dumping pgstats"),
    CatalogEntry::new(
        StepKind::RestartK8sDeployment,
        "generate commands for restarting k8s deployment",
    ),
    CatalogEntry::new(
        StepKind::RestartEcsService,
        "generate commands for restarting ecs service",
    ),
    CatalogEntry::new(
        StepKind::RestartK8sDeployment,
        "generate commands for restarting eks deployment",
    ),
    CatalogEntry::with_mode(
        StepKind::UpdateK8sDeploymentReplicas,
        CountMode::Restore,
        "generate commands for updating k8s deployment replicas to resume",
    ),
    CatalogEntry::with_mode(
        StepKind::UpdateK8sStatefulSetReplicas,
        CountMode::Restore,
        "generate commands for updating k8s statefulset replicas to resume",
    ),
    CatalogEntry::with_mode(
        StepKind::UpdateEcsTaskCount,
        CountMode::Restore,
        "generate commands for updating ecs task count to resume",
    ),
    CatalogEntry::new(
        StepKind::QueryK8sDeploymentStatus,
        "generate commands for querying k8s deployment status",
    ),
    CatalogEntry::new(
        StepKind::QueryEcsTaskStatus,
        "generate commands for querying ecs task status",
    ),
];
