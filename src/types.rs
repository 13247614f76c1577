//! Type-safe enums shared by the topology, the steps and the catalog.
//!
//! These replace stringly-typed engine names and step flags with proper Rust
//! enums that provide compile-time validation and exhaustive matching.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Relational engine family of a database.
///
/// The snapshot carries the raw RDS engine name; dump steps only care about
/// which client speaks to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EngineFamily {
    /// mysql, mariadb, aurora, aurora-mysql
    Mysql,
    /// postgres, aurora-postgresql
    Postgres,
}

impl EngineFamily {
    /// Map an RDS engine name onto its family.
    ///
    /// | Engine name          | Family     |
    /// |----------------------|------------|
    /// | `mysql`              | `Mysql`    |
    /// | `mariadb`            | `Mysql`    |
    /// | `aurora`             | `Mysql`    |
    /// | `aurora-mysql`       | `Mysql`    |
    /// | `postgres`           | `Postgres` |
    /// | `aurora-postgresql`  | `Postgres` |
    pub fn from_engine(engine: &str) -> Option<Self> {
        match engine.trim().to_lowercase().as_str() {
            "mysql" | "mariadb" | "aurora" | "aurora-mysql" => Some(Self::Mysql),
            "postgres" | "postgresql" | "aurora-postgresql" => Some(Self::Postgres),
            _ => None,
        }
    }

    /// Port the engine listens on when the snapshot does not say otherwise.
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Mysql => 3306,
            Self::Postgres => 5432,
        }
    }

    /// Database to connect to when the snapshot does not name one.
    pub fn default_database(&self) -> &'static str {
        match self {
            Self::Mysql => "mysql",
            Self::Postgres => "postgres",
        }
    }
}

/// Which end of the maintenance window a count-changing step serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CountMode {
    /// Drive the count to 0 to quiesce the workload
    Zero,
    /// Drive the count back to the baseline captured at load time
    #[default]
    Restore,
}

impl CountMode {
    /// Target count for a resource whose baseline is `baseline`.
    pub fn target(&self, baseline: u32) -> u32 {
        match self {
            Self::Zero => 0,
            Self::Restore => baseline,
        }
    }
}

/// Closed set of step kinds: one per resource category and action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Display, EnumString, EnumIter)]
pub enum StepKind {
    UpdateEcsTaskCount,
    UpdateK8sStatefulSetReplicas,
    UpdateK8sDeploymentReplicas,
    DumpPgstats,
    DumpMysqlTableStatus,
    ModifyDatabaseEngineVersion,
    ModifyDatabaseClassType,
    QueryDatabaseStatus,
    RestartK8sDeployment,
    RestartEcsService,
    QueryK8sDeploymentStatus,
    QueryEcsTaskStatus,
}

impl StepKind {
    /// Whether the kind behaves differently in zero and restore mode.
    pub fn is_mode_sensitive(&self) -> bool {
        matches!(
            self,
            Self::UpdateEcsTaskCount
                | Self::UpdateK8sStatefulSetReplicas
                | Self::UpdateK8sDeploymentReplicas
        )
    }
}
