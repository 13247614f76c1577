//! Typed commands for RDS databases.
//!
//! Table dumps run before and after the engine work so the operator can
//! compare row counts; their output files carry the realized step number so
//! the two dumps never collide.
//!
//! Engine version targets are checked here: a downgrade, or a version that is
//! not dotted numeric, is a malformed record and fails the step.

use std::cmp::Ordering;

use crate::config::MaintenanceConfig;
use crate::error::{MaintenanceError, Result};
use crate::step_traits::CommandLine;
use crate::topology::{Database, Topology};
use crate::types::{EngineFamily, StepKind};

/// JMESPath projection for the status table.
const DB_STATUS_QUERY: &str =
    "DBInstances[].[DBInstanceIdentifier,DBInstanceStatus,Engine,EngineVersion,DBInstanceClass]";

const PGSTATS_SQL: &str = "SELECT * FROM pg_stat_user_tables ORDER BY schemaname, relname";

fn aws_args(profile: &Option<String>, rest: Vec<String>) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(profile) = profile {
        args.push("--profile".to_string());
        args.push(profile.clone());
    }
    args.extend(rest);
    args
}

/// `psql ... --csv --command <pg_stat_user_tables> > file`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgStatsDumpCommand {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub output: String,
}

impl CommandLine for PgStatsDumpCommand {
    fn program(&self) -> &'static str {
        "psql"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            format!("host={} port={} dbname={}", self.host, self.port, self.database),
            "--no-psqlrc".to_string(),
            "--csv".to_string(),
            "--command".to_string(),
            PGSTATS_SQL.to_string(),
        ]
    }

    fn redirect(&self) -> Option<String> {
        Some(self.output.clone())
    }
}

/// `mysql ... --execute "SHOW TABLE STATUS FROM <db>" > file`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MysqlTableStatusDumpCommand {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub output: String,
}

impl CommandLine for MysqlTableStatusDumpCommand {
    fn program(&self) -> &'static str {
        "mysql"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            format!("--host={}", self.host),
            format!("--port={}", self.port),
            "--batch".to_string(),
            "--execute".to_string(),
            format!("SHOW TABLE STATUS FROM `{}`", self.database),
        ]
    }

    fn redirect(&self) -> Option<String> {
        Some(self.output.clone())
    }
}

/// `aws rds modify-db-instance --engine-version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyEngineVersionCommand {
    pub profile: Option<String>,
    pub region: String,
    pub identifier: String,
    pub engine_version: String,
    pub allow_major_upgrade: bool,
    pub apply_immediately: bool,
}

impl CommandLine for ModifyEngineVersionCommand {
    fn program(&self) -> &'static str {
        "aws"
    }

    fn to_cli_args(&self) -> Vec<String> {
        let mut rest = vec![
            "rds".to_string(),
            "modify-db-instance".to_string(),
            "--region".to_string(),
            self.region.clone(),
            "--db-instance-identifier".to_string(),
            self.identifier.clone(),
            "--engine-version".to_string(),
            self.engine_version.clone(),
        ];
        if self.allow_major_upgrade {
            rest.push("--allow-major-version-upgrade".to_string());
        }
        if self.apply_immediately {
            rest.push("--apply-immediately".to_string());
        }
        aws_args(&self.profile, rest)
    }
}

/// `aws rds modify-db-instance --db-instance-class`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyInstanceClassCommand {
    pub profile: Option<String>,
    pub region: String,
    pub identifier: String,
    pub instance_class: String,
    pub apply_immediately: bool,
}

impl CommandLine for ModifyInstanceClassCommand {
    fn program(&self) -> &'static str {
        "aws"
    }

    fn to_cli_args(&self) -> Vec<String> {
        let mut rest = vec![
            "rds".to_string(),
            "modify-db-instance".to_string(),
            "--region".to_string(),
            self.region.clone(),
            "--db-instance-identifier".to_string(),
            self.identifier.clone(),
            "--db-instance-class".to_string(),
            self.instance_class.clone(),
        ];
        if self.apply_immediately {
            rest.push("--apply-immediately".to_string());
        }
        aws_args(&self.profile, rest)
    }
}

/// `aws rds describe-db-instances` rendered as a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribeDbInstanceCommand {
    pub profile: Option<String>,
    pub region: String,
    pub identifier: String,
}

impl CommandLine for DescribeDbInstanceCommand {
    fn program(&self) -> &'static str {
        "aws"
    }

    fn to_cli_args(&self) -> Vec<String> {
        aws_args(
            &self.profile,
            vec![
                "rds".to_string(),
                "describe-db-instances".to_string(),
                "--region".to_string(),
                self.region.clone(),
                "--db-instance-identifier".to_string(),
                self.identifier.clone(),
                "--query".to_string(),
                DB_STATUS_QUERY.to_string(),
                "--output".to_string(),
                "table".to_string(),
            ],
        )
    }
}

// ============================================================================
// Eligibility
// ============================================================================

pub fn has_databases(topology: &Topology) -> bool {
    topology.databases().next().is_some()
}

pub fn has_family(topology: &Topology, family: EngineFamily) -> bool {
    topology.databases_of(family).next().is_some()
}

pub fn has_pending_versions(topology: &Topology) -> bool {
    topology
        .databases()
        .any(|(_, db)| db.pending_engine_version().is_some())
}

pub fn has_pending_classes(topology: &Topology) -> bool {
    topology
        .databases()
        .any(|(_, db)| db.pending_instance_class().is_some())
}

// ============================================================================
// Command Generation
// ============================================================================

pub fn dump_pgstats(topology: &Topology, config: &MaintenanceConfig, step_no: u32) -> Vec<PgStatsDumpCommand> {
    topology
        .databases_of(EngineFamily::Postgres)
        .map(|(_, db)| PgStatsDumpCommand {
            host: db.host().to_string(),
            port: db.port(),
            database: db.database_name().to_string(),
            output: format!("{}/{}-pgstats-{}.csv", config.dump_dir, db.identifier, step_no),
        })
        .collect()
}

pub fn dump_mysql_table_status(
    topology: &Topology,
    config: &MaintenanceConfig,
    step_no: u32,
) -> Vec<MysqlTableStatusDumpCommand> {
    topology
        .databases_of(EngineFamily::Mysql)
        .map(|(_, db)| MysqlTableStatusDumpCommand {
            host: db.host().to_string(),
            port: db.port(),
            database: db.database_name().to_string(),
            output: format!("{}/{}-table-status-{}.tsv", config.dump_dir, db.identifier, step_no),
        })
        .collect()
}

/// Engine upgrades for every database with a pending target version.
///
/// # Errors
///
/// `StepGeneration` when either version is not dotted numeric or the target
/// is older than the current version.
pub fn modify_engine_versions(
    topology: &Topology,
    config: &MaintenanceConfig,
) -> Result<Vec<ModifyEngineVersionCommand>> {
    let mut commands = Vec::new();
    for (region, db) in topology.databases() {
        let Some(target) = db.pending_engine_version() else {
            continue;
        };
        let current_key = version_key(db, &db.engine_version)?;
        let target_key = version_key(db, target)?;
        if compare_versions(&target_key, &current_key) == Ordering::Less {
            return Err(MaintenanceError::step_generation(
                StepKind::ModifyDatabaseEngineVersion.to_string(),
                format!(
                    "database '{}' target version {} is older than current {}",
                    db.identifier, target, db.engine_version
                ),
            ));
        }
        commands.push(ModifyEngineVersionCommand {
            profile: config.aws_profile.clone(),
            region: region.name.clone(),
            identifier: db.identifier.clone(),
            engine_version: target.to_string(),
            allow_major_upgrade: major_of(db.family, &current_key) != major_of(db.family, &target_key),
            apply_immediately: config.apply_immediately,
        });
    }
    Ok(commands)
}

/// Class changes for every database with a pending target class.
///
/// # Errors
///
/// `StepGeneration` when a target class is not an RDS class (`db.*`).
pub fn modify_instance_classes(
    topology: &Topology,
    config: &MaintenanceConfig,
) -> Result<Vec<ModifyInstanceClassCommand>> {
    let mut commands = Vec::new();
    for (region, db) in topology.databases() {
        let Some(target) = db.pending_instance_class() else {
            continue;
        };
        if !target.starts_with("db.") || target.len() <= 3 {
            return Err(MaintenanceError::step_generation(
                StepKind::ModifyDatabaseClassType.to_string(),
                format!("database '{}' target class '{}' is not a db.* class", db.identifier, target),
            ));
        }
        commands.push(ModifyInstanceClassCommand {
            profile: config.aws_profile.clone(),
            region: region.name.clone(),
            identifier: db.identifier.clone(),
            instance_class: target.to_string(),
            apply_immediately: config.apply_immediately,
        });
    }
    Ok(commands)
}

pub fn query_database_status(topology: &Topology, config: &MaintenanceConfig) -> Vec<DescribeDbInstanceCommand> {
    topology
        .databases()
        .map(|(region, db)| DescribeDbInstanceCommand {
            profile: config.aws_profile.clone(),
            region: region.name.clone(),
            identifier: db.identifier.clone(),
        })
        .collect()
}

/// Numeric components of a version, in order.
///
/// Aurora MySQL versions such as `8.0.mysql_aurora.3.04.0` mix in a label;
/// non-numeric components are skipped, but the first one must be numeric.
fn version_key(db: &Database, version: &str) -> Result<Vec<u64>> {
    let mut parts = version.split('.');
    let leading = parts.next().and_then(|p| p.parse::<u64>().ok());
    let Some(leading) = leading else {
        return Err(MaintenanceError::step_generation(
            StepKind::ModifyDatabaseEngineVersion.to_string(),
            format!(
                "database '{}' has engine version '{}' that is not dotted numeric",
                db.identifier, version
            ),
        ));
    };
    let mut key = vec![leading];
    key.extend(parts.filter_map(|p| p.parse::<u64>().ok()));
    Ok(key)
}

/// The part of a version key that names the major version.
///
/// MySQL majors are two components (5.7, 8.0); PostgreSQL majors are one
/// component from 10 on and two before (9.6).
fn major_of(family: EngineFamily, key: &[u64]) -> Vec<u64> {
    let width = match family {
        EngineFamily::Mysql => 2,
        EngineFamily::Postgres if key.first().is_some_and(|m| *m < 10) => 2,
        EngineFamily::Postgres => 1,
    };
    (0..width).map(|i| key.get(i).copied().unwrap_or(0)).collect()
}

/// Order two version keys, missing trailing components counting as zero.
fn compare_versions(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| a.get(i).copied().unwrap_or(0).cmp(&b.get(i).copied().unwrap_or(0)))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}
