//! The delta data model.
//!
//! A [`Delta`] holds exactly one direction's content for one id. Engine
//! specific sub-artifacts live in [`EngineArtifacts`]; the manager never
//! inspects them and applies every variant through [`Delta::statements`].

use crate::config::DatabaseEngine;
use crate::delta_id::DeltaId;
use crate::direction::Direction;
use serde::{Deserialize, Serialize};

/// Oracle package: head and body compiled with `CREATE OR REPLACE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub head_source: String,
    pub body_source: String,
}

/// DBMS_SCHEDULER job statement for the delta's direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerJob {
    pub name: String,
    pub statement: String,
}

/// MySQL stored function, recreated by drop-then-create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFunction {
    pub name: String,
    pub source: String,
}

/// Engine-specific structured artifacts carried by a delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "engine", rename_all = "lowercase")]
pub enum EngineArtifacts {
    Oracle {
        packages: Vec<Package>,
        jobs: Vec<SchedulerJob>,
    },
    #[serde(rename = "mysql")]
    MySql { functions: Vec<StoredFunction> },
}

impl EngineArtifacts {
    /// Empty artifact set for an engine.
    pub fn empty(engine: DatabaseEngine) -> Self {
        match engine {
            DatabaseEngine::Oracle => EngineArtifacts::Oracle {
                packages: Vec::new(),
                jobs: Vec::new(),
            },
            DatabaseEngine::MySql => EngineArtifacts::MySql {
                functions: Vec::new(),
            },
        }
    }

    /// Engine these artifacts belong to.
    pub fn engine(&self) -> DatabaseEngine {
        match self {
            EngineArtifacts::Oracle { .. } => DatabaseEngine::Oracle,
            EngineArtifacts::MySql { .. } => DatabaseEngine::MySql,
        }
    }
}

/// One versioned, directional unit of schema/data change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    id: DeltaId,
    order: usize,
    direction: Direction,
    summary: String,
    schema: Option<String>,
    ddl: Vec<String>,
    artifacts: EngineArtifacts,
}

impl Delta {
    /// Start a delta for `id` at catalog position `order`.
    ///
    /// `order` comes from the provider's catalog so that it always agrees with
    /// the natural ordering of ids.
    pub fn new(id: DeltaId, order: usize, direction: Direction, engine: DatabaseEngine) -> Self {
        Self {
            id,
            order,
            direction,
            summary: String::new(),
            schema: None,
            ddl: Vec::new(),
            artifacts: EngineArtifacts::empty(engine),
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_schema(mut self, schema: Option<String>) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_ddl(mut self, ddl: Vec<String>) -> Self {
        self.ddl = ddl;
        self
    }

    /// Replace the artifacts; the engine must not change.
    ///
    /// Returns the delta unchanged as `Err` when the artifacts belong to a
    /// different engine.
    pub fn with_artifacts(mut self, artifacts: EngineArtifacts) -> Result<Self, Self> {
        if artifacts.engine() != self.artifacts.engine() {
            return Err(self);
        }
        self.artifacts = artifacts;
        Ok(self)
    }

    pub fn id(&self) -> &DeltaId {
        &self.id
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// DDL/DML statements for the current direction, in source order.
    pub fn ddl(&self) -> &[String] {
        &self.ddl
    }

    pub fn engine(&self) -> DatabaseEngine {
        self.artifacts.engine()
    }

    pub fn artifacts(&self) -> &EngineArtifacts {
        &self.artifacts
    }

    /// Oracle packages; `None` for engines without packages.
    pub fn packages(&self) -> Option<&[Package]> {
        match &self.artifacts {
            EngineArtifacts::Oracle { packages, .. } => Some(packages),
            EngineArtifacts::MySql { .. } => None,
        }
    }

    /// Oracle scheduler jobs; `None` for engines without a scheduler.
    pub fn jobs(&self) -> Option<&[SchedulerJob]> {
        match &self.artifacts {
            EngineArtifacts::Oracle { jobs, .. } => Some(jobs),
            EngineArtifacts::MySql { .. } => None,
        }
    }

    /// MySQL stored functions; `None` for engines that package routines.
    pub fn functions(&self) -> Option<&[StoredFunction]> {
        match &self.artifacts {
            EngineArtifacts::MySql { functions } => Some(functions),
            EngineArtifacts::Oracle { .. } => None,
        }
    }

    /// The full ordered statement sequence to execute for this delta.
    ///
    /// Order: DDL, then routines (package head and body, or function drop and
    /// create), then scheduler jobs.
    pub fn statements(&self) -> Vec<String> {
        let mut statements = self.ddl.clone();
        match &self.artifacts {
            EngineArtifacts::Oracle { packages, jobs } => {
                for package in packages {
                    statements.push(package.head_source.clone());
                    statements.push(package.body_source.clone());
                }
                statements.extend(jobs.iter().map(|job| job.statement.clone()));
            }
            EngineArtifacts::MySql { functions } => {
                for function in functions {
                    statements.push(format!("DROP FUNCTION IF EXISTS {}", function.name));
                    statements.push(function.source.clone());
                }
            }
        }
        statements
    }
}

#[cfg(test)]
#[path = "delta_test.rs"]
mod tests;
