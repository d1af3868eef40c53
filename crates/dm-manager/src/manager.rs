//! The delta manager: resolve a range, then apply it delta by delta

use crate::config::ManagerConfig;
use crate::error::{ApplyError, ManagerError};
use crate::plan::{resolve_plan, MigrationPlan};
use dm_core::{ApplyReport, Delta, DeltaFormat, DeltaId, StorageEngine, VersionStore};
use dm_db::Database;
use dm_delta::{DeltaParser, DeltaProvider, LocalDeltaProvider, ProviderSession, XmlDeltaParser};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Coordinates provider, parser, database and version store for one run.
///
/// The manager owns its provider and parser. Databases and version stores
/// are borrowed per run so a caller can choose between executing live and
/// writing a script.
pub struct DeltaManager {
    config: ManagerConfig,
    provider: Box<dyn DeltaProvider>,
    parser: Box<dyn DeltaParser>,
    cancel: Arc<AtomicBool>,
}

impl DeltaManager {
    /// Build the provider and parser the configuration asks for
    pub fn new(config: ManagerConfig) -> Self {
        let provider: Box<dyn DeltaProvider> = match config.storage.engine {
            StorageEngine::Local => Box::new(
                LocalDeltaProvider::new(config.storage.format)
                    .with_branches(config.branches.clone()),
            ),
        };
        let parser: Box<dyn DeltaParser> = match config.storage.format {
            DeltaFormat::Xml => Box::new(XmlDeltaParser::new(config.database)),
        };
        Self {
            config,
            provider,
            parser,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Use caller-supplied components; the parser must target the configured engine
    pub fn with_components(
        config: ManagerConfig,
        provider: Box<dyn DeltaProvider>,
        parser: Box<dyn DeltaParser>,
    ) -> Result<Self, ManagerError> {
        if parser.engine() != config.database {
            return Err(ManagerError::EngineMismatch {
                parser: parser.engine(),
                database: config.database,
            });
        }
        Ok(Self {
            config,
            provider,
            parser,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Share a flag that stops the run before the next delta when set
    pub fn with_cancellation(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Resolve bounds and the ordered range without fetching any content
    pub fn plan(&mut self, store: &dyn VersionStore) -> Result<MigrationPlan, ManagerError> {
        let mut session =
            ProviderSession::open(self.provider.as_mut(), &self.config.storage.location)
                .map_err(ManagerError::Connection)?;
        resolve(&self.config, &mut session, store)
    }

    /// Resolve the range and apply every delta in it.
    ///
    /// Stops at the first delta that fails to parse, apply or record. The
    /// version store is written after each fully applied delta, so a failed
    /// run can be resumed from the last marker. The provider is disconnected
    /// on every exit path.
    pub async fn run(
        &mut self,
        db: &dyn Database,
        store: &dyn VersionStore,
    ) -> Result<ApplyReport, ManagerError> {
        let mut session =
            ProviderSession::open(self.provider.as_mut(), &self.config.storage.location)
                .map_err(ManagerError::Connection)?;
        let plan = resolve(&self.config, &mut session, store)?;

        let mut report = ApplyReport::new(
            self.config.database,
            plan.branch.clone(),
            plan.last_delta.clone(),
            Some(plan.target_delta.clone()),
        );

        let Some(direction) = plan.direction else {
            log::info!(
                "Branch '{}' is already at delta {}, nothing to apply",
                plan.branch,
                plan.target_delta
            );
            report.mark_completed();
            return Ok(report);
        };

        log::info!(
            "Applying {} delta(s) {} on branch '{}' via {}",
            plan.steps.len(),
            direction,
            plan.branch,
            db.db_type()
        );
        report.begin(direction, plan.ids());

        for step in &plan.steps {
            if self.cancel.load(Ordering::SeqCst) {
                log::warn!("Run cancelled before delta {}", step.id);
                report.mark_cancelled();
                return Err(ManagerError::Cancelled {
                    report: Box::new(report),
                });
            }

            let started = Instant::now();
            let delta = match self.parser.parse(session.provider(), &step.id, direction) {
                Ok(delta) => delta,
                Err(source) => {
                    report.mark_failed(&step.id, direction, &source.to_string());
                    return Err(ManagerError::Parse {
                        id: step.id.clone(),
                        direction,
                        source,
                        report: Box::new(report),
                    });
                }
            };

            let statements = match apply_delta(db, &delta).await {
                Ok(count) => count,
                Err(source) => {
                    report.mark_failed(&step.id, direction, &source.to_string());
                    return Err(ManagerError::Apply {
                        id: step.id.clone(),
                        direction,
                        source,
                        report: Box::new(report),
                    });
                }
            };

            if let Err(source) =
                store.record_applied(self.config.database, &self.config.branch, &delta)
            {
                report.mark_failed(&step.id, direction, &source.to_string());
                return Err(ManagerError::Record {
                    id: step.id.clone(),
                    direction,
                    source,
                    report: Box::new(report),
                });
            }

            let duration_ms = started.elapsed().as_millis() as u64;
            report.mark_applied(&delta, statements, duration_ms);
            log::info!(
                "Applied delta {} {} ({} statement(s), {}ms)",
                delta.id(),
                direction,
                statements,
                duration_ms
            );
        }

        report.mark_completed();
        Ok(report)
    }
}

fn resolve(
    config: &ManagerConfig,
    session: &mut ProviderSession<'_>,
    store: &dyn VersionStore,
) -> Result<MigrationPlan, ManagerError> {
    let last: Option<DeltaId> = match &config.last_delta {
        Some(id) => Some(id.clone()),
        None => store
            .last_applied(config.database, &config.branch)
            .map_err(ManagerError::Store)?,
    };
    log::debug!(
        "Resolving branch '{}' from {} to {}",
        config.branch,
        last.as_ref().map_or("<none>".to_string(), |id| id.to_string()),
        config
            .target_delta
            .as_ref()
            .map_or("<latest>".to_string(), |id| id.to_string())
    );

    let catalog = session
        .provider_mut()
        .available_deltas(&config.branch)
        .map_err(|source| ManagerError::Catalog {
            branch: config.branch.clone(),
            source,
        })?;

    Ok(resolve_plan(
        catalog,
        &config.branch,
        last.as_ref(),
        config.target_delta.as_ref(),
    )?)
}

/// Hand the statements of one delta to the database, in order
async fn apply_delta(db: &dyn Database, delta: &Delta) -> Result<usize, ApplyError> {
    let mut header = format!("delta {} {}", delta.id(), delta.direction());
    if let Some(schema) = delta.schema() {
        header.push_str(&format!(" [{schema}]"));
    }
    if !delta.summary().is_empty() {
        header.push_str(": ");
        header.push_str(delta.summary());
    }
    db.comment(&header)
        .await
        .map_err(|e| ApplyError::Output {
            id: delta.id().clone(),
            message: e.to_string(),
        })?;

    let statements = delta.statements();
    for (index, sql) in statements.iter().enumerate() {
        log::debug!("Delta {} statement {}: {}", delta.id(), index + 1, sql);
        db.execute_batch(sql)
            .await
            .map_err(|e| ApplyError::StatementFailed {
                id: delta.id().clone(),
                index: index + 1,
                statement: sql.clone(),
                message: e.to_string(),
            })?;
    }
    Ok(statements.len())
}

#[cfg(test)]
#[path = "manager_test.rs"]
mod tests;
