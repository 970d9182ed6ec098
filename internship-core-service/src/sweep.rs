//! Scheduled maintenance.
//!
//! Each sweep runs in one transaction guarded by a store advisory lock, so with
//! several instances deployed only one of them does the work per tick.

use std::sync::Arc;
use std::time::Duration;

use internship_core_api::{CoreError, CoreResult};
use internship_core_db::repository::Store;
use internship_core_db::utils::advisory_lock_key;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument};

use crate::clock::Clock;
use crate::context::RequestContext;
use crate::evaluation::EvaluationTracker;
use crate::settings::SweepSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepKind {
    Overdue,
    TokenCleanup,
    AuditRetention,
}

impl SweepKind {
    pub const ALL: [SweepKind; 3] = [SweepKind::Overdue, SweepKind::TokenCleanup, SweepKind::AuditRetention];

    pub fn name(&self) -> &'static str {
        match self {
            SweepKind::Overdue => "overdue_sweep",
            SweepKind::TokenCleanup => "token_cleanup",
            SweepKind::AuditRetention => "audit_retention",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    /// Another instance holds the lock.
    Skipped,
    Completed { affected: u64 },
}

pub struct Sweeper {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    evaluations: Arc<EvaluationTracker>,
    settings: SweepSettings,
}

impl Sweeper {
    pub fn new(
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        evaluations: Arc<EvaluationTracker>,
        settings: SweepSettings,
    ) -> Self {
        Self {
            store,
            clock,
            evaluations,
            settings,
        }
    }

    pub fn interval(&self, kind: SweepKind) -> Duration {
        match kind {
            SweepKind::Overdue => self.settings.overdue_interval,
            SweepKind::TokenCleanup => self.settings.token_cleanup_interval,
            SweepKind::AuditRetention => self.settings.audit_sweep_interval,
        }
    }

    #[instrument(skip(self), fields(sweep = kind.name()))]
    pub async fn run_once(&self, kind: SweepKind) -> CoreResult<SweepOutcome> {
        let key = advisory_lock_key(kind.name()).map_err(CoreError::internal)?;
        let uow = self.store.begin().await?;
        if !uow.try_advisory_lock(key).await? {
            uow.rollback().await?;
            debug!("Lock held elsewhere");
            return Ok(SweepOutcome::Skipped);
        }

        let now = self.clock.now();
        let affected = match kind {
            SweepKind::Overdue => {
                let ctx = RequestContext::background();
                self.evaluations
                    .promote_overdue(uow.as_ref(), &ctx, None)
                    .await?
                    .len() as u64
            }
            SweepKind::TokenCleanup => {
                uow.tokens()
                    .delete_expired_before(now - self.settings.token_cleanup_grace)
                    .await?
            }
            SweepKind::AuditRetention => {
                uow.audit()
                    .delete_older_than(now - self.settings.audit_retention)
                    .await?
            }
        };
        uow.commit().await?;
        if affected > 0 {
            info!(affected, "Sweep completed");
        }
        Ok(SweepOutcome::Completed { affected })
    }

    /// Run `kind` every interval until `shutdown` flips to true.
    pub fn spawn_worker(self: Arc<Self>, kind: SweepKind, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let period = self.interval(kind);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.run_once(kind).await {
                            error!(sweep = kind.name(), error = %e, "Sweep failed");
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            debug!(sweep = kind.name(), "Sweep worker stopping");
                            break;
                        }
                    }
                }
            }
        })
    }
}
