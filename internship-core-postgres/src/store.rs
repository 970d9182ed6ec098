use async_trait::async_trait;
use internship_core_db::error::{StoreError, StoreResult};
use internship_core_db::repository::{
    ApprovalRepository, AuditRepository, EnrollmentRepository, NotificationRepository, PoolStats,
    PrincipalRepository, Store, TokenRepository, TrackerRepository, TrainingRepository, UnitOfWork,
};
use log::LevelFilter;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::executor::Executor;
use crate::repository::{
    ApprovalRepositoryImpl, AuditRepositoryImpl, EnrollmentRepositoryImpl,
    NotificationRepositoryImpl, PrincipalRepositoryImpl, TokenRepositoryImpl,
    TrackerRepositoryImpl, TrainingRepositoryImpl,
};

/// SQL statement logging threshold (`DB_LOG_LEVEL`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbLogLevel {
    Silent,
    Error,
    Warn,
    Info,
}

impl DbLogLevel {
    pub fn level_filter(&self) -> LevelFilter {
        match self {
            DbLogLevel::Silent => LevelFilter::Off,
            DbLogLevel::Error => LevelFilter::Error,
            DbLogLevel::Warn => LevelFilter::Warn,
            DbLogLevel::Info => LevelFilter::Info,
        }
    }
}

impl FromStr for DbLogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "silent" => Ok(DbLogLevel::Silent),
            "error" => Ok(DbLogLevel::Error),
            "warn" => Ok(DbLogLevel::Warn),
            "info" => Ok(DbLogLevel::Info),
            other => Err(format!(
                "unknown DB log level '{other}', expected silent|error|warn|info"
            )),
        }
    }
}

impl fmt::Display for DbLogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DbLogLevel::Silent => "silent",
            DbLogLevel::Error => "error",
            DbLogLevel::Warn => "warn",
            DbLogLevel::Info => "info",
        })
    }
}

/// Pool sizing and statement logging.
#[derive(Debug, Clone)]
pub struct PgStoreConfig {
    pub database_url: String,
    pub max_open_conns: u32,
    pub max_idle_conns: u32,
    pub conn_max_lifetime: Duration,
    pub conn_max_idle_time: Duration,
    pub acquire_timeout: Duration,
    pub log_level: DbLogLevel,
    pub slow_threshold: Duration,
}

impl PgStoreConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_open_conns: 20,
            max_idle_conns: 5,
            conn_max_lifetime: Duration::from_secs(3600),
            conn_max_idle_time: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(30),
            log_level: DbLogLevel::Warn,
            slow_threshold: Duration::from_millis(200),
        }
    }
}

/// PostgreSQL implementation of the persistence gateway.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    max_open_conns: u32,
}

impl PgStore {
    pub async fn connect(config: &PgStoreConfig) -> StoreResult<Self> {
        let connect_options = PgConnectOptions::from_str(&config.database_url)?
            .log_statements(config.log_level.level_filter())
            .log_slow_statements(LevelFilter::Warn, config.slow_threshold);

        // Idle connections beyond `min_connections` are reaped after `idle_timeout`.
        let pool = PgPoolOptions::new()
            .max_connections(config.max_open_conns)
            .min_connections(config.max_idle_conns.min(config.max_open_conns))
            .max_lifetime(config.conn_max_lifetime)
            .idle_timeout(config.conn_max_idle_time)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(connect_options)
            .await?;

        info!(
            max_open = config.max_open_conns,
            max_idle = config.max_idle_conns,
            "Connected to PostgreSQL"
        );
        Ok(Self::from_pool(pool, config.max_open_conns))
    }

    pub fn from_pool(pool: PgPool, max_open_conns: u32) -> Self {
        Self {
            pool,
            max_open_conns,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Open a unit of work over a fresh transaction.
    pub async fn begin_pg(&self) -> StoreResult<PgUnitOfWork> {
        let tx = self.pool.begin().await?;
        Ok(PgUnitOfWork::new(Executor::new(tx)))
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
        Ok(Box::new(self.begin_pg().await?))
    }

    async fn health(&self, timeout: Duration) -> StoreResult<Duration> {
        let started = Instant::now();
        tokio::time::timeout(timeout, sqlx::query("SELECT 1").execute(&self.pool))
            .await
            .map_err(|_| StoreError::Unavailable(format!("ping exceeded {timeout:?}")))??;
        Ok(started.elapsed())
    }

    fn stats(&self) -> PoolStats {
        let open = self.pool.size();
        let idle = u32::try_from(self.pool.num_idle()).unwrap_or(open);
        PoolStats {
            max_open: self.max_open_conns,
            open,
            idle,
            in_use: open.saturating_sub(idle),
        }
    }
}

/// All repositories over one shared transaction.
pub struct PgUnitOfWork {
    executor: Executor,
    principals: PrincipalRepositoryImpl,
    tokens: TokenRepositoryImpl,
    enrollments: EnrollmentRepositoryImpl,
    approvals: ApprovalRepositoryImpl,
    trainings: TrainingRepositoryImpl,
    trackers: TrackerRepositoryImpl,
    audit: AuditRepositoryImpl,
    notifications: NotificationRepositoryImpl,
}

impl PgUnitOfWork {
    pub fn new(executor: Executor) -> Self {
        Self {
            principals: PrincipalRepositoryImpl::new(executor.clone()),
            tokens: TokenRepositoryImpl::new(executor.clone()),
            enrollments: EnrollmentRepositoryImpl::new(executor.clone()),
            approvals: ApprovalRepositoryImpl::new(executor.clone()),
            trainings: TrainingRepositoryImpl::new(executor.clone()),
            trackers: TrackerRepositoryImpl::new(executor.clone()),
            audit: AuditRepositoryImpl::new(executor.clone()),
            notifications: NotificationRepositoryImpl::new(executor.clone()),
            executor,
        }
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    fn principals(&self) -> &dyn PrincipalRepository {
        &self.principals
    }

    fn tokens(&self) -> &dyn TokenRepository {
        &self.tokens
    }

    fn enrollments(&self) -> &dyn EnrollmentRepository {
        &self.enrollments
    }

    fn approvals(&self) -> &dyn ApprovalRepository {
        &self.approvals
    }

    fn trainings(&self) -> &dyn TrainingRepository {
        &self.trainings
    }

    fn trackers(&self) -> &dyn TrackerRepository {
        &self.trackers
    }

    fn audit(&self) -> &dyn AuditRepository {
        &self.audit
    }

    fn notifications(&self) -> &dyn NotificationRepository {
        &self.notifications
    }

    async fn try_advisory_lock(&self, key: i64) -> StoreResult<bool> {
        let mut tx = self.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
        let acquired: bool = sqlx::query_scalar("SELECT pg_try_advisory_xact_lock($1)")
            .bind(key)
            .fetch_one(&mut **transaction)
            .await?;
        debug!(key, acquired, "Advisory lock attempt");
        Ok(acquired)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.executor.commit().await
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.executor.rollback().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_log_level_parsing() {
        assert_eq!("silent".parse::<DbLogLevel>().unwrap().level_filter(), LevelFilter::Off);
        assert_eq!("WARN".parse::<DbLogLevel>().unwrap(), DbLogLevel::Warn);
        assert!("verbose".parse::<DbLogLevel>().is_err());
    }

    #[test]
    fn test_config_defaults() {
        let config = PgStoreConfig::new("postgres://localhost/internship");
        assert_eq!(config.max_open_conns, 20);
        assert_eq!(config.max_idle_conns, 5);
        assert_eq!(config.log_level, DbLogLevel::Warn);
    }
}
