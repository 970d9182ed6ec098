use sqlx::{Postgres, Transaction};
use std::sync::Arc;
use tokio::sync::Mutex;

use internship_core_db::error::{StoreError, StoreResult};

/// Shared handle on one open transaction.
///
/// Every repository of a unit of work holds a clone; the transaction is taken
/// out exactly once, by commit or rollback. Afterwards every access reports
/// "Transaction has been consumed".
#[derive(Clone)]
pub struct Executor {
    pub tx: Arc<Mutex<Option<Transaction<'static, Postgres>>>>,
}

impl Executor {
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self {
            tx: Arc::new(Mutex::new(Some(tx))),
        }
    }

    pub async fn commit(&self) -> StoreResult<()> {
        let tx = self.take().await?;
        tx.commit().await.map_err(StoreError::from)
    }

    pub async fn rollback(&self) -> StoreResult<()> {
        let tx = self.take().await?;
        tx.rollback().await.map_err(StoreError::from)
    }

    async fn take(&self) -> StoreResult<Transaction<'static, Postgres>> {
        self.tx
            .lock()
            .await
            .take()
            .ok_or(StoreError::TransactionConsumed)
    }
}
