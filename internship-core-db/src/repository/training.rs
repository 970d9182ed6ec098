use async_trait::async_trait;

use crate::error::StoreResult;
use crate::models::training::{NewTraining, TrainingModel};

#[async_trait]
pub trait TrainingRepository: Send + Sync {
    /// # Returns
    /// * `Err(StoreError::DuplicateKey)` - The enrollment already has a training
    async fn create(&self, item: NewTraining) -> StoreResult<TrainingModel>;

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<TrainingModel>>;

    async fn find_by_enrollment(&self, student_enroll_id: i64) -> StoreResult<Option<TrainingModel>>;
}
