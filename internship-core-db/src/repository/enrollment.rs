use async_trait::async_trait;

use crate::error::StoreResult;
use crate::models::enrollment::{EnrollmentModel, NewEnrollment};

#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    async fn create(&self, item: NewEnrollment) -> StoreResult<EnrollmentModel>;

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<EnrollmentModel>>;
}
