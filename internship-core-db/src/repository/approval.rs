use async_trait::async_trait;

use crate::error::StoreResult;
use crate::models::approval::{
    ApprovalFilter, ApprovalModel, ApprovalTransitionModel, NewApproval, NewApprovalTransition,
};
use crate::repository::pagination::{Page, PageRequest};

/// Storage of approvals and their transition history.
#[async_trait]
pub trait ApprovalRepository: Send + Sync {
    /// Insert the approval of an enrollment in `registered`
    ///
    /// # Returns
    /// * `Err(StoreError::DuplicateKey)` - The enrollment already has an approval
    async fn create(&self, item: NewApproval) -> StoreResult<ApprovalModel>;

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<ApprovalModel>>;

    async fn find_by_enrollment(&self, student_enroll_id: i64) -> StoreResult<Option<ApprovalModel>>;

    /// Write `item` if the stored row still carries `item.version`
    ///
    /// # Returns
    /// * `Ok(ApprovalModel)` - The stored row with its version incremented
    /// * `Err(StoreError::Conflict)` - Another writer got there first
    async fn update(&self, item: &ApprovalModel) -> StoreResult<ApprovalModel>;

    /// List approvals ordered by `created_at desc, id desc`
    async fn list(&self, filter: ApprovalFilter, page: PageRequest) -> StoreResult<Page<ApprovalModel>>;

    async fn append_transition(
        &self,
        item: NewApprovalTransition,
    ) -> StoreResult<ApprovalTransitionModel>;

    /// Transitions of an approval, oldest first
    async fn history(&self, approval_id: i64) -> StoreResult<Vec<ApprovalTransitionModel>>;
}
