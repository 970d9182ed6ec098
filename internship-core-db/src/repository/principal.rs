use async_trait::async_trait;
use chrono::{DateTime, Utc};
use internship_core_api::{PrincipalKind, PrincipalRef, StudentId};

use crate::error::StoreResult;
use crate::models::principal::{
    NewStudent, NewSuperAdmin, PrincipalRecord, StudentModel, SuperAdminModel,
};

/// Lookup and credential maintenance of Students and SuperAdmins.
///
/// Each kind lives in its own table; every method that takes a [`PrincipalRef`]
/// dispatches on the kind. Password hashes are opaque strings here: hashing and
/// verification happen in the service layer.
#[async_trait]
pub trait PrincipalRepository: Send + Sync {
    /// Find a student by the external student identifier
    async fn find_student_by_student_id(
        &self,
        student_id: &StudentId,
    ) -> StoreResult<Option<StudentModel>>;

    /// Find a principal of the given kind by email
    ///
    /// # Returns
    /// * `Ok(Some(_))` - The active principal with this email, or when none is active,
    ///   the most recently created one
    /// * `Ok(None)` - No principal of this kind uses the email
    async fn find_by_email(
        &self,
        kind: PrincipalKind,
        email: &str,
    ) -> StoreResult<Option<PrincipalRecord>>;

    async fn find_by_ref(&self, principal: PrincipalRef) -> StoreResult<Option<PrincipalRecord>>;

    async fn create_student(&self, item: NewStudent) -> StoreResult<StudentModel>;

    async fn create_super_admin(&self, item: NewSuperAdmin) -> StoreResult<SuperAdminModel>;

    async fn touch_last_login(&self, principal: PrincipalRef, at: DateTime<Utc>) -> StoreResult<()>;

    /// Replace the password hash if it still equals `previous_hash`
    ///
    /// # Returns
    /// * `Err(StoreError::Conflict)` - The hash changed since it was read
    async fn update_password_hash(
        &self,
        principal: PrincipalRef,
        previous_hash: &str,
        new_hash: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<()>;

    async fn mark_email_verified(&self, principal: PrincipalRef, at: DateTime<Utc>) -> StoreResult<()>;
}
