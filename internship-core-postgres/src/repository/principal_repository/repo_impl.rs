use async_trait::async_trait;
use chrono::{DateTime, Utc};
use internship_core_api::{PrincipalKind, PrincipalRef, StudentId};
use internship_core_db::error::StoreResult;
use internship_core_db::models::principal::{
    NewStudent, NewSuperAdmin, PrincipalRecord, StudentModel, SuperAdminModel,
};
use internship_core_db::repository::principal::PrincipalRepository;
use sqlx::{postgres::PgRow, Row};

use crate::executor::Executor;
use crate::utils::TryFromRow;

pub(super) const STUDENT_COLUMNS: &str = "id, student_id, full_name, email, password_hash, status, \
     email_verified_at, last_login_at, created_at, updated_at";

pub(super) const SUPER_ADMIN_COLUMNS: &str = "id, full_name, email, password_hash, status, abilities, \
     email_verified_at, last_login_at, created_at, updated_at";

pub struct PrincipalRepositoryImpl {
    pub executor: Executor,
}

impl PrincipalRepositoryImpl {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }
}

impl TryFromRow<PgRow> for StudentModel {
    fn try_from_row(row: &PgRow) -> StoreResult<Self> {
        let student_id: String = row.try_get("student_id")?;
        let student_id: StudentId = student_id.trim_end().parse().map_err(|e| {
            internship_core_db::error::StoreError::Decode(format!("users.student_id: {e}"))
        })?;
        Ok(StudentModel {
            id: row.try_get("id")?,
            student_id,
            full_name: row.try_get("full_name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            status: row.try_get("status")?,
            email_verified_at: row.try_get("email_verified_at")?,
            last_login_at: row.try_get("last_login_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFromRow<PgRow> for SuperAdminModel {
    fn try_from_row(row: &PgRow) -> StoreResult<Self> {
        Ok(SuperAdminModel {
            id: row.try_get("id")?,
            full_name: row.try_get("full_name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            status: row.try_get("status")?,
            abilities: row.try_get("abilities")?,
            email_verified_at: row.try_get("email_verified_at")?,
            last_login_at: row.try_get("last_login_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Table holding principals of `kind`.
pub(super) fn table_of(kind: PrincipalKind) -> &'static str {
    match kind {
        PrincipalKind::Student => "users",
        PrincipalKind::SuperAdmin => "super_admins",
    }
}

pub(super) fn record_from_row(kind: PrincipalKind, row: &PgRow) -> StoreResult<PrincipalRecord> {
    Ok(match kind {
        PrincipalKind::Student => PrincipalRecord::Student(StudentModel::try_from_row(row)?),
        PrincipalKind::SuperAdmin => PrincipalRecord::SuperAdmin(SuperAdminModel::try_from_row(row)?),
    })
}

#[async_trait]
impl PrincipalRepository for PrincipalRepositoryImpl {
    async fn find_student_by_student_id(
        &self,
        student_id: &StudentId,
    ) -> StoreResult<Option<StudentModel>> {
        Self::find_student_by_student_id_impl(self, student_id).await
    }

    async fn find_by_email(
        &self,
        kind: PrincipalKind,
        email: &str,
    ) -> StoreResult<Option<PrincipalRecord>> {
        Self::find_by_email_impl(self, kind, email).await
    }

    async fn find_by_ref(&self, principal: PrincipalRef) -> StoreResult<Option<PrincipalRecord>> {
        Self::find_by_ref_impl(self, principal).await
    }

    async fn create_student(&self, item: NewStudent) -> StoreResult<StudentModel> {
        Self::create_student_impl(self, item).await
    }

    async fn create_super_admin(&self, item: NewSuperAdmin) -> StoreResult<SuperAdminModel> {
        Self::create_super_admin_impl(self, item).await
    }

    async fn touch_last_login(&self, principal: PrincipalRef, at: DateTime<Utc>) -> StoreResult<()> {
        Self::touch_last_login_impl(self, principal, at).await
    }

    async fn update_password_hash(
        &self,
        principal: PrincipalRef,
        previous_hash: &str,
        new_hash: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        Self::update_password_hash_impl(self, principal, previous_hash, new_hash, at).await
    }

    async fn mark_email_verified(&self, principal: PrincipalRef, at: DateTime<Utc>) -> StoreResult<()> {
        Self::mark_email_verified_impl(self, principal, at).await
    }
}
