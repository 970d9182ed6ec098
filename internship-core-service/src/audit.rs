//! Security log writer.
//!
//! Entries describing a change are written in the unit of work that makes the
//! change, so they commit or roll back with it. Failures are recorded after the
//! failed unit has been discarded, in a unit of their own.

use std::sync::Arc;

use internship_core_api::{AuditAction, AuditSubject, CoreResult, PrincipalRef};
use internship_core_db::models::audit::AuditEntryModel;
use internship_core_db::repository::{Store, UnitOfWork};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::clock::Clock;
use crate::context::RequestContext;

/// One security-relevant fact about to be logged.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub actor: Option<PrincipalRef>,
    pub action: AuditAction,
    pub subject: AuditSubject,
    pub metadata: Value,
}

impl AuditEvent {
    pub fn new(action: AuditAction, subject: AuditSubject) -> Self {
        Self {
            actor: None,
            action,
            subject,
            metadata: Value::Object(Default::default()),
        }
    }

    pub fn actor(mut self, actor: PrincipalRef) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

#[derive(Clone)]
pub struct AuditWriter {
    clock: Arc<dyn Clock>,
}

impl AuditWriter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    fn entry(&self, ctx: &RequestContext, event: AuditEvent) -> AuditEntryModel {
        let mut metadata = event.metadata;
        if let (Some(device), Value::Object(map)) = (&ctx.device, &mut metadata) {
            map.entry("device").or_insert_with(|| Value::String(device.clone()));
        }
        AuditEntryModel {
            id: Uuid::new_v4(),
            actor: event.actor,
            action: event.action.as_str().to_string(),
            subject_kind: event.subject.kind.as_str().to_string(),
            subject_id: event.subject.id,
            source_address: ctx.source_address.clone(),
            user_agent: ctx.user_agent.clone(),
            metadata,
            created_at: self.clock.now(),
        }
    }

    /// Append within `uow`.
    pub async fn record(
        &self,
        uow: &dyn UnitOfWork,
        ctx: &RequestContext,
        event: AuditEvent,
    ) -> CoreResult<()> {
        uow.audit().append(self.entry(ctx, event)).await?;
        Ok(())
    }

    /// Append in a fresh unit of work. A failure to log never replaces the
    /// error being reported.
    pub async fn record_detached(&self, store: &dyn Store, ctx: &RequestContext, event: AuditEvent) {
        let action = event.action;
        let result = async {
            let uow = store.begin().await?;
            uow.audit().append(self.entry(ctx, event)).await?;
            uow.commit().await
        }
        .await;
        if let Err(e) = result {
            warn!(action = %action, error = %e, "Failed to write audit entry");
        }
    }
}
