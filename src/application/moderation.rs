//! Ad lifecycle service: submission, moderation decisions, edits, deletion.
//!
//! Every mutation that can change what the public sees runs the same tail:
//! persist, fire the matching cache trigger (synchronous invalidate, async
//! rebuild), then answer. The response never waits for the rebuild.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::auth::AuthPrincipal;
use crate::application::repos::{
    AdminUpdateAdParams, AdsRepo, AdsWriteRepo, CreateAdParams, RepoError, SetModerationParams,
    UpdateAdContentParams,
};
use crate::cache::trigger::CacheTrigger;
use crate::domain::ads::{self, AdDraftFields, TransitionError};
use crate::domain::entities::AdRecord;
use crate::domain::error::DomainError;

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("ad not found")]
    NotFound,
    #[error("not allowed to modify this ad")]
    Forbidden,
    #[error(transparent)]
    Repo(RepoError),
}

impl From<RepoError> for ModerationError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => Self::NotFound,
            other => Self::Repo(other),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModerationDecision {
    pub admin_note: Option<String>,
    pub is_featured: Option<bool>,
}

pub struct ModerationService {
    reads: Arc<dyn AdsRepo>,
    writes: Arc<dyn AdsWriteRepo>,
    trigger: Arc<CacheTrigger>,
}

impl ModerationService {
    pub fn new(
        reads: Arc<dyn AdsRepo>,
        writes: Arc<dyn AdsWriteRepo>,
        trigger: Arc<CacheTrigger>,
    ) -> Self {
        Self {
            reads,
            writes,
            trigger,
        }
    }

    /// New submission. Always lands pending, invisible to the public until
    /// an admin approves it.
    pub async fn submit(
        &self,
        principal: &AuthPrincipal,
        fields: AdDraftFields,
    ) -> Result<AdRecord, ModerationError> {
        let draft = ads::validate_draft(fields)?;
        let record = self
            .writes
            .create(CreateAdParams {
                title: draft.title,
                description: draft.description,
                category: draft.category,
                content: draft.content,
                price: draft.price,
                location: draft.location,
                whatsapp: draft.whatsapp,
                images: draft.images,
                owner_id: principal.user_id,
            })
            .await?;
        info!(ad_id = %record.id, owner = %principal.user_id, "ad submitted");
        self.trigger.ad_submitted(record.id);
        Ok(record)
    }

    /// Owner edit. Any edit demotes the ad to pending and clears the admin
    /// note, whatever state it was in.
    pub async fn edit(
        &self,
        principal: &AuthPrincipal,
        id: Uuid,
        fields: AdDraftFields,
    ) -> Result<AdRecord, ModerationError> {
        let existing = self.reads.get(id).await?;
        if existing.owner_id != principal.user_id {
            return Err(ModerationError::Forbidden);
        }

        let draft = ads::validate_draft(fields)?;
        let updated = self
            .writes
            .update_content(UpdateAdContentParams {
                id,
                title: draft.title,
                description: draft.description,
                category: draft.category,
                content: draft.content,
                price: draft.price,
                location: draft.location,
                whatsapp: draft.whatsapp,
                images: draft.images,
            })
            .await?;
        info!(ad_id = %id, was = %existing.status, "ad edited, back to pending");
        self.trigger.ad_edited(id);
        Ok(updated)
    }

    /// Admin override of any ad's content and featured flag. Unlike an
    /// owner edit this keeps the current status, so a change to an approved
    /// ad lands in the public payload directly.
    pub async fn admin_edit(
        &self,
        id: Uuid,
        fields: AdDraftFields,
        is_featured: Option<bool>,
    ) -> Result<AdRecord, ModerationError> {
        let draft = ads::validate_draft(fields)?;
        let updated = self
            .writes
            .admin_update(AdminUpdateAdParams {
                id,
                title: draft.title,
                description: draft.description,
                category: draft.category,
                content: draft.content,
                price: draft.price,
                location: draft.location,
                whatsapp: draft.whatsapp,
                images: draft.images,
                is_featured,
            })
            .await?;
        info!(ad_id = %id, "ad updated by admin");
        self.trigger.ad_edited(id);
        Ok(updated)
    }

    /// Admin approval: pending or rejected becomes approved.
    pub async fn approve(
        &self,
        id: Uuid,
        decision: ModerationDecision,
    ) -> Result<AdRecord, ModerationError> {
        let existing = self.reads.get(id).await?;
        let next = ads::approve_from(existing.status)?;
        let updated = self
            .writes
            .set_moderation(SetModerationParams {
                id,
                status: next,
                admin_note: decision.admin_note,
                is_featured: decision.is_featured,
            })
            .await?;
        info!(
            ad_id = %id,
            from = %existing.status,
            visible_change = ads::affects_approved_set(existing.status, Some(next)),
            "ad approved"
        );
        self.trigger.ad_approved(id);
        Ok(updated)
    }

    /// Admin rejection: pending or approved becomes rejected.
    pub async fn reject(
        &self,
        id: Uuid,
        decision: ModerationDecision,
    ) -> Result<AdRecord, ModerationError> {
        let existing = self.reads.get(id).await?;
        let next = ads::reject_from(existing.status)?;
        let updated = self
            .writes
            .set_moderation(SetModerationParams {
                id,
                status: next,
                admin_note: decision.admin_note,
                is_featured: decision.is_featured,
            })
            .await?;
        info!(
            ad_id = %id,
            from = %existing.status,
            visible_change = ads::affects_approved_set(existing.status, Some(next)),
            "ad rejected"
        );
        self.trigger.ad_rejected(id);
        Ok(updated)
    }

    /// Delete by the owner or any admin.
    pub async fn delete(&self, principal: &AuthPrincipal, id: Uuid) -> Result<(), ModerationError> {
        let existing = self.reads.get(id).await?;
        if existing.owner_id != principal.user_id && !principal.is_admin() {
            return Err(ModerationError::Forbidden);
        }
        self.writes.delete(id).await?;
        info!(ad_id = %id, was = %existing.status, "ad deleted");
        self.trigger.ad_deleted(id);
        Ok(())
    }

    /// Admin removal of every ad a user owns, fired when an account is
    /// purged.
    pub async fn delete_all_for_owner(&self, owner_id: Uuid) -> Result<u64, ModerationError> {
        let removed = self.writes.delete_by_owner(owner_id).await?;
        if removed > 0 {
            self.trigger.user_purged(owner_id);
        }
        Ok(removed)
    }

    pub async fn my_ads(&self, principal: &AuthPrincipal) -> Result<Vec<AdRecord>, ModerationError> {
        Ok(self.reads.list_by_owner(principal.user_id).await?)
    }

    pub async fn get_owned(
        &self,
        principal: &AuthPrincipal,
        id: Uuid,
    ) -> Result<AdRecord, ModerationError> {
        let ad = self.reads.get(id).await?;
        if ad.owner_id != principal.user_id && !principal.is_admin() {
            return Err(ModerationError::Forbidden);
        }
        Ok(ad)
    }

    pub async fn list_all(&self) -> Result<Vec<AdRecord>, ModerationError> {
        Ok(self.reads.list_all().await?)
    }

    pub async fn list_pending(&self) -> Result<Vec<AdRecord>, ModerationError> {
        Ok(self.reads.list_pending().await?)
    }

    /// Public counters; failures are swallowed so a broken counter never
    /// breaks a detail view.
    pub async fn record_view(&self, id: Uuid) {
        let _ = self.writes.increment_views(id).await;
    }

    pub async fn record_contact_click(&self, id: Uuid) {
        let _ = self.writes.increment_contact_clicks(id).await;
    }
}
