//! Ad lifecycle rules: the moderation state machine, the canonical public
//! ordering, draft validation, and the public-safe projection.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::AdRecord;
use crate::domain::error::DomainError;
use crate::domain::types::{AdStatus, Category, JobExperience, JobType};

pub const MAX_IMAGES: usize = 4;
pub const MAX_TITLE_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 1000;

/// Category-dependent ad content.
///
/// Selected by category at construction: `Job` only for [`Category::Jobs`],
/// `Generic` for everything else. Sub-category strings are accepted verbatim;
/// no per-category vocabulary is enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdContent {
    Generic {
        sub_category: Option<String>,
    },
    Job {
        job_type: Option<JobType>,
        job_experience: Option<JobExperience>,
    },
}

impl AdContent {
    /// Build content from loosely-typed submission fields, keyed by category.
    ///
    /// Job fields submitted under a non-jobs category are dropped, matching
    /// the permissive behavior of the public submission form.
    pub fn from_fields(
        category: Category,
        sub_category: Option<String>,
        job_type: Option<JobType>,
        job_experience: Option<JobExperience>,
    ) -> Self {
        match category {
            Category::Jobs => Self::Job {
                job_type,
                job_experience,
            },
            _ => Self::Generic { sub_category },
        }
    }

    pub fn sub_category(&self) -> Option<&str> {
        match self {
            Self::Generic { sub_category } => sub_category.as_deref(),
            Self::Job { .. } => None,
        }
    }

    pub fn job_type(&self) -> Option<JobType> {
        match self {
            Self::Job { job_type, .. } => *job_type,
            Self::Generic { .. } => None,
        }
    }

    pub fn job_experience(&self) -> Option<JobExperience> {
        match self {
            Self::Job { job_experience, .. } => *job_experience,
            Self::Generic { .. } => None,
        }
    }
}

/// Public-safe ad projection served by every public read path.
///
/// Excludes status, admin note, and engagement counters. Field names follow
/// the wire format of the durable snapshot document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicAd {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<JobType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_experience: Option<JobExperience>,
    pub price: String,
    pub location: String,
    pub contact_handle: String,
    pub images: Vec<String>,
    pub is_featured: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub owner_name: String,
}

impl PublicAd {
    pub fn from_record(ad: &AdRecord) -> Self {
        Self {
            id: ad.id,
            title: ad.title.clone(),
            description: ad.description.clone(),
            category: ad.category,
            sub_category: ad.content.sub_category().map(str::to_owned),
            job_type: ad.content.job_type(),
            job_experience: ad.content.job_experience(),
            price: ad.price.clone(),
            location: ad.location.clone(),
            contact_handle: ad.whatsapp.clone(),
            images: ad.images.clone(),
            is_featured: ad.is_featured,
            created_at: ad.created_at,
            owner_name: ad.owner_name.clone(),
        }
    }
}

/// Canonical public ordering: featured ads first, then newest-created first,
/// id as the final tie-break. Every read path (memory cache, snapshot file,
/// direct store query) presents this order and no other.
pub fn canonical_order(a: &PublicAd, b: &PublicAd) -> Ordering {
    b.is_featured
        .cmp(&a.is_featured)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| b.id.cmp(&a.id))
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("ad is already approved")]
    AlreadyApproved,
    #[error("ad is already rejected")]
    AlreadyRejected,
}

/// Moderation state machine.
///
/// submit → pending (unconditional); approve: pending|rejected → approved;
/// reject: pending|approved → rejected; edit: any → pending (clearing the
/// admin note); delete: any → removed. Only admin decisions move an ad out
/// of pending.
pub fn approve_from(status: AdStatus) -> Result<AdStatus, TransitionError> {
    match status {
        AdStatus::Pending | AdStatus::Rejected => Ok(AdStatus::Approved),
        AdStatus::Approved => Err(TransitionError::AlreadyApproved),
    }
}

pub fn reject_from(status: AdStatus) -> Result<AdStatus, TransitionError> {
    match status {
        AdStatus::Pending | AdStatus::Approved => Ok(AdStatus::Rejected),
        AdStatus::Rejected => Err(TransitionError::AlreadyRejected),
    }
}

/// Whether a transition away from `status` can shrink or grow the approved
/// set. Used only for logging; every mutation invalidates regardless.
pub fn affects_approved_set(before: AdStatus, after: Option<AdStatus>) -> bool {
    before == AdStatus::Approved || after == Some(AdStatus::Approved)
}

/// A validated ad submission, ready for persistence.
#[derive(Debug, Clone)]
pub struct AdDraft {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub content: AdContent,
    pub price: String,
    pub location: String,
    pub whatsapp: String,
    pub images: Vec<String>,
}

/// Loosely-typed submission fields, as they arrive from a client.
#[derive(Debug, Clone, Default)]
pub struct AdDraftFields {
    pub title: String,
    pub description: String,
    pub category: Option<Category>,
    pub sub_category: Option<String>,
    pub job_type: Option<JobType>,
    pub job_experience: Option<JobExperience>,
    pub price: String,
    pub location: String,
    pub whatsapp: String,
    pub images: Vec<String>,
}

/// Validate submission fields into an [`AdDraft`].
///
/// Required fields mirror the store schema; image payloads are opaque
/// strings and only their count is bounded here.
pub fn validate_draft(fields: AdDraftFields) -> Result<AdDraft, DomainError> {
    let title = fields.title.trim().to_owned();
    if title.is_empty() {
        return Err(DomainError::validation("title is required"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(DomainError::validation(format!(
            "title exceeds {MAX_TITLE_LEN} characters"
        )));
    }

    let description = fields.description.trim().to_owned();
    if description.is_empty() {
        return Err(DomainError::validation("description is required"));
    }
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(DomainError::validation(format!(
            "description exceeds {MAX_DESCRIPTION_LEN} characters"
        )));
    }

    let category = fields
        .category
        .ok_or_else(|| DomainError::validation("category is required"))?;

    if fields.price.trim().is_empty() {
        return Err(DomainError::validation("price is required"));
    }
    if fields.location.trim().is_empty() {
        return Err(DomainError::validation("location is required"));
    }
    if fields.whatsapp.trim().is_empty() {
        return Err(DomainError::validation("contact handle is required"));
    }
    if fields.images.len() > MAX_IMAGES {
        return Err(DomainError::validation(format!(
            "at most {MAX_IMAGES} images are allowed"
        )));
    }

    let content = AdContent::from_fields(
        category,
        fields.sub_category.filter(|s| !s.trim().is_empty()),
        fields.job_type,
        fields.job_experience,
    );

    Ok(AdDraft {
        title,
        description,
        category,
        content,
        price: fields.price.trim().to_owned(),
        location: fields.location.trim().to_owned(),
        whatsapp: fields.whatsapp.trim().to_owned(),
        images: fields.images,
    })
}

#[cfg(test)]
mod tests {
    use time::Duration;

    use super::*;

    fn sample_fields() -> AdDraftFields {
        AdDraftFields {
            title: "Family sedan".to_string(),
            description: "Single owner, serviced".to_string(),
            category: Some(Category::Cars),
            sub_category: Some("sedan".to_string()),
            price: "8500$".to_string(),
            location: "Tripoli".to_string(),
            whatsapp: "+961 70 000 000".to_string(),
            ..Default::default()
        }
    }

    fn sample_public(id_byte: u8, featured: bool, created_at: OffsetDateTime) -> PublicAd {
        PublicAd {
            id: Uuid::from_bytes([id_byte; 16]),
            title: "ad".to_string(),
            description: String::new(),
            category: Category::Home,
            sub_category: None,
            job_type: None,
            job_experience: None,
            price: "1".to_string(),
            location: "x".to_string(),
            contact_handle: "x".to_string(),
            images: Vec::new(),
            is_featured: featured,
            created_at,
            owner_name: "o".to_string(),
        }
    }

    #[test]
    fn approve_allowed_from_pending_and_rejected() {
        assert_eq!(approve_from(AdStatus::Pending), Ok(AdStatus::Approved));
        assert_eq!(approve_from(AdStatus::Rejected), Ok(AdStatus::Approved));
        assert_eq!(
            approve_from(AdStatus::Approved),
            Err(TransitionError::AlreadyApproved)
        );
    }

    #[test]
    fn reject_allowed_from_pending_and_approved() {
        assert_eq!(reject_from(AdStatus::Pending), Ok(AdStatus::Rejected));
        assert_eq!(reject_from(AdStatus::Approved), Ok(AdStatus::Rejected));
        assert_eq!(
            reject_from(AdStatus::Rejected),
            Err(TransitionError::AlreadyRejected)
        );
    }

    #[test]
    fn featured_sorts_before_non_featured() {
        let now = OffsetDateTime::now_utc();
        let featured = sample_public(1, true, now - Duration::days(7));
        let recent = sample_public(2, false, now);

        assert_eq!(canonical_order(&featured, &recent), Ordering::Less);
        assert_eq!(canonical_order(&recent, &featured), Ordering::Greater);
    }

    #[test]
    fn equal_featured_tier_sorts_newest_first() {
        let now = OffsetDateTime::now_utc();
        let older = sample_public(1, false, now - Duration::hours(1));
        let newer = sample_public(2, false, now);

        assert_eq!(canonical_order(&newer, &older), Ordering::Less);
    }

    #[test]
    fn job_fields_dropped_outside_jobs_category() {
        let content = AdContent::from_fields(
            Category::Cars,
            Some("sedan".to_string()),
            Some(JobType::Remote),
            Some(JobExperience::Senior),
        );
        assert_eq!(content.sub_category(), Some("sedan"));
        assert_eq!(content.job_type(), None);
        assert_eq!(content.job_experience(), None);
    }

    #[test]
    fn jobs_category_carries_job_fields() {
        let content = AdContent::from_fields(
            Category::Jobs,
            None,
            Some(JobType::FullTime),
            Some(JobExperience::Entry),
        );
        assert_eq!(content.job_type(), Some(JobType::FullTime));
        assert_eq!(content.job_experience(), Some(JobExperience::Entry));
    }

    #[test]
    fn draft_requires_title_and_category() {
        let mut fields = sample_fields();
        fields.title = "  ".to_string();
        assert!(validate_draft(fields).is_err());

        let mut fields = sample_fields();
        fields.category = None;
        assert!(validate_draft(fields).is_err());
    }

    #[test]
    fn draft_caps_image_count() {
        let mut fields = sample_fields();
        fields.images = vec!["img".to_string(); MAX_IMAGES + 1];
        assert!(validate_draft(fields).is_err());

        let mut fields = sample_fields();
        fields.images = vec!["img".to_string(); MAX_IMAGES];
        assert!(validate_draft(fields).is_ok());
    }
}
