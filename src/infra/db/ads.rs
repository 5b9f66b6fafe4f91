use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{
        AdminUpdateAdParams, AdsRepo, AdsWriteRepo, CreateAdParams, RepoError,
        SetModerationParams, UpdateAdContentParams,
    },
    domain::ads::{AdContent, PublicAd},
    domain::entities::AdRecord,
    domain::types::{AdStatus, Category, JobExperience, JobType},
};

use super::{PostgresRepositories, map_sqlx_error};

const AD_COLUMNS: &str = "a.id, a.title, a.description, a.category, a.sub_category, \
    a.job_type, a.job_experience, a.price, a.location, a.whatsapp, a.images, \
    a.owner_id, u.name AS owner_name, a.status, a.admin_note, a.is_featured, \
    a.views, a.contact_clicks, a.created_at, a.updated_at";

#[derive(sqlx::FromRow)]
struct AdRow {
    id: Uuid,
    title: String,
    description: String,
    category: Category,
    sub_category: Option<String>,
    job_type: Option<JobType>,
    job_experience: Option<JobExperience>,
    price: String,
    location: String,
    whatsapp: String,
    images: Vec<String>,
    owner_id: Uuid,
    owner_name: String,
    status: AdStatus,
    admin_note: Option<String>,
    is_featured: bool,
    views: i64,
    contact_clicks: i64,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<AdRow> for AdRecord {
    fn from(row: AdRow) -> Self {
        let content = AdContent::from_fields(
            row.category,
            row.sub_category,
            row.job_type,
            row.job_experience,
        );
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            category: row.category,
            content,
            price: row.price,
            location: row.location,
            whatsapp: row.whatsapp,
            images: row.images,
            owner_id: row.owner_id,
            owner_name: row.owner_name,
            status: row.status,
            admin_note: row.admin_note,
            is_featured: row.is_featured,
            views: row.views,
            contact_clicks: row.contact_clicks,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn select_ads(where_clause: &str, order_clause: &str) -> String {
    format!(
        "SELECT {AD_COLUMNS} FROM ads a INNER JOIN users u ON u.id = a.owner_id \
         {where_clause} {order_clause}"
    )
}

#[async_trait]
impl AdsRepo for PostgresRepositories {
    async fn list_approved_public(&self) -> Result<Vec<PublicAd>, RepoError> {
        let sql = select_ads(
            "WHERE a.status = 'approved'",
            "ORDER BY a.is_featured DESC, a.created_at DESC, a.id DESC",
        );
        let rows = sqlx::query_as::<_, AdRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows
            .into_iter()
            .map(AdRecord::from)
            .map(|record| PublicAd::from_record(&record))
            .collect())
    }

    async fn get(&self, id: Uuid) -> Result<AdRecord, RepoError> {
        let sql = select_ads("WHERE a.id = $1", "");
        let row = sqlx::query_as::<_, AdRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepoError::NotFound)?;
        Ok(row.into())
    }

    async fn list_all(&self) -> Result<Vec<AdRecord>, RepoError> {
        let sql = select_ads("", "ORDER BY a.created_at DESC, a.id DESC");
        let rows = sqlx::query_as::<_, AdRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(AdRecord::from).collect())
    }

    async fn list_pending(&self) -> Result<Vec<AdRecord>, RepoError> {
        let sql = select_ads(
            "WHERE a.status = 'pending'",
            "ORDER BY a.created_at DESC, a.id DESC",
        );
        let rows = sqlx::query_as::<_, AdRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(AdRecord::from).collect())
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<AdRecord>, RepoError> {
        let sql = select_ads(
            "WHERE a.owner_id = $1",
            "ORDER BY a.created_at DESC, a.id DESC",
        );
        let rows = sqlx::query_as::<_, AdRow>(&sql)
            .bind(owner_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(AdRecord::from).collect())
    }

    async fn count_all(&self) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ads")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(count as u64)
    }

    async fn count_by_status(&self, status: AdStatus) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ads WHERE status = $1")
            .bind(status)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(count as u64)
    }

    async fn counts_by_category(&self) -> Result<Vec<(Category, u64)>, RepoError> {
        let rows: Vec<(Category, i64)> = sqlx::query_as(
            "SELECT category, COUNT(*) FROM ads WHERE status = 'approved' GROUP BY category",
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(rows
            .into_iter()
            .map(|(category, count)| (category, count as u64))
            .collect())
    }
}

#[async_trait]
impl AdsWriteRepo for PostgresRepositories {
    async fn create(&self, params: CreateAdParams) -> Result<AdRecord, RepoError> {
        let sql = format!(
            "WITH a AS (\
                INSERT INTO ads (title, description, category, sub_category, job_type, \
                    job_experience, price, location, whatsapp, images, owner_id) \
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
                RETURNING *\
            ) SELECT {AD_COLUMNS} FROM a INNER JOIN users u ON u.id = a.owner_id"
        );
        let row = sqlx::query_as::<_, AdRow>(&sql)
            .bind(&params.title)
            .bind(&params.description)
            .bind(params.category)
            .bind(params.content.sub_category())
            .bind(params.content.job_type())
            .bind(params.content.job_experience())
            .bind(&params.price)
            .bind(&params.location)
            .bind(&params.whatsapp)
            .bind(&params.images)
            .bind(params.owner_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn update_content(&self, params: UpdateAdContentParams) -> Result<AdRecord, RepoError> {
        // Edits always demote to pending and wipe the previous decision.
        let sql = format!(
            "WITH a AS (\
                UPDATE ads SET title = $2, description = $3, category = $4, \
                    sub_category = $5, job_type = $6, job_experience = $7, price = $8, \
                    location = $9, whatsapp = $10, images = $11, \
                    status = 'pending', admin_note = NULL, updated_at = NOW() \
                WHERE id = $1 \
                RETURNING *\
            ) SELECT {AD_COLUMNS} FROM a INNER JOIN users u ON u.id = a.owner_id"
        );
        let row = sqlx::query_as::<_, AdRow>(&sql)
            .bind(params.id)
            .bind(&params.title)
            .bind(&params.description)
            .bind(params.category)
            .bind(params.content.sub_category())
            .bind(params.content.job_type())
            .bind(params.content.job_experience())
            .bind(&params.price)
            .bind(&params.location)
            .bind(&params.whatsapp)
            .bind(&params.images)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepoError::NotFound)?;
        Ok(row.into())
    }

    async fn admin_update(&self, params: AdminUpdateAdParams) -> Result<AdRecord, RepoError> {
        let sql = format!(
            "WITH a AS (\
                UPDATE ads SET title = $2, description = $3, category = $4, \
                    sub_category = $5, job_type = $6, job_experience = $7, price = $8, \
                    location = $9, whatsapp = $10, images = $11, \
                    is_featured = COALESCE($12, is_featured), updated_at = NOW() \
                WHERE id = $1 \
                RETURNING *\
            ) SELECT {AD_COLUMNS} FROM a INNER JOIN users u ON u.id = a.owner_id"
        );
        let row = sqlx::query_as::<_, AdRow>(&sql)
            .bind(params.id)
            .bind(&params.title)
            .bind(&params.description)
            .bind(params.category)
            .bind(params.content.sub_category())
            .bind(params.content.job_type())
            .bind(params.content.job_experience())
            .bind(&params.price)
            .bind(&params.location)
            .bind(&params.whatsapp)
            .bind(&params.images)
            .bind(params.is_featured)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepoError::NotFound)?;
        Ok(row.into())
    }

    async fn set_moderation(&self, params: SetModerationParams) -> Result<AdRecord, RepoError> {
        let sql = format!(
            "WITH a AS (\
                UPDATE ads SET status = $2, admin_note = $3, \
                    is_featured = COALESCE($4, is_featured), updated_at = NOW() \
                WHERE id = $1 \
                RETURNING *\
            ) SELECT {AD_COLUMNS} FROM a INNER JOIN users u ON u.id = a.owner_id"
        );
        let row = sqlx::query_as::<_, AdRow>(&sql)
            .bind(params.id)
            .bind(params.status)
            .bind(&params.admin_note)
            .bind(params.is_featured)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepoError::NotFound)?;
        Ok(row.into())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM ads WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn delete_by_owner(&self, owner_id: Uuid) -> Result<u64, RepoError> {
        let result = sqlx::query("DELETE FROM ads WHERE owner_id = $1")
            .bind(owner_id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }

    async fn increment_views(&self, id: Uuid) -> Result<(), RepoError> {
        sqlx::query("UPDATE ads SET views = views + 1 WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn increment_contact_clicks(&self, id: Uuid) -> Result<(), RepoError> {
        sqlx::query("UPDATE ads SET contact_clicks = contact_clicks + 1 WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}
