use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{PricesRepo, RepoError, UpdatePricesParams},
    domain::entities::MarketPricesRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct PricesRow {
    gold_ounce: f64,
    gold_lira: f64,
    silver_ounce: f64,
    dollar_rate: f64,
    updated_by: String,
    updated_at: OffsetDateTime,
}

impl From<PricesRow> for MarketPricesRecord {
    fn from(row: PricesRow) -> Self {
        Self {
            gold_ounce: row.gold_ounce,
            gold_lira: row.gold_lira,
            silver_ounce: row.silver_ounce,
            dollar_rate: row.dollar_rate,
            updated_by: row.updated_by,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl PricesRepo for PostgresRepositories {
    async fn get(&self) -> Result<MarketPricesRecord, RepoError> {
        let row = sqlx::query_as::<_, PricesRow>(
            "SELECT gold_ounce, gold_lira, silver_ounce, dollar_rate, updated_by, updated_at \
             FROM market_prices WHERE id = 1",
        )
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn update(
        &self,
        params: UpdatePricesParams,
        updated_by: &str,
    ) -> Result<MarketPricesRecord, RepoError> {
        let row = sqlx::query_as::<_, PricesRow>(
            "UPDATE market_prices SET gold_ounce = $1, gold_lira = $2, silver_ounce = $3, \
             dollar_rate = $4, updated_by = $5, updated_at = NOW() WHERE id = 1 \
             RETURNING gold_ounce, gold_lira, silver_ounce, dollar_rate, updated_by, updated_at",
        )
        .bind(params.gold_ounce)
        .bind(params.gold_lira)
        .bind(params.silver_ounce)
        .bind(params.dollar_rate)
        .bind(updated_by)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.into())
    }
}
