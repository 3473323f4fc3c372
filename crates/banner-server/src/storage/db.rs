//! PostgreSQL database layer

use anyhow::Context;
use async_trait::async_trait;
use banner_core::ports::BannerStore;
use banner_core::{
    BannerContent, BannerDraft, BannerError, BannerFilter, BannerId, BannerSnapshot, FeatureId,
    Result, TagId,
};
use chrono::NaiveDateTime;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};
use tracing::info;

// Timestamps are stored without a zone and read back as UTC
const CREATE_BANNERS: &str = r#"
    CREATE TABLE IF NOT EXISTS banners (
        id SERIAL PRIMARY KEY,
        tag_ids INT[] NOT NULL,
        feature_id INT NOT NULL,
        content JSON NOT NULL,
        is_active BOOLEAN NOT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )"#;

const SELECT_BANNERS: &str = r#"
    SELECT id, tag_ids, feature_id, content, is_active, created_at, updated_at
    FROM banners WHERE 1=1"#;

pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(options: PgConnectOptions, max_connections: u32) -> anyhow::Result<Self> {
        info!("Connecting to PostgreSQL...");

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .context("Failed to connect to PostgreSQL")?;

        info!("PostgreSQL connection established, running migrations...");

        Self::run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;

        info!("Database initialization complete");

        Ok(Self { pool })
    }

    async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
        sqlx::query(CREATE_BANNERS).execute(pool).await?;

        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Base query with the feature and tag criteria applied
    fn select(
        feature_id: Option<FeatureId>,
        tag_id: Option<TagId>,
    ) -> QueryBuilder<'static, Postgres> {
        let mut query = QueryBuilder::new(SELECT_BANNERS);
        if let Some(feature_id) = feature_id {
            query.push(" AND feature_id = ").push_bind(feature_id);
        }
        if let Some(tag_id) = tag_id {
            query.push(" AND ").push_bind(tag_id).push(" = ANY(tag_ids)");
        }
        query.push(" ORDER BY id");
        query
    }
}

fn storage_error(e: sqlx::Error) -> BannerError {
    BannerError::Storage(e.to_string())
}

#[async_trait]
impl BannerStore for Database {
    async fn fetch_one(
        &self,
        feature_id: Option<FeatureId>,
        tag_id: Option<TagId>,
    ) -> Result<BannerSnapshot> {
        let mut query = Self::select(feature_id, tag_id);
        query.push(" LIMIT 1");

        let row: Option<BannerRow> = query
            .build_query_as::<BannerRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        row.map(Into::into).ok_or(BannerError::RecordAbsent)
    }

    async fn list(&self, filter: &BannerFilter) -> Result<Vec<BannerSnapshot>> {
        let mut query = Self::select(filter.feature_id, filter.tag_id);
        if let Some(limit) = filter.limit {
            query.push(" LIMIT ").push_bind(limit);
        }
        if let Some(offset) = filter.offset {
            query.push(" OFFSET ").push_bind(offset);
        }

        let rows: Vec<BannerRow> = query
            .build_query_as::<BannerRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create(&self, draft: &BannerDraft) -> Result<BannerId> {
        let id = sqlx::query_scalar::<_, BannerId>(
            r#"
            INSERT INTO banners (tag_ids, feature_id, content, is_active)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&draft.tag_ids)
        .bind(draft.feature_id)
        .bind(Json(&draft.content))
        .bind(draft.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(id)
    }

    async fn update(&self, id: BannerId, draft: &BannerDraft) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE banners
            SET tag_ids = $1, feature_id = $2, content = $3, is_active = $4, updated_at = NOW()
            WHERE id = $5
            "#,
        )
        .bind(&draft.tag_ids)
        .bind(draft.feature_id)
        .bind(Json(&draft.content))
        .bind(draft.is_active)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }

    async fn delete(&self, id: BannerId) -> Result<()> {
        sqlx::query("DELETE FROM banners WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(())
    }

    async fn exists(&self, id: BannerId) -> Result<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM banners WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(storage_error)
    }
}

// Helper struct for sqlx query_as
#[derive(sqlx::FromRow)]
struct BannerRow {
    id: BannerId,
    tag_ids: Vec<TagId>,
    feature_id: FeatureId,
    content: Json<BannerContent>,
    is_active: bool,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl From<BannerRow> for BannerSnapshot {
    fn from(r: BannerRow) -> Self {
        BannerSnapshot {
            id: r.id,
            tag_ids: r.tag_ids,
            feature_id: r.feature_id,
            content: r.content.0,
            is_active: r.is_active,
            created_at: r.created_at.and_utc(),
            updated_at: r.updated_at.and_utc(),
        }
    }
}
