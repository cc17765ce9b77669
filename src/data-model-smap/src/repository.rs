//! Content repository over the `pages`, `pieces`, `content_collections` and `locales` tables.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use core_smap::{ContentRepository, Document, Result};

use crate::db::DbPool;
use crate::errors::DbError;
use crate::models::{Page, Piece};
use crate::schema;

/// Reads published content straight from Postgres.
#[derive(Clone)]
pub struct PgContentRepository {
    pool: DbPool,
}

impl PgContentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load_locales(&self) -> std::result::Result<Vec<String>, DbError> {
        let mut conn = self.pool.get().await?;
        let locales = schema::locales::table
            .filter(schema::locales::private.eq(false))
            .filter(schema::locales::draft.eq(false))
            .order((schema::locales::position.asc(), schema::locales::name.asc()))
            .select(schema::locales::name)
            .load::<String>(&mut conn)
            .await?;
        Ok(locales)
    }

    async fn load_pages(&self, locale: &str) -> std::result::Result<Vec<Page>, DbError> {
        let mut conn = self.pool.get().await?;
        let pages = schema::pages::table
            .filter(schema::pages::locale.eq(locale))
            .filter(schema::pages::published.eq(true))
            // parents before children, siblings in authored order
            .order((
                schema::pages::level.asc(),
                schema::pages::rank.asc(),
                schema::pages::id.asc(),
            ))
            .select(Page::as_select())
            .load::<Page>(&mut conn)
            .await?;
        Ok(pages)
    }

    async fn load_collections(&self) -> std::result::Result<Vec<String>, DbError> {
        let mut conn = self.pool.get().await?;
        let collections = schema::content_collections::table
            .filter(schema::content_collections::sitemap.eq(true))
            .order((
                schema::content_collections::position.asc(),
                schema::content_collections::type_name.asc(),
            ))
            .select(schema::content_collections::type_name)
            .load::<String>(&mut conn)
            .await?;
        Ok(collections)
    }

    async fn load_items(
        &self,
        locale: &str,
        type_name: &str,
        offset: usize,
        limit: usize,
    ) -> std::result::Result<Vec<Piece>, DbError> {
        let offset = i64::try_from(offset).map_err(|_| DbError::Invalid(format!("offset {} is too large", offset)))?;
        let limit = i64::try_from(limit).map_err(|_| DbError::Invalid(format!("limit {} is too large", limit)))?;

        let mut conn = self.pool.get().await?;
        let pieces = schema::pieces::table
            .filter(schema::pieces::locale.eq(locale))
            .filter(schema::pieces::type_name.eq(type_name))
            .filter(schema::pieces::published.eq(true))
            // a total order keeps offset pagination stable
            .order((schema::pieces::created_at.asc(), schema::pieces::id.asc()))
            .offset(offset)
            .limit(limit)
            .select(Piece::as_select())
            .load::<Piece>(&mut conn)
            .await?;
        Ok(pieces)
    }
}

#[async_trait]
impl ContentRepository for PgContentRepository {
    async fn active_locales(&self) -> Result<Vec<String>> {
        self.load_locales().await.map_err(DbError::into_read)
    }

    async fn list_pages(&self, locale: &str) -> Result<Vec<Document>> {
        let pages = self.load_pages(locale).await.map_err(DbError::into_read)?;
        Ok(pages.into_iter().map(Document::from).collect())
    }

    async fn collections(&self) -> Result<Vec<String>> {
        self.load_collections().await.map_err(DbError::into_read)
    }

    async fn list_items(&self, locale: &str, type_name: &str, offset: usize, limit: usize) -> Result<Vec<Document>> {
        let pieces = self
            .load_items(locale, type_name, offset, limit)
            .await
            .map_err(DbError::into_read)?;
        tracing::debug!(
            "[locale: {}] Loaded {} '{}' items at offset {}",
            locale,
            pieces.len(),
            type_name,
            offset
        );
        Ok(pieces.into_iter().map(Document::from).collect())
    }
}
