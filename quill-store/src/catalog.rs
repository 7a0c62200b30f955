//! Read-mostly taxonomy: categories and tags.

use crate::slug::unique_slug;
use crate::{like_pattern, Category, Result, Store, StoreError, Tag};
use chrono::Utc;
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct SeedCategory {
    pub name: String,
    pub description: String,
}

impl Store {
    /// Insert missing categories; existing names only get their description refreshed.
    pub async fn seed_categories(&self, categories: &[SeedCategory]) -> Result<usize> {
        let mut inserted = 0usize;
        for c in categories {
            let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM categories WHERE name = ?")
                .bind(&c.name)
                .fetch_optional(self.pool())
                .await?;
            if existing.is_some() {
                sqlx::query("UPDATE categories SET description = ?1 WHERE name = ?2")
                    .bind(&c.description)
                    .bind(&c.name)
                    .execute(self.pool())
                    .await?;
                continue;
            }
            let mut conn = self.pool().acquire().await?;
            let slug = unique_slug(&mut conn, "categories", &c.name).await?;
            sqlx::query(
                r#"INSERT INTO categories (name, slug, description, created_at)
                   VALUES (?1, ?2, ?3, ?4)"#,
            )
            .bind(&c.name)
            .bind(&slug)
            .bind(&c.description)
            .bind(Utc::now())
            .execute(&mut *conn)
            .await?;
            inserted += 1;
        }
        info!(requested = categories.len(), inserted, "store.seed_categories");
        Ok(inserted)
    }

    pub async fn seed_tags(&self, names: &[String]) -> Result<usize> {
        let mut inserted = 0usize;
        for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
            let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM tags WHERE name = ?")
                .bind(name)
                .fetch_optional(self.pool())
                .await?;
            if existing.is_some() {
                continue;
            }
            let mut conn = self.pool().acquire().await?;
            let slug = unique_slug(&mut conn, "tags", name).await?;
            sqlx::query("INSERT INTO tags (name, slug) VALUES (?1, ?2)")
                .bind(name)
                .bind(&slug)
                .execute(&mut *conn)
                .await?;
            inserted += 1;
        }
        info!(requested = names.len(), inserted, "store.seed_tags");
        Ok(inserted)
    }

    /// All categories by name, optionally narrowed by a substring of name or description.
    pub async fn list_categories(&self, search: Option<&str>) -> Result<Vec<Category>> {
        let pattern = search.map(str::trim).filter(|s| !s.is_empty()).map(like_pattern);
        let rows: Vec<Category> = sqlx::query_as(
            r#"SELECT id, name, slug, description, created_at
               FROM categories
               WHERE (?1 IS NULL
                      OR name LIKE ?1 ESCAPE '\'
                      OR description LIKE ?1 ESCAPE '\')
               ORDER BY name ASC"#,
        )
        .bind(pattern)
        .fetch_all(self.pool())
        .await?;
        debug!(rows = rows.len(), "store.list_categories");
        Ok(rows)
    }

    pub async fn category_by_slug(&self, slug: &str) -> Result<Category> {
        sqlx::query_as(
            "SELECT id, name, slug, description, created_at FROM categories WHERE slug = ?",
        )
        .bind(slug)
        .fetch_optional(self.pool())
        .await?
        .ok_or_else(|| StoreError::not_found("category", slug))
    }

    pub async fn list_tags(&self, search: Option<&str>) -> Result<Vec<Tag>> {
        let pattern = search.map(str::trim).filter(|s| !s.is_empty()).map(like_pattern);
        let rows: Vec<Tag> = sqlx::query_as(
            r#"SELECT id, name, slug FROM tags
               WHERE (?1 IS NULL OR name LIKE ?1 ESCAPE '\')
               ORDER BY name ASC"#,
        )
        .bind(pattern)
        .fetch_all(self.pool())
        .await?;
        debug!(rows = rows.len(), "store.list_tags");
        Ok(rows)
    }

    pub async fn tag_by_slug(&self, slug: &str) -> Result<Tag> {
        sqlx::query_as("SELECT id, name, slug FROM tags WHERE slug = ?")
            .bind(slug)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| StoreError::not_found("tag", slug))
    }

    pub(crate) async fn tags_for_article(&self, article_id: i64) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as(
            r#"SELECT t.id, t.name, t.slug
               FROM article_tags j
               JOIN tags t ON t.id = j.tag_id
               WHERE j.article_id = ?
               ORDER BY t.name ASC"#,
        )
        .bind(article_id)
        .fetch_all(self.pool())
        .await?;
        Ok(tags)
    }
}
