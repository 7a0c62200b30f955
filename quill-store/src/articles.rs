//! Article lifecycle: create, read, filter, search, update, publish, delete,
//! and recording of AI review results.
//!
//! Visibility rules for listings:
//! - anonymous callers see published articles only;
//! - authenticated non-staff callers see published articles plus their own;
//! - staff see everything.
//!
//! Listings are ordered newest publication first, then newest creation.

use crate::slug::unique_slug;
use crate::{
    like_pattern, reading_time, Article, ArticleDetail, ArticleStatus, Category, Result, Store,
    StoreError, User,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, Transaction};
use tracing::{debug, info, warn};

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_SEARCH_CHARS: usize = 200;
pub const MAX_SEARCH_CATEGORY_CHARS: usize = 100;
const SLUG_ATTEMPTS: u32 = 5;

macro_rules! select_articles {
    ($tail:literal) => {
        concat!(
            r#"SELECT
                 a.id, a.title, a.slug, a.content, a.excerpt, a.status,
                 a.created_at, a.updated_at, a.published_at,
                 a.featured_image, a.meta_description,
                 a.ai_checked, a.ai_score, a.ai_feedback,
                 u.id AS author_id, u.username, u.first_name, u.last_name, u.email, u.is_staff,
                 c.id AS category_id, c.name AS category_name, c.slug AS category_slug,
                 c.description AS category_description, c.created_at AS category_created_at
               FROM articles a
               JOIN users u ON u.id = a.author_id
               LEFT JOIN categories c ON c.id = a.category_id
               "#,
            $tail
        )
    };
}

/// Who is asking. Decides which drafts a listing may include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Anonymous,
    Member(i64),
    Staff,
}

impl Visibility {
    pub fn for_user(user: Option<&User>) -> Self {
        match user {
            None => Visibility::Anonymous,
            Some(u) if u.is_staff => Visibility::Staff,
            Some(u) => Visibility::Member(u.id),
        }
    }

    /// `(sees_all, own_author_id)` as bound into the listing query.
    fn binds(self) -> (bool, Option<i64>) {
        match self {
            Visibility::Anonymous => (false, None),
            Visibility::Member(id) => (false, Some(id)),
            Visibility::Staff => (true, None),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewArticle {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub status: ArticleStatus,
    #[serde(default)]
    pub category: Option<i64>,
    #[serde(default)]
    pub tags: Vec<i64>,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub meta_description: String,
}

impl NewArticle {
    pub fn validate(&self) -> Result<()> {
        validate_title(&self.title)?;
        if self.content.trim().is_empty() {
            return Err(StoreError::Invalid("content is required".into()));
        }
        Ok(())
    }
}

/// Partial update. Absent fields are left alone; `category: null` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub status: Option<ArticleStatus>,
    #[serde(default, deserialize_with = "present")]
    pub category: Option<Option<i64>>,
    pub tags: Option<Vec<i64>>,
    #[serde(default, deserialize_with = "present")]
    pub featured_image: Option<Option<String>>,
    pub meta_description: Option<String>,
}

impl ArticleUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if matches!(&self.content, Some(c) if c.trim().is_empty()) {
            return Err(StoreError::Invalid("content may not be blank".into()));
        }
        Ok(())
    }
}

fn present<'de, D, T>(d: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Some)
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(StoreError::Invalid("title is required".into()));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(StoreError::Invalid(format!(
            "title exceeds {MAX_TITLE_CHARS} characters"
        )));
    }
    Ok(())
}

/// Listing filters, as read from the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleFilter {
    pub status: Option<ArticleStatus>,
    pub category: Option<i64>,
    pub tag: Option<i64>,
    pub author: Option<i64>,
    pub search: Option<String>,
    #[serde(skip)]
    pub visibility: Visibility,
}

/// Body of the advanced search endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub status: Option<ArticleStatus>,
    #[serde(skip)]
    pub published_only: bool,
}

impl SearchQuery {
    pub fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(StoreError::Invalid("query is required".into()));
        }
        if self.query.chars().count() > MAX_SEARCH_CHARS {
            return Err(StoreError::Invalid(format!(
                "query exceeds {MAX_SEARCH_CHARS} characters"
            )));
        }
        if matches!(&self.category, Some(c) if c.chars().count() > MAX_SEARCH_CATEGORY_CHARS) {
            return Err(StoreError::Invalid(format!(
                "category exceeds {MAX_SEARCH_CATEGORY_CHARS} characters"
            )));
        }
        Ok(())
    }
}

impl Store {
    pub async fn create_article(&self, author: &User, input: NewArticle) -> Result<Article> {
        input.validate()?;
        self.ensure_category(input.category).await?;
        self.ensure_tags(&input.tags).await?;

        // A concurrent create can claim the same slug between our lookup and
        // insert; the UNIQUE index rejects it and we pick the next suffix.
        let mut attempt = 1;
        let (id, slug) = loop {
            match self.insert_article(author, &input).await {
                Err(StoreError::Database(sqlx::Error::Database(db)))
                    if db.is_unique_violation() && attempt < SLUG_ATTEMPTS =>
                {
                    warn!(attempt, title = %input.title, "store.article.slug_conflict");
                    attempt += 1;
                }
                other => break other?,
            }
        };

        info!(
            article_id = id,
            author_id = author.id,
            status = input.status.as_str(),
            slug = %slug,
            "store.article.create"
        );
        self.article_by_id(id).await
    }

    async fn insert_article(&self, author: &User, input: &NewArticle) -> Result<(i64, String)> {
        let now = Utc::now();
        let published_at = (input.status == ArticleStatus::Published).then_some(now);

        let mut tx = self.pool().begin().await?;
        let slug = unique_slug(&mut *tx, "articles", &input.title).await?;
        let res = sqlx::query(
            r#"INSERT INTO articles
               (title, slug, content, excerpt, status, author_id, category_id,
                featured_image, meta_description, created_at, updated_at, published_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10, ?11)"#,
        )
        .bind(&input.title)
        .bind(&slug)
        .bind(&input.content)
        .bind(&input.excerpt)
        .bind(input.status.as_str())
        .bind(author.id)
        .bind(input.category)
        .bind(&input.featured_image)
        .bind(&input.meta_description)
        .bind(now)
        .bind(published_at)
        .execute(&mut *tx)
        .await?;
        let id = res.last_insert_rowid();
        replace_tags(&mut tx, id, &input.tags).await?;
        tx.commit().await?;
        Ok((id, slug))
    }

    pub async fn article_by_id(&self, id: i64) -> Result<Article> {
        let row = sqlx::query(select_articles!("WHERE a.id = ?"))
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        match row {
            Some(row) => self.hydrate_one(&row).await,
            None => {
                warn!(article_id = id, "store.article.missing");
                Err(StoreError::not_found("article", id))
            }
        }
    }

    /// Article plus its approved comments.
    pub async fn article_detail(&self, id: i64) -> Result<ArticleDetail> {
        let article = self.article_by_id(id).await?;
        let comments = self.list_comments(Some(id)).await?;
        Ok(ArticleDetail { article, comments })
    }

    pub async fn list_articles(&self, filter: &ArticleFilter) -> Result<Vec<Article>> {
        let (sees_all, own_id) = filter.visibility.binds();
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern);

        let rows = sqlx::query(select_articles!(
            r#"WHERE (?1 IS NULL OR a.status = ?1)
                 AND (?2 IS NULL OR a.category_id = ?2)
                 AND (?3 IS NULL OR a.author_id = ?3)
                 AND (?4 IS NULL OR EXISTS (
                       SELECT 1 FROM article_tags j WHERE j.article_id = a.id AND j.tag_id = ?4))
                 AND (?5 IS NULL
                      OR a.title LIKE ?5 ESCAPE '\'
                      OR a.content LIKE ?5 ESCAPE '\'
                      OR a.excerpt LIKE ?5 ESCAPE '\')
                 AND (?6 = 1 OR a.status = 'published' OR a.author_id = ?7)
               ORDER BY a.published_at DESC, a.created_at DESC, a.id DESC"#
        ))
        .bind(filter.status.map(ArticleStatus::as_str)) // ?1
        .bind(filter.category) // ?2
        .bind(filter.author) // ?3
        .bind(filter.tag) // ?4
        .bind(search) // ?5
        .bind(sees_all) // ?6
        .bind(own_id) // ?7
        .fetch_all(self.pool())
        .await?;

        debug!(
            rows = rows.len(),
            visibility = ?filter.visibility,
            status = ?filter.status,
            "store.article.list"
        );
        self.hydrate(rows).await
    }

    /// Articles written by `author_id`, optionally restricted to one status.
    pub async fn articles_by_author(
        &self,
        author_id: i64,
        status: Option<ArticleStatus>,
    ) -> Result<Vec<Article>> {
        let rows = sqlx::query(select_articles!(
            r#"WHERE a.author_id = ?1 AND (?2 IS NULL OR a.status = ?2)
               ORDER BY a.published_at DESC, a.created_at DESC, a.id DESC"#
        ))
        .bind(author_id)
        .bind(status.map(ArticleStatus::as_str))
        .fetch_all(self.pool())
        .await?;
        debug!(author_id, rows = rows.len(), "store.article.by_author");
        self.hydrate(rows).await
    }

    /// Case-insensitive match on title, content or excerpt, narrowed by
    /// category name, tag names and status.
    pub async fn search_articles(&self, q: &SearchQuery) -> Result<Vec<Article>> {
        q.validate()?;
        let needle = like_pattern(q.query.trim());
        let category = q
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(like_pattern);
        let tags = if q.tags.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&q.tags).map_err(|e| StoreError::Invalid(e.to_string()))?)
        };

        let rows = sqlx::query(select_articles!(
            r#"WHERE (a.title LIKE ?1 ESCAPE '\'
                      OR a.content LIKE ?1 ESCAPE '\'
                      OR a.excerpt LIKE ?1 ESCAPE '\')
                 AND (?2 IS NULL OR c.name LIKE ?2 ESCAPE '\')
                 AND (?3 IS NULL OR EXISTS (
                       SELECT 1 FROM article_tags j
                       JOIN tags t ON t.id = j.tag_id
                       WHERE j.article_id = a.id
                         AND t.name IN (SELECT value FROM json_each(?3))))
                 AND (?4 IS NULL OR a.status = ?4)
                 AND (?5 = 0 OR a.status = 'published')
               ORDER BY a.published_at DESC, a.created_at DESC, a.id DESC"#
        ))
        .bind(&needle) // ?1
        .bind(category) // ?2
        .bind(tags) // ?3
        .bind(q.status.map(ArticleStatus::as_str)) // ?4
        .bind(q.published_only) // ?5
        .fetch_all(self.pool())
        .await?;

        info!(
            query = %q.query,
            rows = rows.len(),
            published_only = q.published_only,
            "store.article.search"
        );
        self.hydrate(rows).await
    }

    /// Apply a partial update. Moving into `published` stamps `published_at`.
    pub async fn update_article(&self, id: i64, changes: ArticleUpdate) -> Result<Article> {
        changes.validate()?;
        let current = self.article_by_id(id).await?;
        if let Some(category) = changes.category {
            self.ensure_category(category).await?;
        }
        if let Some(tags) = &changes.tags {
            self.ensure_tags(tags).await?;
        }

        let status = changes.status.unwrap_or(current.status);
        let now = Utc::now();
        let published_at = publication_stamp(current.status, current.published_at, status, now);
        let category_id = match changes.category {
            Some(c) => c,
            None => current.category.as_ref().map(|c| c.id),
        };
        let featured_image = match changes.featured_image {
            Some(f) => f,
            None => current.featured_image.clone(),
        };

        let mut tx = self.pool().begin().await?;
        sqlx::query(
            r#"UPDATE articles SET
                 title = ?1, content = ?2, excerpt = ?3, status = ?4,
                 category_id = ?5, featured_image = ?6, meta_description = ?7,
                 updated_at = ?8, published_at = ?9
               WHERE id = ?10"#,
        )
        .bind(changes.title.as_deref().unwrap_or(&current.title))
        .bind(changes.content.as_deref().unwrap_or(&current.content))
        .bind(changes.excerpt.as_deref().unwrap_or(&current.excerpt))
        .bind(status.as_str())
        .bind(category_id)
        .bind(featured_image)
        .bind(
            changes
                .meta_description
                .as_deref()
                .unwrap_or(&current.meta_description),
        )
        .bind(now)
        .bind(published_at)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        if let Some(tags) = &changes.tags {
            replace_tags(&mut tx, id, tags).await?;
        }
        tx.commit().await?;

        info!(
            article_id = id,
            from = current.status.as_str(),
            to = status.as_str(),
            "store.article.update"
        );
        self.article_by_id(id).await
    }

    pub async fn publish_article(&self, id: i64) -> Result<Article> {
        let now = Utc::now();
        let res = sqlx::query(
            r#"UPDATE articles SET
                 status = 'published',
                 published_at = COALESCE(published_at, ?1),
                 updated_at = ?1
               WHERE id = ?2"#,
        )
        .bind(now)
        .bind(id)
        .execute(self.pool())
        .await?;
        if res.rows_affected() == 0 {
            return Err(StoreError::not_found("article", id));
        }
        info!(article_id = id, "store.article.publish");
        self.article_by_id(id).await
    }

    pub async fn delete_article(&self, id: i64) -> Result<()> {
        let mut tx = self.pool().begin().await?;
        sqlx::query("DELETE FROM article_tags WHERE article_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM comments WHERE article_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let res = sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if res.rows_affected() == 0 {
            return Err(StoreError::not_found("article", id));
        }
        tx.commit().await?;
        info!(article_id = id, "store.article.delete");
        Ok(())
    }

    /// Persist a successful AI review. The only writer of the `ai_*` columns.
    pub async fn record_ai_review(
        &self,
        id: i64,
        score: Option<f64>,
        feedback: &str,
    ) -> Result<Article> {
        let res = sqlx::query(
            r#"UPDATE articles SET
                 ai_checked = 1, ai_score = ?1, ai_feedback = ?2, updated_at = ?3
               WHERE id = ?4"#,
        )
        .bind(score)
        .bind(feedback)
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool())
        .await?;
        if res.rows_affected() == 0 {
            return Err(StoreError::not_found("article", id));
        }
        info!(article_id = id, score = ?score, "store.article.update_ai");
        self.article_by_id(id).await
    }

    async fn ensure_category(&self, category: Option<i64>) -> Result<()> {
        let Some(id) = category else {
            return Ok(());
        };
        let found: Option<(i64,)> = sqlx::query_as("SELECT id FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        match found {
            Some(_) => Ok(()),
            None => Err(StoreError::Invalid(format!("unknown category {id}"))),
        }
    }

    async fn ensure_tags(&self, tags: &[i64]) -> Result<()> {
        for id in tags {
            let found: Option<(i64,)> = sqlx::query_as("SELECT id FROM tags WHERE id = ?")
                .bind(id)
                .fetch_optional(self.pool())
                .await?;
            if found.is_none() {
                return Err(StoreError::Invalid(format!("unknown tag {id}")));
            }
        }
        Ok(())
    }

    async fn hydrate(&self, rows: Vec<SqliteRow>) -> Result<Vec<Article>> {
        let mut articles = Vec::with_capacity(rows.len());
        for row in &rows {
            articles.push(self.hydrate_one(row).await?);
        }
        Ok(articles)
    }

    async fn hydrate_one(&self, row: &SqliteRow) -> Result<Article> {
        let mut article = article_from_row(row)?;
        article.tags = self.tags_for_article(article.id).await?;
        Ok(article)
    }
}

/// `published_at` after a status change: stamped on the first move into
/// `published`, otherwise unchanged.
fn publication_stamp(
    from: ArticleStatus,
    published_at: Option<DateTime<Utc>>,
    to: ArticleStatus,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if to == ArticleStatus::Published && from != ArticleStatus::Published {
        Some(now)
    } else {
        published_at
    }
}

async fn replace_tags(tx: &mut Transaction<'_, Sqlite>, article_id: i64, tags: &[i64]) -> Result<()> {
    sqlx::query("DELETE FROM article_tags WHERE article_id = ?")
        .bind(article_id)
        .execute(&mut **tx)
        .await?;
    for tag_id in tags {
        sqlx::query("INSERT OR IGNORE INTO article_tags (article_id, tag_id) VALUES (?1, ?2)")
            .bind(article_id)
            .bind(tag_id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

fn article_from_row(r: &SqliteRow) -> Result<Article> {
    let status: String = r.try_get("status")?;
    let content: String = r.try_get("content")?;
    let category = match r.try_get::<Option<i64>, _>("category_id")? {
        Some(id) => Some(Category {
            id,
            name: r.try_get("category_name")?,
            slug: r.try_get("category_slug")?,
            description: r.try_get("category_description")?,
            created_at: r.try_get("category_created_at")?,
        }),
        None => None,
    };

    Ok(Article {
        id: r.try_get("id")?,
        title: r.try_get("title")?,
        slug: r.try_get("slug")?,
        reading_time: reading_time(&content),
        content,
        excerpt: r.try_get("excerpt")?,
        status: status.parse()?,
        created_at: r.try_get("created_at")?,
        updated_at: r.try_get("updated_at")?,
        published_at: r.try_get("published_at")?,
        author: User {
            id: r.try_get("author_id")?,
            username: r.try_get("username")?,
            first_name: r.try_get("first_name")?,
            last_name: r.try_get("last_name")?,
            email: r.try_get("email")?,
            is_staff: r.try_get("is_staff")?,
        },
        category,
        tags: Vec::new(),
        featured_image: r.try_get("featured_image")?,
        meta_description: r.try_get("meta_description")?,
        ai_checked: r.try_get("ai_checked")?,
        ai_score: r.try_get("ai_score")?,
        ai_feedback: r.try_get("ai_feedback")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use crate::{SeedCategory, SeedUser};

    struct Fixture {
        store: Store,
        alice: User,
        bob: User,
        admin: User,
    }

    async fn fixture() -> Fixture {
        let store = testing::store().await;
        let seed = |name: &str, staff: bool| SeedUser {
            username: name.into(),
            email: format!("{name}@example.com"),
            token: format!("tok-{name}"),
            is_staff: staff,
            ..SeedUser::default()
        };
        store
            .seed_users(&[seed("alice", false), seed("bob", false), seed("admin", true)])
            .await
            .unwrap();
        store
            .seed_categories(&[SeedCategory {
                name: "Technologie".into(),
                description: "Tech".into(),
            }])
            .await
            .unwrap();
        store
            .seed_tags(&["rust".to_string(), "sqlite".to_string()])
            .await
            .unwrap();
        let user = |t: &'static str| {
            let store = store.clone();
            async move { store.user_by_token(t).await.unwrap().unwrap() }
        };
        Fixture {
            alice: user("tok-alice").await,
            bob: user("tok-bob").await,
            admin: user("tok-admin").await,
            store,
        }
    }

    fn draft(title: &str) -> NewArticle {
        NewArticle {
            title: title.into(),
            content: format!("Contenu de {title}"),
            ..NewArticle::default()
        }
    }

    #[tokio::test]
    async fn create_assigns_slug_author_and_defaults() {
        let f = fixture().await;
        let a = f.store.create_article(&f.alice, draft("Mon Article")).await.unwrap();
        let b = f.store.create_article(&f.bob, draft("Mon article")).await.unwrap();

        assert_eq!(a.slug, "mon-article");
        assert_eq!(b.slug, "mon-article-2");
        assert_eq!(a.author.username, "alice");
        assert_eq!(a.status, ArticleStatus::Draft);
        assert!(a.published_at.is_none());
        assert!(!a.ai_checked);
        assert!(a.ai_score.is_none());
        assert_eq!(a.reading_time, 1);
    }

    #[tokio::test]
    async fn concurrent_creates_with_same_title_get_distinct_slugs() {
        let f = fixture().await;
        let (a, b, c) = tokio::join!(
            f.store.create_article(&f.alice, draft("Même titre")),
            f.store.create_article(&f.bob, draft("Même titre")),
            f.store.create_article(&f.admin, draft("Même titre")),
        );
        let mut slugs = vec![a.unwrap().slug, b.unwrap().slug, c.unwrap().slug];
        slugs.sort();
        assert_eq!(slugs, ["même-titre", "même-titre-2", "même-titre-3"]);
    }

    #[tokio::test]
    async fn create_rejects_unknown_references_and_blank_fields() {
        let f = fixture().await;
        let mut input = draft("Titre");
        input.category = Some(999);
        assert!(matches!(
            f.store.create_article(&f.alice, input).await,
            Err(StoreError::Invalid(_))
        ));

        let mut input = draft("Titre");
        input.tags = vec![999];
        assert!(f.store.create_article(&f.alice, input).await.is_err());

        let mut input = draft("Titre");
        input.content = "   ".into();
        assert!(f.store.create_article(&f.alice, input).await.is_err());
    }

    #[tokio::test]
    async fn category_and_tags_are_attached() {
        let f = fixture().await;
        let category = f.store.category_by_slug("technologie").await.unwrap();
        let rust = f.store.tag_by_slug("rust").await.unwrap();
        let sqlite = f.store.tag_by_slug("sqlite").await.unwrap();

        let mut input = draft("Avec tags");
        input.category = Some(category.id);
        input.tags = vec![sqlite.id, rust.id, rust.id];
        let a = f.store.create_article(&f.alice, input).await.unwrap();

        assert_eq!(a.category.as_ref().map(|c| c.id), Some(category.id));
        let names: Vec<&str> = a.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["rust", "sqlite"]);

        let by_tag = f
            .store
            .list_articles(&ArticleFilter {
                tag: Some(rust.id),
                visibility: Visibility::Staff,
                ..ArticleFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(by_tag.len(), 1);
    }

    #[tokio::test]
    async fn listing_respects_visibility() {
        let f = fixture().await;
        f.store.create_article(&f.alice, draft("Brouillon Alice")).await.unwrap();
        f.store.create_article(&f.bob, draft("Brouillon Bob")).await.unwrap();
        let mut published = draft("Public");
        published.status = ArticleStatus::Published;
        f.store.create_article(&f.bob, published).await.unwrap();

        let list = |visibility| {
            let store = f.store.clone();
            async move {
                store
                    .list_articles(&ArticleFilter {
                        visibility,
                        ..ArticleFilter::default()
                    })
                    .await
                    .unwrap()
                    .into_iter()
                    .map(|a| a.title)
                    .collect::<Vec<_>>()
            }
        };

        assert_eq!(list(Visibility::Anonymous).await, ["Public"]);
        let mut alice = list(Visibility::for_user(Some(&f.alice))).await;
        alice.sort();
        assert_eq!(alice, ["Brouillon Alice", "Public"]);
        assert_eq!(list(Visibility::for_user(Some(&f.admin))).await.len(), 3);
    }

    #[tokio::test]
    async fn listing_orders_published_first_and_filters() {
        let f = fixture().await;
        f.store.create_article(&f.alice, draft("Ancien brouillon")).await.unwrap();
        let mut p = draft("Publié");
        p.status = ArticleStatus::Published;
        f.store.create_article(&f.alice, p).await.unwrap();

        let all = f
            .store
            .list_articles(&ArticleFilter {
                visibility: Visibility::Staff,
                ..ArticleFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(all[0].title, "Publié");

        let drafts = f
            .store
            .list_articles(&ArticleFilter {
                status: Some(ArticleStatus::Draft),
                author: Some(f.alice.id),
                search: Some("ancien".into()),
                visibility: Visibility::Staff,
                ..ArticleFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title, "Ancien brouillon");
    }

    #[tokio::test]
    async fn update_stamps_publication_once() {
        let f = fixture().await;
        let a = f.store.create_article(&f.alice, draft("Évolution")).await.unwrap();

        let published = f
            .store
            .update_article(
                a.id,
                ArticleUpdate {
                    status: Some(ArticleStatus::Published),
                    excerpt: Some("Résumé".into()),
                    ..ArticleUpdate::default()
                },
            )
            .await
            .unwrap();
        let stamp = published.published_at.expect("stamped");
        assert_eq!(published.excerpt, "Résumé");
        assert_eq!(published.title, "Évolution");
        assert_eq!(published.slug, a.slug);

        let again = f
            .store
            .update_article(
                a.id,
                ArticleUpdate {
                    title: Some("Évolution 2".into()),
                    ..ArticleUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(again.published_at, Some(stamp));
    }

    #[test]
    fn update_body_distinguishes_null_from_absent() {
        let cleared: ArticleUpdate = serde_json::from_str(r#"{"category": null}"#).unwrap();
        assert_eq!(cleared.category, Some(None));
        let untouched: ArticleUpdate = serde_json::from_str("{}").unwrap();
        assert_eq!(untouched.category, None);
    }

    #[tokio::test]
    async fn publish_and_delete() {
        let f = fixture().await;
        let a = f.store.create_article(&f.alice, draft("À publier")).await.unwrap();
        let p = f.store.publish_article(a.id).await.unwrap();
        assert!(p.is_published());
        assert!(p.published_at.is_some());

        f.store.delete_article(a.id).await.unwrap();
        assert!(matches!(
            f.store.article_by_id(a.id).await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(f.store.delete_article(a.id).await.is_err());
        assert!(f.store.publish_article(a.id).await.is_err());
    }

    #[tokio::test]
    async fn ai_review_is_recorded() {
        let f = fixture().await;
        let a = f.store.create_article(&f.alice, draft("Revue")).await.unwrap();
        let reviewed = f
            .store
            .record_ai_review(a.id, Some(7.5), "SCORE: 7.5/10\nBien.")
            .await
            .unwrap();
        assert!(reviewed.ai_checked);
        assert_eq!(reviewed.ai_score, Some(7.5));
        assert_eq!(reviewed.ai_feedback, "SCORE: 7.5/10\nBien.");

        let unscored = f.store.record_ai_review(a.id, None, "pas de score").await.unwrap();
        assert!(unscored.ai_checked);
        assert!(unscored.ai_score.is_none());
    }

    #[tokio::test]
    async fn search_matches_text_tags_and_visibility() {
        let f = fixture().await;
        let rust = f.store.tag_by_slug("rust").await.unwrap();
        let mut tagged = draft("Programmation système");
        tagged.content = "Un article sur Rust et la mémoire.".into();
        tagged.tags = vec![rust.id];
        f.store.create_article(&f.alice, tagged).await.unwrap();

        let mut public = draft("Rust au quotidien");
        public.status = ArticleStatus::Published;
        f.store.create_article(&f.bob, public).await.unwrap();

        let base = SearchQuery {
            query: "RUST".into(),
            ..SearchQuery::default()
        };
        assert_eq!(f.store.search_articles(&base).await.unwrap().len(), 2);

        let anonymous = SearchQuery {
            published_only: true,
            ..base.clone()
        };
        let hits = f.store.search_articles(&anonymous).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Rust au quotidien");

        let by_tag = SearchQuery {
            tags: vec!["rust".into()],
            ..base.clone()
        };
        let hits = f.store.search_articles(&by_tag).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Programmation système");
    }

    #[test]
    fn search_query_bounds() {
        let empty = SearchQuery::default();
        assert!(empty.validate().is_err());
        let long = SearchQuery {
            query: "x".repeat(MAX_SEARCH_CHARS + 1),
            ..SearchQuery::default()
        };
        assert!(long.validate().is_err());
        let ok = SearchQuery {
            query: "x".repeat(MAX_SEARCH_CHARS),
            ..SearchQuery::default()
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn publication_stamp_rules() {
        let now = Utc::now();
        let earlier = now - chrono::Duration::days(1);
        use ArticleStatus::*;
        assert_eq!(publication_stamp(Draft, None, Published, now), Some(now));
        assert_eq!(publication_stamp(Published, Some(earlier), Published, now), Some(earlier));
        assert_eq!(publication_stamp(Published, Some(earlier), Draft, now), Some(earlier));
        assert_eq!(publication_stamp(Draft, None, Draft, now), None);
    }
}
