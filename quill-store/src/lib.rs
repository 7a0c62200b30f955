//! SQLite persistence for the blog: users, categories, tags, articles and comments.
//!
//! All access goes through [`Store`], a cheap-to-clone handle around a
//! [`SqlitePool`]. Queries are plain `sqlx::query` calls with positional
//! binds; optional filters use the `(?n IS NULL OR ...)` idiom.
pub mod articles;
pub mod catalog;
pub mod comments;
pub mod schema;
pub mod slug;
pub mod users;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;
use tracing::info;

pub use articles::{ArticleFilter, ArticleUpdate, NewArticle, SearchQuery, Visibility};
pub use catalog::SeedCategory;
pub use comments::NewComment;
pub use users::SeedUser;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid input: {0}")]
    Invalid(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    #[default]
    Draft,
    Published,
}

impl ArticleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ArticleStatus::Draft => "draft",
            ArticleStatus::Published => "published",
        }
    }
}

impl FromStr for ArticleStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "draft" => Ok(ArticleStatus::Draft),
            "published" => Ok(ArticleStatus::Published),
            other => Err(StoreError::Invalid(format!("unknown article status `{other}`"))),
        }
    }
}

/// An account able to author articles. The token is never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip)]
    pub is_staff: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Comment {
    pub id: i64,
    #[serde(skip)]
    pub article_id: i64,
    pub author_name: String,
    pub author_email: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub is_approved: bool,
}

/// Full article record, including AI review fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub status: ArticleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub author: User,
    pub category: Option<Category>,
    pub tags: Vec<Tag>,
    pub featured_image: Option<String>,
    pub meta_description: String,
    pub ai_checked: bool,
    pub ai_score: Option<f64>,
    pub ai_feedback: String,
    pub reading_time: u32,
}

impl Article {
    pub fn is_published(&self) -> bool {
        self.status == ArticleStatus::Published
    }
}

/// Listing view of an article: no body, no feedback text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleSummary {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub status: ArticleStatus,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub author: User,
    pub category: Option<Category>,
    pub tags: Vec<Tag>,
    pub featured_image: Option<String>,
    pub ai_checked: bool,
    pub ai_score: Option<f64>,
    pub reading_time: u32,
}

impl From<Article> for ArticleSummary {
    fn from(a: Article) -> Self {
        Self {
            id: a.id,
            title: a.title,
            slug: a.slug,
            excerpt: a.excerpt,
            status: a.status,
            created_at: a.created_at,
            published_at: a.published_at,
            author: a.author,
            category: a.category,
            tags: a.tags,
            featured_image: a.featured_image,
            ai_checked: a.ai_checked,
            ai_score: a.ai_score,
            reading_time: a.reading_time,
        }
    }
}

/// Detail view: the article plus its approved comments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleDetail {
    #[serde(flatten)]
    pub article: Article,
    pub comments: Vec<Comment>,
}

/// Minutes needed to read `content` at 200 words per minute, at least one.
pub fn reading_time(content: &str) -> u32 {
    let words = content.split_whitespace().count() as u32;
    words.div_ceil(200).max(1)
}

/// `%needle%` for a case-insensitive `LIKE ? ESCAPE '\'` match.
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a pool for `url`. In-memory databases are pinned to a single
    /// connection that is never recycled, otherwise every connection would
    /// see its own empty database.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let pool = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections.max(1))
                .connect_with(options)
                .await?
        };
        info!(in_memory, max_connections, "store.connect");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
