use crate::{Result, Store};
use tracing::info;

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS users (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        username    TEXT NOT NULL UNIQUE,
        email       TEXT NOT NULL DEFAULT '',
        first_name  TEXT NOT NULL DEFAULT '',
        last_name   TEXT NOT NULL DEFAULT '',
        token       TEXT NOT NULL UNIQUE,
        is_staff    INTEGER NOT NULL DEFAULT 0
    )"#,
    r#"CREATE TABLE IF NOT EXISTS categories (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT NOT NULL UNIQUE,
        slug        TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL DEFAULT '',
        created_at  TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS tags (
        id    INTEGER PRIMARY KEY AUTOINCREMENT,
        name  TEXT NOT NULL UNIQUE,
        slug  TEXT NOT NULL UNIQUE
    )"#,
    r#"CREATE TABLE IF NOT EXISTS articles (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        title            TEXT NOT NULL,
        slug             TEXT NOT NULL UNIQUE,
        content          TEXT NOT NULL,
        excerpt          TEXT NOT NULL DEFAULT '',
        status           TEXT NOT NULL DEFAULT 'draft',
        author_id        INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        category_id      INTEGER REFERENCES categories(id) ON DELETE SET NULL,
        featured_image   TEXT,
        meta_description TEXT NOT NULL DEFAULT '',
        ai_checked       INTEGER NOT NULL DEFAULT 0,
        ai_score         REAL,
        ai_feedback      TEXT NOT NULL DEFAULT '',
        created_at       TEXT NOT NULL,
        updated_at       TEXT NOT NULL,
        published_at     TEXT
    )"#,
    r#"CREATE TABLE IF NOT EXISTS article_tags (
        article_id  INTEGER NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
        tag_id      INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
        PRIMARY KEY (article_id, tag_id)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS comments (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        article_id    INTEGER NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
        author_name   TEXT NOT NULL,
        author_email  TEXT NOT NULL,
        content       TEXT NOT NULL,
        created_at    TEXT NOT NULL,
        is_approved   INTEGER NOT NULL DEFAULT 1
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_articles_status ON articles(status)",
    "CREATE INDEX IF NOT EXISTS idx_articles_author ON articles(author_id)",
    "CREATE INDEX IF NOT EXISTS idx_comments_article ON comments(article_id)",
];

impl Store {
    /// Create every table and index that does not exist yet. Idempotent.
    pub async fn bootstrap(&self) -> Result<()> {
        let mut tx = self.pool().begin().await?;
        for statement in SCHEMA {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        info!(statements = SCHEMA.len(), "store.bootstrap");
        Ok(())
    }
}
