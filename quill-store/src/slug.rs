//! URL slugs for articles, categories and tags.

use crate::Result;
use sqlx::SqliteConnection;

const FALLBACK_SLUG: &str = "item";
const MAX_SLUG_CHARS: usize = 80;

/// Lowercase, keep alphanumerics, collapse every other run into one `-`.
///
/// ```
/// use quill_store::slug::slugify;
///
/// assert_eq!(slugify("Hello, World!"), "hello-world");
/// assert_eq!(slugify("  Rust & SQLite  "), "rust-sqlite");
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
        if slug.chars().count() >= MAX_SLUG_CHARS {
            break;
        }
    }
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// `slugify(text)`, suffixed with `-2`, `-3`, ... until no row of `table` uses it.
/// Run it on the connection that performs the insert.
pub(crate) async fn unique_slug(
    conn: &mut SqliteConnection,
    table: &'static str,
    text: &str,
) -> Result<String> {
    let base = slugify(text);
    let sql = format!("SELECT COUNT(*) FROM {table} WHERE slug = ?");
    let mut candidate = base.clone();
    let mut n = 1u32;
    loop {
        let (taken,): (i64,) = sqlx::query_as(&sql)
            .bind(&candidate)
            .fetch_one(&mut *conn)
            .await?;
        if taken == 0 {
            return Ok(candidate);
        }
        n += 1;
        candidate = format!("{base}-{n}");
    }
}
