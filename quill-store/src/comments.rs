use crate::{Comment, Result, Store, StoreError};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewComment {
    pub article: Option<i64>,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_email: String,
    #[serde(default)]
    pub content: String,
}

impl NewComment {
    pub fn validate(&self) -> Result<()> {
        if self.article.is_none() {
            return Err(StoreError::Invalid("article is required".into()));
        }
        for (field, value) in [
            ("author_name", &self.author_name),
            ("author_email", &self.author_email),
            ("content", &self.content),
        ] {
            if value.trim().is_empty() {
                return Err(StoreError::Invalid(format!("{field} is required")));
            }
        }
        if !self.author_email.contains('@') {
            return Err(StoreError::Invalid("author_email is not an email address".into()));
        }
        Ok(())
    }
}

impl Store {
    /// Approved comments, oldest first, optionally for a single article.
    pub async fn list_comments(&self, article_id: Option<i64>) -> Result<Vec<Comment>> {
        let rows = sqlx::query_as(
            r#"SELECT id, article_id, author_name, author_email, content, created_at, is_approved
               FROM comments
               WHERE is_approved = 1 AND (?1 IS NULL OR article_id = ?1)
               ORDER BY created_at ASC, id ASC"#,
        )
        .bind(article_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    /// Attach a comment to an existing article. Comments start approved.
    pub async fn add_comment(&self, input: NewComment) -> Result<Comment> {
        input.validate()?;
        let article_id = input
            .article
            .ok_or_else(|| StoreError::Invalid("article is required".into()))?;

        let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM articles WHERE id = ?")
            .bind(article_id)
            .fetch_optional(self.pool())
            .await?;
        if exists.is_none() {
            return Err(StoreError::not_found("article", article_id));
        }

        let comment: Comment = sqlx::query_as(
            r#"INSERT INTO comments (article_id, author_name, author_email, content, created_at, is_approved)
               VALUES (?1, ?2, ?3, ?4, ?5, 1)
               RETURNING id, article_id, author_name, author_email, content, created_at, is_approved"#,
        )
        .bind(article_id)
        .bind(input.author_name.trim())
        .bind(input.author_email.trim())
        .bind(&input.content)
        .bind(Utc::now())
        .fetch_one(self.pool())
        .await?;

        info!(comment_id = comment.id, article_id, "store.comment.create");
        Ok(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{testing, NewArticle, SeedUser};

    async fn store_with_article() -> (Store, i64) {
        let store = testing::store().await;
        store
            .seed_users(&[SeedUser {
                username: "alice".into(),
                token: "tok".into(),
                ..SeedUser::default()
            }])
            .await
            .unwrap();
        let alice = store.user_by_token("tok").await.unwrap().unwrap();
        let article = store
            .create_article(
                &alice,
                NewArticle {
                    title: "Article".into(),
                    content: "Corps".into(),
                    ..NewArticle::default()
                },
            )
            .await
            .unwrap();
        (store, article.id)
    }

    fn comment(article: i64, text: &str) -> NewComment {
        NewComment {
            article: Some(article),
            author_name: "Lecteur".into(),
            author_email: "lecteur@example.com".into(),
            content: text.into(),
        }
    }

    #[tokio::test]
    async fn comments_attach_and_list_by_article() {
        let (store, id) = store_with_article().await;
        let first = store.add_comment(comment(id, "Premier")).await.unwrap();
        store.add_comment(comment(id, "Second")).await.unwrap();

        assert!(first.is_approved);
        assert_eq!(first.article_id, id);

        let listed = store.list_comments(Some(id)).await.unwrap();
        let texts: Vec<&str> = listed.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(texts, ["Premier", "Second"]);
        assert!(store.list_comments(Some(id + 1)).await.unwrap().is_empty());

        let detail = store.article_detail(id).await.unwrap();
        assert_eq!(detail.comments.len(), 2);
    }

    #[tokio::test]
    async fn unapproved_comments_are_hidden() {
        let (store, id) = store_with_article().await;
        let c = store.add_comment(comment(id, "Spam")).await.unwrap();
        sqlx::query("UPDATE comments SET is_approved = 0 WHERE id = ?")
            .bind(c.id)
            .execute(store.pool())
            .await
            .unwrap();
        assert!(store.list_comments(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn comment_on_missing_article_is_not_found() {
        let (store, id) = store_with_article().await;
        let err = store.add_comment(comment(id + 100, "?")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "article", .. }));
    }

    #[test]
    fn validation_names_the_missing_field() {
        let mut c = comment(1, "ok");
        c.author_email = " ".into();
        let err = c.validate().unwrap_err();
        assert!(err.to_string().contains("author_email"));

        let mut c = comment(1, "ok");
        c.article = None;
        assert!(c.validate().is_err());
    }
}
