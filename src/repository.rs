use crate::{
    error::AppError,
    models::{Comment, NewUser, Post, PostInput, User},
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

/// Repository Trait
///
/// The persistence contract used by handlers and extractors. Handlers only see
/// `Arc<dyn Repository>`, so tests can swap in an in-memory implementation.
///
/// Unique violations surface as `AppError::Conflict` carrying the constraint name.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: i32) -> Result<Option<User>, AppError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    /// Inserts a user. The first account ever created becomes admin.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;

    // --- Posts ---
    /// All posts, oldest first, with `author_name` resolved through `author_id`.
    async fn get_posts(&self) -> Result<Vec<Post>, AppError>;
    async fn get_post(&self, id: i32) -> Result<Option<Post>, AppError>;
    async fn create_post(&self, input: PostInput, author_id: i32, date: String) -> Result<Post, AppError>;
    /// Overwrites the editable fields and author. `None` if the post does not exist.
    async fn update_post(&self, id: i32, input: PostInput, author_id: i32) -> Result<Option<Post>, AppError>;
    /// Returns true if a row was deleted. Comments go with it.
    async fn delete_post(&self, id: i32) -> Result<bool, AppError>;

    // --- Comments ---
    async fn add_comment(&self, post_id: i32, author_id: i32, text: String) -> Result<Comment, AppError>;
    /// Comments of one post, oldest first, with `author_name`.
    async fn get_comments(&self, post_id: i32) -> Result<Vec<Comment>, AppError>;
}

/// Constraint names from `migrations/`, as reported in `AppError::Conflict`.
pub mod constraints {
    pub const USERS_EMAIL_KEY: &str = "users_email_key";
    pub const USERS_NAME_KEY: &str = "users_name_key";
    pub const USERS_SINGLE_ADMIN: &str = "users_single_admin";
    pub const BLOG_POSTS_TITLE_KEY: &str = "blog_posts_title_key";
}

/// RepositoryState
///
/// The shared handle to the persistence layer stored in `AppState`.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The `Repository` implementation backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "id, email, name, password_hash, role";
const POST_COLUMNS: &str = "id, title, subtitle, date, body, img_url, author_id";

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: i32) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// create_user
    ///
    /// The role is decided inside the INSERT. The table lock serializes
    /// concurrent registrations so that the `EXISTS` check sees every
    /// committed account and only the very first one becomes admin.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("LOCK TABLE users IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;

        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, name, password_hash, role)
            VALUES ($1, $2, $3, CASE WHEN EXISTS (SELECT 1 FROM users) THEN 'reader' ELSE 'admin' END)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.email)
        .bind(user.name)
        .bind(user.password_hash)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn get_posts(&self) -> Result<Vec<Post>, AppError> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT p.id, p.title, p.subtitle, p.date, p.body, p.img_url, p.author_id, u.name AS author_name
            FROM blog_posts p
            JOIN users u ON u.id = p.author_id
            ORDER BY p.id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    async fn get_post(&self, id: i32) -> Result<Option<Post>, AppError> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT p.id, p.title, p.subtitle, p.date, p.body, p.img_url, p.author_id, u.name AS author_name
            FROM blog_posts p
            JOIN users u ON u.id = p.author_id
            WHERE p.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    async fn create_post(&self, input: PostInput, author_id: i32, date: String) -> Result<Post, AppError> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO blog_posts (title, subtitle, date, body, img_url, author_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(input.title)
        .bind(input.subtitle)
        .bind(date)
        .bind(input.body)
        .bind(input.img_url)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(post)
    }

    async fn update_post(&self, id: i32, input: PostInput, author_id: i32) -> Result<Option<Post>, AppError> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE blog_posts
            SET title = $2, subtitle = $3, body = $4, img_url = $5, author_id = $6
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(input.title)
        .bind(input.subtitle)
        .bind(input.body)
        .bind(input.img_url)
        .bind(author_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    async fn delete_post(&self, id: i32) -> Result<bool, AppError> {
        let res = sqlx::query("DELETE FROM blog_posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    /// add_comment
    ///
    /// Inserts the comment and joins `users` in the same statement to return the
    /// author's name.
    async fn add_comment(&self, post_id: i32, author_id: i32, text: String) -> Result<Comment, AppError> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (text, author_id, post_id) VALUES ($1, $2, $3)
                RETURNING id, text, author_id, post_id
            )
            SELECT i.id, i.text, i.author_id, i.post_id, u.name AS author_name
            FROM inserted i JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(text)
        .bind(author_id)
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn get_comments(&self, post_id: i32) -> Result<Vec<Comment>, AppError> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT c.id, c.text, c.author_id, c.post_id, u.name AS author_name
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.post_id = $1
            ORDER BY c.id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }
}
