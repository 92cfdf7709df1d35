use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// --- Core Application Schemas (Mapped to Database) ---

/// Role
///
/// The permission tier of an account. Stored as text in `users.role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Reader,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Reader => "reader",
        }
    }

    /// Unknown values fall back to the least privileged role.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "admin" => Role::Admin,
            _ => Role::Reader,
        }
    }
}

/// User
///
/// A registered account from the `users` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub name: String,
    // argon2 PHC string, never the raw password.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
}

impl User {
    pub fn role(&self) -> Role {
        Role::parse(&self.role)
    }
}

/// NewUser
///
/// Insert payload for registration. The role is assigned by the repository.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

/// Post
///
/// A blog post from the `blog_posts` table.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow, Default)]
pub struct Post {
    pub id: i32,
    pub title: String,
    pub subtitle: String,
    // Display date, e.g. "October 18, 2026".
    pub date: String,
    // Rich text (HTML) authored by the admin.
    pub body: String,
    pub img_url: String,
    pub author_id: i32,
    // Loaded via a JOIN on author_id; absent on RETURNING rows.
    #[sqlx(default)]
    pub author_name: Option<String>,
}

/// PostInput
///
/// The editable fields of a post, shared by create and edit.
#[derive(Debug, Clone, Default)]
pub struct PostInput {
    pub title: String,
    pub subtitle: String,
    pub body: String,
    pub img_url: String,
}

/// Comment
///
/// A comment from the `comments` table, augmented with the author's name.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow, Default)]
pub struct Comment {
    pub id: i32,
    // Plain text; markup is stripped before insertion.
    pub text: String,
    pub author_id: i32,
    pub post_id: i32,
    #[sqlx(default)]
    pub author_name: Option<String>,
}
