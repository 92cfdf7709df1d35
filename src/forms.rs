use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::models::{Post, PostInput};

// --- Submitted Forms (application/x-www-form-urlencoded) ---

/// RegisterForm
///
/// Body of POST /register.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct RegisterForm {
    #[validate(
        email(message = "Enter a valid email address."),
        length(max = 200, message = "Email must be at most 200 characters.")
    )]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
    #[validate(length(min = 1, max = 200, message = "Name is required."))]
    pub name: String,
}

/// LoginForm
///
/// Body of POST /login.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct LoginForm {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

/// CommentForm
///
/// Body of POST /post/{post_id}.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct CommentForm {
    #[validate(length(min = 1, message = "Comment cannot be empty."))]
    pub comment: String,
}

/// PostForm
///
/// Body of POST /new-post and POST /edit-post/{post_id}.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct PostForm {
    #[validate(length(min = 1, max = 250, message = "Title is required."))]
    pub title: String,
    #[validate(length(min = 1, max = 250, message = "Subtitle is required."))]
    pub subtitle: String,
    #[validate(
        url(message = "Enter a valid image URL."),
        length(max = 250, message = "Image URL must be at most 250 characters.")
    )]
    pub img_url: String,
    #[validate(length(min = 1, message = "Content is required."))]
    pub body: String,
}

impl From<&Post> for PostForm {
    fn from(post: &Post) -> Self {
        PostForm {
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            img_url: post.img_url.clone(),
            body: post.body.clone(),
        }
    }
}

impl From<PostForm> for PostInput {
    fn from(form: PostForm) -> Self {
        PostInput {
            title: form.title,
            subtitle: form.subtitle,
            body: form.body,
            img_url: form.img_url,
        }
    }
}

/// FormErrors
///
/// Field-level messages shown next to the inputs of a re-rendered form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormErrors(Vec<(String, String)>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.push((field.to_string(), message.into()));
    }

    pub fn with(mut self, field: &str, message: impl Into<String>) -> Self {
        self.add(field, message);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages for one field, in insertion order.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |(name, _)| name == field)
            .map(|(_, message)| message.as_str())
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FormErrors::new();
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        // HashMap order is random; keep rendering stable.
        fields.sort_by(|a, b| a.0.cmp(&b.0));
        for (field, field_errors) in fields {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid {field}."));
                out.add(&field, message);
            }
        }
        out
    }
}
