#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response, header},
};
use blog_portal::{
    AppConfig, AppError, AppState, Session, create_router,
    models::{Comment, NewUser, Post, PostInput, Role, User},
    password,
    repository::{Repository, constraints},
};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

// --- In-Memory Repository ---

#[derive(Default)]
struct Store {
    users: Vec<User>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    next_user_id: i32,
    next_post_id: i32,
    next_comment_id: i32,
}

/// Stateful stand-in for Postgres. Emulates the UNIQUE constraints, the
/// first-user-is-admin rule, the author JOINs and the comment cascade.
#[derive(Default)]
pub struct InMemoryRepo {
    store: Mutex<Store>,
}

impl InMemoryRepo {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn users(&self) -> Vec<User> {
        self.store.lock().unwrap().users.clone()
    }

    pub fn posts(&self) -> Vec<Post> {
        self.store.lock().unwrap().posts.clone()
    }

    pub fn comments(&self) -> Vec<Comment> {
        self.store.lock().unwrap().comments.clone()
    }

    fn with_author(store: &Store, mut post: Post) -> Post {
        post.author_name = store
            .users
            .iter()
            .find(|u| u.id == post.author_id)
            .map(|u| u.name.clone());
        post
    }
}

#[async_trait]
impl Repository for InMemoryRepo {
    async fn get_user(&self, id: i32) -> Result<Option<User>, AppError> {
        let store = self.store.lock().unwrap();
        Ok(store.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let store = self.store.lock().unwrap();
        Ok(store.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut store = self.store.lock().unwrap();
        if store.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(constraints::USERS_EMAIL_KEY.to_string()));
        }
        if store.users.iter().any(|u| u.name == user.name) {
            return Err(AppError::Conflict(constraints::USERS_NAME_KEY.to_string()));
        }
        let role = if store.users.is_empty() { Role::Admin } else { Role::Reader };
        store.next_user_id += 1;
        let created = User {
            id: store.next_user_id,
            email: user.email,
            name: user.name,
            password_hash: user.password_hash,
            role: role.as_str().to_string(),
        };
        store.users.push(created.clone());
        Ok(created)
    }

    async fn get_posts(&self) -> Result<Vec<Post>, AppError> {
        let store = self.store.lock().unwrap();
        Ok(store
            .posts
            .iter()
            .cloned()
            .map(|p| Self::with_author(&store, p))
            .collect())
    }

    async fn get_post(&self, id: i32) -> Result<Option<Post>, AppError> {
        let store = self.store.lock().unwrap();
        Ok(store
            .posts
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .map(|p| Self::with_author(&store, p)))
    }

    async fn create_post(&self, input: PostInput, author_id: i32, date: String) -> Result<Post, AppError> {
        let mut store = self.store.lock().unwrap();
        if store.posts.iter().any(|p| p.title == input.title) {
            return Err(AppError::Conflict(constraints::BLOG_POSTS_TITLE_KEY.to_string()));
        }
        store.next_post_id += 1;
        let post = Post {
            id: store.next_post_id,
            title: input.title,
            subtitle: input.subtitle,
            date,
            body: input.body,
            img_url: input.img_url,
            author_id,
            author_name: None,
        };
        store.posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, id: i32, input: PostInput, author_id: i32) -> Result<Option<Post>, AppError> {
        let mut store = self.store.lock().unwrap();
        if store.posts.iter().any(|p| p.id != id && p.title == input.title) {
            return Err(AppError::Conflict(constraints::BLOG_POSTS_TITLE_KEY.to_string()));
        }
        let Some(post) = store.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        post.title = input.title;
        post.subtitle = input.subtitle;
        post.body = input.body;
        post.img_url = input.img_url;
        post.author_id = author_id;
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: i32) -> Result<bool, AppError> {
        let mut store = self.store.lock().unwrap();
        let before = store.posts.len();
        store.posts.retain(|p| p.id != id);
        let deleted = store.posts.len() < before;
        if deleted {
            store.comments.retain(|c| c.post_id != id);
        }
        Ok(deleted)
    }

    async fn add_comment(&self, post_id: i32, author_id: i32, text: String) -> Result<Comment, AppError> {
        let mut store = self.store.lock().unwrap();
        store.next_comment_id += 1;
        let author_name = store.users.iter().find(|u| u.id == author_id).map(|u| u.name.clone());
        let comment = Comment {
            id: store.next_comment_id,
            text,
            author_id,
            post_id,
            author_name,
        };
        store.comments.push(comment.clone());
        Ok(comment)
    }

    async fn get_comments(&self, post_id: i32) -> Result<Vec<Comment>, AppError> {
        let store = self.store.lock().unwrap();
        Ok(store
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }
}

// --- App & Request Helpers ---

pub fn test_state(repo: Arc<InMemoryRepo>) -> AppState {
    AppState {
        repo,
        config: AppConfig::default(),
    }
}

pub fn test_app(repo: Arc<InMemoryRepo>) -> Router {
    create_router(test_state(repo))
}

/// A `Cookie` header value for a session logged in as `user_id`.
pub fn cookie_for(user_id: i32) -> String {
    let mut session = Session::new(AppConfig::default().session_settings());
    session.login(user_id);
    format!("session={}", session.encode().unwrap())
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// A urlencoded form POST. `fields` values are percent-encoded here.
pub fn post_form(uri: &str, fields: &[(&str, &str)], cookie: Option<&str>) -> Request<Body> {
    let body = fields
        .iter()
        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).unwrap()
}

fn encode(raw: &str) -> String {
    raw.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => (b as char).to_string(),
            _ => format!("%{b:02X}"),
        })
        .collect()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub fn location(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string())
}

/// The `session=...` pair from the response's `Set-Cookie`, if any.
pub fn response_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("session="))
        .map(|v| v.split(';').next().unwrap().to_string())
}

/// Decodes the session written by a response.
pub fn response_session(response: &Response<Body>) -> Option<Session> {
    let cookie = response_cookie(response)?;
    let token = cookie.strip_prefix("session=")?;
    Session::from_token(token, &AppConfig::default().session_settings())
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// --- Seed Data ---

pub async fn seed_user(repo: &InMemoryRepo, email: &str, name: &str, password: &str) -> User {
    let password_hash = password::hash_password(password.to_string()).await.unwrap();
    repo.create_user(NewUser {
        email: email.to_string(),
        name: name.to_string(),
        password_hash,
    })
    .await
    .unwrap()
}

pub async fn seed_post(repo: &InMemoryRepo, author_id: i32, title: &str) -> Post {
    repo.create_post(
        PostInput {
            title: title.to_string(),
            subtitle: format!("{title} subtitle"),
            body: format!("<p>{title} body</p>"),
            img_url: "https://example.com/cover.jpg".to_string(),
        },
        author_id,
        "October 18, 2026".to_string(),
    )
    .await
    .unwrap()
}
