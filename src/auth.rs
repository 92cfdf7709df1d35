use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{
    error::AppError,
    models::{Role, User},
    repository::RepositoryState,
    session::{Session, SessionSettings},
};

/// AuthUser
///
/// The resolved identity of a logged-in visitor. Handlers receive it through
/// `CurrentUser` or `AdminUser`, never through a global lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: i32,
    pub name: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        let role = user.role();
        AuthUser {
            id: user.id,
            name: user.name,
            role,
        }
    }
}

/// CurrentUser
///
/// The per-request authentication context: `Some` when the session cookie
/// names a user that still exists, `None` for anonymous visitors.
///
/// Only repository failures reject the request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<AuthUser>);

impl CurrentUser {
    pub fn is_authenticated(&self) -> bool {
        self.0.is_some()
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    SessionSettings: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let Ok(session) = Session::from_request_parts(parts, state).await;

        let Some(user_id) = session.user_id() else {
            return Ok(CurrentUser(None));
        };

        // A session may outlive its user row; treat that as anonymous.
        let user = repo.get_user(user_id).await?;
        Ok(CurrentUser(user.map(AuthUser::from)))
    }
}

/// AdminUser
///
/// Guard extractor for post management. Rejects with 403 unless the visitor is
/// logged in with the admin role. Anonymous visitors get 403 too.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    SessionSettings: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        match user {
            Some(user) if user.is_admin() => Ok(AdminUser(user)),
            Some(user) => {
                tracing::warn!(user_id = user.id, uri = %parts.uri, "non-admin attempted post management");
                Err(AppError::Forbidden)
            }
            None => {
                tracing::warn!(uri = %parts.uri, "anonymous visitor attempted post management");
                Err(AppError::Forbidden)
            }
        }
    }
}
