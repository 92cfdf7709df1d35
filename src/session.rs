use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderValue, header, request::Parts},
    response::{IntoResponseParts, ResponseParts},
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::{convert::Infallible, time::SystemTime};

use crate::error::AppError;

/// Name of the cookie carrying the signed session.
pub const SESSION_COOKIE: &str = "session";

/// SessionSettings
///
/// Signing key and cookie attributes, derived from `AppConfig`.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub secret: String,
    pub ttl_secs: u64,
    // Adds the `Secure` attribute (production only).
    pub secure: bool,
}

/// SessionData
///
/// Everything the server keeps per browser: the logged-in user and pending
/// flash messages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flashes: Vec<String>,
}

/// SessionClaims
///
/// The signed token payload. `exp` bounds the lifetime of a stolen cookie.
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    #[serde(flatten)]
    data: SessionData,
    iat: u64,
    exp: u64,
}

/// Session
///
/// Request-scoped session state. Extracting it never fails: a missing, expired
/// or tampered cookie yields an anonymous session.
///
/// Returning the session as part of a response writes a fresh `Set-Cookie`
/// header, but only when something changed.
#[derive(Debug, Clone)]
pub struct Session {
    data: SessionData,
    settings: SessionSettings,
    modified: bool,
}

impl Session {
    /// An empty, anonymous session.
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            data: SessionData::default(),
            settings,
            modified: false,
        }
    }

    /// Decodes a cookie value. `None` if the signature or expiry check fails.
    pub fn from_token(token: &str, settings: &SessionSettings) -> Option<Self> {
        let key = DecodingKey::from_secret(settings.secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        match decode::<SessionClaims>(token, &key, &validation) {
            Ok(token_data) => Some(Self {
                data: token_data.claims.data,
                settings: settings.clone(),
                modified: false,
            }),
            Err(e) => {
                tracing::debug!("discarding invalid session cookie: {e}");
                None
            }
        }
    }

    pub fn user_id(&self) -> Option<i32> {
        self.data.user_id
    }

    pub fn is_authenticated(&self) -> bool {
        self.data.user_id.is_some()
    }

    pub fn data(&self) -> &SessionData {
        &self.data
    }

    /// Associates the session with `user_id`. Pending flashes are kept.
    pub fn login(&mut self, user_id: i32) {
        self.data.user_id = Some(user_id);
        self.modified = true;
    }

    pub fn logout(&mut self) {
        if self.data.user_id.take().is_some() {
            self.modified = true;
        }
    }

    /// Queues a one-time message for the next rendered page.
    pub fn flash(&mut self, message: impl Into<String>) {
        self.data.flashes.push(message.into());
        self.modified = true;
    }

    /// Drains the pending flash messages.
    pub fn take_flashes(&mut self) -> Vec<String> {
        if self.data.flashes.is_empty() {
            return Vec::new();
        }
        self.modified = true;
        std::mem::take(&mut self.data.flashes)
    }

    /// Signs the current state into a cookie value.
    pub fn encode(&self) -> Result<String, AppError> {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_err(|e| AppError::Internal(e.to_string()))?
            .as_secs();

        let claims = SessionClaims {
            data: self.data.clone(),
            iat: now,
            exp: now + self.settings.ttl_secs,
        };

        let key = EncodingKey::from_secret(self.settings.secret.as_bytes());
        encode(&Header::new(Algorithm::HS256), &claims, &key).map_err(|e| AppError::Internal(e.to_string()))
    }

    fn set_cookie_value(&self) -> Result<HeaderValue, AppError> {
        let mut cookie = format!(
            "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.encode()?,
            self.settings.ttl_secs
        );
        if self.settings.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie).map_err(|e| AppError::Internal(e.to_string()))
    }
}

/// Finds the session cookie among all `Cookie` headers of a request.
pub fn session_cookie(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    SessionSettings: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let settings = SessionSettings::from_ref(state);

        let session = session_cookie(parts)
            .and_then(|token| Session::from_token(token, &settings))
            .unwrap_or_else(|| Session::new(settings));

        Ok(session)
    }
}

impl IntoResponseParts for Session {
    type Error = AppError;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        if self.modified {
            let cookie = self.set_cookie_value()?;
            res.headers_mut().append(header::SET_COOKIE, cookie);
        }
        Ok(res)
    }
}
