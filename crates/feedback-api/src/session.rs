use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const SESSION_COOKIE: &str = "feedback_session";

const SESSION_DAYS: i64 = 14;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// Per-request identity decoded from the signed session cookie. Handlers
/// build one of these up front and hand it to [`require_owner`].
#[derive(Debug, Clone)]
pub struct Session(Option<String>);

impl Session {
    pub fn from_jar(jar: &CookieJar, secret: &str) -> Self {
        let user = jar
            .get(SESSION_COOKIE)
            .and_then(|cookie| decode_token(secret, cookie.value()));
        Session(user)
    }

    pub fn user(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

/// The single authorization gate every protected route goes through:
/// no session redirects to the login page, a session for someone other than
/// `owner` redirects to the session user's own page with `denied` flashed,
/// otherwise the caller may proceed. The jar rides along in the denial so
/// flash messages already queued on the request are not lost.
pub fn require_owner(
    session: &Session,
    jar: &CookieJar,
    owner: &str,
    denied: &str,
) -> Result<(), AppError> {
    match session.user() {
        None => Err(AppError::AuthRequired { jar: jar.clone() }),
        Some(user) if user != owner => Err(AppError::Forbidden {
            jar: jar.clone(),
            user: user.to_string(),
            message: denied.to_string(),
        }),
        Some(_) => Ok(()),
    }
}

pub fn establish(jar: CookieJar, secret: &str, username: &str) -> anyhow::Result<CookieJar> {
    let token = issue_token(secret, username)?;
    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    Ok(jar.add(cookie))
}

pub fn clear(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build())
}

fn issue_token(secret: &str, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(SESSION_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

fn decode_token(secret: &str, token: &str) -> Option<String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims.sub)
    .ok()
}
