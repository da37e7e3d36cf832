use std::sync::Arc;

use anyhow::anyhow;
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::Form;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::extract::State;
use axum_extra::extract::CookieJar;
use tracing::info;

use feedback_db::{Database, is_constraint_violation};
use feedback_db::models::UserRow;
use feedback_types::forms::{FieldError, LoginForm, RegisterForm};

use crate::error::AppError;
use crate::session::{self, Session};
use crate::{flash, render};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub session_secret: String,
}

// -- Credential manager --

/// Argon2id with a fresh OsRng salt; output is a PHC string. Plaintext is
/// never stored anywhere.
pub fn hash_password(plaintext: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| anyhow!("password hashing failed: {e}"))?;
    Ok(hash.to_string())
}

pub fn verify_password(plaintext: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

/// Credential check: `None` on unknown username or wrong password, so the
/// caller cannot tell the two apart.
pub fn authenticate(
    db: &Database,
    username: &str,
    password: &str,
) -> anyhow::Result<Option<UserRow>> {
    let Some(user) = db.get_user(username)? else {
        return Ok(None);
    };
    if verify_password(password, &user.password) {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

// -- Handlers --

pub async fn show_register(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let session = Session::from_jar(&jar, &state.session_secret);
    if let Some(user) = session.user() {
        return Ok(already_logged_in(jar, user, "You cannot register while currently logged in"));
    }

    let (jar, messages) = flash::take(jar);
    Ok((
        jar,
        Html(render::register_form(&RegisterForm::default(), &[], &messages)),
    )
        .into_response())
}

pub async fn handle_register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let session = Session::from_jar(&jar, &state.session_secret);
    if let Some(user) = session.user() {
        return Ok(already_logged_in(jar, user, "You cannot register while currently logged in"));
    }

    let errors = form.validate();
    if !errors.is_empty() {
        return Ok(rerender_register(jar, &form, &errors));
    }

    let password_hash = hash_password(&form.password)?;

    match state.db.create_user(
        &form.username,
        &password_hash,
        &form.email,
        &form.first_name,
        &form.last_name,
    ) {
        Ok(()) => {}
        Err(err) if is_constraint_violation(&err) => {
            // UNIQUE failure on username or email reads like any other
            // field error rather than a 500.
            let errors = vec![taken_field_error(&err)];
            return Ok(rerender_register(jar, &form, &errors));
        }
        Err(err) => return Err(err.into()),
    }

    info!("registered user {}", form.username);

    let jar = session::establish(jar, &state.session_secret, &form.username)?;
    Ok((jar, Redirect::to(&format!("/users/{}", form.username))).into_response())
}

pub async fn show_login(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let session = Session::from_jar(&jar, &state.session_secret);
    if let Some(user) = session.user() {
        return Ok(already_logged_in(jar, user, "You cannot log in while already logged in"));
    }

    let (jar, messages) = flash::take(jar);
    Ok((
        jar,
        Html(render::login_form(&LoginForm::default(), &[], &messages)),
    )
        .into_response())
}

pub async fn handle_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let session = Session::from_jar(&jar, &state.session_secret);
    if let Some(user) = session.user() {
        return Ok(already_logged_in(jar, user, "You cannot log in while already logged in"));
    }

    let errors = form.validate();
    if !errors.is_empty() {
        let (jar, messages) = flash::take(jar);
        return Ok((jar, Html(render::login_form(&form, &errors, &messages))).into_response());
    }

    match authenticate(&state.db, &form.username, &form.password)? {
        Some(user) => {
            info!("user {} logged in", user.username);
            let jar = session::establish(jar, &state.session_secret, &user.username)?;
            Ok((jar, Redirect::to(&format!("/users/{}", user.username))).into_response())
        }
        // Bad credentials redirect back to the login page, they do not
        // re-render the form.
        None => Ok(flash::redirect(jar, "/login", "Incorrect username or password").into_response()),
    }
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (session::clear(jar), Redirect::to("/"))
}

fn already_logged_in(jar: CookieJar, user: &str, message: &str) -> Response {
    let to = format!("/users/{user}");
    flash::redirect(jar, &to, message).into_response()
}

fn rerender_register(jar: CookieJar, form: &RegisterForm, errors: &[FieldError]) -> Response {
    let (jar, messages) = flash::take(jar);
    (jar, Html(render::register_form(form, errors, &messages))).into_response()
}

fn taken_field_error(err: &anyhow::Error) -> FieldError {
    if err.to_string().contains("users.email") {
        FieldError::new("email", "Email already in use")
    } else {
        FieldError::new("username", "Username already taken")
    }
}
