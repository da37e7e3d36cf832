use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum_extra::extract::CookieJar;
use thiserror::Error;
use tracing::error;

use crate::{flash, render};

/// Per-request failures. Validation problems never reach this type: the
/// handler re-renders the form with field errors itself. Everything here is
/// recoverable per-request; nothing is fatal to the process.
///
/// The redirect variants carry the request's cookie jar so a flash already
/// queued on the request survives alongside the gate's own message.
#[derive(Debug, Error)]
pub enum AppError {
    /// Unknown username or feedback id.
    #[error("not found")]
    NotFound,
    /// Protected route hit without a session.
    #[error("login required")]
    AuthRequired { jar: CookieJar },
    /// Session user is not the owner of the target resource.
    #[error("{message}")]
    Forbidden {
        jar: CookieJar,
        user: String,
        message: String,
    },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => {
                (StatusCode::NOT_FOUND, Html(render::not_found())).into_response()
            }
            AppError::AuthRequired { jar } => {
                flash::redirect(jar, "/login", "Please login first").into_response()
            }
            AppError::Forbidden { jar, user, message } => {
                flash::redirect(jar, &format!("/users/{user}"), &message).into_response()
            }
            AppError::Internal(err) => {
                error!("internal error: {err:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}
