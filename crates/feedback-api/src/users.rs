use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Response};
use axum_extra::extract::CookieJar;
use tracing::info;

use crate::auth::AppState;
use crate::error::AppError;
use crate::session::{self, Session};
use crate::{flash, render};

pub async fn show_user(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(username): Path<String>,
) -> Result<Response, AppError> {
    let session = Session::from_jar(&jar, &state.session_secret);
    session::require_owner(&session, &jar, &username, "You do not have access to that user's page")?;

    let user = state.db.get_user(&username)?.ok_or(AppError::NotFound)?;
    let feedback = state.db.feedback_for_user(&username)?;

    let (jar, messages) = flash::take(jar);
    Ok((jar, Html(render::user_page(&user, &feedback, &messages))).into_response())
}

pub async fn delete_user(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(username): Path<String>,
) -> Result<Response, AppError> {
    let session = Session::from_jar(&jar, &state.session_secret);
    session::require_owner(&session, &jar, &username, "You do not have access to that user's page")?;

    // Feedback rows go first, then the user, inside one transaction.
    state.db.delete_user(&username)?;
    info!("deleted user {username}");

    let jar = session::clear(jar);
    Ok(flash::redirect(jar, "/", "User has been deleted").into_response())
}
