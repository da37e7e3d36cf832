use axum::Form;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use tracing::info;

use feedback_types::forms::FeedbackForm;

use crate::auth::AppState;
use crate::error::AppError;
use crate::session::{self, Session};
use crate::{flash, render};

pub async fn show_add(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(username): Path<String>,
) -> Result<Response, AppError> {
    let session = Session::from_jar(&jar, &state.session_secret);
    session::require_owner(
        &session,
        &jar,
        &username,
        "You cannot add feedback as someone other than yourself",
    )?;

    let (jar, messages) = flash::take(jar);
    let html = render::feedback_form(
        "New Feedback",
        "Submit",
        &format!("/users/{username}/feedback/add"),
        &FeedbackForm::default(),
        &[],
        &messages,
    );
    Ok((jar, Html(html)).into_response())
}

pub async fn handle_add(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(username): Path<String>,
    Form(form): Form<FeedbackForm>,
) -> Result<Response, AppError> {
    let session = Session::from_jar(&jar, &state.session_secret);
    session::require_owner(
        &session,
        &jar,
        &username,
        "You cannot add feedback as someone other than yourself",
    )?;

    let errors = form.validate();
    if !errors.is_empty() {
        let (jar, messages) = flash::take(jar);
        let html = render::feedback_form(
            "New Feedback",
            "Submit",
            &format!("/users/{username}/feedback/add"),
            &form,
            &errors,
            &messages,
        );
        return Ok((jar, Html(html)).into_response());
    }

    // The row is tied to the session username, which the gate has just
    // matched against the path.
    let id = state.db.create_feedback(&form.title, &form.content, &username)?;
    info!("user {username} added feedback {id}");

    let to = format!("/users/{username}");
    Ok(flash::redirect(jar, &to, "Feedback successfully added").into_response())
}

pub async fn show_update(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    // Loaded before the session check so an unknown id is a 404 even for
    // logged-out clients.
    let row = state.db.get_feedback(id)?.ok_or(AppError::NotFound)?;

    let session = Session::from_jar(&jar, &state.session_secret);
    session::require_owner(&session, &jar, &row.username, "You are not the owner of this feedback")?;

    let form = FeedbackForm {
        title: row.title,
        content: row.content,
    };

    let (jar, messages) = flash::take(jar);
    let html = render::feedback_form(
        "Update Feedback",
        "Save",
        &format!("/feedback/{id}/update"),
        &form,
        &[],
        &messages,
    );
    Ok((jar, Html(html)).into_response())
}

pub async fn handle_update(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
    Form(form): Form<FeedbackForm>,
) -> Result<Response, AppError> {
    let row = state.db.get_feedback(id)?.ok_or(AppError::NotFound)?;

    let session = Session::from_jar(&jar, &state.session_secret);
    session::require_owner(&session, &jar, &row.username, "You are not the owner of this feedback")?;

    let errors = form.validate();
    if !errors.is_empty() {
        let (jar, messages) = flash::take(jar);
        let html = render::feedback_form(
            "Update Feedback",
            "Save",
            &format!("/feedback/{id}/update"),
            &form,
            &errors,
            &messages,
        );
        return Ok((jar, Html(html)).into_response());
    }

    state.db.update_feedback(id, &form.title, &form.content)?;

    Ok(Redirect::to(&format!("/users/{}", row.username)).into_response())
}

pub async fn delete(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let row = state.db.get_feedback(id)?.ok_or(AppError::NotFound)?;

    let session = Session::from_jar(&jar, &state.session_secret);
    session::require_owner(&session, &jar, &row.username, "You cannot delete someone else's feedback")?;

    state.db.delete_feedback(id)?;
    info!("user {} deleted feedback {id}", row.username);

    // Owner captured before the delete, for the redirect target.
    let to = format!("/users/{}", row.username);
    Ok(flash::redirect(jar, &to, "Feedback successfully deleted").into_response())
}
