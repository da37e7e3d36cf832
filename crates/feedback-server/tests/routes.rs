use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;

use feedback_api::AppStateInner;
use feedback_db::Database;

const ALICE: &str = "username=alice&password=pw123&email=a%40x.com&first_name=A&last_name=B";
const BOB: &str = "username=bob&password=pw456&email=b%40x.com&first_name=B&last_name=C";

fn test_app() -> (Router, Arc<AppStateInner>) {
    let state = Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        session_secret: "test-secret".into(),
    });
    (feedback_server::app(state.clone()), state)
}

async fn send(app: &Router, req: Request<Body>) -> Response<axum::body::Body> {
    app.clone().oneshot(req).await.unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(c) = cookie {
        builder = builder.header(header::COOKIE, c);
    }
    builder.body(Body::empty()).unwrap()
}

fn form_post(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(c) = cookie {
        builder = builder.header(header::COOKIE, c);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn location(res: &Response<Body>) -> &str {
    res.headers()
        .get(header::LOCATION)
        .expect("redirect location")
        .to_str()
        .unwrap()
}

/// First `name=value` pair from Set-Cookie with a non-empty value.
fn cookie_named(res: &Response<Body>, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    res.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .find(|v| v.starts_with(&prefix) && v.len() > prefix.len())
        .map(str::to_string)
}

/// True when Set-Cookie expires `name` (empty value).
fn cookie_cleared(res: &Response<Body>, name: &str) -> bool {
    let prefix = format!("{name}=");
    res.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .any(|v| v == prefix)
}

async fn body_text(res: Response<Body>) -> String {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn register(app: &Router, form: &str, username: &str) -> String {
    let res = send(app, form_post("/register", form, None)).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), format!("/users/{username}"));
    cookie_named(&res, "feedback_session").expect("session cookie after register")
}

#[tokio::test]
async fn root_redirects_to_register() {
    let (app, _) = test_app();
    let res = send(&app, get("/", None)).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/register");
}

#[tokio::test]
async fn register_creates_user_sets_session_and_redirects() {
    let (app, state) = test_app();
    let session = register(&app, ALICE, "alice").await;
    assert!(!session.is_empty());

    let user = state.db.get_user("alice").unwrap().unwrap();
    assert_eq!(user.email, "a@x.com");
    // Never the plaintext.
    assert_ne!(user.password, "pw123");
    assert!(user.password.starts_with("$argon2"));
}

#[tokio::test]
async fn wrong_password_login_flashes_and_redirects() {
    let (app, _) = test_app();
    register(&app, ALICE, "alice").await;

    let res = send(&app, form_post("/login", "username=alice&password=wrong", None)).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login");
    // Flash queued, no session established.
    let flash = cookie_named(&res, "feedback_flash").expect("flash cookie");
    assert!(cookie_named(&res, "feedback_session").is_none());

    // The login page shows the notice once and clears the queue.
    let res = send(&app, get("/login", Some(&flash))).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(cookie_cleared(&res, "feedback_flash"));
    let body = body_text(res).await;
    assert!(body.contains("Incorrect username or password"));
}

#[tokio::test]
async fn login_establishes_session() {
    let (app, _) = test_app();
    register(&app, ALICE, "alice").await;

    let res = send(&app, form_post("/login", "username=alice&password=pw123", None)).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/users/alice");
    let session = cookie_named(&res, "feedback_session").unwrap();

    let res = send(&app, get("/users/alice", Some(&session))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_text(res).await;
    assert!(body.contains("alice"));
    assert!(body.contains("a@x.com"));
}

#[tokio::test]
async fn user_page_requires_login() {
    let (app, _) = test_app();
    register(&app, ALICE, "alice").await;

    let res = send(&app, get("/users/alice", None)).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login");
    assert!(cookie_named(&res, "feedback_flash").is_some());
}

#[tokio::test]
async fn other_users_page_redirects_to_own_page() {
    let (app, _) = test_app();
    let session = register(&app, ALICE, "alice").await;

    let res = send(&app, get("/users/bob", Some(&session))).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/users/alice");
}

#[tokio::test]
async fn unknown_user_page_is_404_for_its_owner_session() {
    let (app, state) = test_app();
    let session = register(&app, ALICE, "alice").await;
    state.db.delete_user("alice").unwrap();

    // Session still names alice, but the row is gone.
    let res = send(&app, get("/users/alice", Some(&session))).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn register_while_logged_in_redirects() {
    let (app, state) = test_app();
    let session = register(&app, ALICE, "alice").await;

    let res = send(&app, form_post("/register", BOB, Some(&session))).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/users/alice");
    assert!(state.db.get_user("bob").unwrap().is_none());
}

#[tokio::test]
async fn register_rejects_21_char_username() {
    let (app, state) = test_app();
    let long = "a".repeat(21);
    let body = format!("username={long}&password=pw&email=x%40y.com&first_name=X&last_name=Y");

    let res = send(&app, form_post("/register", &body, None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let html = body_text(res).await;
    assert!(html.contains("Username exceeds 20 character limit"));
    assert!(state.db.get_user(&long).unwrap().is_none());
}

#[tokio::test]
async fn register_rejects_control_characters_in_username() {
    let (app, state) = test_app();

    // %0A is a newline, which would otherwise poison the redirect
    // Location header for every later visit to the user's page.
    let body = "username=a%0Ab&password=pw&email=x%40y.com&first_name=X&last_name=Y";
    let res = send(&app, form_post("/register", body, None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let html = body_text(res).await;
    assert!(html.contains("Username contains invalid characters"));
    assert!(state.db.get_user("a\nb").unwrap().is_none());
}

#[tokio::test]
async fn gate_redirect_preserves_pending_flash() {
    let (app, _) = test_app();
    register(&app, ALICE, "alice").await;

    // Queue a notice, then trip the login gate with it still pending.
    let res = send(&app, form_post("/login", "username=alice&password=wrong", None)).await;
    let flash = cookie_named(&res, "feedback_flash").unwrap();

    let res = send(&app, get("/users/alice", Some(&flash))).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login");
    let flash = cookie_named(&res, "feedback_flash").unwrap();

    // Both messages survive to the next rendered page.
    let res = send(&app, get("/login", Some(&flash))).await;
    let body = body_text(res).await;
    assert!(body.contains("Incorrect username or password"));
    assert!(body.contains("Please login first"));
}

#[tokio::test]
async fn register_reports_duplicate_username_as_field_error() {
    let (app, _) = test_app();
    register(&app, ALICE, "alice").await;

    let dup = "username=alice&password=pw&email=other%40x.com&first_name=X&last_name=Y";
    let res = send(&app, form_post("/register", dup, None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let html = body_text(res).await;
    assert!(html.contains("Username already taken"));
}

#[tokio::test]
async fn logout_clears_the_session_cookie() {
    let (app, _) = test_app();
    let session = register(&app, ALICE, "alice").await;

    let res = send(&app, form_post("/logout", "", Some(&session))).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");
    assert!(cookie_cleared(&res, "feedback_session"));
}

#[tokio::test]
async fn feedback_add_update_delete_flow() {
    let (app, state) = test_app();
    let session = register(&app, ALICE, "alice").await;

    // Add
    let res = send(
        &app,
        form_post("/users/alice/feedback/add", "title=hello&content=world", Some(&session)),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/users/alice");

    let rows = state.db.feedback_for_user("alice").unwrap();
    assert_eq!(rows.len(), 1);
    let id = rows[0].id;

    // Edit form is pre-populated
    let res = send(&app, get(&format!("/feedback/{id}/update"), Some(&session))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let html = body_text(res).await;
    assert!(html.contains("value=\"hello\""));
    assert!(html.contains("world</textarea>"));

    // Update
    let res = send(
        &app,
        form_post(&format!("/feedback/{id}/update"), "title=edited&content=new", Some(&session)),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/users/alice");
    let row = state.db.get_feedback(id).unwrap().unwrap();
    assert_eq!(row.title, "edited");
    assert_eq!(row.content, "new");

    // Delete
    let res = send(&app, form_post(&format!("/feedback/{id}/delete"), "", Some(&session))).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/users/alice");
    assert!(state.db.get_feedback(id).unwrap().is_none());
}

#[tokio::test]
async fn feedback_validation_failure_rerenders_without_writing() {
    let (app, state) = test_app();
    let session = register(&app, ALICE, "alice").await;

    let res = send(
        &app,
        form_post("/users/alice/feedback/add", "title=hello&content=", Some(&session)),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let html = body_text(res).await;
    assert!(html.contains("Please add content to your feedback"));
    assert!(state.db.feedback_for_user("alice").unwrap().is_empty());
}

#[tokio::test]
async fn unknown_feedback_id_is_404_even_when_logged_out() {
    let (app, _) = test_app();

    // The row lookup runs before the session check.
    let res = send(&app, get("/feedback/999/update", None)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = send(&app, form_post("/feedback/999/delete", "", None)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_owner_cannot_touch_feedback() {
    let (app, state) = test_app();
    register(&app, ALICE, "alice").await;
    let id = state.db.create_feedback("hello", "world", "alice").unwrap();

    let bob = register(&app, BOB, "bob").await;

    // Update denied, row unchanged.
    let res = send(
        &app,
        form_post(&format!("/feedback/{id}/update"), "title=hax&content=hax", Some(&bob)),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/users/bob");
    assert_eq!(state.db.get_feedback(id).unwrap().unwrap().title, "hello");

    // Delete denied, row survives.
    let res = send(&app, form_post(&format!("/feedback/{id}/delete"), "", Some(&bob))).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/users/bob");
    assert!(state.db.get_feedback(id).unwrap().is_some());
}

#[tokio::test]
async fn cannot_add_feedback_for_another_user() {
    let (app, state) = test_app();
    register(&app, ALICE, "alice").await;
    let bob = register(&app, BOB, "bob").await;

    let res = send(
        &app,
        form_post("/users/alice/feedback/add", "title=hax&content=hax", Some(&bob)),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/users/bob");
    assert!(state.db.feedback_for_user("alice").unwrap().is_empty());
}

#[tokio::test]
async fn deleting_a_user_cascades_to_their_feedback() {
    let (app, state) = test_app();
    let session = register(&app, ALICE, "alice").await;
    let id = state.db.create_feedback("hello", "world", "alice").unwrap();

    let res = send(&app, form_post("/users/alice/delete", "", Some(&session))).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");
    assert!(cookie_cleared(&res, "feedback_session"));
    assert!(cookie_named(&res, "feedback_flash").is_some());

    assert!(state.db.get_user("alice").unwrap().is_none());
    assert!(state.db.get_feedback(id).unwrap().is_none());
    assert!(state.db.feedback_for_user("alice").unwrap().is_empty());
}

#[tokio::test]
async fn delete_account_requires_the_owner() {
    let (app, state) = test_app();
    register(&app, ALICE, "alice").await;
    let bob = register(&app, BOB, "bob").await;

    // Logged out entirely.
    let res = send(&app, form_post("/users/alice/delete", "", None)).await;
    assert_eq!(location(&res), "/login");
    assert!(state.db.get_user("alice").unwrap().is_some());

    // Logged in as someone else.
    let res = send(&app, form_post("/users/alice/delete", "", Some(&bob))).await;
    assert_eq!(location(&res), "/users/bob");
    assert!(state.db.get_user("alice").unwrap().is_some());
}
