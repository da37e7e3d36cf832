//! Database row types — these map directly to SQLite rows.

#[derive(Debug, Clone)]
pub struct UserRow {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct FeedbackRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub username: String,
    pub created_at: String,
}
