use crate::Database;
use crate::models::{FeedbackRow, UserRow};
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (username, password, email, first_name, last_name)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (username, password_hash, email, first_name, last_name),
            )?;
            Ok(())
        })
    }

    pub fn get_user(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, username))
    }

    /// Removes the user's feedback and then the user row, all in one
    /// transaction so a failure cannot leave either half behind.
    pub fn delete_user(&self, username: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM feedback WHERE username = ?1", [username])?;
            tx.execute("DELETE FROM users WHERE username = ?1", [username])?;
            tx.commit()?;
            Ok(())
        })
    }

    // -- Feedback --

    pub fn create_feedback(&self, title: &str, content: &str, username: &str) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO feedback (title, content, username) VALUES (?1, ?2, ?3)",
                (title, content, username),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_feedback(&self, id: i64) -> Result<Option<FeedbackRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, content, username, created_at FROM feedback WHERE id = ?1",
            )?;
            let row = stmt.query_row([id], feedback_from_row).optional()?;
            Ok(row)
        })
    }

    pub fn feedback_for_user(&self, username: &str) -> Result<Vec<FeedbackRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, content, username, created_at
                 FROM feedback
                 WHERE username = ?1
                 ORDER BY id",
            )?;

            let rows = stmt
                .query_map([username], feedback_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn update_feedback(&self, id: i64, title: &str, content: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE feedback SET title = ?1, content = ?2 WHERE id = ?3",
                (title, content, id),
            )?;
            Ok(())
        })
    }

    pub fn delete_feedback(&self, id: i64) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute("DELETE FROM feedback WHERE id = ?1", [id])?;
            Ok(())
        })
    }
}

fn query_user(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT username, password, email, first_name, last_name, created_at
         FROM users WHERE username = ?1",
    )?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                username: row.get(0)?,
                password: row.get(1)?,
                email: row.get(2)?,
                first_name: row.get(3)?,
                last_name: row.get(4)?,
                created_at: row.get(5)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn feedback_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<FeedbackRow, rusqlite::Error> {
    Ok(FeedbackRow {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        username: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
