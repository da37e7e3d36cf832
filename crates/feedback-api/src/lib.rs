pub mod auth;
pub mod error;
pub mod feedback;
pub mod flash;
pub mod render;
pub mod session;
pub mod users;

pub use auth::{AppState, AppStateInner};
pub use error::AppError;
