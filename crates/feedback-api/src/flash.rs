//! One-shot notices carried in a cookie: queued on redirect, drained on the
//! next rendered page. The queue is a JSON array, base64-encoded so commas
//! and quotes survive the cookie header.

use axum::response::Redirect;
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::Cookie;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;

pub const FLASH_COOKIE: &str = "feedback_flash";

/// Queue a notice for the next rendered page.
pub fn push(jar: CookieJar, message: &str) -> CookieJar {
    let mut queue = peek(&jar);
    queue.push(message.to_string());
    let encoded = B64.encode(serde_json::to_vec(&queue).unwrap_or_default());
    jar.add(Cookie::build((FLASH_COOKIE, encoded)).path("/").build())
}

/// Drain the queue: the returned jar clears the cookie, the messages go to
/// the renderer.
pub fn take(jar: CookieJar) -> (CookieJar, Vec<String>) {
    let messages = peek(&jar);
    let jar = jar.remove(Cookie::build((FLASH_COOKIE, "")).path("/").build());
    (jar, messages)
}

pub fn redirect(jar: CookieJar, to: &str, message: &str) -> (CookieJar, Redirect) {
    (push(jar, message), Redirect::to(to))
}

fn peek(jar: &CookieJar) -> Vec<String> {
    jar.get(FLASH_COOKIE)
        .and_then(|cookie| B64.decode(cookie.value()).ok())
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_then_take() {
        let jar = push(CookieJar::new(), "Please login first");
        let (jar, messages) = take(jar);
        assert_eq!(messages, vec!["Please login first"]);

        // Drained: a second take sees nothing.
        let (_, messages) = take(jar);
        assert!(messages.is_empty());
    }

    #[test]
    fn messages_stack_in_order() {
        let jar = push(CookieJar::new(), "first");
        let jar = push(jar, "second");
        let (_, messages) = take(jar);
        assert_eq!(messages, vec!["first", "second"]);
    }

    #[test]
    fn punctuation_survives_the_cookie() {
        let text = "You do not have access to that user's page, sorry";
        let jar = push(CookieJar::new(), text);
        let (_, messages) = take(jar);
        assert_eq!(messages, vec![text]);
    }
}
