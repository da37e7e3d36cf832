use serde::Deserialize;

/// One failed check, keyed by the form field it belongs to. Handlers render
/// these under the matching input when a form is re-displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.username.trim().is_empty() {
            errors.push(FieldError::new("username", "You must include a username"));
        } else if too_long(&self.username, 20) {
            errors.push(FieldError::new(
                "username",
                "Username exceeds 20 character limit",
            ));
        } else if self.username.chars().any(char::is_control) {
            // Usernames end up in redirect Location headers and URL paths.
            errors.push(FieldError::new(
                "username",
                "Username contains invalid characters",
            ));
        }

        if self.password.is_empty() {
            errors.push(FieldError::new("password", "You must include a password"));
        }

        if self.email.trim().is_empty() {
            errors.push(FieldError::new("email", "You must include an email"));
        } else if too_long(&self.email, 50) {
            errors.push(FieldError::new("email", "Email exceeds 50 character limit"));
        } else if !email_shaped(&self.email) {
            errors.push(FieldError::new("email", "Invalid email address"));
        }

        if self.first_name.trim().is_empty() {
            errors.push(FieldError::new("first_name", "Please input your first name"));
        } else if too_long(&self.first_name, 30) {
            errors.push(FieldError::new(
                "first_name",
                "Your first name exceeds the 30 character limit",
            ));
        }

        if self.last_name.trim().is_empty() {
            errors.push(FieldError::new("last_name", "Please input your last name"));
        } else if too_long(&self.last_name, 30) {
            errors.push(FieldError::new(
                "last_name",
                "Your last name exceeds the 30 character limit",
            ));
        }

        errors
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.username.trim().is_empty() {
            errors.push(FieldError::new("username", "You must include a username"));
        }
        if self.password.is_empty() {
            errors.push(FieldError::new("password", "You must include a password"));
        }

        errors
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedbackForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl FeedbackForm {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() {
            errors.push(FieldError::new("title", "You must include a title"));
        } else if too_long(&self.title, 100) {
            errors.push(FieldError::new(
                "title",
                "Title exceeds the 100 character limit",
            ));
        }

        if self.content.trim().is_empty() {
            errors.push(FieldError::new(
                "content",
                "Please add content to your feedback",
            ));
        }

        errors
    }
}

// Limits are in characters, not bytes.
fn too_long(value: &str, max: usize) -> bool {
    value.chars().count() > max
}

fn email_shaped(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
