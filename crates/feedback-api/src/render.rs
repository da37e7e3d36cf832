//! Minimal inline HTML for the three form shapes and the user page. No
//! template engine; every dynamic value goes through [`escape`].

use feedback_db::models::{FeedbackRow, UserRow};
use feedback_types::forms::{FeedbackForm, FieldError, LoginForm, RegisterForm};

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

struct Field<'a> {
    name: &'static str,
    label: &'static str,
    // HTML input type, or "textarea"
    kind: &'static str,
    value: &'a str,
}

pub fn register_form(form: &RegisterForm, errors: &[FieldError], flash: &[String]) -> String {
    form_page(
        "Sign Up",
        "Register",
        "/register",
        &[
            Field { name: "username", label: "Username", kind: "text", value: &form.username },
            // Passwords are never echoed back into the form.
            Field { name: "password", label: "Password", kind: "password", value: "" },
            Field { name: "email", label: "Email", kind: "email", value: &form.email },
            Field { name: "first_name", label: "First Name", kind: "text", value: &form.first_name },
            Field { name: "last_name", label: "Last Name", kind: "text", value: &form.last_name },
        ],
        errors,
        flash,
    )
}

pub fn login_form(form: &LoginForm, errors: &[FieldError], flash: &[String]) -> String {
    form_page(
        "Login",
        "Login",
        "/login",
        &[
            Field { name: "username", label: "Username", kind: "text", value: &form.username },
            Field { name: "password", label: "Password", kind: "password", value: "" },
        ],
        errors,
        flash,
    )
}

pub fn feedback_form(
    title: &str,
    submit: &str,
    action: &str,
    form: &FeedbackForm,
    errors: &[FieldError],
    flash: &[String],
) -> String {
    form_page(
        title,
        submit,
        action,
        &[
            Field { name: "title", label: "Title", kind: "text", value: &form.title },
            Field { name: "content", label: "Content", kind: "textarea", value: &form.content },
        ],
        errors,
        flash,
    )
}

pub fn user_page(user: &UserRow, feedback: &[FeedbackRow], flash: &[String]) -> String {
    let username = escape(&user.username);
    let mut body = format!(
        "<p>{} {} &lt;{}&gt;</p>",
        escape(&user.first_name),
        escape(&user.last_name),
        escape(&user.email),
    );

    body.push_str("<h2>Feedback</h2><ul>");
    for item in feedback {
        body.push_str(&format!(
            "<li><strong>{title}</strong><p>{content}</p>\
             <a href=\"/feedback/{id}/update\">Edit</a>\
             <form method=\"post\" action=\"/feedback/{id}/delete\">\
             <button type=\"submit\">Delete</button></form></li>",
            title = escape(&item.title),
            content = escape(&item.content),
            id = item.id,
        ));
    }
    body.push_str("</ul>");

    body.push_str(&format!(
        "<a href=\"/users/{username}/feedback/add\">Add Feedback</a>\
         <form method=\"post\" action=\"/logout\"><button type=\"submit\">Log Out</button></form>\
         <form method=\"post\" action=\"/users/{username}/delete\">\
         <button type=\"submit\">Delete Account</button></form>",
    ));

    page(&user.username, flash, &body)
}

pub fn not_found() -> String {
    page("Not Found", &[], "<p>The page you requested does not exist.</p>")
}

fn form_page(
    title: &str,
    submit: &str,
    action: &str,
    fields: &[Field<'_>],
    errors: &[FieldError],
    flash: &[String],
) -> String {
    let mut body = format!("<form method=\"post\" action=\"{}\">", escape(action));

    for field in fields {
        body.push_str(&format!(
            "<p><label for=\"{name}\">{label}</label>",
            name = field.name,
            label = field.label,
        ));
        if field.kind == "textarea" {
            body.push_str(&format!(
                "<textarea id=\"{name}\" name=\"{name}\">{value}</textarea>",
                name = field.name,
                value = escape(field.value),
            ));
        } else {
            body.push_str(&format!(
                "<input id=\"{name}\" name=\"{name}\" type=\"{kind}\" value=\"{value}\">",
                name = field.name,
                kind = field.kind,
                value = escape(field.value),
            ));
        }
        for err in errors.iter().filter(|e| e.field == field.name) {
            body.push_str(&format!(
                "<span class=\"error\">{}</span>",
                escape(&err.message)
            ));
        }
        body.push_str("</p>");
    }

    body.push_str(&format!("<button type=\"submit\">{submit}</button></form>"));
    page(title, flash, &body)
}

fn page(title: &str, flash: &[String], body: &str) -> String {
    let title = escape(title);
    let notices = if flash.is_empty() {
        String::new()
    } else {
        let items: String = flash
            .iter()
            .map(|m| format!("<li>{}</li>", escape(m)))
            .collect();
        format!("<ul class=\"flash\">{items}</ul>")
    };

    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\">\
         <title>{title}</title></head>\
         <body>{notices}<h1>{title}</h1>{body}</body></html>"
    )
}
