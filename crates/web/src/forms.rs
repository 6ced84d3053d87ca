//! Submitted form bodies.

use axum::extract::Multipart;
use serde::Deserialize;
use yatube_common::{AppError, AppResult};
use yatube_core::{ImageUpload, PostInput};

/// Read a multipart post form.
///
/// An empty file input (no file chosen) yields no image.
pub async fn read_post_form(mut multipart: Multipart) -> AppResult<PostInput> {
    let mut input = PostInput::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("text") => {
                input.text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            Some("group") => {
                let group = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                input.group = Some(group);
            }
            Some("image") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                if !file_name.is_empty() || !data.is_empty() {
                    input.image = Some(ImageUpload {
                        file_name,
                        data: data.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(input)
}

/// Comment form.
#[derive(Debug, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

/// Login form.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

/// Sign-up form.
#[derive(Debug, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

/// `?next=` on the login page.
#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// `?page=` on listings. Kept as a string so malformed values fall back to
/// the first page instead of failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Accept only same-site paths as a post-login destination.
#[must_use]
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
}
