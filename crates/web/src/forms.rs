//! Submitted forms.

#![allow(missing_docs)]

use axum::extract::Multipart;
use bytes::Bytes;
use serde::Deserialize;
use yatube_common::{AppError, AppResult, FormErrors};

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
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

impl SignupForm {
    /// Checks that only need the form itself.
    #[must_use]
    pub fn check(&self) -> FormErrors {
        let mut errors = FormErrors::default();
        if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match.");
        }
        errors
    }
}

/// Comment form.
#[derive(Debug, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

/// `?page=` on listings. Kept as text so junk falls back to page 1.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// `?next=` on the login page.
#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// An uploaded image, not yet stored.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// The create/edit post form.
#[derive(Debug, Default)]
pub struct PostForm {
    pub text: String,
    /// Group ID; empty when no group was chosen.
    pub group: String,
    pub image: Option<ImageUpload>,
}

impl PostForm {
    /// Read the form from a multipart body.
    ///
    /// Image problems come back as field errors next to the parsed form;
    /// a malformed body is a bad request.
    pub async fn from_multipart(
        mut multipart: Multipart,
        max_image_bytes: usize,
    ) -> AppResult<(Self, FormErrors)> {
        let mut form = Self::default();
        let mut errors = FormErrors::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let name = field.name().unwrap_or("").to_string();

            match name.as_str() {
                "text" => {
                    form.text = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                }
                "group" => {
                    form.group = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                }
                "image" => {
                    let file_name = field.file_name().unwrap_or("").to_string();
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;

                    // Browsers send an empty part when no file was picked
                    if data.is_empty() && file_name.is_empty() {
                        continue;
                    }

                    let upload = ImageUpload {
                        file_name,
                        content_type,
                        data,
                    };
                    match check_image(&upload, max_image_bytes) {
                        Ok(()) => form.image = Some(upload),
                        Err(msg) => errors.add("image", msg),
                    }
                }
                _ => {}
            }
        }

        Ok((form, errors))
    }

    /// Group ID, if one was chosen.
    #[must_use]
    pub fn group_id(&self) -> Option<String> {
        let group = self.group.trim();
        (!group.is_empty()).then(|| group.to_string())
    }
}

fn check_image(upload: &ImageUpload, max_bytes: usize) -> Result<(), String> {
    if !upload.content_type.starts_with("image/") {
        return Err(
            "Upload a valid image. The file you uploaded was either not an image or a corrupted image."
                .to_string(),
        );
    }
    if upload.data.is_empty() {
        return Err("The submitted file is empty.".to_string());
    }
    if upload.data.len() > max_bytes {
        return Err(format!(
            "Ensure the image is at most {max_bytes} bytes (it is {}).",
            upload.data.len()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(content_type: &str, len: usize) -> ImageUpload {
        ImageUpload {
            file_name: "small.gif".to_string(),
            content_type: content_type.to_string(),
            data: Bytes::from(vec![0u8; len]),
        }
    }

    #[test]
    fn test_check_image() {
        assert!(check_image(&upload("image/gif", 10), 100).is_ok());
        assert!(check_image(&upload("text/plain", 10), 100).is_err());
        assert!(check_image(&upload("image/png", 0), 100).is_err());
        assert!(check_image(&upload("image/png", 101), 100).is_err());
    }

    #[test]
    fn test_signup_password_mismatch() {
        let form = SignupForm {
            username: "leo".to_string(),
            name: String::new(),
            password1: "correct-horse".to_string(),
            password2: "correct-house".to_string(),
        };
        assert_eq!(form.check().get("password2").len(), 1);
    }

    #[test]
    fn test_post_form_group_id() {
        let mut form = PostForm::default();
        assert_eq!(form.group_id(), None);
        form.group = " g1 ".to_string();
        assert_eq!(form.group_id(), Some("g1".to_string()));
    }
}
