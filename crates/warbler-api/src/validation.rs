//! Request-body rules that sit in front of the store: required fields,
//! minimum password length, URL-shaped image links.

use url::Url;
use warbler_db::is_valid_email;
use warbler_db::models::MAX_MESSAGE_LEN;
use warbler_types::api::{EditProfileRequest, LoginRequest, NewMessageRequest, SignupRequest};

use crate::error::ApiError;

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn signup(req: &SignupRequest) -> Result<(), ApiError> {
    required("username", &req.username)?;
    email(&req.email)?;
    password(&req.password)
}

pub fn login(req: &LoginRequest) -> Result<(), ApiError> {
    required("username", &req.username)?;
    password(&req.password)
}

pub fn edit_profile(req: &EditProfileRequest) -> Result<(), ApiError> {
    required("username", &req.username)?;
    email(&req.email)?;
    optional_url("image_url", req.image_url.as_deref())?;
    optional_url("header_image_url", req.header_image_url.as_deref())?;
    password(&req.password)
}

pub fn message(req: &NewMessageRequest) -> Result<(), ApiError> {
    required("text", &req.text)?;
    if req.text.trim().chars().count() > MAX_MESSAGE_LEN {
        return Err(ApiError::field(
            "text",
            format!("text is limited to {MAX_MESSAGE_LEN} characters"),
        ));
    }
    Ok(())
}

fn required(field: &'static str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::field(field, format!("{field} is required")));
    }
    Ok(())
}

fn email(value: &str) -> Result<(), ApiError> {
    required("email", value)?;
    if !is_valid_email(value.trim()) {
        return Err(ApiError::field("email", "invalid email address"));
    }
    Ok(())
}

fn password(value: &str) -> Result<(), ApiError> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::field(
            "password",
            format!("password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    Ok(())
}

fn optional_url(field: &'static str, value: Option<&str>) -> Result<(), ApiError> {
    match value.map(str::trim) {
        None | Some("") => Ok(()),
        Some(url) if is_http_url(url) => Ok(()),
        Some(_) => Err(ApiError::field(field, "invalid URL")),
    }
}

fn is_http_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https")
                && parsed.host_str().is_some_and(|host| !host.is_empty())
        }
        Err(_) => false,
    }
}
