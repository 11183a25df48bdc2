use crate::server::response::{ApiError, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

const MAX_TITLE_LEN: usize = 255;
const MAX_TYPE_TAG_LEN: usize = 64;

/// Tag prefix reserved for built-in entities (sites, categories).
const RESERVED_TAG_PREFIX: &str = "core.";

pub fn validate_title(title: &str) -> Result<(), ApiError> {
    if title.trim().is_empty() {
        return Err(ApiError::bad_request("Title cannot be empty"));
    }
    if title.len() > MAX_TITLE_LEN {
        return Err(ApiError::bad_request(format!(
            "Title cannot exceed {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

fn is_valid_tag_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '_'
}

/// Content type tags look like `article` or `galleries.gallery`: lowercase
/// segments of letters, digits and underscores joined by periods.
pub fn validate_type_tag(tag: &str) -> Result<(), ApiError> {
    if tag.is_empty() {
        return Err(ApiError::bad_request("Content type cannot be empty"));
    }
    if tag.len() > MAX_TYPE_TAG_LEN {
        return Err(ApiError::bad_request(format!(
            "Content type cannot exceed {MAX_TYPE_TAG_LEN} characters"
        )));
    }
    if !tag.chars().all(is_valid_tag_char) {
        return Err(ApiError::bad_request(
            "Content type can only contain lowercase letters, digits, underscores, and periods",
        ));
    }
    if tag.starts_with('.') || tag.ends_with('.') {
        return Err(ApiError::bad_request(
            "Content type cannot start or end with a period",
        ));
    }
    if tag.starts_with(RESERVED_TAG_PREFIX) {
        return Err(ApiError::bad_request(
            "Content types under 'core.' are reserved",
        ));
    }
    Ok(())
}

pub fn validate_site_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::bad_request("Site name cannot be empty"));
    }
    if name.len() > MAX_TITLE_LEN {
        return Err(ApiError::bad_request(format!(
            "Site name cannot exceed {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

/// Clamps a client-supplied page size into a sane range.
#[must_use]
pub fn clamp_limit(limit: Option<i32>) -> i32 {
    limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}
