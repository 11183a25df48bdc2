use crate::error::{Error, Result};

pub const MAX_SLUG_LEN: usize = 255;

/// Validates a caller-supplied slug: lowercase ASCII alphanumerics and
/// hyphens, no leading/trailing hyphen, at most 255 characters.
pub fn validate_slug(slug: &str) -> Result<()> {
    if slug.is_empty() {
        return Err(Error::BadRequest("Slug cannot be empty".to_string()));
    }

    if slug.len() > MAX_SLUG_LEN {
        return Err(Error::BadRequest(format!(
            "Slug cannot exceed {MAX_SLUG_LEN} characters"
        )));
    }

    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(Error::BadRequest(
            "Slug can only contain lowercase letters, digits, and hyphens".to_string(),
        ));
    }

    if slug.starts_with('-') || slug.ends_with('-') {
        return Err(Error::BadRequest(
            "Slug cannot start or end with a hyphen".to_string(),
        ));
    }

    Ok(())
}

/// Derives a slug from free-form text, e.g. a title.
pub fn derive_slug(text: &str) -> Result<String> {
    let derived = slug::slugify(text);
    if derived.is_empty() {
        return Err(Error::BadRequest(
            "Cannot derive a slug from the given text".to_string(),
        ));
    }
    Ok(derived)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_slug_accepts_plain_slugs() {
        assert!(validate_slug("sports").is_ok());
        assert!(validate_slug("big-match-2024").is_ok());
        assert!(validate_slug("a").is_ok());
    }

    #[test]
    fn test_validate_slug_rejects_bad_input() {
        assert!(validate_slug("").is_err());
        assert!(validate_slug("Sports").is_err());
        assert!(validate_slug("big match").is_err());
        assert!(validate_slug("-leading").is_err());
        assert!(validate_slug("trailing-").is_err());
        assert!(validate_slug(&"x".repeat(256)).is_err());
    }

    #[test]
    fn test_derive_slug() {
        assert_eq!(derive_slug("Big Match!").unwrap(), "big-match");
        assert_eq!(derive_slug("  Fußball  ").unwrap(), "fussball");
        assert!(derive_slug("!!!").is_err());
    }
}
