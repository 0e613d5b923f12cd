use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::error::Error;

pub const MAX_SLUG_LENGTH: usize = 128;

/// Slug taken from the request path
#[derive(Debug, Deserialize, Validate)]
pub struct SlugParam {
    #[validate(
        length(min = 1, max = 128, message = "Slug must be between 1 and 128 characters"),
        custom(function = "validate_slug_chars")
    )]
    pub slug: String,
}

fn validate_slug_chars(slug: &str) -> Result<(), ValidationError> {
    if slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        Ok(())
    } else {
        Err(ValidationError::new("slug_chars")
            .with_message("Slug can only contain letters, digits and hyphens".into()))
    }
}

impl SlugParam {
    pub fn new(slug: impl Into<String>) -> Self {
        Self { slug: slug.into() }
    }

    /// Validate and hand back the slug
    pub fn into_valid(self) -> Result<String, Error> {
        if self.slug.is_empty() {
            return Err(Error::InvalidSlug("Slug cannot be empty".to_string()));
        }

        self.validate().map_err(|errors| {
            let message = errors
                .field_errors()
                .values()
                .flat_map(|errs| errs.iter())
                .find_map(|err| err.message.as_ref().map(|m| m.to_string()))
                .unwrap_or_else(|| "Invalid slug".to_string());
            Error::InvalidSlug(message)
        })?;

        Ok(self.slug)
    }
}

/// Validate a slug outside of request extraction
pub fn validate_slug(slug: &str) -> Result<(), Error> {
    SlugParam::new(slug).into_valid().map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_slugs() {
        for slug in ["animations", "hello-world", "css-grid-2024", "A1"] {
            assert!(validate_slug(slug).is_ok(), "{slug} should be valid");
        }
    }

    #[test]
    fn test_empty_slug() {
        let err = validate_slug("").unwrap_err();
        assert_eq!(err.public_message(), "Slug cannot be empty");
    }

    #[test]
    fn test_invalid_characters() {
        for slug in ["hello world", "../etc/passwd", "post_1", "caf\u{e9}", "<script>"] {
            assert!(
                matches!(validate_slug(slug), Err(Error::InvalidSlug(_))),
                "{slug} should be rejected"
            );
        }
    }

    #[test]
    fn test_too_long() {
        let slug = "a".repeat(MAX_SLUG_LENGTH + 1);
        let err = validate_slug(&slug).unwrap_err();
        assert_eq!(
            err.public_message(),
            "Slug must be between 1 and 128 characters"
        );
    }
}
