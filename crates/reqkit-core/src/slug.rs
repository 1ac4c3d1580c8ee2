//! URL-safe slug normalization.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::error::ErrorStatus;

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug pattern"));

/// Slug normalization errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("empty string not permitted")]
    EmptyInput,

    #[error("after removing characters, slug is zero length")]
    ZeroLength,
}

impl ErrorStatus for SlugError {
    fn http_status_code(&self) -> u16 {
        400
    }
}

/// Converts free text into a URL-safe slug.
///
/// Lower-cases the input, collapses every run of characters outside
/// `[a-z0-9]` into a single hyphen, and trims leading/trailing hyphens.
/// The transform is ASCII-alphanumeric only: letters from other scripts are
/// not transliterated, they collapse into the surrounding hyphens.
pub fn slugify(input: &str) -> Result<String, SlugError> {
    if input.is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let lowered = input.to_lowercase();
    let slug = NON_ALPHANUMERIC.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');

    if slug.is_empty() {
        return Err(SlugError::ZeroLength);
    }

    Ok(slug.to_string())
}
