//! Address syntax validation for the corpus' header conventions.

use std::sync::LazyLock;

use regex::Regex;

use crate::pattern;

static ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$"));

/// Returns `true` when `address` matches the corpus address syntax.
#[must_use]
pub fn is_valid(address: &str) -> bool {
    ADDRESS.is_match(address)
}

/// Trims an extracted address and validates it.
///
/// Stray `:` characters around the address come from captures that
/// include a header-field delimiter. Returns `None` when the cleaned
/// value fails validation.
#[must_use]
pub fn clean(raw: &str) -> Option<String> {
    let cleaned = raw.trim().trim_matches(':').trim();
    is_valid(cleaned).then(|| cleaned.to_string())
}
