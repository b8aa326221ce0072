//! URL handling module
//!
//! This module provides the crawler's URL model: parsing raw hrefs into
//! `(scheme, host, port, path)` tuples, registrable-domain extraction,
//! the in-domain check, and the file-extension filter applied before a
//! fetch is attempted.

mod domain;
mod target;

pub use domain::{in_domain, registrable_domain};
pub use target::Target;

/// Path extensions that are never fetched. The file extension is assumed
/// to be accurate; skipping here avoids requests the Accept header would
/// reject anyway.
const IGNORED_EXTENSIONS: &[&str] = &[
    ".dmg", ".gif", ".jpg", ".jpeg", ".pdf", ".png", ".json", ".mov", ".mp3", ".m4a", ".tar",
    ".tgz", ".xls", ".xlsx", ".zip", ".rar",
];

/// Returns true if the path ends with an ignored extension, or carries
/// one immediately before a query string. Matching is case-insensitive.
pub fn has_ignored_extension(path: &str) -> bool {
    let lower = path.to_lowercase();
    IGNORED_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(ext) || lower.contains(&format!("{}?", ext)))
}
