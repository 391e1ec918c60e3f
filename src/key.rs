//! Key sanitization.
//!
//! Caller-supplied keys become relative paths under the cache root, so they
//! are normalized before anything touches the filesystem:
//!
//! 1. `..`, `\` and NUL are removed.
//! 2. Anything outside `[A-Za-z0-9_-/|*]` becomes `_`.
//! 3. Runs of `/` collapse into one.
//! 4. A leading `/` is stripped.

use std::fmt;

use wildmatch::WildMatch;

use crate::error::{CacheError, CacheResult};

/// Wildcard accepted in clear patterns but not in entry keys.
pub const WILDCARD: char = '*';

/// A key that has passed sanitization and is safe to use as a relative path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SanitizedKey(String);

impl SanitizedKey {
    /// Sanitize a key used to address a single entry.
    ///
    /// Wildcards are rejected here; see [`SanitizedKey::pattern`].
    pub fn new(raw: &str) -> CacheResult<Self> {
        let key = Self::pattern(raw)?;
        if key.0.contains(WILDCARD) {
            return Err(CacheError::InvalidKey(raw.to_string()));
        }
        Ok(key)
    }

    /// Sanitize a clear pattern. Wildcards survive.
    pub fn pattern(raw: &str) -> CacheResult<Self> {
        let cleaned = sanitize(raw);
        if cleaned.is_empty() || cleaned.ends_with('/') {
            return Err(CacheError::InvalidKey(raw.to_string()));
        }
        Ok(Self(cleaned))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `/`-separated segments of the key.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    pub fn has_wildcard(&self) -> bool {
        self.0.contains(WILDCARD)
    }

    /// Glob-match a stored key against this pattern.
    ///
    /// `*` never crosses a `/`: both sides must have the same number of
    /// segments and each segment is matched on its own.
    pub fn matches(&self, key: &str) -> bool {
        let mut pattern = self.segments();
        let mut candidate = key.split('/');
        loop {
            match (pattern.next(), candidate.next()) {
                (None, None) => return true,
                (Some(p), Some(c)) => {
                    if !WildMatch::new(p).matches(c) {
                        return false;
                    }
                }
                _ => return false,
            }
        }
    }
}

impl fmt::Display for SanitizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SanitizedKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Apply the sanitization rules without validating the result.
pub fn sanitize(raw: &str) -> String {
    let stripped = raw.replace("..", "").replace(['\\', '\0'], "");

    let mut out = String::with_capacity(stripped.len());
    for c in stripped.chars() {
        let c = if is_allowed(c) { c } else { '_' };
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }

    match out.strip_prefix('/') {
        Some(rest) => rest.to_string(),
        None => out,
    }
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '/' | '|' | WILDCARD)
}
