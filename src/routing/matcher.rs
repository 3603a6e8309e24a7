//! Public-path classification.
//!
//! # Responsibilities
//! - Decide whether an inbound path is reachable without a session
//!
//! # Design Decisions
//! - The root path matches exactly (marketing page), every other pattern
//!   is a prefix (sign-in flows, static assets, the proxy mount)
//! - Path matching is case-sensitive
//! - No regex to guarantee O(n) matching

/// Static list of public-path patterns.
#[derive(Debug, Clone)]
pub struct PublicPaths {
    patterns: Vec<String>,
}

impl PublicPaths {
    pub fn new(patterns: impl IntoIterator<Item = String>) -> Self {
        Self {
            patterns: patterns.into_iter().collect(),
        }
    }

    /// Returns true if the path is reachable without a session.
    pub fn is_public(&self, path: &str) -> bool {
        self.patterns.iter().any(|pattern| {
            if pattern == "/" {
                path == "/"
            } else {
                path.starts_with(pattern.as_str())
            }
        })
    }
}
