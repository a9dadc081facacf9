//! Parsed permission type
//!
//! Holds the components of a validated dot-notation permission.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::parser;
use crate::error::FormatError;

/// A permission split into its components
///
/// - `users.create` → module `users`, action `create`
/// - `app.users.create` → app `app`, module `users`, action `create`
/// - `my.app.users.*` → app `my.app`, module `users`, action `*`, wildcard prefix `my.app.users`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedPermission {
    /// Original permission string
    pub full: String,
    /// Application name (all segments before the module)
    pub app: Option<String>,
    pub module: String,
    pub action: String,
    /// Whether the permission ends in `.*`
    pub is_wildcard: bool,
    /// The permission without its trailing `.*`
    pub wildcard_prefix: Option<String>,
}

impl ParsedPermission {
    /// Number of dot-separated segments
    pub fn depth(&self) -> usize {
        self.full.split('.').count()
    }

    /// Whether this permission grants `permission`
    ///
    /// Concrete permissions grant themselves only; wildcards grant their
    /// prefix and everything below it.
    pub fn grants(&self, permission: &str) -> bool {
        if self.is_wildcard {
            parser::matches_wildcard(permission, &self.full)
        } else {
            self.full == permission
        }
    }
}

impl FromStr for ParsedPermission {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parser::parse(s)
    }
}

impl fmt::Display for ParsedPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_and_display() {
        let parsed: ParsedPermission = "app.users.read".parse().unwrap();
        assert_eq!(parsed.to_string(), "app.users.read");
        assert_eq!(parsed.depth(), 3);
    }

    #[test]
    fn test_from_str_rejects_bad_input() {
        let result = "users".parse::<ParsedPermission>();
        assert!(matches!(result, Err(FormatError::TooFewSegments(_))));
    }

    #[test]
    fn test_grants() {
        let wildcard: ParsedPermission = "users.*".parse().unwrap();
        assert!(wildcard.grants("users.delete"));
        assert!(wildcard.grants("users"));
        assert!(!wildcard.grants("posts.delete"));

        let concrete: ParsedPermission = "users.read".parse().unwrap();
        assert!(concrete.grants("users.read"));
        assert!(!concrete.grants("users.write"));
    }
}
