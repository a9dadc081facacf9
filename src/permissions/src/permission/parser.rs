//! Permission parsing, validation and matching
//!
//! Supported formats:
//! - `module.action` (e.g. `users.create`)
//! - `app.module.action` (e.g. `app.users.create`, `my.app.users.create`)
//! - wildcards as the last segment (e.g. `users.*`, `app.users.*`, `app.*`)

use std::sync::OnceLock;

use regex::Regex;

use super::types::ParsedPermission;
use super::{WILDCARD, WILDCARD_SUFFIX};
use crate::error::FormatError;

/// Every segment is `[a-z][a-z0-9-]*`, with an optional trailing `.*`
fn permission_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z][a-z0-9-]*(\.[a-z][a-z0-9-]*)*(\.\*)?$")
            .expect("permission pattern is a valid regex")
    })
}

/// Validates a permission string
///
/// Checks run in order: emptiness, segment count, consecutive dots,
/// wildcard placement, then the character set.
///
/// # Examples
///
/// ```
/// use tenantguard_permissions::permission::validate;
///
/// assert!(validate("users.*").is_ok());
/// assert!(validate("users..create").is_err());
/// assert!(validate("users*").is_err());
/// ```
pub fn validate(permission: &str) -> Result<(), FormatError> {
    if permission.trim().is_empty() {
        return Err(FormatError::Empty);
    }

    if permission.split('.').count() < 2 {
        return Err(FormatError::TooFewSegments(permission.to_string()));
    }

    if permission.contains("..") {
        return Err(FormatError::ConsecutiveDots(permission.to_string()));
    }

    if permission.contains(WILDCARD) {
        if !permission.ends_with(WILDCARD) || permission.matches(WILDCARD).count() > 1 {
            return Err(FormatError::MisplacedWildcard(permission.to_string()));
        }
        if !permission.ends_with(WILDCARD_SUFFIX) {
            return Err(FormatError::WildcardWithoutDot(permission.to_string()));
        }
    }

    if !permission_pattern().is_match(permission) {
        return Err(FormatError::InvalidCharacters(permission.to_string()));
    }

    Ok(())
}

/// Parses a permission string into its components
///
/// For two segments the first is the module and the second the action. For
/// three or more, the last is the action, the second-to-last the module and
/// the remaining leading segments form the app name.
pub fn parse(permission: &str) -> Result<ParsedPermission, FormatError> {
    validate(permission)?;

    let segments: Vec<&str> = permission.split('.').collect();
    let is_wildcard = permission.ends_with(WILDCARD_SUFFIX);

    let (app, module, action) = match segments.as_slice() {
        [module, action] => (None, *module, *action),
        [app @ .., module, action] => (Some(app.join(".")), *module, *action),
        // validate() guarantees at least two segments
        _ => return Err(FormatError::TooFewSegments(permission.to_string())),
    };

    Ok(ParsedPermission {
        full: permission.to_string(),
        app,
        module: module.to_string(),
        action: action.to_string(),
        is_wildcard,
        wildcard_prefix: permission
            .strip_suffix(WILDCARD_SUFFIX)
            .map(str::to_string),
    })
}

/// Checks whether `permission` falls under the wildcard `pattern`
///
/// `users.*` matches `users`, `users.create` and `users.roles.assign`, but
/// not `users-admin.create`. Patterns not ending in `.*` never match.
pub fn matches_wildcard(permission: &str, pattern: &str) -> bool {
    let Some(prefix) = pattern.strip_suffix(WILDCARD_SUFFIX) else {
        return false;
    };

    match permission.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('.'),
        None => false,
    }
}

/// Lowercases and trims a permission string
pub fn normalize(permission: &str) -> String {
    permission.to_lowercase().trim().to_string()
}

/// Expands a wildcard permission into concrete permissions
///
/// Non-wildcard input is returned unchanged as a single element. Order
/// follows `actions`.
pub fn expand<S: AsRef<str>>(wildcard_permission: &str, actions: &[S]) -> Vec<String> {
    match wildcard_permission.strip_suffix(WILDCARD_SUFFIX) {
        Some(prefix) => actions
            .iter()
            .map(|action| format!("{}.{}", prefix, action.as_ref()))
            .collect(),
        None => vec![wildcard_permission.to_string()],
    }
}

/// Whether permission `a` is more specific than `b`
///
/// Concrete permissions always beat wildcards; otherwise the one with more
/// segments wins. Only meant for display ordering.
pub fn is_more_specific(a: &str, b: &str) -> Result<bool, FormatError> {
    let a = parse(a)?;
    let b = parse(b)?;

    Ok(match (a.is_wildcard, b.is_wildcard) {
        (true, false) => false,
        (false, true) => true,
        _ => a.depth() > b.depth(),
    })
}
