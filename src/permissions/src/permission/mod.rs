//! Dot-notation permission grammar
//!
//! Parsing, validation and wildcard matching for permission strings of the
//! form `module.action` or `app.module.action`, optionally ending in `.*`.
//!
//! # Examples
//!
//! ```
//! use tenantguard_permissions::permission::{matches_wildcard, parse};
//!
//! let parsed = parse("billing.invoices.create").unwrap();
//! assert_eq!(parsed.app.as_deref(), Some("billing"));
//! assert_eq!(parsed.module, "invoices");
//!
//! assert!(matches_wildcard("billing.invoices.create", "billing.*"));
//! assert!(!matches_wildcard("billing.invoices.create", "users.*"));
//! ```

mod parser;
mod types;


pub use parser::{expand, is_more_specific, matches_wildcard, normalize, parse, validate};
pub use types::ParsedPermission;

/// Wildcard marker accepted as the final segment
pub const WILDCARD: &str = "*";

/// Suffix a wildcard permission ends with
pub const WILDCARD_SUFFIX: &str = ".*";
