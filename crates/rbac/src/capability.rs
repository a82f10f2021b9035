//! Capability tokens and their matching rules.
//!
//! Capabilities are opaque permission strings with exactly three shapes
//! (stable wire/config format — role configuration files and every
//! authorization check depend on it):
//!
//! - `namespace:action` — a concrete grant (e.g. `app:login`)
//! - `namespace:*` — everything under a namespace (trailing-wildcard)
//! - `*` — the universal admin wildcard

use std::borrow::Cow;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Characters permitted inside a namespace or action segment.
fn is_segment_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')
}

/// Capability identifier.
///
/// A special wildcard capability `"*"` is used by admin roles to indicate
/// "allow all" without hardcoding domain capabilities into tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capability(Cow<'static, str>);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid capability format: '{0}' (expected 'namespace:action', 'namespace:*' or '*')")]
pub struct CapabilityFormatError(pub String);

impl Capability {
    /// Wrap a string that is already known to be well-formed (static config
    /// constants, values read back from a validated store).
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// The universal admin wildcard.
    pub fn wildcard() -> Self {
        Self(Cow::Borrowed("*"))
    }

    /// Parse and validate an untrusted capability string.
    pub fn parse(s: &str) -> Result<Self, CapabilityFormatError> {
        if Self::is_valid_format(s) {
            Ok(Self(Cow::Owned(s.to_string())))
        } else {
            Err(CapabilityFormatError(s.to_string()))
        }
    }

    /// Validate the three-shape capability grammar.
    ///
    /// Valid iff `s == "*"`, or `s` splits into exactly two non-empty
    /// segments on `:` where each segment is `[A-Za-z0-9_.-]+` and the
    /// second segment may instead be (or end in) a bare `*`.
    pub fn is_valid_format(s: &str) -> bool {
        if s == "*" {
            return true;
        }

        let Some((namespace, action)) = s.split_once(':') else {
            return false;
        };
        // Exactly one ':' — a second one would land inside the action.
        if action.contains(':') {
            return false;
        }
        if namespace.is_empty() || !namespace.chars().all(is_segment_char) {
            return false;
        }

        match action.strip_suffix('*') {
            // "namespace:*" or "namespace:prefix*"
            Some(prefix) => prefix.chars().all(is_segment_char),
            None => !action.is_empty() && action.chars().all(is_segment_char),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The universal `*` wildcard.
    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }

    /// A trailing-wildcard grant such as `app:*` (not the universal `*`).
    pub fn is_prefix_wildcard(&self) -> bool {
        !self.is_wildcard() && self.as_str().ends_with('*')
    }

    /// Whether this *held* capability satisfies `required`.
    ///
    /// - `*` satisfies everything
    /// - exact string match
    /// - `app:*` satisfies `app:login` (prefix match with the `*` stripped)
    pub fn grants(&self, required: &Capability) -> bool {
        if self.is_wildcard() {
            return true;
        }
        if self == required {
            return true;
        }
        if let Some(prefix) = self.as_str().strip_suffix('*') {
            return required.as_str().starts_with(prefix);
        }
        false
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Capability {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

/// Check whether an effective capability set includes a required capability.
///
/// Called on every authorization check: total, side-effect-free, and
/// O(|effective|).
pub fn has_capability(effective: &HashSet<Capability>, required: &Capability) -> bool {
    effective.iter().any(|held| held.grants(required))
}
