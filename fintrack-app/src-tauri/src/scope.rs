//! Per-user scoping of lock settings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scope used when nobody is signed in.
pub const GLOBAL_SCOPE: &str = "global";

/// Identity handed over by the authentication layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: Option<String>,
    pub email: Option<String>,
}

/// Partition key for persisted lock settings and runtime state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserScope(String);

impl UserScope {
    /// Scope from a raw key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The signed-out scope.
    pub fn global() -> Self {
        Self(GLOBAL_SCOPE.to_owned())
    }

    /// Derive the scope for a user: id, then email, then `"global"`.
    /// Blank values count as missing.
    pub fn from_identity(identity: Option<&UserIdentity>) -> Self {
        let non_blank = |v: &Option<String>| {
            v.as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(str::to_owned)
        };

        identity
            .and_then(|user| non_blank(&user.id).or_else(|| non_blank(&user.email)))
            .map(Self)
            .unwrap_or_else(Self::global)
    }

    /// Raw scope key.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key restricted to `[A-Za-z0-9._-]`; anything else becomes `_`.
    pub fn sanitized(&self) -> String {
        self.0
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl Default for UserScope {
    fn default() -> Self {
        Self::global()
    }
}

impl fmt::Display for UserScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sanitized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(id: Option<&str>, email: Option<&str>) -> UserIdentity {
        UserIdentity {
            id: id.map(Into::into),
            email: email.map(Into::into),
        }
    }

    #[test]
    fn test_scope_prefers_id() {
        let scope = UserScope::from_identity(Some(&identity(Some("42"), Some("a@b.c"))));
        assert_eq!(scope.as_str(), "42");
    }

    #[test]
    fn test_scope_falls_back_to_email() {
        let scope = UserScope::from_identity(Some(&identity(None, Some("a@b.c"))));
        assert_eq!(scope.as_str(), "a@b.c");

        let scope = UserScope::from_identity(Some(&identity(Some(""), Some("a@b.c"))));
        assert_eq!(scope.as_str(), "a@b.c");
    }

    #[test]
    fn test_scope_falls_back_to_global() {
        assert_eq!(UserScope::from_identity(None), UserScope::global());
        assert_eq!(
            UserScope::from_identity(Some(&identity(None, Some("  ")))),
            UserScope::global()
        );
    }

    #[test]
    fn test_sanitized_key() {
        assert_eq!(UserScope::new("jane.doe@example.com").sanitized(), "jane.doe_example.com");
        assert_eq!(UserScope::new("user-1_a.b").sanitized(), "user-1_a.b");
        assert_eq!(UserScope::new("a b/c:d").sanitized(), "a_b_c_d");
        assert_eq!(UserScope::new("zoë").sanitized(), "zo_");
    }

    #[test]
    fn test_display_uses_sanitized_form() {
        assert_eq!(UserScope::new("a@b").to_string(), "a_b");
    }
}
