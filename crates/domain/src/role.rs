use std::fmt::{Display, Formatter};

use roleplayer_core::{AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a role record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleId(Uuid);

impl RoleId {
    /// Creates a new random role identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a role identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Role name used as the sole external identifier of a role.
///
/// Names are compared exactly. Surrounding whitespace is significant, only
/// blank names are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleName(NonEmptyString);

impl RoleName {
    /// Creates a validated role name.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        NonEmptyString::new(value).map(Self)
    }

    /// Parses a caller supplied name, treating blank input as absent.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::new(value).ok()
    }

    /// Returns the role name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Converts the name into its token form.
    #[must_use]
    pub fn to_symbol(&self) -> RoleSymbol {
        RoleSymbol(self.as_str().to_owned())
    }
}

impl Display for RoleName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl AsRef<str> for RoleName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Atomic role token handed to external policy checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSymbol(String);

impl RoleSymbol {
    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for RoleSymbol {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl AsRef<str> for RoleSymbol {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<&str> for RoleSymbol {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Named authorization tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    id: RoleId,
    name: RoleName,
}

impl Role {
    /// Creates a role from a stored identifier and name.
    #[must_use]
    pub fn new(id: RoleId, name: RoleName) -> Self {
        Self { id, name }
    }

    /// Returns the store-assigned identifier.
    #[must_use]
    pub fn id(&self) -> RoleId {
        self.id
    }

    /// Returns the role name.
    #[must_use]
    pub fn name(&self) -> &RoleName {
        &self.name
    }

    /// Returns the role name as a token.
    #[must_use]
    pub fn symbol(&self) -> RoleSymbol {
        self.name.to_symbol()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{Role, RoleId, RoleName};

    #[test]
    fn blank_role_name_is_treated_as_absent() {
        assert!(RoleName::parse("").is_none());
        assert!(RoleName::parse(" \t").is_none());
        assert!(RoleName::new("").is_err());
    }

    #[test]
    fn role_symbol_matches_name() {
        let role = Role::new(
            RoleId::new(),
            RoleName::new("editor").unwrap_or_else(|_| unreachable!()),
        );
        assert_eq!(role.symbol(), "editor");
        assert_eq!(role.symbol().to_string(), role.name().to_string());
    }

    proptest! {
        #[test]
        fn non_blank_names_are_kept_verbatim(value in "[a-z_]{1,16}( [a-z]{1,4})?") {
            let parsed = RoleName::parse(value.as_str());
            prop_assert!(parsed.is_some());
            let parsed = parsed.unwrap_or_else(|| unreachable!());
            prop_assert_eq!(parsed.as_str(), value.as_str());
        }
    }
}
