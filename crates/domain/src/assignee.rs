use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use roleplayer_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Entity type that can hold roles.
///
/// The type tag is stored next to the identifier in `role_assignments`, so it
/// must stay stable once rows exist.
pub trait Assignee {
    /// Stable type discriminator persisted as `assignee_type`.
    const ASSIGNEE_TYPE: &'static str;

    /// Returns the identity of this instance.
    fn assignee_id(&self) -> Uuid;

    /// Returns the polymorphic owner reference for this instance.
    fn assignee_ref(&self) -> AssigneeRef {
        AssigneeRef::of::<Self>(self.assignee_id())
    }
}

/// Polymorphic owner of a role assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssigneeRef {
    assignee_type: String,
    assignee_id: Uuid,
}

impl AssigneeRef {
    /// Creates a reference from stored values without checking the type.
    ///
    /// Untrusted input should go through [`AssigneeRegistry::resolve`].
    #[must_use]
    pub fn new(assignee_type: impl Into<String>, assignee_id: Uuid) -> Self {
        Self {
            assignee_type: assignee_type.into(),
            assignee_id,
        }
    }

    /// Creates a reference for a statically known assignee type.
    #[must_use]
    pub fn of<E: Assignee + ?Sized>(assignee_id: Uuid) -> Self {
        Self::new(E::ASSIGNEE_TYPE, assignee_id)
    }

    /// Returns the assignee type discriminator.
    #[must_use]
    pub fn assignee_type(&self) -> &str {
        self.assignee_type.as_str()
    }

    /// Returns the assignee identifier.
    #[must_use]
    pub fn assignee_id(&self) -> Uuid {
        self.assignee_id
    }

    /// Returns true when the reference points at an instance of `E`.
    #[must_use]
    pub fn is<E: Assignee + ?Sized>(&self) -> bool {
        self.assignee_type == E::ASSIGNEE_TYPE
    }
}

impl Display for AssigneeRef {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}:{}", self.assignee_type, self.assignee_id)
    }
}

/// Closed set of assignee types accepted from untyped input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssigneeRegistry {
    known_types: BTreeSet<String>,
}

impl AssigneeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity type to the registry.
    #[must_use]
    pub fn register<E: Assignee>(mut self) -> Self {
        self.known_types.insert(E::ASSIGNEE_TYPE.to_owned());
        self
    }

    /// Adds a type discriminator that has no Rust type in this process.
    pub fn register_type(&mut self, assignee_type: &str) -> AppResult<()> {
        let assignee_type = assignee_type.trim();
        if assignee_type.is_empty() {
            return Err(AppError::Validation(
                "assignee type must not be empty".to_owned(),
            ));
        }

        self.known_types.insert(assignee_type.to_owned());
        Ok(())
    }

    /// Returns true when the discriminator is registered.
    #[must_use]
    pub fn contains(&self, assignee_type: &str) -> bool {
        self.known_types.contains(assignee_type)
    }

    /// Builds a reference after checking the discriminator against the registry.
    pub fn resolve(&self, assignee_type: &str, assignee_id: Uuid) -> AppResult<AssigneeRef> {
        if !self.contains(assignee_type) {
            return Err(AppError::Validation(format!(
                "unknown assignee type '{assignee_type}'"
            )));
        }

        Ok(AssigneeRef::new(assignee_type, assignee_id))
    }
}

#[cfg(test)]
mod tests {
    use roleplayer_core::AppError;
    use uuid::Uuid;

    use super::{Assignee, AssigneeRef, AssigneeRegistry};

    struct Account {
        id: Uuid,
    }

    impl Assignee for Account {
        const ASSIGNEE_TYPE: &'static str = "account";

        fn assignee_id(&self) -> Uuid {
            self.id
        }
    }

    struct Team;

    impl Assignee for Team {
        const ASSIGNEE_TYPE: &'static str = "team";

        fn assignee_id(&self) -> Uuid {
            Uuid::nil()
        }
    }

    #[test]
    fn assignee_ref_carries_static_type() {
        let account = Account { id: Uuid::new_v4() };
        let reference = account.assignee_ref();

        assert_eq!(reference.assignee_type(), "account");
        assert_eq!(reference.assignee_id(), account.id);
        assert!(reference.is::<Account>());
        assert!(!reference.is::<Team>());
    }

    #[test]
    fn same_id_with_different_type_is_a_different_owner() {
        let id = Uuid::new_v4();
        assert_ne!(AssigneeRef::of::<Account>(id), AssigneeRef::of::<Team>(id));
        assert_eq!(Team.assignee_ref().to_string(), format!("team:{}", Uuid::nil()));
    }

    #[test]
    fn registry_rejects_unknown_types() {
        let registry = AssigneeRegistry::new().register::<Account>();

        assert!(registry.resolve("account", Uuid::new_v4()).is_ok());
        assert!(matches!(
            registry.resolve("team", Uuid::new_v4()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn registry_accepts_runtime_types() {
        let mut registry = AssigneeRegistry::new();
        assert!(registry.register_type("  ").is_err());
        assert!(registry.register_type("service_account").is_ok());
        assert!(registry.contains("service_account"));
    }
}
