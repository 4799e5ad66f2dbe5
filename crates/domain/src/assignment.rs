use chrono::{DateTime, Utc};
use roleplayer_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AssigneeRef, AssigneeRegistry, RoleId};

/// Unique identifier for a role assignment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssignmentId(Uuid);

impl AssignmentId {
    /// Creates a new random assignment identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an assignment identifier from an existing UUID value.
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

impl Default for AssignmentId {
    fn default() -> Self {
        Self::new()
    }
}

/// Validated assignment ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NewRoleAssignment {
    role_id: RoleId,
    assignee: AssigneeRef,
}

impl NewRoleAssignment {
    /// Creates an assignment from typed parts.
    #[must_use]
    pub fn new(role_id: RoleId, assignee: AssigneeRef) -> Self {
        Self { role_id, assignee }
    }

    /// Returns the granted role.
    #[must_use]
    pub fn role_id(&self) -> RoleId {
        self.role_id
    }

    /// Returns the owner of the assignment.
    #[must_use]
    pub fn assignee(&self) -> &AssigneeRef {
        &self.assignee
    }
}

/// Untyped assignment input, e.g. parsed from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleAssignmentDraft {
    /// Granted role.
    pub role_id: Option<RoleId>,
    /// Owner identifier.
    pub assignee_id: Option<Uuid>,
    /// Owner type discriminator.
    pub assignee_type: Option<String>,
}

impl RoleAssignmentDraft {
    /// Checks required fields and the assignee type.
    ///
    /// Every missing field is reported in a single validation error.
    pub fn validate(self, registry: &AssigneeRegistry) -> AppResult<NewRoleAssignment> {
        let assignee_type = self
            .assignee_type
            .filter(|value| !value.trim().is_empty());

        let mut missing = Vec::new();
        if self.role_id.is_none() {
            missing.push("role_id");
        }
        if self.assignee_id.is_none() {
            missing.push("assignee_id");
        }
        if assignee_type.is_none() {
            missing.push("assignee_type");
        }

        match (self.role_id, self.assignee_id, assignee_type) {
            (Some(role_id), Some(assignee_id), Some(assignee_type)) => {
                let assignee = registry.resolve(assignee_type.trim(), assignee_id)?;
                Ok(NewRoleAssignment::new(role_id, assignee))
            }
            _ => Err(AppError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            ))),
        }
    }
}

/// Join record granting one role to one assignee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    id: AssignmentId,
    role_id: RoleId,
    assignee: AssigneeRef,
    created_at: DateTime<Utc>,
}

impl RoleAssignment {
    /// Creates an assignment from stored values.
    #[must_use]
    pub fn new(
        id: AssignmentId,
        assignment: NewRoleAssignment,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            role_id: assignment.role_id,
            assignee: assignment.assignee,
            created_at,
        }
    }

    /// Returns the store-assigned identifier.
    #[must_use]
    pub fn id(&self) -> AssignmentId {
        self.id
    }

    /// Returns the granted role.
    #[must_use]
    pub fn role_id(&self) -> RoleId {
        self.role_id
    }

    /// Returns the owner of the assignment.
    #[must_use]
    pub fn assignee(&self) -> &AssigneeRef {
        &self.assignee
    }

    /// Returns the grant timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use roleplayer_core::AppError;
    use uuid::Uuid;

    use super::RoleAssignmentDraft;
    use crate::{AssigneeRegistry, RoleId};

    fn registry() -> AssigneeRegistry {
        let mut registry = AssigneeRegistry::new();
        assert!(registry.register_type("account").is_ok());
        registry
    }

    #[test]
    fn draft_lists_every_missing_field() {
        let result = RoleAssignmentDraft::default().validate(&registry());

        match result {
            Err(AppError::Validation(message)) => assert_eq!(
                message,
                "missing required fields: role_id, assignee_id, assignee_type"
            ),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn blank_assignee_type_counts_as_missing() {
        let result = RoleAssignmentDraft {
            role_id: Some(RoleId::new()),
            assignee_id: Some(Uuid::new_v4()),
            assignee_type: Some("  ".to_owned()),
        }
        .validate(&registry());

        assert!(matches!(
            result,
            Err(AppError::Validation(message))
                if message == "missing required fields: assignee_type"
        ));
    }

    #[test]
    fn complete_draft_validates_against_registry() {
        let role_id = RoleId::new();
        let assignee_id = Uuid::new_v4();

        let valid = RoleAssignmentDraft {
            role_id: Some(role_id),
            assignee_id: Some(assignee_id),
            assignee_type: Some("account".to_owned()),
        }
        .validate(&registry());
        assert!(valid.is_ok());
        let valid = valid.unwrap_or_else(|_| unreachable!());
        assert_eq!(valid.role_id(), role_id);
        assert_eq!(valid.assignee().assignee_id(), assignee_id);

        let unknown = RoleAssignmentDraft {
            role_id: Some(role_id),
            assignee_id: Some(assignee_id),
            assignee_type: Some("invoice".to_owned()),
        }
        .validate(&registry());
        assert!(matches!(unknown, Err(AppError::Validation(_))));
    }
}
