use std::sync::Arc;

use tracing::{debug, info};

use roleplayer_core::{AppError, AppResult};
use roleplayer_domain::{AssigneeRegistry, Role, RoleAssignment, RoleAssignmentDraft, RoleName};

use crate::{RoleAssignmentRepository, RoleRepository};

/// Application service validating and resolving role names.
#[derive(Clone)]
pub struct RoleRegistry {
    roles: Arc<dyn RoleRepository>,
    assignments: Arc<dyn RoleAssignmentRepository>,
}

impl RoleRegistry {
    /// Creates a registry from repository implementations.
    #[must_use]
    pub fn new(
        roles: Arc<dyn RoleRepository>,
        assignments: Arc<dyn RoleAssignmentRepository>,
    ) -> Self {
        Self { roles, assignments }
    }

    pub(crate) fn assignments(&self) -> Arc<dyn RoleAssignmentRepository> {
        Arc::clone(&self.assignments)
    }

    /// Returns true if a role with this exact name exists.
    ///
    /// Absent or blank names return false without touching the store.
    pub async fn exists<'a>(&self, name: impl Into<Option<&'a str>>) -> AppResult<bool> {
        let Some(name) = name.into().and_then(RoleName::parse) else {
            return Ok(false);
        };

        self.roles.role_exists(&name).await
    }

    /// Resolves a role by exact name.
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        let Some(name) = RoleName::parse(name) else {
            return Ok(None);
        };

        self.roles.find_role_by_name(&name).await
    }

    /// Creates a role definition.
    pub async fn create_role(&self, name: &str) -> AppResult<Role> {
        let role = self.roles.create_role(RoleName::new(name)?).await?;
        info!(role_id = %role.id(), role_name = %role.name(), "role created");
        Ok(role)
    }

    /// Creates every missing role in `names` and returns all of them.
    pub async fn ensure_roles<I, S>(&self, names: I) -> AppResult<Vec<Role>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut roles = Vec::new();
        for name in names {
            let Some(name) = RoleName::parse(name.as_ref()) else {
                debug!("skipping blank role name");
                continue;
            };
            roles.push(self.roles.ensure_role(name).await?);
        }

        Ok(roles)
    }

    /// Lists all role definitions ordered by name.
    pub async fn list_roles(&self) -> AppResult<Vec<Role>> {
        self.roles.list_roles().await
    }

    /// Deletes a role and every assignment referencing it.
    pub async fn delete_role(&self, name: &str) -> AppResult<bool> {
        let Some(name) = RoleName::parse(name) else {
            return Ok(false);
        };

        let deleted = self.roles.delete_role(&name).await?;
        if deleted {
            info!(role_name = %name, "role deleted");
        }
        Ok(deleted)
    }

    /// Lists every assignment of the named role across all assignee types.
    ///
    /// Blank names return an empty list without touching the store.
    pub async fn assignments_for(&self, name: &str) -> AppResult<Vec<RoleAssignment>> {
        let Some(name) = RoleName::parse(name) else {
            return Ok(Vec::new());
        };

        self.assignments.list_assignments_for_role(&name).await
    }

    /// Persists an untyped assignment after validating it.
    pub async fn grant(
        &self,
        draft: RoleAssignmentDraft,
        assignee_registry: &AssigneeRegistry,
    ) -> AppResult<RoleAssignment> {
        let assignment = draft.validate(assignee_registry)?;
        let mut stored = self.assignments.insert_assignments(vec![assignment]).await?;

        stored
            .pop()
            .ok_or_else(|| AppError::Internal("assignment insert returned no rows".to_owned()))
    }
}
