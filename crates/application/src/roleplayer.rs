use std::collections::BTreeSet;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use roleplayer_core::AppResult;
use roleplayer_domain::{Assignee, NewRoleAssignment, Role, RoleName, RoleSymbol};

use crate::{RoleAssignmentRepository, RoleMatch, RoleMembershipQuery, RoleRegistry};

mod names;
mod options;
mod scope;


pub use names::RoleNames;
pub use options::RoleplayerOptions;
pub use scope::RoleScope;

/// Role capability attached to one assignee type.
///
/// Instance operations take the entity by reference. Collection scopes are
/// restricted to rows whose `assignee_type` is `E::ASSIGNEE_TYPE`.
pub struct Roleplayer<E: Assignee> {
    registry: RoleRegistry,
    assignments: Arc<dyn RoleAssignmentRepository>,
    options: RoleplayerOptions,
    assignee: PhantomData<fn(&E)>,
}

impl<E: Assignee> Clone for Roleplayer<E> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            assignments: Arc::clone(&self.assignments),
            options: self.options.clone(),
            assignee: PhantomData,
        }
    }
}

impl<E: Assignee> Roleplayer<E> {
    /// Attaches the capability to `E`.
    ///
    /// Attaching again yields an equivalent, independent handle.
    #[must_use]
    pub fn attach(registry: &RoleRegistry, options: RoleplayerOptions) -> Self {
        let options = RoleplayerOptions::default().merge(options);
        debug!(
            assignee_type = E::ASSIGNEE_TYPE,
            option_count = options.len(),
            "roleplayer attached"
        );

        Self {
            registry: registry.clone(),
            assignments: registry.assignments(),
            options,
            assignee: PhantomData,
        }
    }

    /// Returns the options the capability was attached with.
    #[must_use]
    pub fn options(&self) -> &RoleplayerOptions {
        &self.options
    }

    /// Returns true if `entity` holds the named role.
    ///
    /// Absent or blank names return false without touching the store.
    pub async fn has_role<'a>(
        &self,
        entity: &E,
        role_name: impl Into<Option<&'a str>>,
    ) -> AppResult<bool> {
        let Some(role_name) = role_name.into().and_then(RoleName::parse) else {
            return Ok(false);
        };

        self.assignments
            .assignee_has_role(&entity.assignee_ref(), &role_name)
            .await
    }

    /// Returns the roles held by `entity` ordered by name.
    pub async fn roles(&self, entity: &E) -> AppResult<Vec<Role>> {
        self.assignments
            .list_roles_for_assignee(&entity.assignee_ref())
            .await
    }

    /// Returns the current role names of `entity` as tokens.
    pub async fn role_symbols(&self, entity: &E) -> AppResult<Vec<RoleSymbol>> {
        Ok(self
            .roles(entity)
            .await?
            .iter()
            .map(Role::symbol)
            .collect())
    }

    /// Grants every known role in `role_names` to `entity`.
    ///
    /// Unknown names are skipped. Granting a role the entity already holds
    /// fails the whole call with `AppError::DuplicateAssignment`.
    pub async fn add_roles<I, S>(&self, entity: &E, role_names: I) -> AppResult<Vec<RoleSymbol>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let assignee = entity.assignee_ref();
        let mut assignments = Vec::new();

        for role_name in role_names {
            let role_name = role_name.as_ref();
            match self.registry.find_by_name(role_name).await? {
                Some(role) => assignments.push(NewRoleAssignment::new(role.id(), assignee.clone())),
                None => debug!(
                    assignee = %assignee,
                    role_name,
                    "skipping unknown role"
                ),
            }
        }

        if !assignments.is_empty() {
            self.assignments.insert_assignments(assignments).await?;
        }

        self.role_symbols(entity).await
    }

    /// Removes every role in `role_names` that `entity` currently holds.
    pub async fn delete_roles<I, S>(
        &self,
        entity: &E,
        role_names: I,
    ) -> AppResult<Vec<RoleSymbol>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let assignee = entity.assignee_ref();
        let mut role_ids = Vec::new();

        for role_name in role_names {
            let role_name = role_name.as_ref();
            if !self.has_role(entity, role_name).await? {
                continue;
            }
            if let Some(role) = self.registry.find_by_name(role_name).await? {
                role_ids.push(role.id());
            }
        }

        if !role_ids.is_empty() {
            let removed = self
                .assignments
                .delete_assignments(&assignee, &role_ids)
                .await?;
            debug!(assignee = %assignee, removed, "roles removed");
        }

        self.role_symbols(entity).await
    }

    /// Removes every role from `entity`.
    pub async fn reset_roles(&self, entity: &E) -> AppResult<Vec<RoleSymbol>> {
        self.assignments
            .delete_all_assignments(&entity.assignee_ref())
            .await?;

        Ok(Vec::new())
    }

    /// Drops every assignment owned by `entity`.
    ///
    /// Call this when the entity itself is deleted.
    pub async fn destroy_assignee(&self, entity: &E) -> AppResult<u64> {
        let assignee = entity.assignee_ref();
        let removed = self.assignments.delete_all_assignments(&assignee).await?;
        debug!(assignee = %assignee, removed, "assignee assignments destroyed");
        Ok(removed)
    }

    /// Scope over entities holding at least one of `role_names`.
    #[must_use]
    pub fn with_any_roles<I, S>(&self, role_names: I) -> RoleScope
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.scope(role_names, RoleMatch::Any)
    }

    /// Scope over entities holding every one of `role_names`.
    #[must_use]
    pub fn with_all_roles<I, S>(&self, role_names: I) -> RoleScope
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.scope(role_names, RoleMatch::All)
    }

    fn scope<I, S>(&self, role_names: I, mode: RoleMatch) -> RoleScope
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let role_names = role_names
            .into_iter()
            .filter_map(|name| RoleName::parse(name.as_ref()))
            .collect::<BTreeSet<_>>();

        RoleScope::new(
            Arc::clone(&self.assignments),
            RoleMembershipQuery::new(E::ASSIGNEE_TYPE, role_names, mode),
        )
    }
}
