use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use roleplayer_application::{RoleAssignmentRepository, RoleMembershipQuery, RoleRepository};
use roleplayer_core::{AppError, AppResult};
use roleplayer_domain::{
    AssigneeRef, AssignmentId, NewRoleAssignment, Role, RoleAssignment, RoleId, RoleName,
};


/// In-memory role repository implementation.
///
/// Roles and assignments share one lock so that batch writes and role
/// deletion are applied atomically.
#[derive(Debug, Default)]
pub struct InMemoryRoleRepository {
    state: RwLock<InMemoryRoleState>,
}

#[derive(Debug, Default)]
struct InMemoryRoleState {
    roles: BTreeMap<RoleName, Role>,
    assignments: Vec<RoleAssignment>,
}

impl InMemoryRoleState {
    fn role_names_by_id(&self) -> BTreeMap<RoleId, &RoleName> {
        self.roles
            .values()
            .map(|role| (role.id(), role.name()))
            .collect()
    }

    fn is_assigned(&self, role_id: RoleId, assignee: &AssigneeRef) -> bool {
        self.assignments
            .iter()
            .any(|assignment| assignment.role_id() == role_id && assignment.assignee() == assignee)
    }
}

impl InMemoryRoleRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn role_exists(&self, name: &RoleName) -> AppResult<bool> {
        Ok(self.state.read().await.roles.contains_key(name))
    }

    async fn find_role_by_name(&self, name: &RoleName) -> AppResult<Option<Role>> {
        Ok(self.state.read().await.roles.get(name).cloned())
    }

    async fn create_role(&self, name: RoleName) -> AppResult<Role> {
        let mut state = self.state.write().await;
        if state.roles.contains_key(&name) {
            return Err(AppError::Conflict(format!("role '{name}' already exists")));
        }

        let role = Role::new(RoleId::new(), name.clone());
        state.roles.insert(name, role.clone());
        Ok(role)
    }

    async fn ensure_role(&self, name: RoleName) -> AppResult<Role> {
        let mut state = self.state.write().await;
        Ok(state
            .roles
            .entry(name.clone())
            .or_insert_with(|| Role::new(RoleId::new(), name))
            .clone())
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        Ok(self.state.read().await.roles.values().cloned().collect())
    }

    async fn delete_role(&self, name: &RoleName) -> AppResult<bool> {
        let mut state = self.state.write().await;
        let Some(role) = state.roles.remove(name) else {
            return Ok(false);
        };

        state
            .assignments
            .retain(|assignment| assignment.role_id() != role.id());
        Ok(true)
    }
}

#[async_trait]
impl RoleAssignmentRepository for InMemoryRoleRepository {
    async fn insert_assignments(
        &self,
        assignments: Vec<NewRoleAssignment>,
    ) -> AppResult<Vec<RoleAssignment>> {
        let mut state = self.state.write().await;
        let known_roles = state
            .roles
            .values()
            .map(Role::id)
            .collect::<BTreeSet<_>>();

        let mut pending = BTreeSet::new();
        for assignment in &assignments {
            if !known_roles.contains(&assignment.role_id()) {
                return Err(AppError::NotFound(format!(
                    "role '{}' was not found",
                    assignment.role_id()
                )));
            }

            if state.is_assigned(assignment.role_id(), assignment.assignee())
                || !pending.insert((assignment.role_id(), assignment.assignee().clone()))
            {
                return Err(AppError::DuplicateAssignment(format!(
                    "role '{}' is already assigned to '{}'",
                    assignment.role_id(),
                    assignment.assignee()
                )));
            }
        }

        let inserted = assignments
            .into_iter()
            .map(|assignment| RoleAssignment::new(AssignmentId::new(), assignment, Utc::now()))
            .collect::<Vec<_>>();
        state.assignments.extend(inserted.iter().cloned());

        Ok(inserted)
    }

    async fn delete_assignments(
        &self,
        assignee: &AssigneeRef,
        role_ids: &[RoleId],
    ) -> AppResult<u64> {
        let mut state = self.state.write().await;
        let before = state.assignments.len();
        state.assignments.retain(|assignment| {
            !(assignment.assignee() == assignee && role_ids.contains(&assignment.role_id()))
        });

        Ok(u64::try_from(before - state.assignments.len()).unwrap_or(u64::MAX))
    }

    async fn delete_all_assignments(&self, assignee: &AssigneeRef) -> AppResult<u64> {
        let mut state = self.state.write().await;
        let before = state.assignments.len();
        state
            .assignments
            .retain(|assignment| assignment.assignee() != assignee);

        Ok(u64::try_from(before - state.assignments.len()).unwrap_or(u64::MAX))
    }

    async fn assignee_has_role(
        &self,
        assignee: &AssigneeRef,
        name: &RoleName,
    ) -> AppResult<bool> {
        let state = self.state.read().await;
        Ok(state
            .roles
            .get(name)
            .is_some_and(|role| state.is_assigned(role.id(), assignee)))
    }

    async fn list_roles_for_assignee(&self, assignee: &AssigneeRef) -> AppResult<Vec<Role>> {
        let state = self.state.read().await;
        let role_names = state.role_names_by_id();

        let mut roles: Vec<Role> = state
            .assignments
            .iter()
            .filter(|assignment| assignment.assignee() == assignee)
            .filter_map(|assignment| {
                role_names
                    .get(&assignment.role_id())
                    .map(|name| Role::new(assignment.role_id(), (*name).clone()))
            })
            .collect();
        roles.sort_by(|left, right| left.name().cmp(right.name()));

        Ok(roles)
    }

    async fn list_assignments_for_role(&self, name: &RoleName) -> AppResult<Vec<RoleAssignment>> {
        let state = self.state.read().await;
        let Some(role_id) = state.roles.get(name).map(Role::id) else {
            return Ok(Vec::new());
        };

        let mut assignments: Vec<RoleAssignment> = state
            .assignments
            .iter()
            .filter(|assignment| assignment.role_id() == role_id)
            .cloned()
            .collect();
        assignments.sort_by(|left, right| left.assignee().cmp(right.assignee()));

        Ok(assignments)
    }

    async fn find_assignees(&self, query: &RoleMembershipQuery) -> AppResult<Vec<AssigneeRef>> {
        let state = self.state.read().await;
        let role_names = state.role_names_by_id();

        let mut held: BTreeMap<&AssigneeRef, BTreeSet<&RoleName>> = BTreeMap::new();
        for assignment in &state.assignments {
            if assignment.assignee().assignee_type() != query.assignee_type {
                continue;
            }

            if let Some(name) = role_names.get(&assignment.role_id()) {
                held.entry(assignment.assignee()).or_default().insert(*name);
            }
        }

        let mut matched: Vec<AssigneeRef> = held
            .into_iter()
            .filter(|(_, names)| query.matches(names.iter().copied()))
            .map(|(assignee, _)| assignee.clone())
            .collect();
        matched.sort_by_key(AssigneeRef::assignee_id);

        Ok(matched
            .into_iter()
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .collect())
    }
}
