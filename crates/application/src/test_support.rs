use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use roleplayer_core::{AppError, AppResult};
use roleplayer_domain::{
    AssigneeRef, AssignmentId, NewRoleAssignment, Role, RoleAssignment, RoleId, RoleName,
};

use crate::{RoleAssignmentRepository, RoleMembershipQuery, RoleRepository};

#[derive(Default)]
pub(crate) struct FakeRoleStore {
    roles: Mutex<BTreeMap<RoleName, Role>>,
    assignments: Mutex<Vec<RoleAssignment>>,
    role_lookups: AtomicUsize,
}

impl FakeRoleStore {
    pub(crate) fn with_roles(names: &[&str]) -> Self {
        let roles = names
            .iter()
            .filter_map(|name| RoleName::parse(name))
            .map(|name| (name.clone(), Role::new(RoleId::new(), name)))
            .collect();

        Self {
            roles: Mutex::new(roles),
            ..Self::default()
        }
    }

    pub(crate) fn role_lookups(&self) -> usize {
        self.role_lookups.load(Ordering::SeqCst)
    }

    pub(crate) async fn assignment_count(&self) -> usize {
        self.assignments.lock().await.len()
    }

    async fn role_names_by_id(&self) -> BTreeMap<RoleId, RoleName> {
        self.roles
            .lock()
            .await
            .values()
            .map(|role| (role.id(), role.name().clone()))
            .collect()
    }
}

#[async_trait]
impl RoleRepository for FakeRoleStore {
    async fn role_exists(&self, name: &RoleName) -> AppResult<bool> {
        self.role_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.roles.lock().await.contains_key(name))
    }

    async fn find_role_by_name(&self, name: &RoleName) -> AppResult<Option<Role>> {
        self.role_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.roles.lock().await.get(name).cloned())
    }

    async fn create_role(&self, name: RoleName) -> AppResult<Role> {
        let mut roles = self.roles.lock().await;
        if roles.contains_key(&name) {
            return Err(AppError::Conflict(format!("role '{name}' already exists")));
        }

        let role = Role::new(RoleId::new(), name.clone());
        roles.insert(name, role.clone());
        Ok(role)
    }

    async fn ensure_role(&self, name: RoleName) -> AppResult<Role> {
        Ok(self
            .roles
            .lock()
            .await
            .entry(name.clone())
            .or_insert_with(|| Role::new(RoleId::new(), name))
            .clone())
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        Ok(self.roles.lock().await.values().cloned().collect())
    }

    async fn delete_role(&self, name: &RoleName) -> AppResult<bool> {
        let Some(role) = self.roles.lock().await.remove(name) else {
            return Ok(false);
        };

        self.assignments
            .lock()
            .await
            .retain(|assignment| assignment.role_id() != role.id());
        Ok(true)
    }
}

#[async_trait]
impl RoleAssignmentRepository for FakeRoleStore {
    async fn insert_assignments(
        &self,
        assignments: Vec<NewRoleAssignment>,
    ) -> AppResult<Vec<RoleAssignment>> {
        let mut stored = self.assignments.lock().await;
        let mut seen = stored
            .iter()
            .map(|assignment| (assignment.role_id(), assignment.assignee().clone()))
            .collect::<BTreeSet<_>>();

        for assignment in &assignments {
            if !seen.insert((assignment.role_id(), assignment.assignee().clone())) {
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
        stored.extend(inserted.iter().cloned());
        Ok(inserted)
    }

    async fn delete_assignments(
        &self,
        assignee: &AssigneeRef,
        role_ids: &[RoleId],
    ) -> AppResult<u64> {
        let mut stored = self.assignments.lock().await;
        let before = stored.len();
        stored.retain(|assignment| {
            !(assignment.assignee() == assignee && role_ids.contains(&assignment.role_id()))
        });
        Ok(u64::try_from(before - stored.len()).unwrap_or(u64::MAX))
    }

    async fn delete_all_assignments(&self, assignee: &AssigneeRef) -> AppResult<u64> {
        let mut stored = self.assignments.lock().await;
        let before = stored.len();
        stored.retain(|assignment| assignment.assignee() != assignee);
        Ok(u64::try_from(before - stored.len()).unwrap_or(u64::MAX))
    }

    async fn assignee_has_role(&self, assignee: &AssigneeRef, name: &RoleName) -> AppResult<bool> {
        let Some(role_id) = self.roles.lock().await.get(name).map(Role::id) else {
            return Ok(false);
        };

        Ok(self
            .assignments
            .lock()
            .await
            .iter()
            .any(|assignment| assignment.assignee() == assignee && assignment.role_id() == role_id))
    }

    async fn list_roles_for_assignee(&self, assignee: &AssigneeRef) -> AppResult<Vec<Role>> {
        let role_names = self.role_names_by_id().await;
        let mut roles = self
            .assignments
            .lock()
            .await
            .iter()
            .filter(|assignment| assignment.assignee() == assignee)
            .filter_map(|assignment| {
                role_names
                    .get(&assignment.role_id())
                    .map(|name| Role::new(assignment.role_id(), name.clone()))
            })
            .collect::<Vec<_>>();
        roles.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(roles)
    }

    async fn list_assignments_for_role(&self, name: &RoleName) -> AppResult<Vec<RoleAssignment>> {
        self.role_lookups.fetch_add(1, Ordering::SeqCst);
        let Some(role_id) = self.roles.lock().await.get(name).map(Role::id) else {
            return Ok(Vec::new());
        };

        let mut assignments = self
            .assignments
            .lock()
            .await
            .iter()
            .filter(|assignment| assignment.role_id() == role_id)
            .cloned()
            .collect::<Vec<_>>();
        assignments.sort_by(|left, right| left.assignee().cmp(right.assignee()));
        Ok(assignments)
    }

    async fn find_assignees(&self, query: &RoleMembershipQuery) -> AppResult<Vec<AssigneeRef>> {
        let role_names = self.role_names_by_id().await;
        let mut held: BTreeMap<AssigneeRef, BTreeSet<RoleName>> = BTreeMap::new();
        for assignment in self.assignments.lock().await.iter() {
            if assignment.assignee().assignee_type() != query.assignee_type {
                continue;
            }
            if let Some(name) = role_names.get(&assignment.role_id()) {
                held.entry(assignment.assignee().clone())
                    .or_default()
                    .insert(name.clone());
            }
        }

        let mut matched = held
            .into_iter()
            .filter(|(_, names)| query.matches(names))
            .map(|(assignee, _)| assignee)
            .collect::<Vec<_>>();
        matched.sort_by_key(AssigneeRef::assignee_id);

        Ok(matched
            .into_iter()
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .collect())
    }
}
