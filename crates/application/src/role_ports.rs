use std::collections::BTreeSet;

use async_trait::async_trait;

use roleplayer_core::AppResult;
use roleplayer_domain::{AssigneeRef, NewRoleAssignment, Role, RoleAssignment, RoleId, RoleName};

/// Repository port for role definitions.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Returns true when a role with exactly this name exists.
    async fn role_exists(&self, name: &RoleName) -> AppResult<bool>;

    /// Finds a role by exact name.
    async fn find_role_by_name(&self, name: &RoleName) -> AppResult<Option<Role>>;

    /// Creates a role, failing with a conflict when the name is taken.
    async fn create_role(&self, name: RoleName) -> AppResult<Role>;

    /// Returns the existing role with this name or creates it.
    async fn ensure_role(&self, name: RoleName) -> AppResult<Role>;

    /// Lists all roles ordered by name.
    async fn list_roles(&self) -> AppResult<Vec<Role>>;

    /// Deletes a role together with every assignment referencing it.
    async fn delete_role(&self, name: &RoleName) -> AppResult<bool>;
}

/// Repository port for role assignments and membership queries.
#[async_trait]
pub trait RoleAssignmentRepository: Send + Sync {
    /// Persists a batch of assignments atomically.
    ///
    /// An already granted `(role, assignee)` pair fails the whole batch with
    /// `AppError::DuplicateAssignment`.
    async fn insert_assignments(
        &self,
        assignments: Vec<NewRoleAssignment>,
    ) -> AppResult<Vec<RoleAssignment>>;

    /// Removes the given roles from one assignee atomically.
    async fn delete_assignments(
        &self,
        assignee: &AssigneeRef,
        role_ids: &[RoleId],
    ) -> AppResult<u64>;

    /// Removes every assignment owned by one assignee.
    async fn delete_all_assignments(&self, assignee: &AssigneeRef) -> AppResult<u64>;

    /// Existence check for one role name on one assignee.
    async fn assignee_has_role(&self, assignee: &AssigneeRef, name: &RoleName)
    -> AppResult<bool>;

    /// Lists roles held by one assignee ordered by name.
    async fn list_roles_for_assignee(&self, assignee: &AssigneeRef) -> AppResult<Vec<Role>>;

    /// Lists every assignment of one role across all assignee types.
    ///
    /// Assignments are ordered by assignee type, then assignee identifier.
    /// An unknown role yields an empty list.
    async fn list_assignments_for_role(&self, name: &RoleName) -> AppResult<Vec<RoleAssignment>>;

    /// Returns distinct assignees matching a membership query.
    async fn find_assignees(&self, query: &RoleMembershipQuery) -> AppResult<Vec<AssigneeRef>>;
}

/// How requested role names are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleMatch {
    /// Assignee holds at least one of the names.
    Any,
    /// Assignee holds every one of the names.
    All,
}

/// Role membership filter over one assignee type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMembershipQuery {
    /// Assignee type the query is scoped to.
    pub assignee_type: String,
    /// Requested role names, de-duplicated.
    pub role_names: BTreeSet<RoleName>,
    /// Set semantics applied to `role_names`.
    pub mode: RoleMatch,
    /// Maximum rows returned.
    pub limit: Option<usize>,
    /// Number of rows skipped for offset pagination.
    pub offset: usize,
}

impl RoleMembershipQuery {
    /// Creates an unpaginated query.
    #[must_use]
    pub fn new(
        assignee_type: impl Into<String>,
        role_names: BTreeSet<RoleName>,
        mode: RoleMatch,
    ) -> Self {
        Self {
            assignee_type: assignee_type.into(),
            role_names,
            mode,
            limit: None,
            offset: 0,
        }
    }

    /// Returns true when an assignee holding `held` satisfies the filter.
    #[must_use]
    pub fn matches<'a>(&self, held: impl IntoIterator<Item = &'a RoleName>) -> bool {
        let matched = held
            .into_iter()
            .filter(|name| self.role_names.contains(*name))
            .collect::<BTreeSet<_>>()
            .len();

        match self.mode {
            RoleMatch::Any => matched > 0,
            RoleMatch::All => !self.role_names.is_empty() && matched == self.role_names.len(),
        }
    }
}
