use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use roleplayer_application::{RoleAssignmentRepository, RoleMembershipQuery, RoleRepository};
use roleplayer_core::{AppError, AppResult};
use roleplayer_domain::{
    AssigneeRef, AssignmentId, NewRoleAssignment, Role, RoleAssignment, RoleId, RoleName,
};

mod assignments;
mod roles;


/// SQLSTATE raised by PostgreSQL for unique index violations.
const UNIQUE_VIOLATION: &str = "23505";

/// SQLSTATE raised by PostgreSQL when a foreign key target is missing.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// PostgreSQL-backed repository for roles and role assignments.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: Uuid,
    name: String,
}

impl RoleRow {
    fn into_role(self) -> AppResult<Role> {
        let name = RoleName::new(self.name.as_str()).map_err(|error| {
            AppError::Internal(format!("invalid stored role name for '{}': {error}", self.id))
        })?;

        Ok(Role::new(RoleId::from_uuid(self.id), name))
    }
}

#[derive(Debug, FromRow)]
struct InsertedAssignmentRow {
    id: Uuid,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct RoleAssignmentRow {
    id: Uuid,
    role_id: Uuid,
    assignee_type: String,
    assignee_id: Uuid,
    created_at: DateTime<Utc>,
}

impl RoleAssignmentRow {
    fn into_assignment(self) -> RoleAssignment {
        RoleAssignment::new(
            AssignmentId::from_uuid(self.id),
            NewRoleAssignment::new(
                RoleId::from_uuid(self.role_id),
                AssigneeRef::new(self.assignee_type, self.assignee_id),
            ),
            self.created_at,
        )
    }
}

#[derive(Debug, FromRow)]
struct AssigneeRow {
    assignee_type: String,
    assignee_id: Uuid,
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn role_exists(&self, name: &RoleName) -> AppResult<bool> {
        self.role_exists_impl(name).await
    }

    async fn find_role_by_name(&self, name: &RoleName) -> AppResult<Option<Role>> {
        self.find_role_by_name_impl(name).await
    }

    async fn create_role(&self, name: RoleName) -> AppResult<Role> {
        self.create_role_impl(name).await
    }

    async fn ensure_role(&self, name: RoleName) -> AppResult<Role> {
        self.ensure_role_impl(name).await
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        self.list_roles_impl().await
    }

    async fn delete_role(&self, name: &RoleName) -> AppResult<bool> {
        self.delete_role_impl(name).await
    }
}

#[async_trait]
impl RoleAssignmentRepository for PostgresRoleRepository {
    async fn insert_assignments(
        &self,
        assignments: Vec<NewRoleAssignment>,
    ) -> AppResult<Vec<RoleAssignment>> {
        self.insert_assignments_impl(assignments).await
    }

    async fn delete_assignments(
        &self,
        assignee: &AssigneeRef,
        role_ids: &[RoleId],
    ) -> AppResult<u64> {
        self.delete_assignments_impl(assignee, role_ids).await
    }

    async fn delete_all_assignments(&self, assignee: &AssigneeRef) -> AppResult<u64> {
        self.delete_all_assignments_impl(assignee).await
    }

    async fn assignee_has_role(
        &self,
        assignee: &AssigneeRef,
        name: &RoleName,
    ) -> AppResult<bool> {
        self.assignee_has_role_impl(assignee, name).await
    }

    async fn list_roles_for_assignee(&self, assignee: &AssigneeRef) -> AppResult<Vec<Role>> {
        self.list_roles_for_assignee_impl(assignee).await
    }

    async fn list_assignments_for_role(&self, name: &RoleName) -> AppResult<Vec<RoleAssignment>> {
        self.list_assignments_for_role_impl(name).await
    }

    async fn find_assignees(&self, query: &RoleMembershipQuery) -> AppResult<Vec<AssigneeRef>> {
        self.find_assignees_impl(query).await
    }
}

fn has_sqlstate(error: &sqlx::Error, sqlstate: &str) -> bool {
    matches!(
        error,
        sqlx::Error::Database(database_error)
            if database_error.code().as_deref() == Some(sqlstate)
    )
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    has_sqlstate(error, UNIQUE_VIOLATION)
}

fn map_role_conflict(error: sqlx::Error, role_name: &RoleName) -> AppError {
    if is_unique_violation(&error) {
        return AppError::Conflict(format!("role '{role_name}' already exists"));
    }

    AppError::Internal(format!("failed to create role: {error}"))
}

fn map_assignment_conflict(error: sqlx::Error, assignment: &NewRoleAssignment) -> AppError {
    if is_unique_violation(&error) {
        return AppError::DuplicateAssignment(format!(
            "role '{}' is already assigned to '{}'",
            assignment.role_id(),
            assignment.assignee()
        ));
    }

    if has_sqlstate(&error, FOREIGN_KEY_VIOLATION) {
        return AppError::NotFound(format!("role '{}' was not found", assignment.role_id()));
    }

    AppError::Internal(format!("failed to assign role: {error}"))
}

fn to_assignment(row: InsertedAssignmentRow, assignment: NewRoleAssignment) -> RoleAssignment {
    RoleAssignment::new(AssignmentId::from_uuid(row.id), assignment, row.created_at)
}
