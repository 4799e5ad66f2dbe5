use sqlx::{Postgres, QueryBuilder};

use crate::role_scope_sql::push_membership_subquery;

use super::*;

impl PostgresRoleRepository {
    pub(super) async fn insert_assignments_impl(
        &self,
        assignments: Vec<NewRoleAssignment>,
    ) -> AppResult<Vec<RoleAssignment>> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        let mut inserted = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            let row = sqlx::query_as::<_, InsertedAssignmentRow>(
                r#"
                INSERT INTO role_assignments (role_id, assignee_id, assignee_type)
                VALUES ($1, $2, $3)
                RETURNING id, created_at
                "#,
            )
            .bind(assignment.role_id().as_uuid())
            .bind(assignment.assignee().assignee_id())
            .bind(assignment.assignee().assignee_type())
            .fetch_one(&mut *transaction)
            .await
            .map_err(|error| map_assignment_conflict(error, &assignment))?;

            inserted.push(to_assignment(row, assignment));
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(inserted)
    }

    pub(super) async fn delete_assignments_impl(
        &self,
        assignee: &AssigneeRef,
        role_ids: &[RoleId],
    ) -> AppResult<u64> {
        let role_ids = role_ids.iter().map(RoleId::as_uuid).collect::<Vec<_>>();

        let result = sqlx::query(
            r#"
            DELETE FROM role_assignments
            WHERE assignee_type = $1
                AND assignee_id = $2
                AND role_id = ANY($3)
            "#,
        )
        .bind(assignee.assignee_type())
        .bind(assignee.assignee_id())
        .bind(role_ids)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to remove role assignments: {error}"))
        })?;

        Ok(result.rows_affected())
    }

    pub(super) async fn delete_all_assignments_impl(
        &self,
        assignee: &AssigneeRef,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM role_assignments
            WHERE assignee_type = $1
                AND assignee_id = $2
            "#,
        )
        .bind(assignee.assignee_type())
        .bind(assignee.assignee_id())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to clear role assignments: {error}"))
        })?;

        Ok(result.rows_affected())
    }

    pub(super) async fn assignee_has_role_impl(
        &self,
        assignee: &AssigneeRef,
        name: &RoleName,
    ) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM role_assignments
                INNER JOIN roles
                    ON roles.id = role_assignments.role_id
                WHERE role_assignments.assignee_type = $1
                    AND role_assignments.assignee_id = $2
                    AND roles.name = $3
            )
            "#,
        )
        .bind(assignee.assignee_type())
        .bind(assignee.assignee_id())
        .bind(name.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to check role assignment: {error}")))
    }

    pub(super) async fn list_roles_for_assignee_impl(
        &self,
        assignee: &AssigneeRef,
    ) -> AppResult<Vec<Role>> {
        sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT roles.id, roles.name
            FROM role_assignments
            INNER JOIN roles
                ON roles.id = role_assignments.role_id
            WHERE role_assignments.assignee_type = $1
                AND role_assignments.assignee_id = $2
            ORDER BY roles.name
            "#,
        )
        .bind(assignee.assignee_type())
        .bind(assignee.assignee_id())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list assignee roles: {error}")))?
        .into_iter()
        .map(RoleRow::into_role)
        .collect()
    }

    pub(super) async fn list_assignments_for_role_impl(
        &self,
        name: &RoleName,
    ) -> AppResult<Vec<RoleAssignment>> {
        let rows = sqlx::query_as::<_, RoleAssignmentRow>(
            r#"
            SELECT
                role_assignments.id,
                role_assignments.role_id,
                role_assignments.assignee_type,
                role_assignments.assignee_id,
                role_assignments.created_at
            FROM role_assignments
            INNER JOIN roles
                ON roles.id = role_assignments.role_id
            WHERE roles.name = $1
            ORDER BY role_assignments.assignee_type COLLATE "C", role_assignments.assignee_id
            "#,
        )
        .bind(name.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list role assignments: {error}")))?;

        Ok(rows
            .into_iter()
            .map(RoleAssignmentRow::into_assignment)
            .collect())
    }

    pub(super) async fn find_assignees_impl(
        &self,
        query: &RoleMembershipQuery,
    ) -> AppResult<Vec<AssigneeRef>> {
        let limit = query
            .limit
            .map(i64::try_from)
            .transpose()
            .map_err(|error| AppError::Validation(format!("invalid role scope limit: {error}")))?;
        let offset = i64::try_from(query.offset).map_err(|error| {
            AppError::Validation(format!("invalid role scope offset: {error}"))
        })?;

        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new("");
        push_membership_subquery(&mut builder, query);
        builder.push(" ORDER BY role_assignments.assignee_id");
        if let Some(limit) = limit {
            builder.push(" LIMIT ");
            builder.push_bind(limit);
        }
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let rows = builder
            .build_query_as::<AssigneeRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to query role membership: {error}"))
            })?;

        Ok(rows
            .into_iter()
            .map(|row| AssigneeRef::new(row.assignee_type, row.assignee_id))
            .collect())
    }
}
