use tracing::info;

use super::*;

impl PostgresRoleRepository {
    pub(super) async fn role_exists_impl(&self, name: &RoleName) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM roles
                WHERE name = $1
            )
            "#,
        )
        .bind(name.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to check role existence: {error}")))
    }

    pub(super) async fn find_role_by_name_impl(&self, name: &RoleName) -> AppResult<Option<Role>> {
        sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name
            FROM roles
            WHERE name = $1
            LIMIT 1
            "#,
        )
        .bind(name.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve role: {error}")))?
        .map(RoleRow::into_role)
        .transpose()
    }

    pub(super) async fn create_role_impl(&self, name: RoleName) -> AppResult<Role> {
        let role_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO roles (name)
            VALUES ($1)
            RETURNING id
            "#,
        )
        .bind(name.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| map_role_conflict(error, &name))?;

        Ok(Role::new(RoleId::from_uuid(role_id), name))
    }

    pub(super) async fn ensure_role_impl(&self, name: RoleName) -> AppResult<Role> {
        let role_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO roles (name)
            VALUES ($1)
            ON CONFLICT (name) DO UPDATE
            SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(name.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to ensure role: {error}")))?;

        Ok(Role::new(RoleId::from_uuid(role_id), name))
    }

    pub(super) async fn list_roles_impl(&self) -> AppResult<Vec<Role>> {
        sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name
            FROM roles
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?
        .into_iter()
        .map(RoleRow::into_role)
        .collect()
    }

    pub(super) async fn delete_role_impl(&self, name: &RoleName) -> AppResult<bool> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        let Some(role_id) = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM roles
            WHERE name = $1
            FOR UPDATE
            "#,
        )
        .bind(name.as_str())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve role: {error}")))?
        else {
            return Ok(false);
        };

        let removed_assignments = sqlx::query(
            r#"
            DELETE FROM role_assignments
            WHERE role_id = $1
            "#,
        )
        .bind(role_id)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to remove role assignments: {error}"))
        })?
        .rows_affected();

        sqlx::query(
            r#"
            DELETE FROM roles
            WHERE id = $1
            "#,
        )
        .bind(role_id)
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete role: {error}")))?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        info!(
            role_name = %name,
            removed_assignments,
            "deleted role and dependent assignments"
        );
        Ok(true)
    }
}
