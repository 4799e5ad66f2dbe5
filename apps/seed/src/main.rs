//! Applies the role schema and seeds role definitions and grants.

#![forbid(unsafe_code)]

mod seed_config;

use std::sync::Arc;

use roleplayer_application::RoleRegistry;
use roleplayer_core::{AppError, AppResult};
use roleplayer_domain::{AssigneeRegistry, RoleAssignmentDraft};
use roleplayer_infrastructure::{MIGRATOR, PostgresRoleRepository};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::seed_config::{SeedConfig, SeedGrant, init_tracing};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = SeedConfig::load()?;
    let pool = connect_pool(&config).await?;

    MIGRATOR
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    let repository = Arc::new(PostgresRoleRepository::new(pool));
    let registry = RoleRegistry::new(repository.clone(), repository);

    let roles = registry.ensure_roles(&config.roles).await?;
    info!(role_count = roles.len(), "role definitions seeded");

    let mut assignee_registry = AssigneeRegistry::new();
    for assignee_type in &config.assignee_types {
        assignee_registry.register_type(assignee_type)?;
    }

    let mut granted = 0_usize;
    for grant in &config.grants {
        let draft = match grant_draft(&registry, grant).await {
            Ok(draft) => draft,
            Err(error) => {
                warn!(role_name = %grant.role_name, error = %error, "invalid seed grant");
                return Err(error);
            }
        };

        match registry.grant(draft, &assignee_registry).await {
            Ok(assignment) => {
                granted = granted.saturating_add(1);
                info!(
                    role_name = %grant.role_name,
                    assignee = %assignment.assignee(),
                    "role granted"
                );
            }
            Err(AppError::DuplicateAssignment(detail)) => {
                info!(role_name = %grant.role_name, %detail, "role already granted");
            }
            Err(error) => {
                warn!(role_name = %grant.role_name, error = %error, "invalid seed grant");
                return Err(error);
            }
        }
    }

    info!(
        grant_count = config.grants.len(),
        granted, "roleplayer seed finished"
    );
    Ok(())
}

async fn grant_draft(registry: &RoleRegistry, grant: &SeedGrant) -> AppResult<RoleAssignmentDraft> {
    let Some(role) = registry.find_by_name(grant.role_name.as_str()).await? else {
        return Err(AppError::Validation(format!(
            "unknown role '{}' in seed grant",
            grant.role_name
        )));
    };

    Ok(RoleAssignmentDraft {
        role_id: Some(role.id()),
        assignee_id: grant.assignee_id,
        assignee_type: grant.assignee_type.clone(),
    })
}

async fn connect_pool(config: &SeedConfig) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(config.database_url.as_str())
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use roleplayer_application::RoleRegistry;
    use roleplayer_core::AppError;
    use roleplayer_infrastructure::InMemoryRoleRepository;
    use uuid::Uuid;

    use super::grant_draft;
    use crate::seed_config::SeedGrant;

    async fn registry() -> RoleRegistry {
        let repository = Arc::new(InMemoryRoleRepository::new());
        let registry = RoleRegistry::new(repository.clone(), repository);
        assert!(registry.ensure_roles(["editor"]).await.is_ok());
        registry
    }

    #[tokio::test]
    async fn grant_draft_rejects_unknown_roles() {
        let registry = registry().await;
        let grant = SeedGrant {
            role_name: "ghost".to_owned(),
            assignee_type: Some("account".to_owned()),
            assignee_id: Some(Uuid::new_v4()),
        };

        let draft = grant_draft(&registry, &grant).await;
        assert!(matches!(
            draft,
            Err(AppError::Validation(message)) if message == "unknown role 'ghost' in seed grant"
        ));
    }

    #[tokio::test]
    async fn grant_draft_resolves_known_roles() {
        let registry = registry().await;
        let assignee_id = Uuid::new_v4();
        let grant = SeedGrant {
            role_name: "editor".to_owned(),
            assignee_type: Some("account".to_owned()),
            assignee_id: Some(assignee_id),
        };

        let draft = grant_draft(&registry, &grant)
            .await
            .unwrap_or_else(|_| unreachable!());
        assert!(draft.role_id.is_some());
        assert_eq!(draft.assignee_id, Some(assignee_id));
        assert_eq!(draft.assignee_type.as_deref(), Some("account"));
    }
}
