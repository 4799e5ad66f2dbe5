use std::env;

use roleplayer_core::{AppError, AppResult};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// One `role=assignee_type:assignee_id` entry from `ROLEPLAYER_SEED_GRANTS`.
///
/// Parts are kept optional so that the assignment validation can report
/// everything that is missing at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedGrant {
    pub role_name: String,
    pub assignee_type: Option<String>,
    pub assignee_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct SeedConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub roles: Vec<String>,
    pub assignee_types: Vec<String>,
    pub grants: Vec<SeedGrant>,
}

impl SeedConfig {
    pub fn load() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let database_url = lookup("DATABASE_URL")
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| AppError::Validation("DATABASE_URL is required".to_owned()))?;

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(value) => value.parse::<u32>().map_err(|error| {
                AppError::Validation(format!(
                    "invalid DATABASE_MAX_CONNECTIONS value '{value}': {error}"
                ))
            })?,
            None => 5,
        };

        let roles = split_list(lookup("ROLEPLAYER_SEED_ROLES").as_deref());
        let assignee_types = split_list(lookup("ROLEPLAYER_ASSIGNEE_TYPES").as_deref());
        let grants = split_list(lookup("ROLEPLAYER_SEED_GRANTS").as_deref())
            .iter()
            .map(|entry| parse_grant(entry))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self {
            database_url,
            max_connections,
            roles,
            assignee_types,
            grants,
        })
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_owned)
        .collect()
}

fn parse_grant(entry: &str) -> AppResult<SeedGrant> {
    let (role_name, assignee) = entry.split_once('=').unwrap_or((entry, ""));
    let (assignee_type, assignee_id) = assignee.split_once(':').unwrap_or((assignee, ""));

    let assignee_id = Some(assignee_id.trim())
        .filter(|value| !value.is_empty())
        .map(|value| {
            Uuid::parse_str(value).map_err(|error| {
                AppError::Validation(format!("invalid assignee id in grant '{entry}': {error}"))
            })
        })
        .transpose()?;

    Ok(SeedGrant {
        role_name: role_name.trim().to_owned(),
        assignee_type: Some(assignee_type.trim())
            .filter(|value| !value.is_empty())
            .map(str::to_owned),
        assignee_id,
    })
}
