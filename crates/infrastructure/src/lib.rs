//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_role_repository;
mod postgres_role_repository;
mod role_scope_sql;

pub use in_memory_role_repository::InMemoryRoleRepository;
pub use postgres_role_repository::PostgresRoleRepository;
pub use role_scope_sql::push_role_membership_filter;

/// Embedded schema migrations for the `roles` and `role_assignments` tables.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
