use sqlx::{Postgres, QueryBuilder};

use roleplayer_application::{RoleMatch, RoleMembershipQuery};
use roleplayer_core::{AppError, AppResult};

/// Appends `<id_column> IN (<membership subquery>)` to a caller's query.
///
/// `id_column` is pushed verbatim and must be a plain, optionally qualified,
/// column identifier such as `accounts.id`.
pub fn push_role_membership_filter(
    builder: &mut QueryBuilder<'_, Postgres>,
    id_column: &str,
    query: &RoleMembershipQuery,
) -> AppResult<()> {
    validate_column_identifier(id_column)?;

    builder.push(id_column);
    builder.push(" IN (SELECT membership.assignee_id FROM (");
    push_membership_subquery(builder, query);
    builder.push(") AS membership)");

    Ok(())
}

/// Pushes a `SELECT assignee_type, assignee_id` grouped by assignee.
///
/// Grouping makes ANY matches distinct. ALL matches compare the distinct
/// matched role count against the de-duplicated request.
pub(crate) fn push_membership_subquery(
    builder: &mut QueryBuilder<'_, Postgres>,
    query: &RoleMembershipQuery,
) {
    let role_names = query
        .role_names
        .iter()
        .map(|name| name.as_str().to_owned())
        .collect::<Vec<_>>();
    let role_count = i64::try_from(role_names.len()).unwrap_or(i64::MAX);

    builder.push(
        "SELECT role_assignments.assignee_type, role_assignments.assignee_id \
         FROM role_assignments \
         INNER JOIN roles ON roles.id = role_assignments.role_id \
         WHERE role_assignments.assignee_type = ",
    );
    builder.push_bind(query.assignee_type.clone());
    builder.push(" AND roles.name = ANY(");
    builder.push_bind(role_names);
    builder.push(") GROUP BY role_assignments.assignee_type, role_assignments.assignee_id");

    if query.mode == RoleMatch::All {
        builder.push(" HAVING COUNT(DISTINCT roles.name) = ");
        builder.push_bind(role_count);
    }
}

fn validate_column_identifier(id_column: &str) -> AppResult<()> {
    let valid = !id_column.is_empty()
        && id_column.split('.').all(|part| {
            let mut chars = part.chars();
            chars
                .next()
                .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
                && chars.all(|character| character.is_ascii_alphanumeric() || character == '_')
        });

    if valid {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "invalid column identifier '{id_column}'"
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use sqlx::{Postgres, QueryBuilder};

    use roleplayer_application::{RoleMatch, RoleMembershipQuery};
    use roleplayer_domain::RoleName;

    use super::push_role_membership_filter;

    fn query(mode: RoleMatch) -> RoleMembershipQuery {
        let names = ["editor", "admin"]
            .iter()
            .filter_map(|name| RoleName::parse(name))
            .collect::<BTreeSet<_>>();
        RoleMembershipQuery::new("account", names, mode)
    }

    #[test]
    fn any_filter_groups_without_having() {
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT accounts.id FROM accounts WHERE ");
        let result =
            push_role_membership_filter(&mut builder, "accounts.id", &query(RoleMatch::Any));
        assert!(result.is_ok());

        let sql = builder.sql();
        assert!(sql.contains("accounts.id IN (SELECT membership.assignee_id"));
        assert!(sql.contains(
            "GROUP BY role_assignments.assignee_type, role_assignments.assignee_id"
        ));
        assert!(!sql.contains("HAVING"));
    }

    #[test]
    fn all_filter_compares_distinct_count() {
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT accounts.id FROM accounts WHERE ");
        let result =
            push_role_membership_filter(&mut builder, "accounts.id", &query(RoleMatch::All));
        assert!(result.is_ok());
        builder.push(" LIMIT 10");

        let sql = builder.sql();
        assert!(sql.contains("HAVING COUNT(DISTINCT roles.name) = $3"));
        assert!(sql.ends_with(") AS membership) LIMIT 10"));
    }

    #[test]
    fn rejects_unsafe_column_identifiers() {
        for column in ["", "accounts.id; DROP TABLE roles", "1id", "accounts..id"] {
            let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new("SELECT 1 WHERE ");
            assert!(
                push_role_membership_filter(&mut builder, column, &query(RoleMatch::Any)).is_err()
            );
        }
    }
}
