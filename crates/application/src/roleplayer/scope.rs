use std::sync::Arc;

use roleplayer_core::AppResult;
use roleplayer_domain::AssigneeRef;

use crate::{RoleAssignmentRepository, RoleMembershipQuery};

/// Chainable role membership scope returned by `with_any_roles` and
/// `with_all_roles`.
#[derive(Clone)]
pub struct RoleScope {
    repository: Arc<dyn RoleAssignmentRepository>,
    query: RoleMembershipQuery,
}

impl RoleScope {
    pub(super) fn new(
        repository: Arc<dyn RoleAssignmentRepository>,
        query: RoleMembershipQuery,
    ) -> Self {
        Self { repository, query }
    }

    /// Caps the number of returned assignees.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    /// Skips the first `offset` assignees.
    #[must_use]
    pub fn offset(mut self, offset: usize) -> Self {
        self.query.offset = offset;
        self
    }

    /// Returns the membership query this scope runs.
    #[must_use]
    pub fn query(&self) -> &RoleMembershipQuery {
        &self.query
    }

    /// Runs the scope, returning distinct assignees ordered by identifier.
    pub async fn fetch(&self) -> AppResult<Vec<AssigneeRef>> {
        if self.query.role_names.is_empty() || self.query.limit == Some(0) {
            return Ok(Vec::new());
        }

        self.repository.find_assignees(&self.query).await
    }
}
