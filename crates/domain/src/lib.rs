//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod assignee;
mod assignment;
mod role;

pub use assignee::{Assignee, AssigneeRef, AssigneeRegistry};
pub use assignment::{AssignmentId, NewRoleAssignment, RoleAssignment, RoleAssignmentDraft};
pub use role::{Role, RoleId, RoleName, RoleSymbol};
