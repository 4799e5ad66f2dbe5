//! Application services and ports.

#![forbid(unsafe_code)]

mod role_ports;
mod role_registry;
mod roleplayer;

#[cfg(test)]
mod test_support;

pub use role_ports::{RoleAssignmentRepository, RoleMatch, RoleMembershipQuery, RoleRepository};
pub use role_registry::RoleRegistry;
pub use roleplayer::{RoleNames, RoleScope, Roleplayer, RoleplayerOptions};
