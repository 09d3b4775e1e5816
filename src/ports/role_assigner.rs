//! Role assigner port.
//!
//! Grants platform roles to owners. Like notifications, this collaborator is
//! best-effort: the membership write must not roll back because the role
//! system was down. Role revocation is deliberately absent; revoking a grant
//! does not strip the member role.

use crate::domain::foundation::{DomainError, OwnerId};
use async_trait::async_trait;

/// Platform roles the membership engine can assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Paid or granted member.
    Member,
}

impl Role {
    /// Returns the role slug used by the role system.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Port for idempotent role assignment.
#[async_trait]
pub trait RoleAssigner: Send + Sync {
    /// Ensure the owner holds the given role. Idempotent upsert: assigning a
    /// role the owner already has is a no-op, not an error.
    async fn ensure_role(&self, owner_id: &OwnerId, role: Role) -> Result<(), DomainError>;
}
