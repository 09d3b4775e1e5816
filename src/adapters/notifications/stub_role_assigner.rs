//! Log-backed role assigner.

use crate::domain::foundation::{DomainError, OwnerId};
use crate::ports::{Role, RoleAssigner};
use async_trait::async_trait;

/// Records role assignments as log events.
///
/// Stands in until the platform's identity service exposes a role API. The
/// assignment contract is idempotent, so replaying these logs against the
/// real system later is safe.
#[derive(Debug, Default, Clone)]
pub struct LoggingRoleAssigner;

impl LoggingRoleAssigner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RoleAssigner for LoggingRoleAssigner {
    async fn ensure_role(&self, owner_id: &OwnerId, role: Role) -> Result<(), DomainError> {
        tracing::info!(owner_id = %owner_id, role = %role, "role ensured");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ensure_role_is_infallible() {
        let assigner = LoggingRoleAssigner::new();
        let owner = OwnerId::new("owner-1").unwrap();
        assert!(assigner.ensure_role(&owner, Role::Member).await.is_ok());
    }
}
