//! RevokePromoGrantHandler - Command handler for revoking a promo grant.

use std::sync::Arc;

use crate::domain::foundation::{GrantId, Timestamp};
use crate::domain::membership::{Membership, MembershipError};
use crate::ports::MembershipStore;

/// Command to revoke a promo grant and deactivate its membership.
#[derive(Debug, Clone)]
pub struct RevokePromoGrantCommand {
    pub grant_id: GrantId,
}

/// Result of a successful revocation.
#[derive(Debug, Clone)]
pub struct RevokePromoGrantResult {
    pub membership: Membership,
}

/// Handler for grant revocation.
///
/// Deletes the grant and deactivates the membership in one atomic write. The
/// membership row survives with its member number, so a later signup or
/// grant revives it. The member role is deliberately not revoked and no
/// notification is sent.
pub struct RevokePromoGrantHandler {
    store: Arc<dyn MembershipStore>,
}

impl RevokePromoGrantHandler {
    pub fn new(store: Arc<dyn MembershipStore>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        cmd: RevokePromoGrantCommand,
    ) -> Result<RevokePromoGrantResult, MembershipError> {
        match self.attempt(&cmd).await {
            Err(e) if e.is_retryable() => {
                tracing::warn!(grant_id = %cmd.grant_id, "revocation hit a write conflict, retrying once");
                self.attempt(&cmd).await
            }
            other => other,
        }
    }

    async fn attempt(
        &self,
        cmd: &RevokePromoGrantCommand,
    ) -> Result<RevokePromoGrantResult, MembershipError> {
        let grant = self
            .store
            .find_grant(&cmd.grant_id)
            .await?
            .ok_or(MembershipError::GrantNotFound(cmd.grant_id))?;
        let mut membership = self
            .store
            .find_membership(&grant.membership_id)
            .await?
            .ok_or_else(|| {
                MembershipError::infrastructure(format!(
                    "Grant {} references missing membership {}",
                    grant.id, grant.membership_id
                ))
            })?;
        let now = Timestamp::now();

        let expected_version = membership.version;
        membership.deactivate(now);
        self.store
            .revoke_grant(&membership, expected_version, &grant.id)
            .await?;

        tracing::info!(
            grant_id = %grant.id,
            membership_id = %membership.id,
            "revoked promo grant"
        );
        Ok(RevokePromoGrantResult { membership })
    }
}
