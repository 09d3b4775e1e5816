//! ReactivateMembershipHandler - Command handler for resuming a lapsed membership.

use std::sync::Arc;

use crate::domain::foundation::{MembershipId, Timestamp};
use crate::domain::membership::{Membership, MembershipError};
use crate::ports::MembershipStore;

/// Command to resume a lapsed membership on its existing plan.
#[derive(Debug, Clone)]
pub struct ReactivateMembershipCommand {
    pub membership_id: MembershipId,
}

/// Result of a successful reactivation.
#[derive(Debug, Clone)]
pub struct ReactivateMembershipResult {
    pub membership: Membership,
}

/// Handler for reactivating a lapsed membership.
///
/// Only valid on a membership that is effectively expired but not revoked.
/// The plan and member number are untouched; the term restarts at one year
/// from now. A linked promo grant is moved in the same atomic write.
pub struct ReactivateMembershipHandler {
    store: Arc<dyn MembershipStore>,
}

impl ReactivateMembershipHandler {
    pub fn new(store: Arc<dyn MembershipStore>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        cmd: ReactivateMembershipCommand,
    ) -> Result<ReactivateMembershipResult, MembershipError> {
        match self.attempt(&cmd).await {
            Err(e) if e.is_retryable() => {
                tracing::warn!(membership_id = %cmd.membership_id, "reactivation hit a write conflict, retrying once");
                self.attempt(&cmd).await
            }
            other => other,
        }
    }

    async fn attempt(
        &self,
        cmd: &ReactivateMembershipCommand,
    ) -> Result<ReactivateMembershipResult, MembershipError> {
        let mut membership = self
            .store
            .find_membership(&cmd.membership_id)
            .await?
            .ok_or(MembershipError::NotFound(cmd.membership_id))?;
        let now = Timestamp::now();

        let expected_version = membership.version;
        membership.reactivate(now)?;

        match self.store.find_grant_by_membership(&membership.id).await? {
            Some(mut grant) => {
                grant.align_expiry(membership.expires_at);
                self.store
                    .update_membership_with_grant(&membership, expected_version, None, &grant)
                    .await?;
            }
            None => {
                self.store
                    .update_membership(&membership, expected_version, None)
                    .await?;
            }
        }

        tracing::info!(
            membership_id = %membership.id,
            expires_at = %membership.expires_at,
            "reactivated membership"
        );
        Ok(ReactivateMembershipResult { membership })
    }
}
