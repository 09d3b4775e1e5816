//! RenewMembershipHandler - Command handler for yearly renewal.

use std::sync::Arc;

use crate::domain::foundation::{MembershipId, PlanId, Timestamp};
use crate::domain::membership::{Membership, MembershipError};
use crate::domain::plan::{quota, PlanCatalog, QuotaCheck};
use crate::ports::MembershipStore;

/// Command to renew a membership for another year.
///
/// `plan_id` may differ from the current plan; renewal is the natural moment
/// to switch tiers.
#[derive(Debug, Clone)]
pub struct RenewMembershipCommand {
    pub membership_id: MembershipId,
    pub plan_id: PlanId,
}

/// Result of a successful renewal.
#[derive(Debug, Clone)]
pub struct RenewMembershipResult {
    pub membership: Membership,
}

/// Handler for membership renewal.
///
/// The new term runs one year from the current expiry or from now, whichever
/// is later: renewing early keeps the remaining time, renewing after a lapse
/// never credits the gap. If the membership was issued by a promo grant, the
/// grant's expiry is moved in the same atomic write.
pub struct RenewMembershipHandler {
    store: Arc<dyn MembershipStore>,
    catalog: PlanCatalog,
}

impl RenewMembershipHandler {
    pub fn new(store: Arc<dyn MembershipStore>, catalog: PlanCatalog) -> Self {
        Self { store, catalog }
    }

    pub async fn handle(
        &self,
        cmd: RenewMembershipCommand,
    ) -> Result<RenewMembershipResult, MembershipError> {
        match self.attempt(&cmd).await {
            Err(e) if e.is_retryable() => {
                tracing::warn!(membership_id = %cmd.membership_id, "renewal hit a write conflict, retrying once");
                self.attempt(&cmd).await
            }
            other => other,
        }
    }

    async fn attempt(
        &self,
        cmd: &RenewMembershipCommand,
    ) -> Result<RenewMembershipResult, MembershipError> {
        let mut membership = self
            .store
            .find_membership(&cmd.membership_id)
            .await?
            .ok_or(MembershipError::NotFound(cmd.membership_id))?;
        let plan = self
            .catalog
            .get(&cmd.plan_id)
            .map_err(|_| MembershipError::unknown_plan(cmd.plan_id.clone()))?;
        let now = Timestamp::now();

        // Renewing onto a smaller plan is a downgrade like any other
        let pet_ceiling = if membership.shrinks_quota_to(plan) {
            let count = self.store.pet_count(&membership.id).await?;
            if let QuotaCheck::Exceeded { excess } = quota::validate_downgrade(count, plan) {
                return Err(MembershipError::quota_exceeded(excess, plan.max_pets));
            }
            Some(plan.max_pets)
        } else {
            None
        };

        let expected_version = membership.version;
        membership.renew(plan, now)?;

        // Grant-issued memberships keep the grant expiry in lockstep
        match self.store.find_grant_by_membership(&membership.id).await? {
            Some(mut grant) => {
                grant.align_expiry(membership.expires_at);
                self.store
                    .update_membership_with_grant(&membership, expected_version, pet_ceiling, &grant)
                    .await?;
            }
            None => {
                self.store
                    .update_membership(&membership, expected_version, pet_ceiling)
                    .await?;
            }
        }

        tracing::info!(
            membership_id = %membership.id,
            plan_id = %membership.plan_id,
            expires_at = %membership.expires_at,
            "renewed membership"
        );
        Ok(RenewMembershipResult { membership })
    }
}
