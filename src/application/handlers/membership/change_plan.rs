//! ChangePlanHandler - Command handler for mid-term plan switches.

use std::sync::Arc;

use crate::domain::foundation::{MembershipId, PlanId, Timestamp};
use crate::domain::membership::{EffectiveStatus, Membership, MembershipError};
use crate::domain::plan::{quota, PlanCatalog, QuotaCheck};
use crate::ports::MembershipStore;

/// Command to move a membership to a different plan tier, keeping the term.
#[derive(Debug, Clone)]
pub struct ChangePlanCommand {
    pub membership_id: MembershipId,
    pub new_plan_id: PlanId,
}

/// Result of a successful plan change.
#[derive(Debug, Clone)]
pub struct ChangePlanResult {
    pub membership: Membership,
}

/// Handler for plan changes.
///
/// A downgrade is validated against the pet count: no pet may be stranded
/// over the new ceiling. The final count check happens inside the store's
/// update transaction, so a pet registered between our read and the write
/// still fails the change instead of slipping over quota.
pub struct ChangePlanHandler {
    store: Arc<dyn MembershipStore>,
    catalog: PlanCatalog,
}

impl ChangePlanHandler {
    pub fn new(store: Arc<dyn MembershipStore>, catalog: PlanCatalog) -> Self {
        Self { store, catalog }
    }

    pub async fn handle(&self, cmd: ChangePlanCommand) -> Result<ChangePlanResult, MembershipError> {
        match self.attempt(&cmd).await {
            Err(e) if e.is_retryable() => {
                tracing::warn!(membership_id = %cmd.membership_id, "plan change hit a write conflict, retrying once");
                self.attempt(&cmd).await
            }
            other => other,
        }
    }

    async fn attempt(&self, cmd: &ChangePlanCommand) -> Result<ChangePlanResult, MembershipError> {
        let mut membership = self
            .store
            .find_membership(&cmd.membership_id)
            .await?
            .ok_or(MembershipError::NotFound(cmd.membership_id))?;
        let plan = self
            .catalog
            .get(&cmd.new_plan_id)
            .map_err(|_| MembershipError::unknown_plan(cmd.new_plan_id.clone()))?;
        let now = Timestamp::now();

        // Only an effectively active membership may change plan, even to its
        // own tier; lapsed rows go through renew/reactivate instead
        if membership.effective_status(now) != EffectiveStatus::Active {
            return Err(MembershipError::invalid_state(format!(
                "Cannot change plan on membership {} while {}",
                membership.id,
                membership.effective_status(now)
            )));
        }

        // Same tier: nothing to change
        if membership.plan_id == cmd.new_plan_id {
            return Ok(ChangePlanResult { membership });
        }

        // Downgrades must not strand pets over the new ceiling
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
        membership.change_plan(plan, now)?;
        self.store
            .update_membership(&membership, expected_version, pet_ceiling)
            .await?;

        tracing::info!(
            membership_id = %membership.id,
            plan_id = %membership.plan_id,
            "changed membership plan"
        );
        Ok(ChangePlanResult { membership })
    }
}
