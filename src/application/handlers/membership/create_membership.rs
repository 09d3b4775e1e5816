//! CreateMembershipHandler - Command handler for paid membership signup.

use std::sync::Arc;

use crate::domain::foundation::{
    ErrorCode, MemberNumber, MembershipId, OwnerId, PlanId, Timestamp,
};
use crate::domain::membership::{EffectiveStatus, Membership, MembershipError};
use crate::domain::plan::{quota, PlanCatalog, QuotaCheck};
use crate::ports::MembershipStore;

/// Command to create (or resume) a membership for an owner.
#[derive(Debug, Clone)]
pub struct CreateMembershipCommand {
    pub owner_id: OwnerId,
    pub plan_id: PlanId,
}

/// Result of a successful signup.
#[derive(Debug, Clone)]
pub struct CreateMembershipResult {
    pub membership: Membership,
    /// False when an already-active membership on the same plan was returned
    /// as-is, or a lapsed row was revived.
    pub newly_created: bool,
}

/// Handler for membership signup.
///
/// Signup is safe to repeat: an active membership on the requested plan is
/// returned unchanged. An active membership on a *different* plan is an
/// error; switching plans goes through `ChangePlanHandler`, never through a
/// second signup. A lapsed or revoked row is revived in place so the owner
/// keeps their original member number.
pub struct CreateMembershipHandler {
    store: Arc<dyn MembershipStore>,
    catalog: PlanCatalog,
}

impl CreateMembershipHandler {
    pub fn new(store: Arc<dyn MembershipStore>, catalog: PlanCatalog) -> Self {
        Self { store, catalog }
    }

    pub async fn handle(
        &self,
        cmd: CreateMembershipCommand,
    ) -> Result<CreateMembershipResult, MembershipError> {
        match self.attempt(&cmd).await {
            Err(e) if e.is_retryable() => {
                tracing::warn!(owner_id = %cmd.owner_id, "signup hit a write conflict, retrying once");
                self.attempt(&cmd).await
            }
            other => other,
        }
    }

    async fn attempt(
        &self,
        cmd: &CreateMembershipCommand,
    ) -> Result<CreateMembershipResult, MembershipError> {
        let plan = self
            .catalog
            .get(&cmd.plan_id)
            .map_err(|_| MembershipError::unknown_plan(cmd.plan_id.clone()))?;
        let now = Timestamp::now();

        // 1. Reuse the owner's existing row if there is one
        if let Some(mut membership) = self.store.find_membership_by_owner(&cmd.owner_id).await? {
            if membership.effective_status(now) == EffectiveStatus::Active {
                if membership.plan_id == cmd.plan_id {
                    // Repeated signup on the same plan is a no-op
                    return Ok(CreateMembershipResult {
                        membership,
                        newly_created: false,
                    });
                }
                return Err(MembershipError::already_active(
                    cmd.owner_id.clone(),
                    membership.plan_id,
                    membership.expires_at,
                ));
            }

            // 2. Revive the lapsed/revoked row, quota-checked against the new plan
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
            membership.revive(plan, now.add_years(1), now)?;
            self.store
                .update_membership(&membership, expected_version, pet_ceiling)
                .await?;

            tracing::info!(
                owner_id = %cmd.owner_id,
                membership_id = %membership.id,
                plan_id = %cmd.plan_id,
                "revived lapsed membership on signup"
            );
            return Ok(CreateMembershipResult {
                membership,
                newly_created: false,
            });
        }

        // 3. First signup: mint a member number and insert a fresh row
        let sequence = self.store.next_member_sequence(now.year()).await?;
        let member_number = MemberNumber::mint(now.year(), sequence);
        let membership = Membership::create(
            MembershipId::new(),
            cmd.owner_id.clone(),
            member_number,
            plan,
            now,
        );

        match self.store.insert_membership(&membership).await {
            Ok(()) => {}
            // A concurrent signup inserted first; retry re-reads their row
            Err(e) if e.code == ErrorCode::MembershipExists => {
                return Err(MembershipError::Conflict);
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(
            owner_id = %cmd.owner_id,
            membership_id = %membership.id,
            member_number = %membership.member_number,
            plan_id = %cmd.plan_id,
            "created membership"
        );
        Ok(CreateMembershipResult {
            membership,
            newly_created: true,
        })
    }
}
