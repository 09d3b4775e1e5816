//! GrantPromoMembershipHandler - Command handler for issuing complimentary memberships.

use std::sync::Arc;

use crate::domain::foundation::{
    ErrorCode, GrantId, MemberNumber, MembershipId, OwnerId, PlanId, Timestamp,
};
use crate::domain::grant::{GrantReason, PromoGrant};
use crate::domain::membership::{EffectiveStatus, Membership, MembershipError};
use crate::domain::plan::{quota, PlanCatalog, QuotaCheck};
use crate::ports::{MembershipStore, NotificationEmitter, NotificationPayload, Role, RoleAssigner};

/// Command to issue a complimentary membership to an owner.
#[derive(Debug, Clone)]
pub struct GrantPromoMembershipCommand {
    pub owner_id: OwnerId,
    pub plan_id: PlanId,
    pub reason: GrantReason,
    pub months: u32,
    pub granted_by: String,
    pub notes: Option<String>,
}

/// Result of a successful grant.
#[derive(Debug, Clone)]
pub struct GrantPromoMembershipResult {
    pub grant: PromoGrant,
    pub membership: Membership,
}

/// Handler for issuing promo grants.
///
/// The membership and grant land in one atomic write. Role assignment and
/// the welcome notification run after commit and are best-effort: a failure
/// there is logged, never propagated, and the grant stands.
pub struct GrantPromoMembershipHandler {
    store: Arc<dyn MembershipStore>,
    catalog: PlanCatalog,
    roles: Arc<dyn RoleAssigner>,
    notifications: Arc<dyn NotificationEmitter>,
}

impl GrantPromoMembershipHandler {
    pub fn new(
        store: Arc<dyn MembershipStore>,
        catalog: PlanCatalog,
        roles: Arc<dyn RoleAssigner>,
        notifications: Arc<dyn NotificationEmitter>,
    ) -> Self {
        Self {
            store,
            catalog,
            roles,
            notifications,
        }
    }

    pub async fn handle(
        &self,
        cmd: GrantPromoMembershipCommand,
    ) -> Result<GrantPromoMembershipResult, MembershipError> {
        if cmd.months == 0 {
            return Err(MembershipError::validation(
                "months",
                "Grant term must be at least one month",
            ));
        }

        let result = match self.attempt(&cmd).await {
            Err(e) if e.is_retryable() => {
                tracing::warn!(owner_id = %cmd.owner_id, "grant hit a write conflict, retrying once");
                self.attempt(&cmd).await?
            }
            other => other?,
        };

        self.notify_after_commit(&result).await;
        Ok(result)
    }

    async fn attempt(
        &self,
        cmd: &GrantPromoMembershipCommand,
    ) -> Result<GrantPromoMembershipResult, MembershipError> {
        let plan = self
            .catalog
            .get(&cmd.plan_id)
            .map_err(|_| MembershipError::unknown_plan(cmd.plan_id.clone()))?;
        let now = Timestamp::now();
        let expires_at = now.add_months(cmd.months);

        // 1. An owner with an effectively active membership cannot be granted
        if let Some(mut membership) = self.store.find_membership_by_owner(&cmd.owner_id).await? {
            if membership.effective_status(now) == EffectiveStatus::Active {
                return Err(MembershipError::already_active(
                    cmd.owner_id.clone(),
                    membership.plan_id,
                    membership.expires_at,
                ));
            }

            // 2. Revive the existing row under the granted plan
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
            membership.revive(plan, expires_at, now)?;
            let grant = PromoGrant::issue(
                GrantId::new(),
                cmd.owner_id.clone(),
                membership.id,
                cmd.reason,
                cmd.granted_by.clone(),
                expires_at,
                cmd.notes.clone(),
                now,
            );
            self.store
                .update_membership_with_grant(&membership, expected_version, pet_ceiling, &grant)
                .await?;

            tracing::info!(
                owner_id = %cmd.owner_id,
                membership_id = %membership.id,
                grant_id = %grant.id,
                reason = %cmd.reason,
                "issued promo grant onto existing row"
            );
            return Ok(GrantPromoMembershipResult { grant, membership });
        }

        // 3. No row yet: mint a member number and insert membership + grant
        let sequence = self.store.next_member_sequence(now.year()).await?;
        let member_number = MemberNumber::mint(now.year(), sequence);
        let membership = Membership::create_with_expiry(
            MembershipId::new(),
            cmd.owner_id.clone(),
            member_number,
            plan,
            now,
            expires_at,
        );
        let grant = PromoGrant::issue(
            GrantId::new(),
            cmd.owner_id.clone(),
            membership.id,
            cmd.reason,
            cmd.granted_by.clone(),
            expires_at,
            cmd.notes.clone(),
            now,
        );

        match self
            .store
            .insert_membership_with_grant(&membership, &grant)
            .await
        {
            Ok(()) => {}
            // Concurrent signup won the insert; retry re-reads their row
            Err(e) if e.code == ErrorCode::MembershipExists => {
                return Err(MembershipError::Conflict);
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(
            owner_id = %cmd.owner_id,
            membership_id = %membership.id,
            grant_id = %grant.id,
            reason = %cmd.reason,
            "issued promo grant with new membership"
        );
        Ok(GrantPromoMembershipResult { grant, membership })
    }

    async fn notify_after_commit(&self, result: &GrantPromoMembershipResult) {
        let owner_id = &result.membership.owner_id;
        if let Err(e) = self.roles.ensure_role(owner_id, Role::Member).await {
            tracing::warn!(owner_id = %owner_id, error = %e, "role assignment failed after grant");
        }
        let payload = NotificationPayload::PromoGranted {
            plan_id: result.membership.plan_id.clone(),
            member_number: result.membership.member_number.clone(),
            reason: result.grant.reason,
            expires_at: result.grant.expires_at,
        };
        if let Err(e) = self.notifications.send(owner_id, payload).await {
            tracing::warn!(owner_id = %owner_id, error = %e, "grant notification failed");
        }
    }
}
