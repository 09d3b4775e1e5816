//! ExtendPromoGrantHandler - Command handler for extending or re-planning a grant.

use std::sync::Arc;

use crate::domain::foundation::{GrantId, PlanId, Timestamp};
use crate::domain::grant::PromoGrant;
use crate::domain::membership::{Membership, MembershipError};
use crate::domain::plan::{quota, PlanCatalog, QuotaCheck};
use crate::ports::{MembershipStore, NotificationEmitter, NotificationPayload};

/// Command to extend an existing promo grant.
///
/// `extra_months` may be zero when the call only switches the plan or
/// replaces the notes. `new_plan_id` of `None` keeps the current plan.
#[derive(Debug, Clone)]
pub struct ExtendPromoGrantCommand {
    pub grant_id: GrantId,
    pub extra_months: u32,
    pub new_plan_id: Option<PlanId>,
    pub notes: Option<String>,
}

/// Result of a successful extension.
#[derive(Debug, Clone)]
pub struct ExtendPromoGrantResult {
    pub grant: PromoGrant,
    pub membership: Membership,
}

/// Handler for grant extensions.
///
/// The extension is measured from the grant's current expiry, never from
/// now, so extending early costs nothing. Grant and membership expiry move
/// together in one atomic write; when two admins extend concurrently,
/// exactly one extension applies and the other gets a conflict.
pub struct ExtendPromoGrantHandler {
    store: Arc<dyn MembershipStore>,
    catalog: PlanCatalog,
    notifications: Arc<dyn NotificationEmitter>,
}

impl ExtendPromoGrantHandler {
    pub fn new(
        store: Arc<dyn MembershipStore>,
        catalog: PlanCatalog,
        notifications: Arc<dyn NotificationEmitter>,
    ) -> Self {
        Self {
            store,
            catalog,
            notifications,
        }
    }

    pub async fn handle(
        &self,
        cmd: ExtendPromoGrantCommand,
    ) -> Result<ExtendPromoGrantResult, MembershipError> {
        let result = match self.attempt(&cmd).await {
            Err(e) if e.is_retryable() => {
                tracing::warn!(grant_id = %cmd.grant_id, "extension hit a write conflict, retrying once");
                self.attempt(&cmd).await?
            }
            other => other?,
        };

        let payload = NotificationPayload::GrantExtended {
            plan_id: result.membership.plan_id.clone(),
            extra_months: cmd.extra_months,
            expires_at: result.grant.expires_at,
        };
        if let Err(e) = self
            .notifications
            .send(&result.membership.owner_id, payload)
            .await
        {
            tracing::warn!(grant_id = %cmd.grant_id, error = %e, "extension notification failed");
        }

        Ok(result)
    }

    async fn attempt(
        &self,
        cmd: &ExtendPromoGrantCommand,
    ) -> Result<ExtendPromoGrantResult, MembershipError> {
        let mut grant = self
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

        let plan = match &cmd.new_plan_id {
            Some(plan_id) => self
                .catalog
                .get(plan_id)
                .map_err(|_| MembershipError::unknown_plan(plan_id.clone()))?,
            None => self
                .catalog
                .get(&membership.plan_id)
                .map_err(|_| MembershipError::unknown_plan(membership.plan_id.clone()))?,
        };

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
        let new_expiry = grant.extend(cmd.extra_months, cmd.notes.clone());
        membership.extend_to(new_expiry, now);
        if membership.plan_id != plan.id {
            // Requires the extension to have made the membership active again
            membership.change_plan(plan, now)?;
        }

        self.store
            .update_membership_with_grant(&membership, expected_version, pet_ceiling, &grant)
            .await?;

        tracing::info!(
            grant_id = %grant.id,
            membership_id = %membership.id,
            extra_months = cmd.extra_months,
            expires_at = %grant.expires_at,
            "extended promo grant"
        );
        Ok(ExtendPromoGrantResult { grant, membership })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::testing::{CapturingEmitter, InMemoryMembershipStore};
    use crate::domain::foundation::{MemberNumber, MembershipId, OwnerId};
    use crate::domain::grant::GrantReason;
    use crate::domain::plan::Plan;

    fn plan(id: &str) -> &'static Plan {
        PlanCatalog::builtin().get(&PlanId::new(id).unwrap()).unwrap()
    }

    fn granted_pair(plan_id: &str, months: u32) -> (Membership, PromoGrant) {
        let now = Timestamp::now();
        let expires = now.add_months(months);
        let membership = Membership::create_with_expiry(
            MembershipId::new(),
            OwnerId::new("owner-42").unwrap(),
            MemberNumber::mint(2026, 10),
            plan(plan_id),
            now,
            expires,
        );
        let grant = PromoGrant::issue(
            GrantId::new(),
            membership.owner_id.clone(),
            membership.id,
            GrantReason::Partner,
            "admin-3",
            expires,
            None,
            now,
        );
        (membership, grant)
    }

    struct Fixture {
        store: Arc<InMemoryMembershipStore>,
        emitter: Arc<CapturingEmitter>,
        handler: ExtendPromoGrantHandler,
    }

    fn fixture(membership: Membership, grant: PromoGrant) -> Fixture {
        let store = Arc::new(
            InMemoryMembershipStore::new()
                .with_membership(membership)
                .with_grant(grant),
        );
        let emitter = Arc::new(CapturingEmitter::new());
        let handler = ExtendPromoGrantHandler::new(
            store.clone(),
            PlanCatalog::builtin(),
            emitter.clone(),
        );
        Fixture {
            store,
            emitter,
            handler,
        }
    }

    fn extend_cmd(grant_id: GrantId, extra_months: u32) -> ExtendPromoGrantCommand {
        ExtendPromoGrantCommand {
            grant_id,
            extra_months,
            new_plan_id: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn extension_moves_grant_and_membership_together() {
        let (membership, grant) = granted_pair("duo", 12);
        let original_expiry = grant.expires_at;
        let membership_id = membership.id;
        let grant_id = grant.id;
        let f = fixture(membership, grant);

        let result = f.handler.handle(extend_cmd(grant_id, 6)).await.unwrap();

        // Exact calendar months from the previous expiry
        assert_eq!(result.grant.expires_at, original_expiry.add_months(6));
        assert_eq!(result.membership.expires_at, result.grant.expires_at);
        let stored = f.store.stored_membership(&membership_id).unwrap();
        assert_eq!(stored.expires_at, result.grant.expires_at);
        assert_eq!(
            f.store.stored_grant(&grant_id).unwrap().expires_at,
            result.grant.expires_at
        );
    }

    #[tokio::test]
    async fn extension_sends_notification() {
        let (membership, grant) = granted_pair("duo", 3);
        let grant_id = grant.id;
        let f = fixture(membership, grant);

        f.handler.handle(extend_cmd(grant_id, 2)).await.unwrap();

        let sent = f.emitter.sent();
        assert_eq!(sent.len(), 1);
        assert!(matches!(
            sent[0].1,
            NotificationPayload::GrantExtended { extra_months: 2, .. }
        ));
    }

    #[tokio::test]
    async fn extension_can_switch_plans_without_adding_months() {
        let (membership, grant) = granted_pair("single", 6);
        let grant_id = grant.id;
        let expiry = grant.expires_at;
        let f = fixture(membership, grant);

        let result = f
            .handler
            .handle(ExtendPromoGrantCommand {
                grant_id,
                extra_months: 0,
                new_plan_id: Some(PlanId::new("family").unwrap()),
                notes: Some("upgraded for the expo".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(result.membership.plan_id, PlanId::new("family").unwrap());
        assert_eq!(result.membership.max_pets, 5);
        assert_eq!(result.grant.expires_at, expiry);
        assert_eq!(result.grant.notes.as_deref(), Some("upgraded for the expo"));
    }

    #[tokio::test]
    async fn plan_switch_to_smaller_quota_is_checked() {
        let (membership, grant) = granted_pair("family", 6);
        let membership_id = membership.id;
        let grant_id = grant.id;
        let store = Arc::new(
            InMemoryMembershipStore::new()
                .with_membership(membership)
                .with_grant(grant)
                .with_pet_count(membership_id, 4),
        );
        let handler = ExtendPromoGrantHandler::new(
            store,
            PlanCatalog::builtin(),
            Arc::new(CapturingEmitter::new()),
        );

        let err = handler
            .handle(ExtendPromoGrantCommand {
                grant_id,
                extra_months: 1,
                new_plan_id: Some(PlanId::new("single").unwrap()),
                notes: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            MembershipError::QuotaExceeded {
                excess: 3,
                max_pets: 1
            }
        ));
    }

    #[tokio::test]
    async fn concurrent_extensions_apply_exactly_once() {
        let (membership, grant) = granted_pair("duo", 12);
        let original_expiry = grant.expires_at;
        let grant_id = grant.id;
        let f = fixture(membership, grant);

        // Another admin's write lands between our read and write, twice:
        // the retry also loses, and the caller sees the conflict.
        f.store.inject_conflicts(2);
        let err = f.handler.handle(extend_cmd(grant_id, 6)).await.unwrap_err();
        assert!(matches!(err, MembershipError::Conflict));

        // A single interleaved write is absorbed by the one retry.
        f.store.inject_conflicts(1);
        let result = f.handler.handle(extend_cmd(grant_id, 6)).await.unwrap();
        assert_eq!(result.grant.expires_at, original_expiry.add_months(6));
        assert_eq!(
            f.store.stored_grant(&grant_id).unwrap().expires_at,
            original_expiry.add_months(6)
        );
    }

    #[tokio::test]
    async fn missing_grant_is_grant_not_found() {
        let store = Arc::new(InMemoryMembershipStore::new());
        let handler = ExtendPromoGrantHandler::new(
            store,
            PlanCatalog::builtin(),
            Arc::new(CapturingEmitter::new()),
        );

        let err = handler
            .handle(extend_cmd(GrantId::new(), 1))
            .await
            .unwrap_err();

        assert!(matches!(err, MembershipError::GrantNotFound(_)));
    }
}
