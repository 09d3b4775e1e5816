//! Membership aggregate entity.
//!
//! The Membership aggregate represents a pet owner's current entitlement.
//! Each owner has at most one Membership row; lifecycle operations mutate it
//! in place rather than minting history rows.
//!
//! # Design Decisions
//!
//! - **One per owner**: unique constraint on owner_id enforced at database level
//! - **Quota snapshot**: `max_pets` is denormalized from the plan at the last
//!   plan change so quota checks never depend on catalog availability
//! - **Computed expiry**: no stored Expired state; see [`EffectiveStatus`]
//! - **Optimistic locking**: `version` guards every conditional update

use crate::domain::foundation::{
    DomainError, ErrorCode, MemberNumber, MembershipId, OwnerId, PlanId, Timestamp,
};
use serde::{Deserialize, Serialize};

use crate::domain::plan::Plan;

use super::EffectiveStatus;

/// Membership aggregate - a pet owner's current entitlement.
///
/// # Invariants
///
/// - `id` and `member_number` are globally unique
/// - `owner_id` is unique (one membership row per owner)
/// - `max_pets` equals the quota of `plan_id` at the last plan change
/// - pet count never exceeds `max_pets` (guarded by callers + store)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    /// Unique identifier for this membership.
    pub id: MembershipId,

    /// Pet owner holding this membership.
    pub owner_id: OwnerId,

    /// Human-readable card number, minted once and kept for life.
    pub member_number: MemberNumber,

    /// Current plan tier.
    pub plan_id: PlanId,

    /// Pet quota snapshot from the plan at the last plan change.
    pub max_pets: u32,

    /// Stored active flag. `false` only after an admin revoke.
    /// Never read alone: effective state is [`Membership::effective_status`].
    pub is_active: bool,

    /// End of the current entitlement term.
    pub expires_at: Timestamp,

    /// When the membership was created.
    pub created_at: Timestamp,

    /// When the membership was last updated.
    pub updated_at: Timestamp,

    /// Optimistic-lock counter, bumped by the store on every update.
    pub version: i64,
}

impl Membership {
    /// Creates a new membership with a standard one-year term.
    pub fn create(
        id: MembershipId,
        owner_id: OwnerId,
        member_number: MemberNumber,
        plan: &Plan,
        now: Timestamp,
    ) -> Self {
        Self::create_with_expiry(id, owner_id, member_number, plan, now, now.add_years(1))
    }

    /// Creates a new membership with an explicit term end.
    ///
    /// Used by promotional grants, whose term is measured in months.
    pub fn create_with_expiry(
        id: MembershipId,
        owner_id: OwnerId,
        member_number: MemberNumber,
        plan: &Plan,
        now: Timestamp,
        expires_at: Timestamp,
    ) -> Self {
        Self {
            id,
            owner_id,
            member_number,
            plan_id: plan.id.clone(),
            max_pets: plan.max_pets,
            is_active: true,
            expires_at,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Computes the effective entitlement state at `now`.
    ///
    /// Every consumer of entitlement state must go through this; the stored
    /// `is_active` boolean alone says nothing about a lapsed term.
    pub fn effective_status(&self, now: Timestamp) -> EffectiveStatus {
        EffectiveStatus::compute(self.is_active, self.expires_at, now)
    }

    /// Returns true if moving to `plan` would shrink the pet quota.
    ///
    /// Compared against the stored quota snapshot, not the catalog's current
    /// definition of the old plan. Only shrinking moves need a pet-count
    /// check; growing or equal quotas trivially fit.
    pub fn shrinks_quota_to(&self, plan: &Plan) -> bool {
        plan.max_pets < self.max_pets
    }

    /// Switches to a new plan, effective immediately. Term unchanged.
    ///
    /// Callers must run the quota check first when the new plan shrinks the
    /// quota; this method only applies the already-validated change.
    ///
    /// # Errors
    ///
    /// Returns error unless the membership is effectively active.
    pub fn change_plan(&mut self, plan: &Plan, now: Timestamp) -> Result<(), DomainError> {
        self.require_status(EffectiveStatus::Active, "change plan on", now)?;
        self.plan_id = plan.id.clone();
        self.max_pets = plan.max_pets;
        self.updated_at = now;
        Ok(())
    }

    /// Renews for another year, optionally changing plan in the same call.
    ///
    /// The new term starts from whichever is later: now or the current
    /// expiry. Lapsed time is never credited back.
    ///
    /// # Errors
    ///
    /// Returns error if the membership was revoked (`is_active = false`);
    /// revoked rows are revived by a new signup or an admin grant.
    pub fn renew(&mut self, plan: &Plan, now: Timestamp) -> Result<(), DomainError> {
        if !self.is_active {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot renew revoked membership {}", self.id),
            ));
        }
        self.expires_at = self.expires_at.max(now).add_years(1);
        self.plan_id = plan.id.clone();
        self.max_pets = plan.max_pets;
        self.updated_at = now;
        Ok(())
    }

    /// Resumes a lapsed membership with a fresh one-year term.
    ///
    /// Plan and member number are preserved.
    ///
    /// # Errors
    ///
    /// Returns error if the membership is not lapsed, or was revoked.
    pub fn reactivate(&mut self, now: Timestamp) -> Result<(), DomainError> {
        if !self.is_active {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot reactivate revoked membership {}", self.id),
            ));
        }
        self.require_status(EffectiveStatus::Expired, "reactivate", now)?;
        self.expires_at = now.add_years(1);
        self.updated_at = now;
        Ok(())
    }

    /// Revives a non-active row as the owner's new entitlement.
    ///
    /// Used when an owner signs up again (or is granted a promotional
    /// membership) after a lapse or revoke: the row is reused so the original
    /// member number survives, but plan and term are set fresh.
    ///
    /// # Errors
    ///
    /// Returns error if the membership is still effectively active.
    pub fn revive(
        &mut self,
        plan: &Plan,
        expires_at: Timestamp,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        self.require_status(EffectiveStatus::Expired, "revive", now)?;
        self.plan_id = plan.id.clone();
        self.max_pets = plan.max_pets;
        self.is_active = true;
        self.expires_at = expires_at;
        self.updated_at = now;
        Ok(())
    }

    /// Moves the term end to an explicit point in time.
    ///
    /// Used by grant extensions, where the new expiry is computed from the
    /// grant rather than from now.
    pub fn extend_to(&mut self, expires_at: Timestamp, now: Timestamp) {
        self.expires_at = expires_at;
        self.updated_at = now;
    }

    /// Deactivates the membership (admin revoke). The row is kept.
    pub fn deactivate(&mut self, now: Timestamp) {
        self.is_active = false;
        self.updated_at = now;
    }

    fn require_status(
        &self,
        expected: EffectiveStatus,
        attempted: &str,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        let current = self.effective_status(now);
        if current != expected {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!(
                    "Cannot {} membership {} while {}",
                    attempted, self.id, current
                ),
            ));
        }
        Ok(())
    }
}
