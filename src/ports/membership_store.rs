//! Membership store port.
//!
//! Defines the transactional persistence boundary for Membership and
//! PromoGrant records. Implementations own the actual database operations;
//! the transaction contract below is part of the design, not an adapter
//! detail.
//!
//! # Transaction contract
//!
//! - Every mutating method is a single atomic unit: it fully applies or
//!   fully fails, and compound membership+grant writes can never be observed
//!   half-applied.
//! - Conditional updates take an `expected_version`; a mismatch means a
//!   concurrent writer won and the method fails with `WriteConflict` without
//!   touching the row.
//! - When a `pet_ceiling` is supplied, the implementation must re-count the
//!   membership's pets *inside the update transaction* and fail with
//!   `QuotaExceeded` if the count is above the ceiling. A count read before
//!   the transaction is only advisory.
//! - Unreachable or timed-out storage surfaces as `StoreUnavailable`; the
//!   store never blocks indefinitely.

use crate::domain::foundation::{DomainError, GrantId, MembershipId, OwnerId};
use crate::domain::grant::PromoGrant;
use crate::domain::membership::Membership;
use async_trait::async_trait;

/// Persistence port for Membership and PromoGrant records.
///
/// Implementations must ensure:
/// - Unique owner_id and member_number constraints
/// - Optimistic locking via the membership `version` column
/// - In-transaction pet-count guards for quota-shrinking updates
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Find a membership by its ID. Returns `None` if not found.
    async fn find_membership(
        &self,
        id: &MembershipId,
    ) -> Result<Option<Membership>, DomainError>;

    /// Find the membership row for an owner, active or not.
    ///
    /// The primary lookup: each owner has at most one row.
    async fn find_membership_by_owner(
        &self,
        owner_id: &OwnerId,
    ) -> Result<Option<Membership>, DomainError>;

    /// Count pets currently registered against a membership.
    ///
    /// Advisory outside a transaction; writes that depend on the count must
    /// also pass a `pet_ceiling` so the store re-checks atomically.
    async fn pet_count(&self, id: &MembershipId) -> Result<u32, DomainError>;

    /// Reserve the next member-number sequence value for a year.
    async fn next_member_sequence(&self, year: i32) -> Result<u32, DomainError>;

    /// Insert a new membership row.
    ///
    /// # Errors
    ///
    /// - `MembershipExists` if the owner already has a row
    /// - `StoreUnavailable` / `DatabaseError` on persistence failure
    async fn insert_membership(&self, membership: &Membership) -> Result<(), DomainError>;

    /// Conditionally update a membership row.
    ///
    /// # Errors
    ///
    /// - `WriteConflict` if the stored version differs from `expected_version`
    /// - `QuotaExceeded` if `pet_ceiling` is set and the in-transaction pet
    ///   count exceeds it
    /// - `MembershipNotFound` if the row is gone
    async fn update_membership(
        &self,
        membership: &Membership,
        expected_version: i64,
        pet_ceiling: Option<u32>,
    ) -> Result<(), DomainError>;

    /// Find a promo grant by its ID. Returns `None` if not found.
    async fn find_grant(&self, id: &GrantId) -> Result<Option<PromoGrant>, DomainError>;

    /// Find the promo grant linked to a membership, if any.
    ///
    /// Self-service renew/reactivate use this to keep the grant expiry in
    /// lockstep with the membership.
    async fn find_grant_by_membership(
        &self,
        membership_id: &MembershipId,
    ) -> Result<Option<PromoGrant>, DomainError>;

    /// Insert a new membership together with its promo grant, atomically.
    async fn insert_membership_with_grant(
        &self,
        membership: &Membership,
        grant: &PromoGrant,
    ) -> Result<(), DomainError>;

    /// Conditionally update a membership and upsert its promo grant as one
    /// atomic unit.
    ///
    /// Same version/ceiling semantics as [`update_membership`]. The grant is
    /// inserted when absent (grant issued against a revived row) or updated
    /// in place (extension).
    ///
    /// [`update_membership`]: MembershipStore::update_membership
    async fn update_membership_with_grant(
        &self,
        membership: &Membership,
        expected_version: i64,
        pet_ceiling: Option<u32>,
        grant: &PromoGrant,
    ) -> Result<(), DomainError>;

    /// Deactivate a membership and delete its promo grant, atomically.
    ///
    /// # Errors
    ///
    /// - `WriteConflict` on version mismatch
    /// - `GrantNotFound` if the grant row is already gone
    async fn revoke_grant(
        &self,
        membership: &Membership,
        expected_version: i64,
        grant_id: &GrantId,
    ) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Trait object safety test
    #[test]
    fn membership_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn MembershipStore) {}
    }
}
