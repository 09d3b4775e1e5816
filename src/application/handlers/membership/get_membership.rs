//! GetMembershipHandler - Query handler for membership lookups.

use std::sync::Arc;

use crate::domain::foundation::{MembershipId, OwnerId, Timestamp};
use crate::domain::membership::{EffectiveStatus, Membership, MembershipError};
use crate::ports::MembershipStore;

/// Query for a membership, by row id or by owner.
#[derive(Debug, Clone)]
pub enum GetMembershipQuery {
    ById(MembershipId),
    ByOwner(OwnerId),
}

/// A membership together with its entitlement state at read time.
///
/// The status is computed on every read; consumers must never look at the
/// stored row alone, because a lapsed term leaves `is_active` untouched.
#[derive(Debug, Clone)]
pub struct MembershipView {
    pub membership: Membership,
    pub status: EffectiveStatus,
}

/// Handler for membership lookups.
pub struct GetMembershipHandler {
    store: Arc<dyn MembershipStore>,
}

impl GetMembershipHandler {
    pub fn new(store: Arc<dyn MembershipStore>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        query: GetMembershipQuery,
    ) -> Result<MembershipView, MembershipError> {
        let membership = match &query {
            GetMembershipQuery::ById(id) => self
                .store
                .find_membership(id)
                .await?
                .ok_or(MembershipError::NotFound(*id))?,
            GetMembershipQuery::ByOwner(owner_id) => self
                .store
                .find_membership_by_owner(owner_id)
                .await?
                .ok_or_else(|| MembershipError::not_found_for_owner(owner_id.clone()))?,
        };

        let status = membership.effective_status(Timestamp::now());
        Ok(MembershipView { membership, status })
    }
}
