//! Shared test doubles for handler tests.
//!
//! An in-memory `MembershipStore` with the same version-check and pet-ceiling
//! semantics as the Postgres adapter, plus capturing stand-ins for the
//! best-effort collaborator ports. Conflict injection lets tests exercise the
//! retry-once policy deterministically.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::foundation::{
    DomainError, ErrorCode, GrantId, MembershipId, OwnerId,
};
use crate::domain::grant::PromoGrant;
use crate::domain::membership::Membership;
use crate::ports::{
    MembershipStore, NotificationEmitter, NotificationPayload, Role, RoleAssigner,
};

#[derive(Default)]
struct StoreState {
    memberships: HashMap<MembershipId, Membership>,
    grants: HashMap<GrantId, PromoGrant>,
    pet_counts: HashMap<MembershipId, u32>,
    sequences: HashMap<i32, u32>,
    conflicts_to_inject: u32,
    fail_all_with: Option<ErrorCode>,
}

/// In-memory membership store honoring the port's transaction contract.
#[derive(Default)]
pub struct InMemoryMembershipStore {
    state: Mutex<StoreState>,
}

impl InMemoryMembershipStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_membership(self, membership: Membership) -> Self {
        self.state
            .lock()
            .unwrap()
            .memberships
            .insert(membership.id, membership);
        self
    }

    pub fn with_grant(self, grant: PromoGrant) -> Self {
        self.state.lock().unwrap().grants.insert(grant.id, grant);
        self
    }

    pub fn with_pet_count(self, id: MembershipId, count: u32) -> Self {
        self.state.lock().unwrap().pet_counts.insert(id, count);
        self
    }

    /// Makes the next `n` conditional writes fail with `WriteConflict`.
    pub fn inject_conflicts(&self, n: u32) {
        self.state.lock().unwrap().conflicts_to_inject = n;
    }

    /// Makes every call fail with the given code.
    pub fn fail_all_with(&self, code: ErrorCode) {
        self.state.lock().unwrap().fail_all_with = Some(code);
    }

    pub fn stored_membership(&self, id: &MembershipId) -> Option<Membership> {
        self.state.lock().unwrap().memberships.get(id).cloned()
    }

    pub fn stored_grant(&self, id: &GrantId) -> Option<PromoGrant> {
        self.state.lock().unwrap().grants.get(id).cloned()
    }

    pub fn membership_count(&self) -> usize {
        self.state.lock().unwrap().memberships.len()
    }

    pub fn grant_count(&self) -> usize {
        self.state.lock().unwrap().grants.len()
    }
}

fn check_failure(state: &StoreState) -> Result<(), DomainError> {
    if let Some(code) = state.fail_all_with {
        return Err(DomainError::new(code, "injected failure"));
    }
    Ok(())
}

fn conditional_write_guards(
    state: &mut StoreState,
    membership: &Membership,
    expected_version: i64,
    pet_ceiling: Option<u32>,
) -> Result<(), DomainError> {
    check_failure(state)?;
    if state.conflicts_to_inject > 0 {
        state.conflicts_to_inject -= 1;
        return Err(DomainError::new(
            ErrorCode::WriteConflict,
            "injected conflict",
        ));
    }
    let stored = state.memberships.get(&membership.id).ok_or_else(|| {
        DomainError::new(ErrorCode::MembershipNotFound, "Membership not found")
    })?;
    if stored.version != expected_version {
        return Err(DomainError::new(
            ErrorCode::WriteConflict,
            "version mismatch",
        ));
    }
    if let Some(ceiling) = pet_ceiling {
        let count = state.pet_counts.get(&membership.id).copied().unwrap_or(0);
        if count > ceiling {
            return Err(DomainError::new(ErrorCode::QuotaExceeded, "over quota")
                .with_detail("excess", (count - ceiling).to_string())
                .with_detail("max_pets", ceiling.to_string()));
        }
    }
    Ok(())
}

fn bump_and_store(state: &mut StoreState, membership: &Membership, expected_version: i64) {
    let mut updated = membership.clone();
    updated.version = expected_version + 1;
    state.memberships.insert(updated.id, updated);
}

#[async_trait]
impl MembershipStore for InMemoryMembershipStore {
    async fn find_membership(
        &self,
        id: &MembershipId,
    ) -> Result<Option<Membership>, DomainError> {
        let state = self.state.lock().unwrap();
        check_failure(&state)?;
        Ok(state.memberships.get(id).cloned())
    }

    async fn find_membership_by_owner(
        &self,
        owner_id: &OwnerId,
    ) -> Result<Option<Membership>, DomainError> {
        let state = self.state.lock().unwrap();
        check_failure(&state)?;
        Ok(state
            .memberships
            .values()
            .find(|m| &m.owner_id == owner_id)
            .cloned())
    }

    async fn pet_count(&self, id: &MembershipId) -> Result<u32, DomainError> {
        let state = self.state.lock().unwrap();
        check_failure(&state)?;
        Ok(state.pet_counts.get(id).copied().unwrap_or(0))
    }

    async fn next_member_sequence(&self, year: i32) -> Result<u32, DomainError> {
        let mut state = self.state.lock().unwrap();
        check_failure(&state)?;
        let next = state.sequences.entry(year).or_insert(0);
        *next += 1;
        Ok(*next)
    }

    async fn insert_membership(&self, membership: &Membership) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        check_failure(&state)?;
        if state
            .memberships
            .values()
            .any(|m| m.owner_id == membership.owner_id)
        {
            return Err(DomainError::new(
                ErrorCode::MembershipExists,
                "Owner already has a membership",
            ));
        }
        state.memberships.insert(membership.id, membership.clone());
        Ok(())
    }

    async fn update_membership(
        &self,
        membership: &Membership,
        expected_version: i64,
        pet_ceiling: Option<u32>,
    ) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        conditional_write_guards(&mut state, membership, expected_version, pet_ceiling)?;
        bump_and_store(&mut state, membership, expected_version);
        Ok(())
    }

    async fn find_grant(&self, id: &GrantId) -> Result<Option<PromoGrant>, DomainError> {
        let state = self.state.lock().unwrap();
        check_failure(&state)?;
        Ok(state.grants.get(id).cloned())
    }

    async fn find_grant_by_membership(
        &self,
        membership_id: &MembershipId,
    ) -> Result<Option<PromoGrant>, DomainError> {
        let state = self.state.lock().unwrap();
        check_failure(&state)?;
        Ok(state
            .grants
            .values()
            .find(|g| &g.membership_id == membership_id)
            .cloned())
    }

    async fn insert_membership_with_grant(
        &self,
        membership: &Membership,
        grant: &PromoGrant,
    ) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        check_failure(&state)?;
        if state
            .memberships
            .values()
            .any(|m| m.owner_id == membership.owner_id)
        {
            return Err(DomainError::new(
                ErrorCode::MembershipExists,
                "Owner already has a membership",
            ));
        }
        state.memberships.insert(membership.id, membership.clone());
        state.grants.insert(grant.id, grant.clone());
        Ok(())
    }

    async fn update_membership_with_grant(
        &self,
        membership: &Membership,
        expected_version: i64,
        pet_ceiling: Option<u32>,
        grant: &PromoGrant,
    ) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        conditional_write_guards(&mut state, membership, expected_version, pet_ceiling)?;
        bump_and_store(&mut state, membership, expected_version);
        // One grant per membership: a fresh grant replaces any older one.
        state
            .grants
            .retain(|_, g| g.membership_id != grant.membership_id || g.id == grant.id);
        state.grants.insert(grant.id, grant.clone());
        Ok(())
    }

    async fn revoke_grant(
        &self,
        membership: &Membership,
        expected_version: i64,
        grant_id: &GrantId,
    ) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        conditional_write_guards(&mut state, membership, expected_version, None)?;
        if state.grants.remove(grant_id).is_none() {
            return Err(DomainError::new(
                ErrorCode::GrantNotFound,
                "Promo grant not found",
            ));
        }
        bump_and_store(&mut state, membership, expected_version);
        Ok(())
    }
}

/// Capturing notification emitter.
#[derive(Default)]
pub struct CapturingEmitter {
    sent: Mutex<Vec<(OwnerId, NotificationPayload)>>,
    fail_sends: Mutex<bool>,
}

impl CapturingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_sends: Mutex::new(true),
        }
    }

    pub fn sent(&self) -> Vec<(OwnerId, NotificationPayload)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationEmitter for CapturingEmitter {
    async fn send(
        &self,
        owner_id: &OwnerId,
        payload: NotificationPayload,
    ) -> Result<(), DomainError> {
        if *self.fail_sends.lock().unwrap() {
            return Err(DomainError::new(
                ErrorCode::InternalError,
                "notification channel down",
            ));
        }
        self.sent
            .lock()
            .unwrap()
            .push((owner_id.clone(), payload));
        Ok(())
    }
}

/// Capturing role assigner.
#[derive(Default)]
pub struct CapturingRoleAssigner {
    assigned: Mutex<Vec<(OwnerId, Role)>>,
    fail_assigns: Mutex<bool>,
}

impl CapturingRoleAssigner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            assigned: Mutex::new(Vec::new()),
            fail_assigns: Mutex::new(true),
        }
    }

    pub fn assigned(&self) -> Vec<(OwnerId, Role)> {
        self.assigned.lock().unwrap().clone()
    }
}

#[async_trait]
impl RoleAssigner for CapturingRoleAssigner {
    async fn ensure_role(&self, owner_id: &OwnerId, role: Role) -> Result<(), DomainError> {
        if *self.fail_assigns.lock().unwrap() {
            return Err(DomainError::new(
                ErrorCode::InternalError,
                "role system down",
            ));
        }
        self.assigned.lock().unwrap().push((owner_id.clone(), role));
        Ok(())
    }
}

mod tests {
    use super::*;
    use crate::domain::foundation::{MemberNumber, PlanId, Timestamp};
    use crate::domain::membership::MembershipError;
    use crate::domain::plan::Plan;

    fn membership_on(plan: &Plan) -> Membership {
        Membership::create(
            MembershipId::new(),
            OwnerId::new("owner-42").unwrap(),
            MemberNumber::mint(2026, 1),
            plan,
            Timestamp::now(),
        )
    }

    fn plan(id: &str, max_pets: u32) -> Plan {
        Plan {
            id: PlanId::new(id).unwrap(),
            name: id.to_string(),
            max_pets,
            price_new_cents: 4900,
            price_renewal_cents: 3900,
        }
    }

    // A pet registered between a handler's advisory count and its write must
    // still fail the write: the ceiling is re-checked against the count the
    // store sees at commit time.
    #[tokio::test]
    async fn write_time_ceiling_guard_rejects_stale_count() {
        let family = plan("family", 5);
        let mut membership = membership_on(&family);
        let id = membership.id;
        let store = InMemoryMembershipStore::new()
            .with_membership(membership.clone())
            .with_pet_count(id, 3);

        membership.change_plan(&plan("single", 1), Timestamp::now()).unwrap();
        let err = store
            .update_membership(&membership, 0, Some(1))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::QuotaExceeded);
        assert_eq!(err.details.get("excess").map(String::as_str), Some("2"));
        assert_eq!(err.details.get("max_pets").map(String::as_str), Some("1"));
        assert_eq!(
            MembershipError::from(err),
            MembershipError::QuotaExceeded { excess: 2, max_pets: 1 }
        );
        // The row is untouched on a rejected write
        let stored = store.stored_membership(&id).unwrap();
        assert_eq!(stored.version, 0);
        assert_eq!(stored.plan_id, family.id);
        assert_eq!(stored.max_pets, 5);
    }

    #[tokio::test]
    async fn write_time_ceiling_guard_passes_at_exactly_the_ceiling() {
        let mut membership = membership_on(&plan("family", 5));
        let id = membership.id;
        let store = InMemoryMembershipStore::new()
            .with_membership(membership.clone())
            .with_pet_count(id, 2);

        membership.change_plan(&plan("duo", 2), Timestamp::now()).unwrap();
        store
            .update_membership(&membership, 0, Some(2))
            .await
            .unwrap();

        assert_eq!(store.stored_membership(&id).unwrap().version, 1);
    }
}
