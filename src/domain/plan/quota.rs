//! Pure pet-quota validation.
//!
//! These checks are the only business rule standing between a write and the
//! `pet_count <= max_pets` invariant. They are deliberately pure: callers
//! supply the pet count, and the count they supply must come from the same
//! transaction that commits the write (see `MembershipStore`).

use crate::domain::membership::Membership;

use super::Plan;

/// Outcome of a quota check against a target plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaCheck {
    /// The pet count fits within the target quota.
    Ok,
    /// The pet count exceeds the target quota by `excess` pets.
    Exceeded { excess: u32 },
}

impl QuotaCheck {
    /// Returns true if the check passed.
    pub fn is_ok(&self) -> bool {
        matches!(self, QuotaCheck::Ok)
    }
}

/// Outcome of checking whether one more pet fits the current quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PetAddCheck {
    /// There is room for another pet.
    Ok,
    /// The membership is already at its quota ceiling.
    QuotaReached,
}

/// Validates a plan change against the current pet count.
///
/// `excess = max(0, current_pet_count - target.max_pets)`. A downgrade is
/// rejected when any pets would be left over the new ceiling; an upgrade
/// trivially passes.
pub fn validate_downgrade(current_pet_count: u32, target: &Plan) -> QuotaCheck {
    let excess = current_pet_count.saturating_sub(target.max_pets);
    if excess == 0 {
        QuotaCheck::Ok
    } else {
        QuotaCheck::Exceeded { excess }
    }
}

/// Validates that one more pet fits under the membership's quota.
///
/// The engine does not own pet rows; this is the seam external pet-add
/// operations call before committing, with a count read in their own
/// transaction.
pub fn validate_add_pet(membership: &Membership, current_pet_count: u32) -> PetAddCheck {
    if current_pet_count < membership.max_pets {
        PetAddCheck::Ok
    } else {
        PetAddCheck::QuotaReached
    }
}
