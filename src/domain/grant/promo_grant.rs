//! Promotional grant entity.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{GrantId, MembershipId, OwnerId, Timestamp};

/// Why a complimentary membership was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantReason {
    /// Personal gift from the team.
    Gift,
    /// Partner-business arrangement.
    Partner,
    /// Contest or giveaway winner.
    ContestWinner,
    /// Employee perk.
    Employee,
    /// Anything else; explain in notes.
    Other,
}

impl GrantReason {
    /// Returns the storage string for this reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantReason::Gift => "gift",
            GrantReason::Partner => "partner",
            GrantReason::ContestWinner => "contest_winner",
            GrantReason::Employee => "employee",
            GrantReason::Other => "other",
        }
    }

    /// Parses a storage string back into a reason.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "gift" => Some(GrantReason::Gift),
            "partner" => Some(GrantReason::Partner),
            "contest_winner" => Some(GrantReason::ContestWinner),
            "employee" => Some(GrantReason::Employee),
            "other" => Some(GrantReason::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for GrantReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An administratively issued complimentary membership.
///
/// # Invariants
///
/// - `expires_at` always equals the linked membership's `expires_at`; every
///   operation that moves one moves the other in the same atomic write
/// - exactly one grant per membership
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoGrant {
    /// Unique identifier for this grant.
    pub id: GrantId,

    /// Pet owner who received the grant.
    pub owner_id: OwnerId,

    /// Membership created (or revived) by this grant.
    pub membership_id: MembershipId,

    /// Why the grant was issued.
    pub reason: GrantReason,

    /// Admin identity that issued the grant.
    pub granted_by: String,

    /// End of the granted term. Mirrors the membership's expiry.
    pub expires_at: Timestamp,

    /// Free-form audit notes.
    pub notes: Option<String>,

    /// When the grant was issued.
    pub created_at: Timestamp,
}

impl PromoGrant {
    /// Issues a new grant linked to a membership.
    #[allow(clippy::too_many_arguments)]
    pub fn issue(
        id: GrantId,
        owner_id: OwnerId,
        membership_id: MembershipId,
        reason: GrantReason,
        granted_by: impl Into<String>,
        expires_at: Timestamp,
        notes: Option<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            owner_id,
            membership_id,
            reason,
            granted_by: granted_by.into(),
            expires_at,
            notes,
            created_at: now,
        }
    }

    /// Extends the grant by whole calendar months and returns the new expiry.
    ///
    /// Zero months is allowed: an extension call may change only the plan or
    /// the notes. Extension is always measured from the current expiry, not
    /// from now.
    pub fn extend(&mut self, extra_months: u32, notes: Option<String>) -> Timestamp {
        self.expires_at = self.expires_at.add_months(extra_months);
        if notes.is_some() {
            self.notes = notes;
        }
        self.expires_at
    }

    /// Re-aligns the grant expiry with the membership after a self-service
    /// renew or reactivate moved the membership term.
    pub fn align_expiry(&mut self, expires_at: Timestamp) {
        self.expires_at = expires_at;
    }
}
