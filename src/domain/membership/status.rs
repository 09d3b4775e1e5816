//! Computed entitlement status.
//!
//! There is no stored "expired" flag. Expiry is always derived by comparing
//! `expires_at` against the clock, so a membership lapses the instant its
//! term ends without any background job flipping a column. Consumers must
//! never branch on the stored `is_active` boolean alone.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

/// Effective entitlement state, derived on every read.
///
/// `Active` iff the membership is stored active *and* its term has not
/// elapsed. Everything else (lapsed term, admin revoke) reads as `Expired`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectiveStatus {
    /// Entitlement is live: offers may be redeemed against it.
    Active,

    /// Entitlement has lapsed or been revoked. No redemptions.
    Expired,
}

impl EffectiveStatus {
    /// Computes the effective status from stored fields.
    pub fn compute(is_active: bool, expires_at: Timestamp, now: Timestamp) -> Self {
        if is_active && expires_at.is_after(&now) {
            EffectiveStatus::Active
        } else {
            EffectiveStatus::Expired
        }
    }

    /// Returns true if offers may currently be redeemed.
    pub fn grants_access(&self) -> bool {
        matches!(self, EffectiveStatus::Active)
    }
}

impl std::fmt::Display for EffectiveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EffectiveStatus::Active => "active",
            EffectiveStatus::Expired => "expired",
        };
        write!(f, "{}", s)
    }
}
