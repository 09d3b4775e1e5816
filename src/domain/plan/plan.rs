//! Plan tier reference data.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::PlanId;

/// A membership plan tier.
///
/// Immutable reference data: a named bundle defining the pet quota and the
/// price for a new signup versus a renewal. Money is i64 cents, never floats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Plan identifier slug, e.g. `family`.
    pub id: PlanId,

    /// Display name shown to members.
    pub name: String,

    /// Maximum number of pets permitted under this plan. Always >= 1.
    pub max_pets: u32,

    /// New-signup price in cents.
    pub price_new_cents: i64,

    /// Renewal price in cents.
    pub price_renewal_cents: i64,
}
