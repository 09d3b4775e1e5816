//! Static plan catalog.
//!
//! Plans are reference data compiled into the application rather than stored
//! rows: they change with releases, not at runtime, and every quota decision
//! depends on them being deterministic.

use once_cell::sync::Lazy;

use crate::domain::foundation::{DomainError, ErrorCode, PlanId};

use super::Plan;

static BUILTIN_PLANS: Lazy<Vec<Plan>> = Lazy::new(|| {
    fn plan(id: &str, name: &str, max_pets: u32, new_cents: i64, renewal_cents: i64) -> Plan {
        Plan {
            // Slugs are static and non-empty, construction cannot fail.
            id: PlanId::new(id).unwrap_or_else(|_| unreachable!()),
            name: name.to_string(),
            max_pets,
            price_new_cents: new_cents,
            price_renewal_cents: renewal_cents,
        }
    }

    vec![
        plan("single", "Single Pet", 1, 3900, 2900),
        plan("duo", "Dynamic Duo", 2, 5900, 4400),
        plan("family", "Whole Family", 5, 9900, 7400),
    ]
});

/// Read-only lookup over the plan tiers.
#[derive(Debug, Clone)]
pub struct PlanCatalog {
    plans: &'static [Plan],
}

impl PlanCatalog {
    /// Returns the catalog of built-in plan tiers.
    pub fn builtin() -> Self {
        Self {
            plans: &BUILTIN_PLANS,
        }
    }

    /// Looks up a plan by id.
    ///
    /// # Errors
    ///
    /// Returns `PlanNotFound` for unknown ids.
    pub fn get(&self, plan_id: &PlanId) -> Result<&'static Plan, DomainError> {
        self.plans.iter().find(|p| &p.id == plan_id).ok_or_else(|| {
            DomainError::new(
                ErrorCode::PlanNotFound,
                format!("Unknown plan: {}", plan_id),
            )
        })
    }

    /// Returns all plans, ordered by quota ascending.
    pub fn all(&self) -> &'static [Plan] {
        self.plans
    }
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
