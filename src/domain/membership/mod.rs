//! Membership domain module.
//!
//! Handles the entitlement lifecycle: creation, plan changes, renewal,
//! reactivation, and revocation.
//!
//! # Module Structure
//!
//! - `aggregate` - Membership aggregate entity
//! - `status` - Computed EffectiveStatus
//! - `errors` - MembershipError taxonomy

mod aggregate;
mod errors;
mod status;

pub use aggregate::Membership;
pub use errors::MembershipError;
pub use status::EffectiveStatus;
