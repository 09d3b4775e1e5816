//! Promo grant administration handlers.
//!
//! Admin-side counterparts to the membership lifecycle: issuing, extending,
//! and revoking complimentary memberships. Grant and membership expiry move
//! in lockstep through every one of these.

mod extend_promo_grant;
mod grant_promo_membership;
mod revoke_promo_grant;

pub use extend_promo_grant::{
    ExtendPromoGrantCommand, ExtendPromoGrantHandler, ExtendPromoGrantResult,
};
pub use grant_promo_membership::{
    GrantPromoMembershipCommand, GrantPromoMembershipHandler, GrantPromoMembershipResult,
};
pub use revoke_promo_grant::{
    RevokePromoGrantCommand, RevokePromoGrantHandler, RevokePromoGrantResult,
};
