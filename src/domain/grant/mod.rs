//! Promotional grant domain module.

mod promo_grant;

pub use promo_grant::{GrantReason, PromoGrant};
