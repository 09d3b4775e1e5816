//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `plan` - Plan tier reference data and quota validation
//! - `membership` - Membership entitlement lifecycle
//! - `grant` - Administratively issued promotional grants

pub mod foundation;
pub mod grant;
pub mod membership;
pub mod plan;
