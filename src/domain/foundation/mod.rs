//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types
//! that form the vocabulary of the WagFriends membership domain.

mod errors;
mod ids;
mod member_number;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{GrantId, MembershipId, OwnerId, PlanId};
pub use member_number::MemberNumber;
pub use timestamp::Timestamp;
