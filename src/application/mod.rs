//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Following CQRS, it separates command handlers (write) from query handlers (read).

pub mod handlers;

pub use handlers::grant::{
    ExtendPromoGrantCommand, ExtendPromoGrantHandler, ExtendPromoGrantResult,
    GrantPromoMembershipCommand, GrantPromoMembershipHandler, GrantPromoMembershipResult,
    RevokePromoGrantCommand, RevokePromoGrantHandler, RevokePromoGrantResult,
};
pub use handlers::membership::{
    ChangePlanCommand, ChangePlanHandler, ChangePlanResult, CreateMembershipCommand,
    CreateMembershipHandler, CreateMembershipResult, GetMembershipHandler, GetMembershipQuery,
    MembershipView, ReactivateMembershipCommand, ReactivateMembershipHandler,
    ReactivateMembershipResult, RenewMembershipCommand, RenewMembershipHandler,
    RenewMembershipResult,
};
