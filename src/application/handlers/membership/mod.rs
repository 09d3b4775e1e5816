//! Membership lifecycle handlers.
//!
//! One handler per use case, wired with `Arc<dyn MembershipStore>` and the
//! static plan catalog. Mutating handlers retry exactly once on a write
//! conflict; a second conflict surfaces to the caller.

mod change_plan;
mod create_membership;
mod get_membership;
mod reactivate_membership;
mod renew_membership;

pub use change_plan::{ChangePlanCommand, ChangePlanHandler, ChangePlanResult};
pub use create_membership::{
    CreateMembershipCommand, CreateMembershipHandler, CreateMembershipResult,
};
pub use get_membership::{GetMembershipHandler, GetMembershipQuery, MembershipView};
pub use reactivate_membership::{
    ReactivateMembershipCommand, ReactivateMembershipHandler, ReactivateMembershipResult,
};
pub use renew_membership::{
    RenewMembershipCommand, RenewMembershipHandler, RenewMembershipResult,
};
