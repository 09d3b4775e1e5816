//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `MembershipStore` - Transactional persistence for memberships and grants
//! - `NotificationEmitter` - Best-effort member notifications
//! - `RoleAssigner` - Idempotent platform role assignment

mod membership_store;
mod notification_emitter;
mod role_assigner;

pub use membership_store::MembershipStore;
pub use notification_emitter::{NotificationEmitter, NotificationPayload};
pub use role_assigner::{Role, RoleAssigner};
