//! Adapters - Concrete implementations of the ports.
//!
//! Each adapter module implements one port against a real technology:
//!
//! - `postgres` - sqlx-backed persistence
//! - `notifications` - log-backed notification and role side channels

pub mod notifications;
pub mod postgres;

pub use notifications::{LoggingRoleAssigner, TracingNotificationEmitter};
pub use postgres::PostgresMembershipStore;
