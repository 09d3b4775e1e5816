//! PostgreSQL adapters - Database implementation for the persistence port.
//!
//! - `PostgresMembershipStore` - Transactional storage for memberships and grants

mod membership_store;

pub use membership_store::PostgresMembershipStore;
