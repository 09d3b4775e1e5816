//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod grant;
pub mod membership;

#[cfg(test)]
pub(crate) mod testing;
