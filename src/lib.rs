//! WagFriends - Membership Entitlement & Plan Lifecycle Engine
//!
//! This crate manages pet-owner memberships for the WagFriends loyalty
//! platform: paid signups, plan changes, renewals, lapse-and-resume, and
//! admin-issued promotional grants, with pet quotas enforced against the
//! active plan.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
