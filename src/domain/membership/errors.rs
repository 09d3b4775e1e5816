//! Membership-specific error types.
//!
//! Errors surfaced by lifecycle and grant operations. `QuotaExceeded` and
//! `AlreadyActive` are expected business outcomes: they carry the detail a
//! caller needs to act (excess pet count; the conflicting entitlement's plan
//! and expiry) and are never folded into a generic error.

use crate::domain::foundation::{
    DomainError, ErrorCode, GrantId, MembershipId, OwnerId, PlanId, Timestamp,
};

/// Membership-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipError {
    /// Membership was not found.
    NotFound(MembershipId),

    /// No membership exists for this owner.
    NotFoundForOwner(OwnerId),

    /// Promotional grant was not found.
    GrantNotFound(GrantId),

    /// Plan id is not in the catalog.
    UnknownPlan(PlanId),

    /// Owner already holds an effectively active membership.
    AlreadyActive {
        owner_id: OwnerId,
        plan_id: PlanId,
        expires_at: Timestamp,
    },

    /// Downgrade blocked: current pet count exceeds the target quota.
    QuotaExceeded { excess: u32, max_pets: u32 },

    /// Invalid state for the requested operation.
    InvalidState { message: String },

    /// A concurrent write won the race; the operation was not applied.
    Conflict,

    /// Persistence is unreachable or timed out.
    StoreUnavailable(String),

    /// Validation failed.
    ValidationFailed { field: String, message: String },

    /// Infrastructure error.
    Infrastructure(String),
}

impl MembershipError {
    // Constructor functions for cleaner error creation

    pub fn not_found(id: MembershipId) -> Self {
        MembershipError::NotFound(id)
    }

    pub fn not_found_for_owner(owner_id: OwnerId) -> Self {
        MembershipError::NotFoundForOwner(owner_id)
    }

    pub fn grant_not_found(id: GrantId) -> Self {
        MembershipError::GrantNotFound(id)
    }

    pub fn unknown_plan(plan_id: PlanId) -> Self {
        MembershipError::UnknownPlan(plan_id)
    }

    pub fn already_active(owner_id: OwnerId, plan_id: PlanId, expires_at: Timestamp) -> Self {
        MembershipError::AlreadyActive {
            owner_id,
            plan_id,
            expires_at,
        }
    }

    pub fn quota_exceeded(excess: u32, max_pets: u32) -> Self {
        MembershipError::QuotaExceeded { excess, max_pets }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        MembershipError::InvalidState {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        MembershipError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn store_unavailable(message: impl Into<String>) -> Self {
        MembershipError::StoreUnavailable(message.into())
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        MembershipError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            MembershipError::NotFound(_) | MembershipError::NotFoundForOwner(_) => {
                ErrorCode::MembershipNotFound
            }
            MembershipError::GrantNotFound(_) => ErrorCode::GrantNotFound,
            MembershipError::UnknownPlan(_) => ErrorCode::PlanNotFound,
            MembershipError::AlreadyActive { .. } => ErrorCode::MembershipExists,
            MembershipError::QuotaExceeded { .. } => ErrorCode::QuotaExceeded,
            MembershipError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            MembershipError::Conflict => ErrorCode::WriteConflict,
            MembershipError::StoreUnavailable(_) => ErrorCode::StoreUnavailable,
            MembershipError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            MembershipError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-friendly error message.
    pub fn message(&self) -> String {
        match self {
            MembershipError::NotFound(id) => format!("Membership not found: {}", id),
            MembershipError::NotFoundForOwner(owner_id) => {
                format!("No membership found for owner: {}", owner_id)
            }
            MembershipError::GrantNotFound(id) => format!("Promo grant not found: {}", id),
            MembershipError::UnknownPlan(plan_id) => format!("Unknown plan: {}", plan_id),
            MembershipError::AlreadyActive {
                owner_id,
                plan_id,
                expires_at,
            } => format!(
                "Owner {} already has an active {} membership until {}",
                owner_id, plan_id, expires_at
            ),
            MembershipError::QuotaExceeded { excess, max_pets } => format!(
                "Plan allows {} pets; {} over quota. Rehome listings or pick a bigger plan",
                max_pets, excess
            ),
            MembershipError::InvalidState { message } => message.clone(),
            MembershipError::Conflict => {
                "Membership was modified concurrently; please retry".to_string()
            }
            MembershipError::StoreUnavailable(msg) => {
                format!("Membership store unavailable: {}", msg)
            }
            MembershipError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            MembershipError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// Returns true if this error should trigger a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MembershipError::Conflict)
    }
}

impl std::fmt::Display for MembershipError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for MembershipError {}

impl From<DomainError> for MembershipError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::WriteConflict => MembershipError::Conflict,
            ErrorCode::StoreUnavailable => MembershipError::StoreUnavailable(err.message),
            ErrorCode::QuotaExceeded => {
                let excess = err
                    .details
                    .get("excess")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0);
                let max_pets = err
                    .details
                    .get("max_pets")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0);
                MembershipError::QuotaExceeded { excess, max_pets }
            }
            ErrorCode::InvalidStateTransition => MembershipError::InvalidState {
                message: err.message,
            },
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::OutOfRange
            | ErrorCode::InvalidFormat => MembershipError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            _ => MembershipError::Infrastructure(err.to_string()),
        }
    }
}

impl From<MembershipError> for DomainError {
    fn from(err: MembershipError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}
