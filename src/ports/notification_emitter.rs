//! Notification emitter port.
//!
//! Fire-and-forget delivery of member-facing notifications. Emission is
//! best-effort by contract: a failed send must never roll back the lifecycle
//! transition that triggered it. Callers log the failure and move on.

use crate::domain::foundation::{DomainError, MemberNumber, OwnerId, PlanId, Timestamp};
use crate::domain::grant::GrantReason;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Typed notification payload, one variant per notification type.
///
/// A tagged union rather than a loose map: the emitter boundary validates
/// shape at compile time and serializes with a `type` discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationPayload {
    /// A promotional membership was issued.
    PromoGranted {
        plan_id: PlanId,
        member_number: MemberNumber,
        reason: GrantReason,
        expires_at: Timestamp,
    },

    /// An existing promo grant was extended and/or moved to a new plan.
    GrantExtended {
        plan_id: PlanId,
        extra_months: u32,
        expires_at: Timestamp,
    },
}

impl NotificationPayload {
    /// Short title for the notification bell.
    pub fn title(&self) -> &'static str {
        match self {
            NotificationPayload::PromoGranted { .. } => "Welcome to WagFriends!",
            NotificationPayload::GrantExtended { .. } => "Your membership was extended",
        }
    }

    /// Human-readable body text.
    pub fn message(&self) -> String {
        match self {
            NotificationPayload::PromoGranted {
                plan_id,
                member_number,
                expires_at,
                ..
            } => format!(
                "You've been granted a complimentary {} membership (card {}), valid until {}",
                plan_id, member_number, expires_at
            ),
            NotificationPayload::GrantExtended {
                plan_id,
                extra_months,
                expires_at,
            } => {
                if *extra_months > 0 {
                    format!(
                        "Your {} membership was extended by {} month(s), now valid until {}",
                        plan_id, extra_months, expires_at
                    )
                } else {
                    format!("Your membership was updated to {}", plan_id)
                }
            }
        }
    }
}

/// Port for emitting member-facing notifications.
///
/// Best-effort and non-transactional: implementations may drop on the floor
/// under pressure, and callers must not fail a lifecycle operation because a
/// send failed.
#[async_trait]
pub trait NotificationEmitter: Send + Sync {
    /// Send a notification to an owner.
    async fn send(
        &self,
        owner_id: &OwnerId,
        payload: NotificationPayload,
    ) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn granted_payload() -> NotificationPayload {
        NotificationPayload::PromoGranted {
            plan_id: PlanId::new("family").unwrap(),
            member_number: MemberNumber::mint(2026, 12),
            reason: GrantReason::Gift,
            expires_at: Timestamp::now().add_months(12),
        }
    }

    #[test]
    fn notification_emitter_is_object_safe() {
        fn _accepts_dyn(_emitter: &dyn NotificationEmitter) {}
    }

    #[test]
    fn payload_serializes_with_type_tag() {
        let json = serde_json::to_string(&granted_payload()).unwrap();
        assert!(json.contains("\"type\":\"promo_granted\""));
        assert!(json.contains("\"plan_id\":\"family\""));
    }

    #[test]
    fn payload_round_trips_through_json() {
        let payload = granted_payload();
        let json = serde_json::to_string(&payload).unwrap();
        let back: NotificationPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn extended_message_mentions_months_when_extended() {
        let payload = NotificationPayload::GrantExtended {
            plan_id: PlanId::new("duo").unwrap(),
            extra_months: 6,
            expires_at: Timestamp::now().add_months(6),
        };
        assert!(payload.message().contains("6 month"));
    }

    #[test]
    fn extended_message_omits_months_for_plan_only_change() {
        let payload = NotificationPayload::GrantExtended {
            plan_id: PlanId::new("family").unwrap(),
            extra_months: 0,
            expires_at: Timestamp::now().add_months(3),
        };
        assert!(!payload.message().contains("month"));
        assert!(payload.message().contains("family"));
    }
}
