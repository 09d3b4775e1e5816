//! Log-backed notification emitter.

use crate::domain::foundation::{DomainError, ErrorCode, OwnerId};
use crate::ports::{NotificationEmitter, NotificationPayload};
use async_trait::async_trait;

/// Emits notifications as structured log events.
///
/// Stands in until a real delivery channel (push, email) is wired up; the
/// payload is logged as JSON so downstream log shippers can pick it up.
#[derive(Debug, Default, Clone)]
pub struct TracingNotificationEmitter;

impl TracingNotificationEmitter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationEmitter for TracingNotificationEmitter {
    async fn send(
        &self,
        owner_id: &OwnerId,
        payload: NotificationPayload,
    ) -> Result<(), DomainError> {
        let body = serde_json::to_string(&payload)
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::InternalError,
                    format!("Failed to encode notification: {}", e),
                )
            })?;
        tracing::info!(
            owner_id = %owner_id,
            title = payload.title(),
            payload = %body,
            "notification emitted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{MemberNumber, PlanId, Timestamp};
    use crate::domain::grant::GrantReason;

    #[tokio::test]
    async fn send_succeeds_for_valid_payload() {
        let emitter = TracingNotificationEmitter::new();
        let owner = OwnerId::new("owner-1").unwrap();
        let payload = NotificationPayload::PromoGranted {
            plan_id: PlanId::new("duo").unwrap(),
            member_number: MemberNumber::mint(2026, 1),
            reason: GrantReason::Gift,
            expires_at: Timestamp::now().add_months(6),
        };

        assert!(emitter.send(&owner, payload).await.is_ok());
    }
}
