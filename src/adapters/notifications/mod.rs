//! Side-channel adapters for the best-effort collaborator ports.

mod stub_role_assigner;
mod tracing_emitter;

pub use stub_role_assigner::LoggingRoleAssigner;
pub use tracing_emitter::TracingNotificationEmitter;
