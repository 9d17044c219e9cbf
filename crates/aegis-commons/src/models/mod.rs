pub mod health;
pub mod idempotency;
pub mod ids;
pub mod manifest;
pub mod relay_instance;
pub mod session;
pub mod usage;
pub mod user;

pub use health::RelayHealthEvent;
pub use idempotency::IdempotencyRecord;
pub use ids::{IdParseError, RelayInstanceId, SessionId};
pub use manifest::RelayManifestEntry;
pub use relay_instance::{RelayInstance, RelayInstanceState};
pub use session::{Session, SessionStatus};
pub use usage::{UsageCurrent, UsageRecord};
pub use user::{PlanStatus, PlanTier, User};
