use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RelayManifestEntry {
    pub region: String,
    pub ami_id: String,
    pub default_instance_type: String,
    pub updated_at: DateTime<Utc>,
}
