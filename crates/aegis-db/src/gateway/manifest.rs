use aegis_commons::error::CoreError;
use aegis_commons::models::manifest::RelayManifestEntry;
use chrono::Utc;

use super::Gateway;

impl Gateway {
    /// Implements `spec.md` §4.5 `GetManifest`.
    pub async fn get_manifest(&self) -> Result<Vec<RelayManifestEntry>, CoreError> {
        sqlx::query_as::<_, RelayManifestEntry>(
            "SELECT region, ami_id, default_instance_type, updated_at \
             FROM relay_manifests ORDER BY region",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(log_db_err("get_manifest"))
    }

    pub async fn upsert_manifest_entry(&self, entry: &RelayManifestEntry) -> Result<(), CoreError> {
        sqlx::query(
            "INSERT INTO relay_manifests (region, ami_id, default_instance_type, updated_at) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (region) DO UPDATE SET \
             ami_id = EXCLUDED.ami_id, \
             default_instance_type = EXCLUDED.default_instance_type, \
             updated_at = EXCLUDED.updated_at",
        )
        .bind(&entry.region)
        .bind(&entry.ami_id)
        .bind(&entry.default_instance_type)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(log_db_err("upsert_manifest_entry"))?;
        Ok(())
    }
}

fn log_db_err(context: &'static str) -> impl Fn(sqlx::Error) -> CoreError {
    move |e| {
        tracing::error!(cause = %e, context, "database operation failed");
        CoreError::Internal(e.to_string())
    }
}
