use aegis_commons::error::CoreError;
use aegis_commons::models::health::RelayHealthInput;
use aegis_commons::models::ids::SessionId;
use aegis_db::gateway::RecordHealthInput;
use aegis_db::Gateway;
use chrono::{DateTime, Utc};

/// Implements `spec.md` §4.4 `RecordRelayHealth`. Parses `observed_at`
/// (defaulting to now if the caller omits it) and defers admission to the
/// gateway's single atomic insert, which is the only place that knows
/// whether the session currently has a bound relay instance. A malformed
/// `session_id` (wrong prefix, empty) is rejected the same way an unbound
/// session is: there is no session it could legitimately refer to.
pub async fn record_relay_health(gateway: &Gateway, input: RelayHealthInput) -> Result<(), CoreError> {
    let observed_at = resolve_observed_at(input.observed_at.as_deref())?;
    let session_id: SessionId = input.session_id.parse().map_err(|e| {
        tracing::warn!(cause = %e, "relay health event rejected: malformed session id");
        CoreError::RelayHealthRejected
    })?;

    gateway
        .record_relay_health(RecordHealthInput {
            session_id,
            observed_at,
            ingest_active: input.ingest_active,
            egress_active: input.egress_active,
            session_uptime_seconds: input.session_uptime_seconds.max(0),
            payload_json: input.payload,
        })
        .await
}

fn resolve_observed_at(raw: Option<&str>) -> Result<DateTime<Utc>, CoreError> {
    match raw {
        None => Ok(Utc::now()),
        Some(value) => DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                tracing::warn!(cause = %e, value, "rejected malformed observed_at timestamp");
                CoreError::RelayHealthRejected
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_observed_at_defaults_to_now() {
        let before = Utc::now();
        let resolved = resolve_observed_at(None).unwrap();
        assert!(resolved >= before);
    }

    #[test]
    fn valid_rfc3339_is_parsed() {
        let resolved = resolve_observed_at(Some("2026-01-02T03:04:05Z")).unwrap();
        assert_eq!(resolved.to_rfc3339(), "2026-01-02T03:04:05+00:00");
    }

    #[test]
    fn malformed_timestamp_is_rejected() {
        let err = resolve_observed_at(Some("not-a-timestamp")).unwrap_err();
        assert!(matches!(err, CoreError::RelayHealthRejected));
    }

    #[test]
    fn malformed_session_id_is_rejected_before_reaching_the_gateway() {
        let err = "not-a-session-id".parse::<SessionId>().unwrap_err();
        assert_eq!(err.to_string().contains("ses_"), true);
    }
}
