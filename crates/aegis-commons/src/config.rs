use clap::Parser;

/// Process configuration, loaded from environment variables (with CLI overrides),
/// following the twelve-factor convention used across the retrieved pack's
/// standalone services rather than the teacher's desktop-config-file approach,
/// since this is a server process, not a user-facing app.
#[derive(Debug, Clone, Parser)]
#[command(name = "aegis-server", about = "Aegis relay control plane")]
pub struct AppConfig {
    /// Postgres connection string.
    #[arg(long, env = "AEGIS_DATABASE_URL")]
    pub database_url: String,

    /// Address the HTTP server binds to.
    #[arg(long, env = "AEGIS_BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind_addr: String,

    /// Default region used when a start request omits one or requests "auto".
    #[arg(long, env = "AEGIS_DEFAULT_REGION", default_value = "us-east-1")]
    pub default_region: String,

    /// Comma-separated list of regions this deployment supports.
    #[arg(
        long,
        env = "AEGIS_SUPPORTED_REGIONS",
        default_value = "us-east-1,us-west-2,eu-west-1",
        value_delimiter = ','
    )]
    pub supported_regions: Vec<String>,

    /// HMAC secret used to verify bearer JWTs on user-facing endpoints.
    #[arg(long, env = "AEGIS_JWT_SECRET")]
    pub jwt_secret: String,

    /// Shared secret relays present via `X-Relay-Auth` on the health endpoint.
    #[arg(long, env = "AEGIS_RELAY_AUTH_SECRET")]
    pub relay_auth_secret: String,

    /// Base URL of the external provisioner's HTTP facade.
    #[arg(long, env = "AEGIS_PROVISIONER_BASE_URL")]
    pub provisioner_base_url: String,

    /// Max connections in the Postgres pool.
    #[arg(long, env = "AEGIS_DB_MAX_CONNECTIONS", default_value_t = 10)]
    pub db_max_connections: u32,
}

impl AppConfig {
    pub fn region_or_default(&self, preference: &str) -> String {
        let trimmed = preference.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("auto") {
            return self.default_region.clone();
        }
        if self
            .supported_regions
            .iter()
            .any(|r| r.eq_ignore_ascii_case(trimmed))
        {
            trimmed.to_string()
        } else {
            self.default_region.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig {
            database_url: "postgres://localhost/aegis".into(),
            bind_addr: "0.0.0.0:8080".into(),
            default_region: "us-east-1".into(),
            supported_regions: vec!["us-east-1".into(), "us-west-2".into()],
            jwt_secret: "secret".into(),
            relay_auth_secret: "relay-secret".into(),
            provisioner_base_url: "http://localhost:9999".into(),
            db_max_connections: 10,
        }
    }

    #[test]
    fn empty_preference_falls_back_to_default() {
        let cfg = base_config();
        assert_eq!(cfg.region_or_default(""), "us-east-1");
        assert_eq!(cfg.region_or_default("auto"), "us-east-1");
        assert_eq!(cfg.region_or_default("AUTO"), "us-east-1");
    }

    #[test]
    fn supported_preference_is_kept() {
        let cfg = base_config();
        assert_eq!(cfg.region_or_default("us-west-2"), "us-west-2");
    }

    #[test]
    fn unsupported_preference_falls_back_to_default() {
        let cfg = base_config();
        assert_eq!(cfg.region_or_default("ap-south-1"), "us-east-1");
    }
}
