use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub redis: Option<RedisConfig>,
    pub supplier: SupplierConfig,
    #[serde(default)]
    pub business_rules: BusinessRules,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
    /// Abandoned drafts expire after this long
    #[serde(default = "default_draft_ttl")]
    pub draft_ttl_seconds: u64,
}

fn default_draft_ttl() -> u64 { 7 * 24 * 3600 }

#[derive(Debug, Deserialize, Clone)]
pub struct SupplierConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Serve the flow from the in-process mock supplier
    #[serde(default)]
    pub mock: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    #[serde(default = "default_markup")]
    pub markup_rate: f64,
    #[serde(default = "default_pickup")]
    pub default_pickup_location: String,
}

fn default_markup() -> f64 { 0.15 }
fn default_pickup() -> String { "MEETING_POINT".to_string() }

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            markup_rate: default_markup(),
            default_pickup_location: default_pickup(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TimeoutConfig {
    #[serde(default = "default_voucher_seconds")]
    pub voucher_seconds: u64,
    #[serde(default = "default_supplier_seconds")]
    pub supplier_seconds: u64,
}

fn default_voucher_seconds() -> u64 { 10 }
fn default_supplier_seconds() -> u64 { 15 }

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            voucher_seconds: default_voucher_seconds(),
            supplier_seconds: default_supplier_seconds(),
        }
    }
}

impl TimeoutConfig {
    pub fn voucher(&self) -> Duration {
        Duration::from_secs(self.voucher_seconds)
    }

    /// Availability, order and payment calls
    pub fn supplier(&self) -> Duration {
        Duration::from_secs(self.supplier_seconds)
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides are optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local, never checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `TOURBOOK_SUPPLIER__BASE_URL=...`
            .add_source(config::Environment::with_prefix("TOURBOOK").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_optional_sections() {
        let cfg: Config = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                [server]
                port = 8080

                [supplier]
                base_url = "https://supplier.test/v3"
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert!(cfg.redis.is_none());
        assert!(!cfg.supplier.mock);
        assert_eq!(cfg.business_rules.markup_rate, 0.15);
        assert_eq!(cfg.timeouts.voucher(), Duration::from_secs(10));
        assert_eq!(cfg.timeouts.supplier(), Duration::from_secs(15));
    }
}
