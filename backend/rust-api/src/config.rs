use serde::Deserialize;
use std::env;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8081";
const DEFAULT_KIDEMIA_API_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_MAX_CSV_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub bind_addr: String,
    pub kidemia_api: KidemiaApiConfig,
    pub authoring: AuthoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KidemiaApiConfig {
    pub url: String,
    /// Bearer token forwarded to the Kidemia API.
    pub token: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthoringConfig {
    /// Upper bound for an uploaded CSV body.
    pub max_csv_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            kidemia_api: KidemiaApiConfig {
                url: DEFAULT_KIDEMIA_API_URL.to_string(),
                token: None,
                timeout_secs: DEFAULT_TIMEOUT_SECS,
            },
            authoring: AuthoringConfig {
                max_csv_bytes: DEFAULT_MAX_CSV_BYTES,
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // config/<env>.toml, then APP__SECTION__KEY overrides
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let bind_addr = settings
            .get_string("server.bind_addr")
            .or_else(|_| env::var("BIND_ADDR"))
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        let url = settings
            .get_string("kidemia_api.url")
            .or_else(|_| env::var("KIDEMIA_API_URL"))
            .unwrap_or_else(|_| DEFAULT_KIDEMIA_API_URL.to_string());

        let token = settings
            .get_string("kidemia_api.token")
            .or_else(|_| env::var("KIDEMIA_API_TOKEN"))
            .ok()
            .filter(|token| !token.is_empty());
        if token.is_none() {
            tracing::warn!("KIDEMIA_API_TOKEN not set, upstream calls will be anonymous");
        }

        let timeout_secs = settings
            .get_int("kidemia_api.timeout_secs")
            .ok()
            .and_then(|secs| u64::try_from(secs).ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let max_csv_bytes = settings
            .get_int("authoring.max_csv_bytes")
            .ok()
            .and_then(|bytes| usize::try_from(bytes).ok())
            .filter(|bytes| *bytes > 0)
            .unwrap_or(DEFAULT_MAX_CSV_BYTES);

        Ok(Config {
            bind_addr,
            kidemia_api: KidemiaApiConfig {
                url: url.trim_end_matches('/').to_string(),
                token,
                timeout_secs,
            },
            authoring: AuthoringConfig { max_csv_bytes },
        })
    }
}
