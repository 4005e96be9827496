use std::net::SocketAddr;
use std::time::Duration;

use clap::{Args, ValueEnum};

use crate::error::AppError;
use crate::models::ModelPricing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Hosted Responses API with optional web search.
    Primary,
    /// Plain JSON endpoint taking conversational content.
    Secondary,
}

/// Raw settings as read from flags and the environment.
#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    /// Credential for the primary backend.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Which backend answers model calls.
    #[arg(long, env = "SERVICEGPT_BACKEND", value_enum, default_value = "primary")]
    pub backend: Backend,

    #[arg(long, env = "SERVICEGPT_PRIMARY_MODEL", default_value = "gpt-4o")]
    pub primary_model: String,

    #[arg(
        long,
        env = "SERVICEGPT_PRIMARY_BASE_URL",
        default_value = "https://api.openai.com/v1"
    )]
    pub primary_base_url: String,

    #[arg(long, env = "SECONDARY_API_KEY", hide_env_values = true)]
    pub secondary_api_key: Option<String>,

    #[arg(long, env = "SECONDARY_API_URL")]
    pub secondary_api_url: Option<String>,

    #[arg(long, env = "SECONDARY_MODEL")]
    pub secondary_model: Option<String>,

    /// Header that carries the secondary credential.
    #[arg(long, env = "SECONDARY_API_KEY_HEADER", default_value = "x-goog-api-key")]
    pub secondary_api_key_header: String,

    /// Address to bind the HTTP server to (host:port).
    #[arg(long, env = "SERVICEGPT_BIND", default_value = "0.0.0.0:8000")]
    pub bind: String,

    /// Milliseconds before a model call times out.
    #[arg(long, env = "SERVICEGPT_TIMEOUT_MS", default_value_t = 120_000)]
    pub timeout_ms: u64,

    /// Largest provider count a client may request.
    #[arg(long, env = "SERVICEGPT_MAX_COUNT", default_value_t = 20)]
    pub max_count: usize,

    /// Browser origins allowed by CORS.
    #[arg(
        long,
        env = "SERVICEGPT_CORS_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:3000,http://localhost:5173"
    )]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PrimaryConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct SecondaryConfig {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub api_key_header: String,
}

/// Process-wide settings, fixed at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: Backend,
    pub primary: PrimaryConfig,
    pub secondary: Option<SecondaryConfig>,
    pub bind: SocketAddr,
    pub timeout: Duration,
    pub max_count: usize,
    pub cors_origins: Vec<String>,
    pub pricing: ModelPricing,
}

impl AppConfig {
    pub fn from_args(args: ConfigArgs) -> Result<Self, AppError> {
        let api_key = required(args.openai_api_key, "OPENAI_API_KEY")?;

        let secondary = match args.backend {
            Backend::Primary => None,
            Backend::Secondary => Some(SecondaryConfig {
                api_key: required(args.secondary_api_key, "SECONDARY_API_KEY")?,
                api_url: required(args.secondary_api_url, "SECONDARY_API_URL")?,
                model: required(args.secondary_model, "SECONDARY_MODEL")?,
                api_key_header: args.secondary_api_key_header,
            }),
        };

        let bind: SocketAddr = args
            .bind
            .parse()
            .map_err(|_| AppError::Config(format!("invalid bind address {}", args.bind)))?;

        let cors_origins = args
            .cors_origins
            .into_iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        Ok(Self {
            backend: args.backend,
            primary: PrimaryConfig {
                api_key,
                model: args.primary_model,
                base_url: args.primary_base_url,
            },
            secondary,
            bind,
            timeout: Duration::from_millis(args.timeout_ms.max(1)),
            max_count: args.max_count.max(1),
            cors_origins,
            pricing: ModelPricing::default(),
        })
    }

    /// Model identifier sent to whichever backend is active.
    pub fn model_name(&self) -> &str {
        match (&self.backend, &self.secondary) {
            (Backend::Secondary, Some(secondary)) => &secondary.model,
            _ => &self.primary.model,
        }
    }
}

#[cfg(test)]
impl AppConfig {
    /// Primary-backend settings pointing at `base_url`.
    pub(crate) fn for_tests(base_url: &str) -> Self {
        Self {
            backend: Backend::Primary,
            primary: PrimaryConfig {
                api_key: "sk-test".into(),
                model: "gpt-4o".into(),
                base_url: base_url.into(),
            },
            secondary: None,
            bind: SocketAddr::from(([127, 0, 0, 1], 0)),
            timeout: Duration::from_secs(5),
            max_count: 20,
            cors_origins: Vec::new(),
            pricing: ModelPricing::default(),
        }
    }
}

fn required(value: Option<String>, var: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Config(format!("{} environment variable is not set", var)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ConfigArgs {
        ConfigArgs {
            openai_api_key: Some("sk-test".into()),
            backend: Backend::Primary,
            primary_model: "gpt-4o".into(),
            primary_base_url: "https://api.openai.com/v1".into(),
            secondary_api_key: None,
            secondary_api_url: None,
            secondary_model: None,
            secondary_api_key_header: "x-goog-api-key".into(),
            bind: "127.0.0.1:8000".into(),
            timeout_ms: 120_000,
            max_count: 20,
            cors_origins: vec!["http://localhost:3000".into(), " ".into()],
        }
    }

    #[test]
    fn missing_primary_key_is_fatal() {
        let mut a = args();
        a.openai_api_key = Some("   ".into());
        let err = AppConfig::from_args(a).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn secondary_requires_its_settings() {
        let mut a = args();
        a.backend = Backend::Secondary;
        a.secondary_api_key = Some("key".into());
        let err = AppConfig::from_args(a).unwrap_err();
        assert!(err.to_string().contains("SECONDARY_API_URL"));
    }

    #[test]
    fn model_name_follows_backend() {
        let config = AppConfig::from_args(args()).unwrap();
        assert_eq!(config.model_name(), "gpt-4o");
        assert!(config.secondary.is_none());
        assert_eq!(config.cors_origins, vec!["http://localhost:3000"]);

        let mut a = args();
        a.backend = Backend::Secondary;
        a.secondary_api_key = Some("key".into());
        a.secondary_api_url = Some("https://example.test/v1beta/models/gemini-pro:generateContent".into());
        a.secondary_model = Some("gemini-2.0-flash".into());
        let config = AppConfig::from_args(a).unwrap();
        assert_eq!(config.model_name(), "gemini-2.0-flash");
    }

    #[test]
    fn parses_from_flags() {
        use clap::Parser;

        #[derive(Parser)]
        struct Harness {
            #[command(flatten)]
            config: ConfigArgs,
        }

        let harness = Harness::try_parse_from([
            "servicegpt",
            "--openai-api-key",
            "sk-flag",
            "--backend",
            "primary",
            "--bind",
            "127.0.0.1:0",
            "--timeout-ms",
            "1000",
            "--cors-origins",
            "http://a.test,http://b.test",
            "--max-count",
            "0",
        ])
        .unwrap();
        let config = AppConfig::from_args(harness.config).unwrap();
        assert_eq!(config.primary.api_key, "sk-flag");
        assert_eq!(config.cors_origins.len(), 2);
        assert_eq!(config.max_count, 1);
    }
}
