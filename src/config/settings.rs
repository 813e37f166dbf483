use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

use crate::ratelimit::RateLimitConfig;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub templates: TemplateConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub otel: OtelConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum accepted request body size in bytes
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Shared secret expected in `key_header`. Unset means every caller is allowed.
    pub key: Option<String>,
    #[serde(default = "default_key_header")]
    pub key_header: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateConfig {
    /// Directory holding one file per template
    #[serde(default = "default_template_dir")]
    pub dir: String,
    #[serde(default = "default_template_extension")]
    pub extension: String,
    /// Fail rendering when a template references a missing variable
    #[serde(default)]
    pub strict: bool,
}

/// Which outbound transport hands messages off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailTransportKind {
    #[default]
    Smtp,
    /// Log the envelope and drop the message
    Log,
    /// Keep messages in memory (tests)
    Memory,
}

/// SMTP connection security
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    /// Plain text only
    None,
    /// Upgrade with STARTTLS when the server offers it
    #[default]
    Opportunistic,
    /// Require STARTTLS
    StartTls,
    /// Implicit TLS from the first byte (port 465)
    Tls,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    #[serde(default)]
    pub transport: MailTransportKind,
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_mail_port")]
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub tls: TlsMode,
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// Sender address; falls back to `username`
    pub from_address: Option<String>,
    /// SMTP command timeout in seconds
    #[serde(default = "default_mail_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Ordered stage names run for every send request
    #[serde(default = "default_stages")]
    pub stages: Vec<String>,
}

/// Log line format on stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_otel_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_body_limit() -> usize {
    1024 * 1024 // 1 MiB
}

fn default_key_header() -> String {
    "x-api-key".to_string()
}

fn default_template_dir() -> String {
    "templates".to_string()
}

fn default_template_extension() -> String {
    "hbs".to_string()
}

fn default_mail_port() -> u16 {
    587
}

fn default_from_name() -> String {
    "My App".to_string()
}

fn default_mail_timeout() -> u64 {
    30
}

pub fn default_stages() -> Vec<String> {
    ["authenticate", "rate_limit", "validate", "render", "dispatch"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    "templated-mailer".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

/// Check if running in production mode (based on RUN_MODE env var)
pub fn is_production() -> bool {
    env::var("RUN_MODE")
        .map(|m| m == "production" || m == "prod")
        .unwrap_or(false)
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // MAILER_SERVER__PORT, MAILER_MAIL__HOST, MAILER_PIPELINE__STAGES=a,b,c ...
            .add_source(
                Environment::with_prefix("MAILER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("pipeline.stages"),
            )
            // Short names used by existing deployments
            .set_override_option("server.port", env::var("PORT").ok())?
            .set_override_option("api.key", env::var("API_KEY").ok())?
            .set_override_option("mail.host", env::var("EMAIL_HOST").ok())?
            .set_override_option("mail.port", env::var("EMAIL_PORT").ok())?
            .set_override_option("mail.username", env::var("EMAIL_USER").ok())?
            .set_override_option("mail.password", env::var("EMAIL_PASS").ok())?;

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate(is_production())?;
        Ok(settings)
    }

    /// Reject configurations the service cannot run with.
    pub fn validate(&self, production: bool) -> Result<(), ConfigError> {
        if production && self.api.secret().is_none() {
            return Err(ConfigError::Message(
                "api.key must be set when RUN_MODE is production".to_string(),
            ));
        }
        if self.rate_limit.max_requests == 0 || self.rate_limit.window_seconds == 0 {
            return Err(ConfigError::Message(
                "rate_limit.max_requests and rate_limit.window_seconds must be greater than zero"
                    .to_string(),
            ));
        }
        if self.mail.transport == MailTransportKind::Smtp && self.mail.host.trim().is_empty() {
            return Err(ConfigError::Message(
                "mail.host is required for the smtp transport".to_string(),
            ));
        }
        Ok(())
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl ApiConfig {
    /// The configured secret, treating an empty string as unset
    pub fn secret(&self) -> Option<&str> {
        self.key.as_deref().filter(|k| !k.is_empty())
    }
}

impl MailConfig {
    /// Address used in the `From` header
    pub fn sender_address(&self) -> String {
        self.from_address
            .as_deref()
            .or(self.username.as_deref())
            .filter(|a| !a.is_empty())
            .unwrap_or("noreply@localhost")
            .to_string()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: None,
            key_header: default_key_header(),
        }
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            dir: default_template_dir(),
            extension: default_template_extension(),
            strict: false,
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            transport: MailTransportKind::default(),
            host: String::new(),
            port: default_mail_port(),
            username: None,
            password: None,
            tls: TlsMode::default(),
            from_name: default_from_name(),
            from_address: None,
            timeout_seconds: default_mail_timeout(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stages: default_stages(),
        }
    }
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_otel_endpoint(),
            service_name: default_service_name(),
            sampling_ratio: default_sampling_ratio(),
        }
    }
}
