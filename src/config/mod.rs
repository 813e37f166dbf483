mod settings;

pub use settings::{
    default_stages, is_production, ApiConfig, LogConfig, LogFormat, MailConfig, MailTransportKind, OtelConfig,
    PipelineConfig, ServerConfig, Settings, TemplateConfig, TlsMode,
};
pub use crate::ratelimit::RateLimitConfig;
