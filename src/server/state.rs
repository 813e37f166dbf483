use std::sync::Arc;

use crate::auth::ApiKeyAuthenticator;
use crate::config::Settings;
use crate::error::Result;
use crate::mail::{create_mail_transport, MailDispatcher, MailTransport};
use crate::pipeline::Pipeline;
use crate::ratelimit::RateLimiter;
use crate::template::TemplateRenderer;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub rate_limiter: Arc<RateLimiter>,
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    /// Build the state with the transport selected in configuration
    pub fn new(settings: Settings) -> Result<Self> {
        let transport = create_mail_transport(&settings.mail)?;
        Self::with_transport(settings, transport)
    }

    /// Build the state around an existing transport
    pub fn with_transport(settings: Settings, transport: Arc<dyn MailTransport>) -> Result<Self> {
        let authenticator = ApiKeyAuthenticator::new(&settings.api)?;
        if !authenticator.is_enforced() {
            tracing::warn!("No API key configured; /send-email accepts every caller");
        }

        let rate_limiter = Arc::new(RateLimiter::new(settings.rate_limit.clone()));
        let renderer = TemplateRenderer::new(&settings.templates);
        let dispatcher = MailDispatcher::new(&settings.mail, transport)?;
        let transport_name = dispatcher.transport_name();

        let stages = Pipeline::parse_stages(&settings.pipeline.stages)?;
        let pipeline = Pipeline::new(
            stages,
            authenticator,
            rate_limiter.clone(),
            renderer,
            dispatcher,
        )?;

        tracing::info!(
            transport = transport_name,
            stages = ?pipeline.stages().iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            "Send pipeline configured"
        );

        Ok(Self {
            settings: Arc::new(settings),
            rate_limiter,
            pipeline: Arc::new(pipeline),
        })
    }
}
