use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::http::HeaderMap;

use super::stage::{check_order, PipelineError, Stage};
use crate::auth::ApiKeyAuthenticator;
use crate::email::{DeliveryResult, RenderedMessage, SendEmailRequest};
use crate::error::AppError;
use crate::mail::MailDispatcher;
use crate::metrics::{DeliveryMetrics, RateLimitMetrics};
use crate::ratelimit::{RateLimitResult, RateLimiter};
use crate::template::TemplateRenderer;
use crate::validation;

/// Everything a stage may look at from the inbound request
pub struct SendInput<'a> {
    pub headers: &'a HeaderMap,
    /// Client identity used by the rate limiter
    pub client_ip: IpAddr,
    /// Raw JSON body, parsed by the validate stage
    pub body: &'a [u8],
}

/// Result of one pipeline run
#[derive(Debug)]
pub struct PipelineOutcome {
    pub result: Result<DeliveryResult, AppError>,
    /// Set when the rate limit stage ran, whatever happened afterwards
    pub rate_limit: Option<RateLimitResult>,
}

/// Runs the configured stages in order, stopping at the first failure.
pub struct Pipeline {
    stages: Vec<Stage>,
    authenticator: ApiKeyAuthenticator,
    rate_limiter: Arc<RateLimiter>,
    renderer: TemplateRenderer,
    dispatcher: MailDispatcher,
}

impl Pipeline {
    pub fn new(
        stages: Vec<Stage>,
        authenticator: ApiKeyAuthenticator,
        rate_limiter: Arc<RateLimiter>,
        renderer: TemplateRenderer,
        dispatcher: MailDispatcher,
    ) -> Result<Self, PipelineError> {
        check_order(&stages)?;

        Ok(Self {
            stages,
            authenticator,
            rate_limiter,
            renderer,
            dispatcher,
        })
    }

    /// Parse stage names as they appear in configuration
    pub fn parse_stages<S: AsRef<str>>(names: &[S]) -> Result<Vec<Stage>, PipelineError> {
        names.iter().map(|name| name.as_ref().parse()).collect()
    }

    /// The active stage order
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub async fn run(&self, input: SendInput<'_>) -> PipelineOutcome {
        let mut rate_limit = None;
        let result = self.run_stages(&input, &mut rate_limit).await;
        PipelineOutcome { result, rate_limit }
    }

    async fn run_stages(
        &self,
        input: &SendInput<'_>,
        rate_limit: &mut Option<RateLimitResult>,
    ) -> Result<DeliveryResult, AppError> {
        let mut request: Option<SendEmailRequest> = None;
        let mut rendered: Option<RenderedMessage> = None;
        let mut delivery: Option<DeliveryResult> = None;

        for stage in &self.stages {
            match stage {
                Stage::Authenticate => {
                    self.authenticator.authenticate(input.headers)?;
                }
                Stage::RateLimit => {
                    if !self.rate_limiter.is_enabled() {
                        continue;
                    }

                    // Counted even if a later stage fails
                    let decision = self.rate_limiter.check(input.client_ip);
                    if decision.is_allowed() {
                        RateLimitMetrics::record_allowed();
                    } else {
                        RateLimitMetrics::record_denied();
                        tracing::warn!(ip = %input.client_ip, "Rate limit exceeded");
                    }
                    *rate_limit = Some(decision.clone());
                    decision.into_result()?;
                }
                Stage::Validate => {
                    request = Some(validation::validate_json(input.body)?);
                }
                Stage::Render => {
                    let req = request.as_ref().ok_or(PipelineError::MissingInput {
                        stage: Stage::Render,
                        needs: Stage::Validate,
                    })?;

                    let start = Instant::now();
                    let html = self.renderer.render(&req.template, &req.variables).await;
                    DeliveryMetrics::observe_render(start.elapsed());

                    rendered = Some(RenderedMessage {
                        to: req.to.clone(),
                        subject: req.subject.clone(),
                        html: html?,
                    });
                }
                Stage::Dispatch => {
                    let message = rendered.as_ref().ok_or(PipelineError::MissingInput {
                        stage: Stage::Dispatch,
                        needs: Stage::Render,
                    })?;

                    let start = Instant::now();
                    let sent = self.dispatcher.send(message).await;
                    DeliveryMetrics::observe_dispatch(start.elapsed());

                    delivery = Some(sent?);
                }
            }
            tracing::debug!(stage = %stage, "Pipeline stage passed");
        }

        delivery.ok_or_else(|| {
            AppError::Pipeline(PipelineError::MissingStage(Stage::Dispatch))
        })
    }
}
