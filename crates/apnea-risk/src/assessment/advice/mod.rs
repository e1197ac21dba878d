//! Optional narrative advice for a risk category.
//!
//! The generative text service is untrusted and possibly slow, so every call is
//! time-bounded, retried at most once, and failures collapse to "no advice".

mod gemini;

pub use gemini::GeminiClient;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use super::category::RiskCategory;
use crate::config::AdviceConfig;

/// Prompt-in, text-out capability of an external generative text service.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, AdviceError>> + Send;
}

/// Failure of the external advice call. Always recovered locally.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdviceError {
    #[error("advice request timed out")]
    Timeout,
    #[error("advice transport failure: {0}")]
    Transport(String),
    #[error("advice service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("advice service returned a malformed response: {0}")]
    MalformedResponse(String),
    #[error("advice service returned no text")]
    EmptyResponse,
}

impl AdviceError {
    /// Whether a single immediate retry has a reasonable chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        match self {
            AdviceError::Timeout | AdviceError::Transport(_) => true,
            AdviceError::Status { status, .. } => *status >= 500,
            AdviceError::MalformedResponse(_) | AdviceError::EmptyResponse => false,
        }
    }
}

/// Builds the supportive-explanation prompt for a category.
pub fn build_prompt(category: RiskCategory) -> String {
    format!(
        "A user has been classified as having {} for sleep apnea based on several lifestyle factors.\n\n\
         Please explain what this means in simple, encouraging terms and give personalized, \
         practical tips they can follow.\n\
         Make sure the tone is warm and supportive.",
        category.label().to_lowercase()
    )
}

/// Wraps a [`TextGenerator`] with a per-attempt time bound and a single retry.
pub struct AdviceGenerator<G> {
    generator: Arc<G>,
    attempt_timeout: Duration,
    retry_backoff: Option<Duration>,
}

impl<G> AdviceGenerator<G>
where
    G: TextGenerator + 'static,
{
    pub fn new(
        generator: Arc<G>,
        attempt_timeout: Duration,
        retry_backoff: Option<Duration>,
    ) -> Self {
        Self {
            generator,
            attempt_timeout,
            retry_backoff,
        }
    }

    pub fn from_config(generator: Arc<G>, config: &AdviceConfig) -> Self {
        let retry_backoff = config.retry.then_some(config.retry_backoff);
        Self::new(generator, config.timeout, retry_backoff)
    }

    /// Request advice, surfacing the final error to the caller.
    pub async fn request(&self, category: RiskCategory) -> Result<String, AdviceError> {
        let prompt = build_prompt(category);

        let first = self.attempt(&prompt).await;
        let error = match first {
            Ok(text) => return Ok(text),
            Err(error) => error,
        };

        match self.retry_backoff {
            Some(backoff) if error.is_retryable() => {
                warn!(%error, ?backoff, "advice attempt failed, retrying once");
                sleep(backoff).await;
                self.attempt(&prompt).await
            }
            _ => Err(error),
        }
    }

    /// Request advice, degrading any failure to `None`.
    pub async fn advise(&self, category: RiskCategory) -> Option<String> {
        match self.request(category).await {
            Ok(text) => {
                debug!(%category, chars = text.len(), "advice generated");
                Some(text)
            }
            Err(error) => {
                warn!(%category, %error, "advice unavailable, continuing without narrative");
                None
            }
        }
    }

    async fn attempt(&self, prompt: &str) -> Result<String, AdviceError> {
        let text = timeout(self.attempt_timeout, self.generator.generate(prompt))
            .await
            .map_err(|_| AdviceError::Timeout)??;
        let text = text.trim();
        if text.is_empty() {
            return Err(AdviceError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}

impl<G> std::fmt::Debug for AdviceGenerator<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdviceGenerator")
            .field("attempt_timeout", &self.attempt_timeout)
            .field("retry_backoff", &self.retry_backoff)
            .finish_non_exhaustive()
    }
}
