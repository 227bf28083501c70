use crate::error::AppError;
use crate::infrastructure::repositories::ProviderError;

/// Outcome of a single provider call after timeout racing and retries
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SynthesisError {
    #[error("provider call timed out")]
    Timeout,
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("provider server error {status}: {message}")]
    ServerError { status: u16, message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("no audio content returned")]
    NoContent,
    #[error("aborted")]
    Aborted,
}

impl SynthesisError {
    /// Rate limits, 5xx responses, timeouts and transport failures are worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SynthesisError::Timeout
                | SynthesisError::RateLimited(_)
                | SynthesisError::ServerError { .. }
                | SynthesisError::Network(_)
        )
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, SynthesisError::RateLimited(_))
    }
}

impl From<ProviderError> for SynthesisError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Status { status: 429, message } => SynthesisError::RateLimited(message),
            ProviderError::Status { status, message } if (500..=599).contains(&status) => {
                SynthesisError::ServerError { status, message }
            }
            ProviderError::Status { status, message } => {
                SynthesisError::Rejected(format!("status {}: {}", status, message))
            }
            ProviderError::Transport(msg) => SynthesisError::Network(msg),
            ProviderError::EmptyAudio => SynthesisError::NoContent,
            ProviderError::Malformed(msg) => SynthesisError::Rejected(msg),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TtsServiceError {
    #[error("synthesis aborted")]
    Aborted,
    #[error("synthesis failed at segment(s) {}", format_indices(.indices))]
    SegmentExhausted { indices: Vec<usize> },
    #[error("no content: {0}")]
    NoContent(String),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("dependency error: {0}")]
    Dependency(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn format_indices(indices: &[usize]) -> String {
    indices
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<SynthesisError> for TtsServiceError {
    fn from(err: SynthesisError) -> Self {
        match err {
            SynthesisError::Aborted => TtsServiceError::Aborted,
            SynthesisError::NoContent => {
                TtsServiceError::NoContent("provider returned no audio".to_string())
            }
            other => TtsServiceError::Dependency(other.to_string()),
        }
    }
}

impl From<TtsServiceError> for AppError {
    fn from(err: TtsServiceError) -> Self {
        match err {
            TtsServiceError::Aborted => AppError::Cancelled,
            TtsServiceError::SegmentExhausted { .. } => AppError::ExternalService(err.to_string()),
            TtsServiceError::NoContent(msg) | TtsServiceError::Invalid(msg) => {
                AppError::BadRequest(msg)
            }
            TtsServiceError::NotFound(msg) => AppError::NotFound(msg),
            TtsServiceError::Dependency(msg) => AppError::ExternalService(msg),
            TtsServiceError::Other(e) => AppError::Internal(e.to_string()),
        }
    }
}
