//! Orchestration configuration.

use std::time::Duration;

use url::Url;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_VERIFY_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the session manager and credential service clients.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    base_url: Url,
    request_timeout: Duration,
    verify_timeout: Duration,
}

impl AuthConfig {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            verify_timeout: DEFAULT_VERIFY_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Deadline applied to finalize and fallback calls during MFA sign-in.
    /// An elapsed deadline surfaces as a recoverable adapter failure.
    #[must_use]
    pub fn with_verify_timeout(mut self, timeout: Duration) -> Self {
        self.verify_timeout = timeout;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    #[must_use]
    pub fn verify_timeout(&self) -> Duration {
        self.verify_timeout
    }
}
