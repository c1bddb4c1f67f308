//! Error taxonomy for the orchestration layer.
//!
//! Raw backend error shapes are converted to [`AdapterError`] inside the
//! credential service implementations and to [`AuthError`] at the session
//! manager / verification flow boundary; nothing above that boundary sees a
//! transport error directly.

use thiserror::Error;

use crate::client::FactorKind;

/// Failures reported by a credential service implementation.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("recent authentication required")]
    ReauthRequired,
    #[error("credential service unavailable: {0}")]
    Unavailable(String),
}

/// Failures surfaced to the UI.
///
/// Recoverable variants render inline with a retry action; terminal variants
/// clear the in-progress MFA state and return the user to the sign-in form.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Bad credentials. Recoverable, the user retries.
    #[error("invalid email or password")]
    Authentication,
    /// Sign-up failed, carrying the backend's message. Recoverable.
    #[error("registration failed: {0}")]
    Registration(String),
    /// Session finalization failed after a successful code check, including
    /// the one built-in fallback reconciliation. Fatal for the attempt; the
    /// user must restart sign-in.
    #[error("could not finish sign-in after verification, sign in again")]
    MfaFinalization,
    /// No factor is usable for the current attempt. Terminal; direct the user
    /// to a recovery or administrator path.
    #[error("no verification factor available for this account")]
    NoFactorAvailable,
    /// The selected factor's type has no client-side verification path.
    /// Terminal for that factor; offer an alternate factor if one exists.
    #[error("unsupported factor type: {0}")]
    UnsupportedFactor(FactorKind),
    /// The backend requires a fresh password check before this operation.
    #[error("recent authentication required")]
    ReauthRequired,
    /// Backend or network failure with no local state mutated. Safe to retry.
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

impl AuthError {
    /// Whether the UI should offer an inline retry for this error.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Authentication | Self::Registration(_) | Self::Adapter(_)
        )
    }
}
