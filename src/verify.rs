//! MFA verification flow.
//!
//! Collects a single user-entered code, resolves which factor it applies to,
//! submits it, and reports the outcome upward. This flow never mutates the
//! session; the completion callback is where the caller plugs in the session
//! manager's finalize step.

use std::future::Future;
use std::sync::Arc;

use tracing::warn;

use crate::client::{CredentialService, Factor, FactorKind, FactorScope};
use crate::error::AuthError;
use crate::factors;

/// Minimum accepted code length. Shorter codes are rejected locally so a
/// rate-limited verification attempt is not wasted on the backend.
const MIN_CODE_LEN: usize = 6;

/// Outcome of one code submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Code accepted and the follow-up session refresh succeeded.
    Complete,
    /// Code rejected: wrong, expired, already consumed, or too short to send.
    CodeRejected,
    /// Code accepted but the follow-up session refresh failed. The user must
    /// sign in again; re-entering the already-correct code would only consume
    /// another attempt.
    SessionRefreshFailed,
}

/// Resolve which factor a submission applies to.
///
/// An explicit caller choice wins when it names an available factor;
/// otherwise the registry's deterministic default applies. An empty list
/// is terminal for the attempt: the UI directs the user to a recovery or
/// administrator path rather than retrying.
pub fn select_factor<'a>(
    available: &'a [Factor],
    explicit: Option<&str>,
) -> Result<&'a Factor, AuthError> {
    if let Some(id) = explicit {
        if let Some(factor) = available.iter().find(|factor| factor.id == id) {
            return Ok(factor);
        }
    }
    factors::default_factor(available).ok_or(AuthError::NoFactorAvailable)
}

/// Drives verification for one challenge.
pub struct MfaVerifier<S: ?Sized> {
    service: Arc<S>,
}

impl<S: CredentialService + ?Sized> MfaVerifier<S> {
    #[must_use]
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }

    /// Factors usable for the current attempt, verified scope first.
    ///
    /// The verified listing is best-effort (it only exists for re-enrollment
    /// flows); the pending listing must succeed.
    pub async fn available_factors(&self) -> Result<Vec<Factor>, AuthError> {
        let verified = match self.service.list_factors(FactorScope::Verified).await {
            Ok(listed) => listed,
            Err(err) => {
                warn!("listing verified factors failed: {err}");
                Vec::new()
            }
        };
        let pending = self
            .service
            .list_factors(FactorScope::Pending)
            .await
            .map_err(AuthError::Adapter)?;
        Ok(factors::usable_factors(&verified, &pending))
    }

    /// Submit one user-entered code against `factor`.
    ///
    /// `complete` runs only after the backend accepts the code and is
    /// expected to perform the second-phase session establishment (the
    /// session manager's MFA finalize). Its boolean result is surfaced
    /// distinctly so a correct code is never blamed for a failed refresh.
    ///
    /// Codes are single-use: resubmitting an already-consumed code is a
    /// normal [`VerifyOutcome::CodeRejected`], never a crash.
    pub async fn submit_code<F, Fut>(
        &self,
        factor: &Factor,
        code: &str,
        complete: F,
    ) -> Result<VerifyOutcome, AuthError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = bool>,
    {
        let code = code.trim();
        if code.len() < MIN_CODE_LEN {
            return Ok(VerifyOutcome::CodeRejected);
        }

        match factor.kind {
            FactorKind::Totp => {}
            // Recognized but not implemented end-to-end; never silently no-op.
            FactorKind::Sms => return Err(AuthError::UnsupportedFactor(FactorKind::Sms)),
        }

        match self.service.verify_totp(&factor.id, code).await {
            Ok(true) => {
                if complete().await {
                    Ok(VerifyOutcome::Complete)
                } else {
                    warn!(factor_id = %factor.id, "code accepted but session refresh failed");
                    Ok(VerifyOutcome::SessionRefreshFailed)
                }
            }
            Ok(false) => Ok(VerifyOutcome::CodeRejected),
            Err(err) => Err(AuthError::Adapter(err)),
        }
    }
}
