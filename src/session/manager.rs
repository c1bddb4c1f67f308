//! The session state machine and its single writer.

use std::future::Future;
use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{info, warn};

use super::AuthConfig;
use crate::client::{
    CredentialService, Factor, FactorScope, Identity, MfaChallenge, PasswordSignIn, SignUpProfile,
    TotpEnrollment,
};
use crate::error::{AdapterError, AuthError};
use crate::factors;

/// The identity session as a tagged union.
///
/// Illegal combinations (a fully trusted user with an outstanding MFA
/// requirement) are unrepresentable: a user is only ever carried by
/// [`Self::Authenticated`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Startup hydration from any existing backend session is in flight.
    Hydrating,
    Anonymous,
    Authenticated(Identity),
    /// Password accepted, a second factor is outstanding. Not trusted.
    MfaPending {
        challenge: MfaChallenge,
        factors: Vec<Factor>,
    },
    /// A successful code check is being upgraded to a trusted session.
    MfaFinalizing {
        challenge: MfaChallenge,
        factors: Vec<Factor>,
    },
}

impl SessionState {
    /// True only during startup hydration.
    #[must_use]
    pub fn loading(&self) -> bool {
        matches!(self, Self::Hydrating)
    }

    /// Whether a second factor is outstanding. While this holds, the UI must
    /// not treat any identity as authenticated.
    #[must_use]
    pub fn mfa_required(&self) -> bool {
        matches!(self, Self::MfaPending { .. } | Self::MfaFinalizing { .. })
    }

    /// The fully trusted identity, if any.
    #[must_use]
    pub fn user(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    /// Factors usable to resolve the outstanding challenge. Empty outside of
    /// the MFA states.
    #[must_use]
    pub fn pending_factors(&self) -> &[Factor] {
        match self {
            Self::MfaPending { factors, .. } | Self::MfaFinalizing { factors, .. } => factors,
            _ => &[],
        }
    }
}

/// Structured outcome of a password sign-in. An outstanding second factor is
/// a normal result, not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct SignInResult {
    pub user: Option<Identity>,
    pub mfa_required: bool,
}

/// Single authority for the identity session.
///
/// All mutation goes through this type; every other component holds a
/// [`watch::Receiver`] snapshot or calls these methods.
pub struct SessionManager<S: ?Sized> {
    service: Arc<S>,
    config: AuthConfig,
    state: watch::Sender<SessionState>,
}

impl<S: CredentialService + ?Sized> SessionManager<S> {
    #[must_use]
    pub fn new(service: Arc<S>, config: AuthConfig) -> Self {
        let (state, _) = watch::channel(SessionState::Hydrating);
        Self {
            service,
            config,
            state,
        }
    }

    /// Read-only view of the identity session. Receivers observe every
    /// transition; only this manager writes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Hydrate from any existing backend session. The session reports
    /// `loading` only while this call is in flight.
    pub async fn hydrate(&self) {
        self.state.send_replace(SessionState::Hydrating);
        match self.service.get_session().await {
            Ok(Some(user)) => {
                info!(user_id = %user.user_id, "session hydrated");
                self.state.send_replace(SessionState::Authenticated(user));
            }
            Ok(None) => {
                self.state.send_replace(SessionState::Anonymous);
            }
            Err(err) => {
                warn!("session hydration failed: {err}");
                self.state.send_replace(SessionState::Anonymous);
            }
        }
    }

    /// Password sign-in.
    ///
    /// A valid credential with an outstanding second factor yields
    /// `SignInResult { user: None, mfa_required: true }` and parks the
    /// session in the pending state; it does not error. Invalid credentials
    /// error and leave the session anonymous.
    ///
    /// A second call while one is in flight is not guarded here; callers are
    /// expected to disable resubmission while awaiting.
    pub async fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<SignInResult, AuthError> {
        match self.service.sign_in_with_password(email, password).await {
            Ok(PasswordSignIn::Session(user)) => {
                info!(user_id = %user.user_id, "signed in");
                self.state
                    .send_replace(SessionState::Authenticated(user.clone()));
                Ok(SignInResult {
                    user: Some(user),
                    mfa_required: false,
                })
            }
            Ok(PasswordSignIn::MfaChallenge(challenge)) => {
                // The listing is best-effort at this point; an empty list is
                // reported as NoFactorAvailable at verification time.
                let factors = match self.service.list_factors(FactorScope::Pending).await {
                    Ok(listed) => factors::usable_factors(&[], &listed),
                    Err(err) => {
                        warn!("listing pending factors failed: {err}");
                        Vec::new()
                    }
                };
                self.state
                    .send_replace(SessionState::MfaPending { challenge, factors });
                Ok(SignInResult {
                    user: None,
                    mfa_required: true,
                })
            }
            Err(AdapterError::InvalidCredentials) => Err(AuthError::Authentication),
            Err(err) => Err(AuthError::Adapter(err)),
        }
    }

    /// Register an account and its downstream merchant record.
    ///
    /// Success does not authenticate; the caller is expected to route back to
    /// sign-in.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &SecretString,
        profile: &SignUpProfile,
    ) -> Result<(), AuthError> {
        match self.service.sign_up(email, password, profile).await {
            Ok(user) => {
                info!(user_id = %user.user_id, "account registered");
                Ok(())
            }
            Err(err @ AdapterError::Unavailable(_)) => Err(AuthError::Adapter(err)),
            Err(err) => Err(AuthError::Registration(err.to_string())),
        }
    }

    /// Finalize a pending sign-in after a successful code check.
    ///
    /// The finalize call can fail even though the code check just succeeded
    /// (backend session propagation lag). On failure the manager queries the
    /// backend session once and, if a user is present, treats the attempt as
    /// a success anyway. The two calls run strictly sequentially and the
    /// fallback runs only after a failed finalize. Both calls run under the
    /// configured verification deadline.
    ///
    /// A fallback that definitively reports no session ends the attempt;
    /// callers show a "sign in again" message. A fallback that itself fails
    /// (transport error, elapsed deadline) surfaces the adapter error instead,
    /// since the session may still exist.
    pub async fn sign_in_with_mfa(&self) -> Result<Identity, AuthError> {
        let (challenge, factors) = match &*self.state.borrow() {
            SessionState::MfaPending { challenge, factors } => {
                (challenge.clone(), factors.clone())
            }
            _ => return Err(AuthError::MfaFinalization),
        };
        self.state.send_replace(SessionState::MfaFinalizing {
            challenge: challenge.clone(),
            factors: factors.clone(),
        });

        match self
            .with_deadline(self.service.finalize_mfa(&challenge))
            .await
        {
            Ok(user) => {
                info!(user_id = %user.user_id, "session finalized after verification");
                self.state
                    .send_replace(SessionState::Authenticated(user.clone()));
                Ok(user)
            }
            Err(err) => {
                warn!("finalize failed after successful code check: {err}");
                match self.with_deadline(self.service.get_session()).await {
                    Ok(Some(user)) => {
                        // The backend established the session despite the
                        // failed finalize call.
                        info!(user_id = %user.user_id, "session present after failed finalize");
                        self.state
                            .send_replace(SessionState::Authenticated(user.clone()));
                        Ok(user)
                    }
                    Ok(None) => {
                        self.state
                            .send_replace(SessionState::MfaPending { challenge, factors });
                        Err(AuthError::MfaFinalization)
                    }
                    Err(fallback_err) => {
                        warn!("fallback session query failed: {fallback_err}");
                        self.state
                            .send_replace(SessionState::MfaPending { challenge, factors });
                        Err(AuthError::Adapter(fallback_err))
                    }
                }
            }
        }
    }

    /// Abandon an in-progress challenge and return to anonymous.
    ///
    /// The backend sign-out is best-effort; failures are logged, never
    /// surfaced. The local challenge and factor list are always discarded, so
    /// a later sign-in starts a fresh challenge.
    pub async fn cancel_mfa(&self) {
        if let Err(err) = self.service.sign_out().await {
            warn!("sign-out during MFA cancel failed: {err}");
        }
        self.state.send_replace(SessionState::Anonymous);
    }

    /// Unconditional sign-out. Local state is cleared even when the backend
    /// call fails.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let outcome = self.service.sign_out().await;
        self.state.send_replace(SessionState::Anonymous);
        outcome.map_err(AuthError::Adapter)
    }

    /// Begin authenticator-app enrollment for the signed-in identity.
    pub async fn begin_totp_enrollment(&self) -> Result<TotpEnrollment, AuthError> {
        match self.service.enroll_totp().await {
            Ok(enrollment) => Ok(enrollment),
            Err(AdapterError::ReauthRequired) => Err(AuthError::ReauthRequired),
            Err(err) => Err(AuthError::Adapter(err)),
        }
    }

    /// Request a password-reset email. The outcome is intentionally opaque to
    /// avoid account enumeration; failures are logged only.
    pub async fn request_password_reset(&self, email: &str) {
        if let Err(err) = self.service.request_password_reset(email).await {
            warn!("password reset request failed: {err}");
        }
    }

    async fn with_deadline<T>(
        &self,
        call: impl Future<Output = Result<T, AdapterError>>,
    ) -> Result<T, AdapterError> {
        match timeout(self.config.verify_timeout(), call).await {
            Ok(result) => result,
            Err(_) => Err(AdapterError::Unavailable(
                "verification deadline elapsed".to_string(),
            )),
        }
    }
}
