//! Credential service boundary.
//!
//! The hosted identity backend is consumed as a set of opaque async calls
//! behind [`CredentialService`]. Password verification, token issuance, and
//! TOTP validation all happen server-side; this crate only orchestrates the
//! calls and never inspects credential material beyond shipping it over the
//! wire.

mod http;
#[cfg(test)]
pub(crate) mod testing;

use std::fmt;

use async_trait::async_trait;
use secrecy::SecretString;
use uuid::Uuid;

use crate::error::AdapterError;

pub use http::HttpCredentialService;

/// A signed-in identity as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
}

/// Second-factor credential type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactorKind {
    Totp,
    Sms,
}

impl FactorKind {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Totp => "totp",
            Self::Sms => "sms",
        }
    }

    pub(crate) fn from_str(value: &str) -> Option<Self> {
        match value.trim() {
            "totp" => Some(Self::Totp),
            "sms" => Some(Self::Sms),
            _ => None,
        }
    }
}

impl fmt::Display for FactorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend-reported factor status.
///
/// States other than `verified`/`unverified` parse into [`Self::Other`]
/// without failing; the registry excludes them from login-time selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactorStatus {
    Verified,
    Unverified,
    Other(String),
}

impl FactorStatus {
    pub(crate) fn from_str(value: &str) -> Self {
        match value.trim() {
            "verified" => Self::Verified,
            "unverified" => Self::Unverified,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One enrolled second-factor credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Factor {
    /// Opaque backend-assigned identifier.
    pub id: String,
    pub kind: FactorKind,
    pub status: FactorStatus,
    /// Present only for SMS factors.
    pub phone_number: Option<String>,
}

/// Scope selector for [`CredentialService::list_factors`].
///
/// `Verified` lists factors tied to a fully trusted identity (re-enrollment
/// flows); `Pending` lists factors surfaced mid-login, before the session is
/// trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactorScope {
    Verified,
    Pending,
}

/// Profile captured at sign-up. The backend provisions the downstream
/// merchant record alongside the account.
#[derive(Debug, Clone)]
pub struct SignUpProfile {
    pub display_name: String,
    pub merchant_name: Option<String>,
}

/// Backend marker for a password-valid sign-in awaiting a second factor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MfaChallenge {
    pub token: String,
}

/// Outcome of a password check: a full session, or a challenge marker when a
/// second factor is outstanding.
#[derive(Debug, Clone)]
pub enum PasswordSignIn {
    Session(Identity),
    MfaChallenge(MfaChallenge),
}

/// Material returned when TOTP enrollment starts.
#[derive(Clone)]
pub struct TotpEnrollment {
    pub factor_id: String,
    /// otpauth:// payload rendered as a QR code by the UI.
    pub qr_payload: String,
    /// Base32 secret for manual entry. Redacted in `Debug` output.
    pub secret: SecretString,
}

impl fmt::Debug for TotpEnrollment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TotpEnrollment")
            .field("factor_id", &self.factor_id)
            .field("secret", &"REDACTED")
            .finish_non_exhaustive()
    }
}

/// Operations of the hosted identity backend.
///
/// Implementations convert transport and backend error shapes to
/// [`AdapterError`]; callers never see them raw.
#[async_trait]
pub trait CredentialService: Send + Sync {
    /// Register an account and its downstream merchant record.
    async fn sign_up(
        &self,
        email: &str,
        password: &SecretString,
        profile: &SignUpProfile,
    ) -> Result<Identity, AdapterError>;

    /// Check a password. A valid credential with an outstanding second factor
    /// yields [`PasswordSignIn::MfaChallenge`], not an error.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<PasswordSignIn, AdapterError>;

    /// Fetch the current backend session, if any.
    async fn get_session(&self) -> Result<Option<Identity>, AdapterError>;

    /// List enrolled factors in the given scope.
    async fn list_factors(&self, scope: FactorScope) -> Result<Vec<Factor>, AdapterError>;

    /// Exchange a challenge marker for a fully trusted session after a
    /// successful code check.
    async fn finalize_mfa(&self, challenge: &MfaChallenge) -> Result<Identity, AdapterError>;

    /// Begin authenticator-app enrollment for the signed-in identity.
    async fn enroll_totp(&self) -> Result<TotpEnrollment, AdapterError>;

    /// Check a TOTP code against a factor. `Ok(false)` means the code was
    /// rejected; codes are single-use, so a consumed code also yields
    /// `Ok(false)`.
    async fn verify_totp(&self, factor_id: &str, code: &str) -> Result<bool, AdapterError>;

    /// Request a password-reset email. Outcome is intentionally opaque.
    async fn request_password_reset(&self, email: &str) -> Result<(), AdapterError>;

    /// Terminate the backend session. Best-effort for callers cancelling an
    /// MFA challenge.
    async fn sign_out(&self) -> Result<(), AdapterError>;
}
