//! HTTP implementation of the credential service boundary.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;
use uuid::Uuid;

use super::{
    CredentialService, Factor, FactorKind, FactorScope, FactorStatus, Identity, MfaChallenge,
    PasswordSignIn, SignUpProfile, TotpEnrollment,
};
use crate::error::AdapterError;
use crate::session::AuthConfig;

/// Credential service backed by the hosted identity API.
#[derive(Debug, Clone)]
pub struct HttpCredentialService {
    http: Client,
    base_url: Url,
}

#[derive(Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    display_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    merchant_name: Option<&'a str>,
}

#[derive(Serialize)]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct FinalizeRequest<'a> {
    mfa_token: &'a str,
}

#[derive(Serialize)]
struct VerifyTotpRequest<'a> {
    factor_id: &'a str,
    code: &'a str,
}

#[derive(Serialize)]
struct PasswordResetRequest<'a> {
    email: &'a str,
}

#[derive(Deserialize)]
struct IdentityWire {
    user_id: Uuid,
    email: String,
    display_name: Option<String>,
}

impl From<IdentityWire> for Identity {
    fn from(wire: IdentityWire) -> Self {
        Self {
            user_id: wire.user_id,
            email: wire.email,
            display_name: wire.display_name,
        }
    }
}

#[derive(Deserialize)]
struct SignInResponse {
    user: Option<IdentityWire>,
    mfa_token: Option<String>,
}

#[derive(Deserialize)]
struct FactorListResponse {
    factors: Vec<FactorWire>,
}

#[derive(Deserialize)]
struct FactorWire {
    id: String,
    kind: String,
    status: String,
    phone_number: Option<String>,
}

impl FactorWire {
    /// Factors of a kind this client does not know are dropped rather than
    /// failing the whole listing.
    fn into_factor(self) -> Option<Factor> {
        let Some(kind) = FactorKind::from_str(&self.kind) else {
            debug!(factor_id = %self.id, kind = %self.kind, "dropping factor of unknown kind");
            return None;
        };
        Some(Factor {
            id: self.id,
            kind,
            status: FactorStatus::from_str(&self.status),
            phone_number: self.phone_number,
        })
    }
}

#[derive(Deserialize)]
struct EnrollTotpResponse {
    factor_id: String,
    qr_payload: String,
    secret: String,
}

impl HttpCredentialService {
    /// Build a client from the orchestration configuration.
    ///
    /// # Errors
    /// Returns [`AdapterError::Unavailable`] when the underlying HTTP client
    /// cannot be constructed.
    pub fn from_config(config: &AuthConfig) -> Result<Self, AdapterError> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|err| AdapterError::Unavailable(err.to_string()))?;

        // Normalize to a trailing slash so endpoint joins keep any path prefix.
        let mut base_url = config.base_url().clone();
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, AdapterError> {
        self.base_url
            .join(path)
            .map_err(|err| AdapterError::Unavailable(err.to_string()))
    }
}

fn transport(err: reqwest::Error) -> AdapterError {
    AdapterError::Unavailable(err.to_string())
}

/// Map a non-success response to the adapter taxonomy.
async fn rejection(response: Response) -> AdapterError {
    let status = response.status();
    let message = response.text().await.unwrap_or_default();
    match status {
        StatusCode::UNAUTHORIZED => AdapterError::InvalidCredentials,
        StatusCode::FORBIDDEN => AdapterError::ReauthRequired,
        status if status.is_client_error() => {
            if message.is_empty() {
                AdapterError::Rejected(status.to_string())
            } else {
                AdapterError::Rejected(message)
            }
        }
        status => AdapterError::Unavailable(status.to_string()),
    }
}

#[async_trait]
impl CredentialService for HttpCredentialService {
    async fn sign_up(
        &self,
        email: &str,
        password: &SecretString,
        profile: &SignUpProfile,
    ) -> Result<Identity, AdapterError> {
        let response = self
            .http
            .post(self.endpoint("v1/auth/signup")?)
            .json(&SignUpRequest {
                email,
                password: password.expose_secret(),
                display_name: &profile.display_name,
                merchant_name: profile.merchant_name.as_deref(),
            })
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        let wire: IdentityWire = response.json().await.map_err(transport)?;
        Ok(wire.into())
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<PasswordSignIn, AdapterError> {
        let response = self
            .http
            .post(self.endpoint("v1/auth/login")?)
            .json(&SignInRequest {
                email,
                password: password.expose_secret(),
            })
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        let wire: SignInResponse = response.json().await.map_err(transport)?;
        match (wire.user, wire.mfa_token) {
            (Some(user), _) => Ok(PasswordSignIn::Session(user.into())),
            (None, Some(token)) => Ok(PasswordSignIn::MfaChallenge(MfaChallenge { token })),
            (None, None) => Err(AdapterError::Unavailable(
                "login response carried neither a session nor a challenge".to_string(),
            )),
        }
    }

    async fn get_session(&self) -> Result<Option<Identity>, AdapterError> {
        let response = self
            .http
            .get(self.endpoint("v1/auth/session")?)
            .send()
            .await
            .map_err(transport)?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(None),
            status if status.is_success() => {
                let wire: IdentityWire = response.json().await.map_err(transport)?;
                Ok(Some(wire.into()))
            }
            _ => Err(rejection(response).await),
        }
    }

    async fn list_factors(&self, scope: FactorScope) -> Result<Vec<Factor>, AdapterError> {
        let scope = match scope {
            FactorScope::Verified => "verified",
            FactorScope::Pending => "pending",
        };
        let response = self
            .http
            .get(self.endpoint("v1/auth/factors")?)
            .query(&[("scope", scope)])
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        let wire: FactorListResponse = response.json().await.map_err(transport)?;
        Ok(wire
            .factors
            .into_iter()
            .filter_map(FactorWire::into_factor)
            .collect())
    }

    async fn finalize_mfa(&self, challenge: &MfaChallenge) -> Result<Identity, AdapterError> {
        let response = self
            .http
            .post(self.endpoint("v1/auth/mfa/finalize")?)
            .json(&FinalizeRequest {
                mfa_token: &challenge.token,
            })
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        let wire: IdentityWire = response.json().await.map_err(transport)?;
        Ok(wire.into())
    }

    async fn enroll_totp(&self) -> Result<TotpEnrollment, AdapterError> {
        let response = self
            .http
            .post(self.endpoint("v1/auth/mfa/totp/enroll/start")?)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        let wire: EnrollTotpResponse = response.json().await.map_err(transport)?;
        Ok(TotpEnrollment {
            factor_id: wire.factor_id,
            qr_payload: wire.qr_payload,
            secret: SecretString::from(wire.secret),
        })
    }

    async fn verify_totp(&self, factor_id: &str, code: &str) -> Result<bool, AdapterError> {
        let response = self
            .http
            .post(self.endpoint("v1/auth/mfa/totp/verify")?)
            .json(&VerifyTotpRequest { factor_id, code })
            .send()
            .await
            .map_err(transport)?;

        // A rejected code is a normal outcome, not an adapter failure.
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::BAD_REQUEST => Ok(false),
            _ => Err(rejection(response).await),
        }
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), AdapterError> {
        let response = self
            .http
            .post(self.endpoint("v1/auth/password-reset")?)
            .json(&PasswordResetRequest { email })
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), AdapterError> {
        let response = self
            .http
            .post(self.endpoint("v1/auth/logout")?)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        Ok(())
    }
}
