//! Scripted credential service for unit tests.
//!
//! Each operation pops the next scripted outcome; call counters let tests
//! assert sequencing (e.g. that the fallback session query runs exactly once).

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use secrecy::SecretString;
use uuid::Uuid;

use super::{
    CredentialService, Factor, FactorKind, FactorScope, FactorStatus, Identity, MfaChallenge,
    PasswordSignIn, SignUpProfile, TotpEnrollment,
};
use crate::error::AdapterError;

pub(crate) fn identity(email: &str) -> Identity {
    Identity {
        user_id: Uuid::new_v4(),
        email: email.to_string(),
        display_name: None,
    }
}

pub(crate) fn totp_factor(id: &str, status: FactorStatus) -> Factor {
    Factor {
        id: id.to_string(),
        kind: FactorKind::Totp,
        status,
        phone_number: None,
    }
}

pub(crate) fn sms_factor(id: &str, status: FactorStatus) -> Factor {
    Factor {
        id: id.to_string(),
        kind: FactorKind::Sms,
        status,
        phone_number: Some("+15555550100".to_string()),
    }
}

#[derive(Default)]
pub(crate) struct ScriptedCredentials {
    sign_up_results: Mutex<VecDeque<Result<Identity, AdapterError>>>,
    sign_in_results: Mutex<VecDeque<Result<PasswordSignIn, AdapterError>>>,
    session_results: Mutex<VecDeque<Result<Option<Identity>, AdapterError>>>,
    finalize_results: Mutex<VecDeque<Result<Identity, AdapterError>>>,
    enroll_results: Mutex<VecDeque<Result<TotpEnrollment, AdapterError>>>,
    verify_results: Mutex<VecDeque<Result<bool, AdapterError>>>,
    verified_factors: Mutex<Vec<Factor>>,
    pending_factors: Mutex<Vec<Factor>>,
    fail_sign_out: AtomicBool,
    hang_finalize: AtomicBool,
    hang_session: AtomicBool,
    pub(crate) session_calls: AtomicUsize,
    pub(crate) finalize_calls: AtomicUsize,
    pub(crate) verify_calls: AtomicUsize,
    pub(crate) sign_out_calls: AtomicUsize,
    pub(crate) reset_calls: AtomicUsize,
}

impl ScriptedCredentials {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_sign_up(&self, result: Result<Identity, AdapterError>) {
        self.sign_up_results.lock().unwrap().push_back(result);
    }

    pub(crate) fn push_sign_in(&self, result: Result<PasswordSignIn, AdapterError>) {
        self.sign_in_results.lock().unwrap().push_back(result);
    }

    pub(crate) fn push_session(&self, result: Result<Option<Identity>, AdapterError>) {
        self.session_results.lock().unwrap().push_back(result);
    }

    pub(crate) fn push_finalize(&self, result: Result<Identity, AdapterError>) {
        self.finalize_results.lock().unwrap().push_back(result);
    }

    pub(crate) fn push_enroll(&self, result: Result<TotpEnrollment, AdapterError>) {
        self.enroll_results.lock().unwrap().push_back(result);
    }

    pub(crate) fn push_verify(&self, result: Result<bool, AdapterError>) {
        self.verify_results.lock().unwrap().push_back(result);
    }

    pub(crate) fn set_pending_factors(&self, factors: Vec<Factor>) {
        *self.pending_factors.lock().unwrap() = factors;
    }

    pub(crate) fn set_verified_factors(&self, factors: Vec<Factor>) {
        *self.verified_factors.lock().unwrap() = factors;
    }

    pub(crate) fn fail_sign_out(&self) {
        self.fail_sign_out.store(true, Ordering::SeqCst);
    }

    /// Make `finalize_mfa` pend forever, as a stalled backend would.
    pub(crate) fn hang_finalize(&self) {
        self.hang_finalize.store(true, Ordering::SeqCst);
    }

    /// Make `get_session` pend forever.
    pub(crate) fn hang_session(&self) {
        self.hang_session.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl CredentialService for ScriptedCredentials {
    async fn sign_up(
        &self,
        _email: &str,
        _password: &SecretString,
        _profile: &SignUpProfile,
    ) -> Result<Identity, AdapterError> {
        self.sign_up_results
            .lock()
            .unwrap()
            .pop_front()
            .expect("sign_up script exhausted")
    }

    async fn sign_in_with_password(
        &self,
        _email: &str,
        _password: &SecretString,
    ) -> Result<PasswordSignIn, AdapterError> {
        self.sign_in_results
            .lock()
            .unwrap()
            .pop_front()
            .expect("sign_in script exhausted")
    }

    async fn get_session(&self) -> Result<Option<Identity>, AdapterError> {
        self.session_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang_session.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.session_results
            .lock()
            .unwrap()
            .pop_front()
            .expect("get_session script exhausted")
    }

    async fn list_factors(&self, scope: FactorScope) -> Result<Vec<Factor>, AdapterError> {
        let factors = match scope {
            FactorScope::Verified => self.verified_factors.lock().unwrap().clone(),
            FactorScope::Pending => self.pending_factors.lock().unwrap().clone(),
        };
        Ok(factors)
    }

    async fn finalize_mfa(&self, _challenge: &MfaChallenge) -> Result<Identity, AdapterError> {
        self.finalize_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang_finalize.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.finalize_results
            .lock()
            .unwrap()
            .pop_front()
            .expect("finalize script exhausted")
    }

    async fn enroll_totp(&self) -> Result<TotpEnrollment, AdapterError> {
        self.enroll_results
            .lock()
            .unwrap()
            .pop_front()
            .expect("enroll script exhausted")
    }

    async fn verify_totp(&self, factor_id: &str, _code: &str) -> Result<bool, AdapterError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        let result = self
            .verify_results
            .lock()
            .unwrap()
            .pop_front()
            .expect("verify script exhausted");
        // An accepted code confirms the factor, as the backend does.
        if matches!(result, Ok(true)) {
            for list in [&self.verified_factors, &self.pending_factors] {
                for factor in list.lock().unwrap().iter_mut() {
                    if factor.id == factor_id {
                        factor.status = FactorStatus::Verified;
                    }
                }
            }
        }
        result
    }

    async fn request_password_reset(&self, _email: &str) -> Result<(), AdapterError> {
        self.reset_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), AdapterError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_sign_out.load(Ordering::SeqCst) {
            Err(AdapterError::Unavailable("connection reset".to_string()))
        } else {
            Ok(())
        }
    }
}
