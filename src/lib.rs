//! Authentication and multi-factor verification orchestration for Bursar.
//!
//! Bursar's UI is driven by CRUD calls against a hosted backend; the one
//! subsystem with real state-machine depth is sign-in. This crate owns it:
//!
//! 1) The [`session::SessionManager`] hydrates any existing session at
//!    startup and is the single writer of the identity session, published to
//!    readers through a watch channel.
//! 2) A password sign-in either authenticates directly or parks the session
//!    in an MFA-pending state carrying the backend's challenge marker.
//! 3) The [`factors`] registry decides which enrolled factors a verification
//!    attempt may use and picks a deterministic default.
//! 4) The [`verify::MfaVerifier`] submits a user-entered code and reports
//!    the outcome without touching session state itself.
//! 5) The [`page::AuthPageController`] routes between forms; session truth
//!    always overrides the locally tracked mode while MFA is outstanding.
//!
//! The identity backend is a boundary: [`client::CredentialService`] is the
//! whole contract, with a reqwest implementation in
//! [`client::HttpCredentialService`].

pub mod client;
pub mod error;
pub mod factors;
pub mod page;
pub mod session;
pub mod verify;

pub use client::{
    CredentialService, Factor, FactorKind, FactorScope, FactorStatus, HttpCredentialService,
    Identity, MfaChallenge, PasswordSignIn, SignUpProfile, TotpEnrollment,
};
pub use error::{AdapterError, AuthError};
pub use page::{AuthPageController, FormMode, Navigation};
pub use session::{AuthConfig, SessionManager, SessionState, SignInResult};
pub use verify::{select_factor, MfaVerifier, VerifyOutcome};
