//! Session manager: the single authority for the identity session.
//!
//! Flow overview:
//! 1) At startup the manager hydrates from any existing backend session.
//! 2) A password sign-in either authenticates directly or parks the session
//!    in an MFA-pending state carrying the backend's challenge marker and the
//!    factors usable to resolve it.
//! 3) After a successful code check the pending sign-in is finalized into a
//!    trusted session; a documented fallback reconciliation covers backends
//!    whose finalize call lags their actual session state.
//! 4) Cancelling the challenge or signing out returns to anonymous.

mod config;
mod manager;

pub use config::AuthConfig;
pub use manager::{SessionManager, SessionState, SignInResult};
