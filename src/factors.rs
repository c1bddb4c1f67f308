//! Factor registry.
//!
//! Normalizes the backend's factor listings into the set a verification
//! attempt may actually use. Pure functions; the caller re-invokes them
//! whenever the upstream lists change.

use std::collections::HashSet;

use crate::client::{Factor, FactorStatus};

/// Usable factors for the current verification attempt.
///
/// Factors tied to a fully trusted identity (`verified` scope, re-enrollment
/// flows) take precedence; mid-login `pending` factors are considered only
/// when the verified list is empty. The two lists are never merged. The
/// result is de-duplicated by id, order-stable, and filtered to factors in
/// the `verified` or `unverified` state.
#[must_use]
pub fn usable_factors(verified: &[Factor], pending: &[Factor]) -> Vec<Factor> {
    let source = if verified.is_empty() { pending } else { verified };
    let mut seen = HashSet::new();
    source
        .iter()
        .filter(|factor| {
            matches!(
                factor.status,
                FactorStatus::Verified | FactorStatus::Unverified
            )
        })
        .filter(|factor| seen.insert(factor.id.clone()))
        .cloned()
        .collect()
}

/// Deterministic default: the first usable factor.
///
/// With exactly one factor (the common case) this selects it; with several it
/// is a stable tie-break.
#[must_use]
pub fn default_factor(factors: &[Factor]) -> Option<&Factor> {
    factors.first()
}
