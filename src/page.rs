//! Auth page controller.
//!
//! Pure routing between form modes from session state plus explicit
//! navigation. No business logic lives here; the session manager and the
//! verification flow own every transition.

use crate::session::{SessionState, SignInResult};

/// Which form the auth page shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    SignIn,
    SignUp,
    ForgotPassword,
    MfaSetup,
    MfaVerify,
}

/// Side effect requested by the controller after a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    None,
    /// Redirect into the authenticated area. Emitted at most once.
    AuthenticatedArea,
}

/// Routes the auth page. Created per mount; holds only transient form state.
#[derive(Debug)]
pub struct AuthPageController {
    mode: FormMode,
    email: String,
    password: String,
    redirected: bool,
}

impl AuthPageController {
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: FormMode::SignIn,
            email: String::new(),
            password: String::new(),
            redirected: false,
        }
    }

    /// Locally tracked mode, used for mode-dependent messaging only.
    #[must_use]
    pub fn mode(&self) -> FormMode {
        self.mode
    }

    /// The form to render.
    ///
    /// Session truth overrides the local mode for one condition: whenever a
    /// second factor is outstanding, the verify form renders regardless of
    /// any navigation the user performed.
    #[must_use]
    pub fn visible_form(&self, session: &SessionState) -> FormMode {
        if session.mfa_required() {
            FormMode::MfaVerify
        } else {
            self.mode
        }
    }

    /// Explicit navigation. Password fields are cleared on every switch.
    pub fn switch_mode(&mut self, mode: FormMode) {
        self.password.clear();
        self.mode = mode;
    }

    /// Track the outcome of a password sign-in. The mode switch keeps
    /// messaging consistent; correctness does not depend on it (see
    /// [`Self::visible_form`]).
    pub fn on_sign_in_result(&mut self, result: &SignInResult) {
        if result.mfa_required {
            self.switch_mode(FormMode::MfaVerify);
        }
    }

    /// Sign-up success returns to sign-in; it never authenticates.
    pub fn on_sign_up_success(&mut self) {
        self.switch_mode(FormMode::SignIn);
    }

    /// The single navigation side effect on terminal authentication. Once the
    /// redirect fires the form stops re-rendering, so this never fires twice.
    pub fn navigation(&mut self, session: &SessionState) -> Navigation {
        if self.redirected {
            return Navigation::None;
        }
        if session.user().is_some() {
            self.redirected = true;
            Navigation::AuthenticatedArea
        } else {
            Navigation::None
        }
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl Default for AuthPageController {
    fn default() -> Self {
        Self::new()
    }
}

/// Coarse 0-5 strength score shown next to the sign-up password field.
#[must_use]
pub fn password_strength(password: &str) -> u8 {
    let mut score = 0;
    if password.len() >= 8 {
        score += 1;
    }
    if password.len() >= 12 {
        score += 1;
    }
    if password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
    {
        score += 1;
    }
    if password.chars().any(|c| c.is_ascii_digit()) {
        score += 1;
    }
    if password.chars().any(|c| !c.is_ascii_alphanumeric()) {
        score += 1;
    }
    score
}
