//! Best-effort login before the crawl starts.
//!
//! The flow is linear: open the login page, fill the username, optionally
//! click "next", wait for the password field, fill it, submit, optionally
//! wait for a post-login marker, then wait for the network to settle. A step
//! that fails is logged and the flow moves on to the next one.

use log::{info, warn};
use std::time::Duration;

use super::session::RenderedSession;
use crate::config::{LoginSteps, WaitUntil};

/// Login step names, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStep {
    Navigate,
    Username,
    Next,
    PasswordVisible,
    Password,
    Submit,
    PostLogin,
    Settle,
}

impl std::fmt::Display for LoginStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Navigate => "open login page",
            Self::Username => "fill username",
            Self::Next => "click next",
            Self::PasswordVisible => "wait for password field",
            Self::Password => "fill password",
            Self::Submit => "submit",
            Self::PostLogin => "wait for post-login marker",
            Self::Settle => "wait for network idle",
        })
    }
}

/// Steps that did not succeed. Empty when every step went through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginOutcome {
    pub failed_steps: Vec<LoginStep>,
}

impl LoginOutcome {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed_steps.is_empty()
    }

    fn check(&mut self, step: LoginStep, result: anyhow::Result<()>) {
        match result {
            Ok(()) => info!(target: "sitescout::login", "Login step done: {step}"),
            Err(e) => {
                warn!(target: "sitescout::login", "Login step '{step}' failed: {e:#}; continuing");
                self.failed_steps.push(step);
            }
        }
    }
}

/// Run the login flow in `session`. Never fails; see [`LoginOutcome`].
pub async fn perform_login<S: RenderedSession + ?Sized>(
    session: &S,
    steps: &LoginSteps,
    wait: WaitUntil,
    timeout: Duration,
) -> LoginOutcome {
    let mut outcome = LoginOutcome::default();
    info!(target: "sitescout::login", "Logging in at {}", steps.login_url);

    outcome.check(
        LoginStep::Navigate,
        session.navigate(&steps.login_url, wait, timeout).await,
    );

    let username = async {
        session
            .wait_for_visible(&steps.username_selector, timeout)
            .await?;
        session.fill(&steps.username_selector, &steps.username).await
    };
    outcome.check(LoginStep::Username, username.await);

    if let Some(next) = &steps.next_selector {
        outcome.check(LoginStep::Next, session.click_selector(next).await);
    }

    outcome.check(
        LoginStep::PasswordVisible,
        session
            .wait_for_visible(&steps.password_selector, timeout)
            .await,
    );
    outcome.check(
        LoginStep::Password,
        session
            .fill(&steps.password_selector, &steps.password)
            .await,
    );
    outcome.check(
        LoginStep::Submit,
        session.click_selector(&steps.submit_selector).await,
    );

    if let Some(marker) = &steps.post_login_selector {
        outcome.check(
            LoginStep::PostLogin,
            session.wait_for_visible(marker, timeout).await,
        );
    }

    outcome.check(
        LoginStep::Settle,
        session.wait_for_load(WaitUntil::NetworkIdle, timeout).await,
    );

    if outcome.is_clean() {
        info!(target: "sitescout::login", "Login flow completed");
    } else {
        warn!(
            target: "sitescout::login",
            "Login flow finished with {} failed steps; the session may not be authenticated",
            outcome.failed_steps.len()
        );
    }
    outcome
}
