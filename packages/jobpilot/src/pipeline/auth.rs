//! Login and logout wrappers.
//!
//! Thin by design: credential mechanics carry no architectural weight, but
//! a failed login is fatal to the whole run, so every miss here maps to
//! [`FlowError::Authentication`].

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{FlowError, Result};
use crate::selectors::{select_first_visible, SelectorCatalog};
use crate::traits::page::{PageDriver, WaitPolicy};
use crate::types::config::BoardConfig;

/// Budget for each login form field.
const FIELD_WAIT: Duration = Duration::from_secs(10);

/// Budget for the post-login settle.
const LOGIN_SETTLE: Duration = Duration::from_secs(10);

/// Login credentials.
pub struct Credentials {
    /// Account email.
    pub email: String,

    /// Account password; never logged or serialized.
    pub password: SecretString,
}

impl Credentials {
    /// Create credentials.
    pub fn new(email: impl Into<String>, password: SecretString) -> Self {
        Self {
            email: email.into(),
            password,
        }
    }
}

/// Complete the login sequence.
pub async fn login(
    driver: &dyn PageDriver,
    catalog: &SelectorCatalog,
    board: &BoardConfig,
    credentials: &Credentials,
) -> Result<()> {
    info!("logging in");
    driver
        .navigate(&board.login_url, WaitPolicy::Load)
        .await
        .map_err(|e| auth_failed(format!("login page unreachable: {}", e)))?;

    let email = select_first_visible(driver, &catalog.login_email, FIELD_WAIT)
        .await
        .ok_or_else(|| auth_failed("email field missing"))?;
    driver
        .fill(&email, &credentials.email)
        .await
        .map_err(|e| auth_failed(format!("email entry failed: {}", e)))?;

    // Some variants show the password only after a continue step.
    if let Some(next) = select_first_visible(driver, &catalog.login_continue, FIELD_WAIT).await {
        if let Err(e) = driver.click(&next).await {
            debug!(error = %e, "continue click failed; password may already be visible");
        }
    }

    let password = select_first_visible(driver, &catalog.login_password, FIELD_WAIT)
        .await
        .ok_or_else(|| auth_failed("password field missing"))?;
    driver
        .fill(&password, credentials.password.expose_secret())
        .await
        .map_err(|e| auth_failed(format!("password entry failed: {}", e)))?;
    driver
        .press_key(&password, "Enter")
        .await
        .map_err(|e| auth_failed(format!("login submission failed: {}", e)))?;

    if driver.wait_for_idle(LOGIN_SETTLE).await.is_err() {
        debug!("post-login idle wait timed out");
    }
    info!("login complete");
    Ok(())
}

/// Best-effort logout; failures are logged, never propagated.
pub async fn logout(driver: &dyn PageDriver, catalog: &SelectorCatalog, board: &BoardConfig) {
    if let Err(e) = driver.navigate(&board.login_url, WaitPolicy::Load).await {
        debug!(error = %e, "logout navigation failed");
        return;
    }

    let Some(menu) = select_first_visible(driver, &catalog.menu_settings, FIELD_WAIT).await else {
        debug!("account menu absent; skipping logout");
        return;
    };
    if driver.click(&menu).await.is_err() {
        return;
    }

    if let Some(entry) = select_first_visible(driver, &catalog.menu_logout, FIELD_WAIT).await {
        if driver.click(&entry).await.is_ok() {
            info!("logged out");
        }
    }
}

fn auth_failed(reason: impl Into<String>) -> FlowError {
    FlowError::Authentication {
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockPage, PageCall};
    use crate::traits::page::Element;

    fn credentials() -> Credentials {
        Credentials::new("me@example.com", SecretString::from("hunter2"))
    }

    #[tokio::test]
    async fn test_login_fills_fields_and_submits() {
        let page = MockPage::new()
            .with_element("input[name='email']", Element::new("input[name='email']", 0))
            .with_element(
                "input[type='password']",
                Element::new("input[type='password']", 0),
            );

        login(
            &page,
            &SelectorCatalog::default(),
            &BoardConfig::default(),
            &credentials(),
        )
        .await
        .unwrap();

        let calls = page.calls();
        assert!(calls
            .iter()
            .any(|c| matches!(c, PageCall::Fill { text, .. } if text == "me@example.com")));
        assert!(calls
            .iter()
            .any(|c| matches!(c, PageCall::Fill { text, .. } if text == "hunter2")));
        assert!(calls
            .iter()
            .any(|c| matches!(c, PageCall::PressKey { key, .. } if key == "Enter")));
    }

    #[tokio::test]
    async fn test_missing_email_field_is_authentication_error() {
        let page = MockPage::new();
        let result = login(
            &page,
            &SelectorCatalog::default(),
            &BoardConfig::default(),
            &credentials(),
        )
        .await;
        assert!(matches!(result, Err(FlowError::Authentication { .. })));
    }

    #[tokio::test]
    async fn test_logout_is_silent_when_menu_absent() {
        let page = MockPage::new();
        logout(&page, &SelectorCatalog::default(), &BoardConfig::default()).await;
        // Only the navigation and the menu probes happened.
        assert!(!page
            .calls()
            .iter()
            .any(|c| matches!(c, PageCall::Click { .. })));
    }
}
