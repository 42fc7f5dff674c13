//! Selector catalog and fallback resolution.
//!
//! The target site A/B-tests its markup, so every semantic target is an
//! ordered list of alternative locators tried until one yields a visible
//! match. No locator succeeding is not fatal here: it is reported upward as
//! "target absent" (`None`) so callers can apply their own fallback
//! behavior.

use std::time::Duration;
use tracing::debug;

use crate::traits::page::{Element, PageDriver};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Ordered alternative locators for each semantic target.
///
/// The `Default` carries the board's currently known markup variants;
/// catalog entries are data, so a markup change is a config edit, not a
/// code change.
#[derive(Debug, Clone)]
pub struct SelectorCatalog {
    /// Job link elements inside result cards.
    pub job_links: Vec<String>,

    /// "Next" / "Load more" pagination controls.
    pub next_controls: Vec<String>,

    /// Result card containers.
    pub result_containers: Vec<String>,

    /// Login email input.
    pub login_email: Vec<String>,

    /// Login continue control after the email step.
    pub login_continue: Vec<String>,

    /// Login password input.
    pub login_password: Vec<String>,

    /// Keyword search box.
    pub search_keywords: Vec<String>,

    /// Location search box.
    pub search_location: Vec<String>,

    /// Search submit control.
    pub search_submit: Vec<String>,

    /// Cookie/consent overlay dismiss controls.
    pub consent_buttons: Vec<String>,

    /// Third Party filter control.
    pub filter_third_party: Vec<String>,

    /// Easy Apply filter control.
    pub filter_easy_apply: Vec<String>,

    /// Date-posted dropdown opener (fallback when the direct option is
    /// not visible).
    pub date_posted_dropdown: Vec<String>,

    /// Page-size select element.
    pub page_size_select: Vec<String>,

    /// Shadow host of the apply widget on the detail page.
    pub apply_widget_host: String,

    /// Easy-apply button inside the widget's shadow root.
    pub easy_apply_button: String,

    /// Hops from the widget's shadow root to the confirmation text
    /// element.
    pub confirmation_path: Vec<String>,

    /// "Next" control inside the multi-step apply flow.
    pub flow_next: Vec<String>,

    /// Upload trigger inside the resume step.
    pub upload_trigger: Vec<String>,

    /// File input receiving the resume path.
    pub file_input: Vec<String>,

    /// Upload confirmation control.
    pub upload_confirm: Vec<String>,

    /// Description container on the detail page.
    pub description: Vec<String>,

    /// Account menu opener, for logout.
    pub menu_settings: Vec<String>,

    /// Logout entry inside the account menu.
    pub menu_logout: Vec<String>,
}

impl Default for SelectorCatalog {
    fn default() -> Self {
        Self {
            job_links: strings(&[
                "a[data-cy='card-title-link']",
                "a[href*='/job-detail/']",
                "article [data-cy='card-title-link']",
                "article a:has(h5)",
            ]),
            next_controls: strings(&[
                "li[aria-label='Next'] button",
                "li.pagination-next button",
                "button[aria-label='Next']",
                "button[data-cy='load-more']",
            ]),
            result_containers: strings(&[
                "[data-cy='search-card']",
                "article[data-cy='search-card']",
                "article:has(a[href*='/job-detail/'])",
            ]),
            login_email: strings(&["input[name='email']", "input[type='email']"]),
            login_continue: strings(&[
                "button[type='submit']",
                "button[data-testid='sign-in-button']",
            ]),
            login_password: strings(&["input[type='password']"]),
            search_keywords: strings(&[
                "input[placeholder='Job title, skill, company, keyword']",
                "input[aria-label='Job title, skill, company, keyword']",
            ]),
            search_location: strings(&[
                "input[placeholder='Location (ex. Denver, remote)']",
                "input[aria-label='Location']",
            ]),
            search_submit: strings(&["#submitSearch-button", "button[type='submit']"]),
            consent_buttons: strings(&[
                "button[aria-label='Accept']",
                "#onetrust-accept-btn-handler",
                "button[data-testid='accept-all']",
            ]),
            filter_third_party: strings(&[
                "button[aria-label='Filter Search Results by Third Party']",
            ]),
            filter_easy_apply: strings(&[
                "button[aria-label='Filter Search Results by Easy Apply']",
            ]),
            date_posted_dropdown: strings(&[
                "button[aria-label*='Date posted']",
                "button[data-cy='posted-date-filter']",
            ]),
            page_size_select: strings(&["select[id^='pageSize']"]),
            apply_widget_host: "apply-button-wc".to_string(),
            easy_apply_button: "button.btn.btn-primary".to_string(),
            confirmation_path: strings(&["application-submitted", "p.app-text"]),
            flow_next: strings(&["button.seds-button-primary.btn-next"]),
            upload_trigger: strings(&[
                "button[data-e2e='replace-resume']",
                "button[data-v-746be088]",
            ]),
            file_input: strings(&["input[type='file']"]),
            upload_confirm: strings(&["span[data-e2e='upload']"]),
            description: strings(&["div.job-description", "[data-cy='jobDescription']"]),
            menu_settings: strings(&["[data-id='menu-settings']"]),
            menu_logout: strings(&["[data-id='menu-logout']"]),
        }
    }
}

/// Try each candidate in order until one has a visible match.
///
/// The wait budget is sliced across candidates (with a floor so a long list
/// still gives each locator a real chance) and the whole list is tried
/// twice, which raises the odds during slow loads. `None` means "target
/// absent within the budget" and is never itself an error.
pub async fn select_first_visible(
    driver: &dyn PageDriver,
    candidates: &[String],
    timeout: Duration,
) -> Option<Element> {
    if candidates.is_empty() {
        return None;
    }

    let floor = Duration::from_millis(250);
    let slice = (timeout / candidates.len() as u32 / 2).max(floor);

    for pass in 0..2 {
        for selector in candidates {
            match driver.wait_for_visible(selector, slice).await {
                Ok(element) => return Some(element),
                Err(e) => {
                    debug!(selector = %selector, pass, error = %e, "locator candidate missed");
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockPage, PageCall};

    #[tokio::test]
    async fn test_first_visible_wins_in_order() {
        let page = MockPage::new().with_element(
            "a[href*='/job-detail/']",
            Element::new("a[href*='/job-detail/']", 0).with_attr("href", "/job-detail/x-ABC123"),
        );

        let catalog = SelectorCatalog::default();
        let found = select_first_visible(&page, &catalog.job_links, Duration::from_millis(400))
            .await
            .expect("should find the second candidate");
        assert_eq!(found.selector, "a[href*='/job-detail/']");
    }

    #[tokio::test]
    async fn test_absent_target_is_none_not_error() {
        let page = MockPage::new();
        let catalog = SelectorCatalog::default();

        let found =
            select_first_visible(&page, &catalog.consent_buttons, Duration::from_millis(200)).await;
        assert!(found.is_none());

        // Each candidate was probed on both passes.
        let waits = page
            .calls()
            .iter()
            .filter(|c| matches!(c, PageCall::WaitForVisible { .. }))
            .count();
        assert_eq!(waits, catalog.consent_buttons.len() * 2);
    }
}
