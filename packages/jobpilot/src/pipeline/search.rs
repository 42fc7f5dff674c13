//! Search flow: keyword + location query and best-effort refinements.
//!
//! The two search boxes are required; everything after them is optional.
//! An absent filter, date option, or page-size control is logged and
//! skipped; the search proceeds unrefined rather than failing.

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{DriverError, Result};
use crate::selectors::{select_first_visible, SelectorCatalog};
use crate::traits::page::{Element, OptionChoice, PageDriver, WaitPolicy};
use crate::types::config::{BoardConfig, SearchSpec};

/// Budget for dismissing consent overlays.
const CONSENT_WAIT: Duration = Duration::from_secs(2);

/// Budget for the required search boxes.
const BOX_WAIT: Duration = Duration::from_secs(10);

/// Budget for each optional refinement control.
const FILTER_WAIT: Duration = Duration::from_secs(7);

/// Budget for the post-search network settle.
const RESULTS_WAIT: Duration = Duration::from_secs(10);

/// Navigate to the search page and run one search.
pub async fn run_search(
    driver: &dyn PageDriver,
    catalog: &SelectorCatalog,
    board: &BoardConfig,
    spec: &SearchSpec,
) -> Result<()> {
    info!(keywords = %spec.keywords, location = %spec.location, "running search");
    driver.navigate(&board.search_url, WaitPolicy::NetworkIdle).await?;

    // Consent overlays block everything underneath; absent is fine.
    if let Some(button) = select_first_visible(driver, &catalog.consent_buttons, CONSENT_WAIT).await
    {
        if let Err(e) = driver.click(&button).await {
            debug!(error = %e, "consent dismiss click failed");
        }
    }

    let keywords = require(driver, &catalog.search_keywords, "keyword search box").await?;
    driver.fill(&keywords, &spec.keywords).await?;

    let location = require(driver, &catalog.search_location, "location search box").await?;
    driver.fill(&location, &spec.location).await?;

    let submit = require(driver, &catalog.search_submit, "search submit control").await?;
    driver.click(&submit).await?;
    if driver.wait_for_idle(RESULTS_WAIT).await.is_err() {
        debug!("results never went network-idle; continuing");
    }

    apply_refinements(driver, catalog, spec).await;
    Ok(())
}

/// Locate a required control or fail the session.
async fn require(
    driver: &dyn PageDriver,
    candidates: &[String],
    what: &str,
) -> Result<Element> {
    select_first_visible(driver, candidates, BOX_WAIT)
        .await
        .ok_or_else(|| {
            DriverError::NotFound {
                selector: format!("{} ({})", what, candidates.join(", ")),
            }
            .into()
        })
}

/// Apply the optional refinements the spec asks for. Never fails.
async fn apply_refinements(driver: &dyn PageDriver, catalog: &SelectorCatalog, spec: &SearchSpec) {
    if spec.third_party_filter {
        toggle_filter(driver, &catalog.filter_third_party, "Third Party").await;
    }
    if spec.easy_apply_filter {
        toggle_filter(driver, &catalog.filter_easy_apply, "Easy Apply").await;
    }
    if spec.recent_filter {
        apply_recent_filter(driver, catalog).await;
    }
    if let Some(size) = spec.page_size {
        set_page_size(driver, catalog, size).await;
    }
}

async fn toggle_filter(driver: &dyn PageDriver, candidates: &[String], name: &str) {
    match select_first_visible(driver, candidates, FILTER_WAIT).await {
        Some(control) => match driver.click(&control).await {
            Ok(()) => {
                let _ = driver.wait_for_idle(RESULTS_WAIT).await;
                info!(filter = name, "filter applied");
            }
            Err(e) => warn!(filter = name, error = %e, "filter click failed; skipped"),
        },
        None => warn!(filter = name, "filter control absent; skipped"),
    }
}

/// Best-effort "Last 3 days" refinement: try the directly visible option,
/// then open the date-posted dropdown and try again. Intent only: any
/// miss is a skip.
async fn apply_recent_filter(driver: &dyn PageDriver, catalog: &SelectorCatalog) {
    if click_by_text(driver, "Last 3 days").await {
        let _ = driver.wait_for_idle(RESULTS_WAIT).await;
        info!("date-posted filter applied");
        return;
    }

    if let Some(dropdown) =
        select_first_visible(driver, &catalog.date_posted_dropdown, FILTER_WAIT).await
    {
        if driver.click(&dropdown).await.is_ok() && click_by_text(driver, "Last 3 days").await {
            let _ = driver.wait_for_idle(RESULTS_WAIT).await;
            info!("date-posted filter applied via dropdown");
            return;
        }
    }
    warn!("date-posted filter not applied");
}

/// Click the first clickable element whose trimmed text equals `text`.
async fn click_by_text(driver: &dyn PageDriver, text: &str) -> bool {
    let needle = text.replace('\\', "\\\\").replace('\'', "\\'");
    let script = format!(
        "(() => {{\nconst nodes = document.querySelectorAll('button, a, li, span, [role=\"option\"], [role=\"menuitem\"]');\nfor (const n of nodes) {{\nif (n.textContent && n.textContent.trim() === '{}') {{ n.click(); return true; }}\n}}\nreturn false;\n}})()",
        needle
    );
    match driver.evaluate(&script).await {
        Ok(value) => value.as_bool().unwrap_or(false),
        Err(e) => {
            debug!(error = %e, "text-based click failed");
            false
        }
    }
}

/// Select the requested page size by value, then by label.
async fn set_page_size(driver: &dyn PageDriver, catalog: &SelectorCatalog, size: u32) {
    let size = size.to_string();
    for selector in &catalog.page_size_select {
        let by_value = driver
            .select_option(selector, &OptionChoice::Value(size.clone()))
            .await;
        if by_value.is_ok() {
            let _ = driver.wait_for_idle(RESULTS_WAIT).await;
            info!(size = %size, "page size set");
            return;
        }
        let by_label = driver
            .select_option(selector, &OptionChoice::Label(size.clone()))
            .await;
        if by_label.is_ok() {
            let _ = driver.wait_for_idle(RESULTS_WAIT).await;
            info!(size = %size, "page size set by label");
            return;
        }
    }
    warn!(size = %size, "could not set page size; skipped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlowError;
    use crate::testing::{MockPage, PageCall};
    use crate::traits::page::Element;

    fn search_page() -> MockPage {
        let kw = "input[placeholder='Job title, skill, company, keyword']";
        let loc = "input[placeholder='Location (ex. Denver, remote)']";
        MockPage::new()
            .with_element(kw, Element::new(kw, 0))
            .with_element(loc, Element::new(loc, 0))
            .with_element("#submitSearch-button", Element::new("#submitSearch-button", 0))
    }

    #[tokio::test]
    async fn test_search_fills_both_boxes_and_submits() {
        let page = search_page();
        let spec = SearchSpec::new("rust engineer", "remote").without_filters();

        run_search(&page, &SelectorCatalog::default(), &BoardConfig::default(), &spec)
            .await
            .unwrap();

        let calls = page.calls();
        assert!(calls
            .iter()
            .any(|c| matches!(c, PageCall::Fill { text, .. } if text == "rust engineer")));
        assert!(calls
            .iter()
            .any(|c| matches!(c, PageCall::Fill { text, .. } if text == "remote")));
        assert!(calls
            .iter()
            .any(|c| matches!(c, PageCall::Click { selector, .. } if selector == "#submitSearch-button")));
    }

    #[tokio::test]
    async fn test_missing_search_box_is_fatal() {
        let page = MockPage::new();
        let spec = SearchSpec::new("rust", "remote").without_filters();

        let result =
            run_search(&page, &SelectorCatalog::default(), &BoardConfig::default(), &spec).await;
        assert!(matches!(result, Err(FlowError::Driver(_))));
    }

    #[tokio::test]
    async fn test_absent_filters_are_skipped_not_fatal() {
        // Filters requested but no filter controls exist anywhere.
        let page = search_page();
        let spec = SearchSpec::new("rust", "remote");

        run_search(&page, &SelectorCatalog::default(), &BoardConfig::default(), &spec)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_page_size_applied_when_control_present() {
        let sel = "select[id^='pageSize']";
        let page = search_page().with_element(sel, Element::new(sel, 0));
        let spec = SearchSpec::new("rust", "remote");

        run_search(&page, &SelectorCatalog::default(), &BoardConfig::default(), &spec)
            .await
            .unwrap();

        let selects = page
            .calls()
            .iter()
            .filter(|c| matches!(c, PageCall::SelectOption { .. }))
            .count();
        assert!(selects >= 1);
    }
}
