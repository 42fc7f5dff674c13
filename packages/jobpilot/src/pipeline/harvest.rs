//! Listing traversal: accumulate unique job identifiers across pages.
//!
//! The board serves at least two pagination UX patterns interchangeably
//! (an explicit "Next" control, and endless scroll) without announcing
//! which one a session got, and neither reliably signals "no more data".
//! The
//! engine handles both: it advances through whichever control is present,
//! falls back to scrolling, watches for stagnation, and bounds total work
//! with a hard round cap.

use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::error::{FlowError, Result};
use crate::identity::IdExtractor;
use crate::selectors::{select_first_visible, SelectorCatalog};
use crate::traits::page::{Element, PageDriver};
use crate::types::config::HarvestConfig;
use crate::types::job::JobId;

/// Why a listing session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Scroll fallback produced nothing new twice in a row.
    ScrollExhausted,

    /// Three stagnant rounds with nothing new on the last page.
    Stagnant,

    /// The configured round cap was reached.
    RoundBudget,
}

/// Result of one listing session.
#[derive(Debug, Clone)]
pub struct HarvestOutcome {
    /// Unique identifiers, in first-seen order. Callers treat this as a
    /// set; the order carries no meaning.
    pub ids: Vec<JobId>,

    /// Rounds actually executed.
    pub rounds: usize,

    /// Why the session stopped.
    pub stop: StopReason,
}

/// Transient state scoped to one search-result traversal.
struct ListingSession {
    seen: HashSet<JobId>,
    ids: Vec<JobId>,
    stagnant_rounds: u32,
}

impl ListingSession {
    fn new() -> Self {
        Self {
            seen: HashSet::new(),
            ids: Vec::new(),
            stagnant_rounds: 0,
        }
    }

    /// Record an identifier; true when it was new.
    fn insert(&mut self, id: JobId) -> bool {
        if self.seen.insert(id.clone()) {
            self.ids.push(id);
            true
        } else {
            false
        }
    }
}

/// Drive one listing session to completion.
///
/// Fails with [`FlowError::NoResults`] only when no result marker ever
/// appears within the initial wait window; after that, every per-element
/// and per-control failure is contained inside the round loop.
pub async fn harvest(
    driver: &dyn PageDriver,
    catalog: &SelectorCatalog,
    config: &HarvestConfig,
) -> Result<HarvestOutcome> {
    let any_result: Vec<String> = catalog
        .result_containers
        .iter()
        .chain(catalog.job_links.iter())
        .cloned()
        .collect();

    if select_first_visible(driver, &any_result, config.initial_wait())
        .await
        .is_none()
    {
        warn!("no result markers appeared within the initial wait window");
        return Err(FlowError::NoResults);
    }

    let extractor = IdExtractor::new();
    let mut session = ListingSession::new();
    let mut rounds = 0;
    let mut stop = StopReason::RoundBudget;

    for round in 0..config.max_rounds {
        rounds = round + 1;

        // Give lazy cards a moment to render.
        if driver.wait_for_idle(config.idle_wait()).await.is_err() {
            debug!(round, "network never went idle; continuing anyway");
        }
        driver.settle(config.settle()).await;

        let new_on_this_page = collect_round(driver, catalog, &extractor, &mut session).await;

        if new_on_this_page == 0 {
            session.stagnant_rounds += 1;
        } else {
            session.stagnant_rounds = 0;
        }
        debug!(
            round,
            new = new_on_this_page,
            total = session.ids.len(),
            stagnant = session.stagnant_rounds,
            "listing round complete"
        );

        let advanced = try_advance(driver, catalog, config).await;

        if advanced {
            if driver.wait_for_idle(config.idle_wait()).await.is_err() {
                debug!(round, "post-advance idle wait timed out");
            }
            driver.settle(config.settle()).await;
        } else {
            // Infinite-scroll assumption: no advance control worked.
            if let Err(e) = driver.scroll_to_bottom().await {
                warn!(error = %e, "scroll fallback failed; ending session");
                stop = StopReason::ScrollExhausted;
                break;
            }
            driver.settle(config.settle()).await;

            if session.stagnant_rounds >= 2 {
                stop = StopReason::ScrollExhausted;
                break;
            }
        }

        if session.stagnant_rounds >= 3 && new_on_this_page == 0 {
            stop = StopReason::Stagnant;
            break;
        }
    }

    info!(
        unique = session.ids.len(),
        rounds,
        stop = ?stop,
        "listing session finished"
    );
    Ok(HarvestOutcome {
        ids: session.ids,
        rounds,
        stop,
    })
}

/// Collect all link elements across selector variants and extract their
/// identifiers. Returns how many were new this round.
async fn collect_round(
    driver: &dyn PageDriver,
    catalog: &SelectorCatalog,
    extractor: &IdExtractor,
    session: &mut ListingSession,
) -> usize {
    let mut new_on_this_page = 0;

    for selector in &catalog.job_links {
        let elements = match driver.query_all(selector).await {
            Ok(elements) => elements,
            Err(e) => {
                // One bad selector variant never aborts the round.
                debug!(selector = %selector, error = %e, "link query failed");
                continue;
            }
        };

        for element in elements {
            match extractor.extract(&element) {
                Some(id) => {
                    if session.insert(id) {
                        new_on_this_page += 1;
                    }
                }
                None => {
                    debug!(selector = %selector, "element yielded no identifier");
                }
            }
        }
    }

    new_on_this_page
}

/// Try each advance control in priority order; use the first that is
/// visible and not disabled. Returns whether any click landed.
async fn try_advance(
    driver: &dyn PageDriver,
    catalog: &SelectorCatalog,
    config: &HarvestConfig,
) -> bool {
    for selector in &catalog.next_controls {
        let element = match driver.wait_for_visible(selector, config.control_wait()).await {
            Ok(element) => element,
            Err(_) => continue,
        };

        if control_disabled(driver, &element).await {
            debug!(selector = %selector, "advance control present but disabled");
            continue;
        }

        match driver.click(&element).await {
            Ok(()) => return true,
            Err(e) => {
                debug!(selector = %selector, error = %e, "advance click failed");
                continue;
            }
        }
    }
    false
}

/// A control is disabled if a direct disabled-state attribute says so, or,
/// when no attribute carries the answer, an ancestor-or-self class marker
/// does.
async fn control_disabled(driver: &dyn PageDriver, element: &Element) -> bool {
    if element.attr("disabled").is_some() {
        return true;
    }
    if let Some(aria) = element.attr("aria-disabled") {
        return aria.eq_ignore_ascii_case("true");
    }

    let selector = element.selector.replace('\\', "\\\\").replace('\'', "\\'");
    let script = format!(
        "(() => {{\nconst els = document.querySelectorAll('{}');\nconst e = els[{}];\nif (!e) return false;\nreturn e.closest('.disabled, [aria-disabled=\"true\"]') !== null;\n}})()",
        selector, element.index
    );
    match driver.evaluate(&script).await {
        Ok(value) => value.as_bool().unwrap_or(false),
        Err(e) => {
            debug!(error = %e, "disabled-state check failed; assuming enabled");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockPage, PageCall};
    use crate::types::config::HarvestConfig;

    fn link(href: &str) -> Element {
        Element::new("a[data-cy='card-title-link']", 0).with_attr("href", href)
    }

    fn quick_config() -> HarvestConfig {
        HarvestConfig {
            max_rounds: 20,
            initial_wait_ms: 200,
            control_wait_ms: 50,
            idle_wait_ms: 0,
            settle_ms: 0,
        }
    }

    #[tokio::test]
    async fn test_no_results_raises_before_round_loop() {
        let page = MockPage::new();
        let outcome = harvest(&page, &SelectorCatalog::default(), &quick_config()).await;
        assert!(matches!(outcome, Err(FlowError::NoResults)));

        // The round loop was never entered.
        assert!(!page
            .calls()
            .iter()
            .any(|c| matches!(c, PageCall::QueryAll { .. })));
    }

    #[tokio::test]
    async fn test_scroll_fixture_terminates_on_stagnation() {
        // Three scripted rounds; round 3 repeats round 2 exactly. No next
        // control anywhere, so the engine must fall back to scrolling and
        // stop once the scroll stops producing anything new.
        let page = MockPage::new()
            .with_round(|r| {
                r.links(vec![
                    link("/job-detail/alpha-AAA111x"),
                    link("/job-detail/beta-BBB222x"),
                ])
                .advance_on_scroll()
            })
            .with_round(|r| {
                r.links(vec![
                    link("/job-detail/gamma-CCC333x"),
                    link("/job-detail/delta-DDD444x"),
                ])
                .advance_on_scroll()
            })
            .with_round(|r| {
                r.links(vec![
                    link("/job-detail/gamma-CCC333x"),
                    link("/job-detail/delta-DDD444x"),
                ])
            });

        let outcome = harvest(&page, &SelectorCatalog::default(), &quick_config())
            .await
            .unwrap();

        // Exactly the union of rounds 1-2; the idempotent re-scan adds
        // nothing.
        let got: HashSet<&str> = outcome.ids.iter().map(|id| id.as_str()).collect();
        let want: HashSet<&str> = ["AAA111x", "BBB222x", "CCC333x", "DDD444x"]
            .into_iter()
            .collect();
        assert_eq!(got, want);

        assert_eq!(outcome.stop, StopReason::ScrollExhausted);
        // Stagnation stops the session well under the round budget.
        assert!(outcome.rounds <= 5, "ran {} rounds", outcome.rounds);
    }

    #[tokio::test]
    async fn test_next_control_advances_pages() {
        let next = Element::new("li[aria-label='Next'] button", 0);
        let page = MockPage::new()
            .with_round(|r| {
                r.links(vec![link("/job-detail/a-AAAAAA1")])
                    .control(next.clone())
            })
            .with_round(|r| {
                r.links(vec![link("/job-detail/b-BBBBBB2")])
                    .control(next.clone())
            })
            .with_round(|r| r.links(vec![link("/job-detail/b-BBBBBB2")]));

        let outcome = harvest(&page, &SelectorCatalog::default(), &quick_config())
            .await
            .unwrap();

        let got: HashSet<&str> = outcome.ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(got, ["AAAAAA1", "BBBBBB2"].into_iter().collect());
        assert!(page
            .calls()
            .iter()
            .any(|c| matches!(c, PageCall::Click { selector, .. } if selector.contains("Next"))));
    }

    #[tokio::test]
    async fn test_disabled_next_control_is_skipped() {
        let disabled_next =
            Element::new("li[aria-label='Next'] button", 0).with_attr("disabled", "");
        let page = MockPage::new()
            .with_round(|r| {
                r.links(vec![link("/job-detail/a-AAAAAA1")])
                    .control(disabled_next)
            });

        let outcome = harvest(&page, &SelectorCatalog::default(), &quick_config())
            .await
            .unwrap();

        assert_eq!(outcome.ids.len(), 1);
        // The disabled control was never clicked; the engine fell back to
        // scrolling instead.
        assert!(!page
            .calls()
            .iter()
            .any(|c| matches!(c, PageCall::Click { .. })));
        assert!(page
            .calls()
            .iter()
            .any(|c| matches!(c, PageCall::ScrollToBottom)));
    }

    #[tokio::test]
    async fn test_duplicate_ids_across_selectors_counted_once() {
        // The same job matched by two selector variants in one round.
        let page = MockPage::new().with_round(|r| {
            r.elements(
                "a[data-cy='card-title-link']",
                vec![Element::new("a[data-cy='card-title-link']", 0)
                    .with_attr("href", "/job-detail/x-SAME001")],
            )
            .elements(
                "a[href*='/job-detail/']",
                vec![Element::new("a[href*='/job-detail/']", 0)
                    .with_attr("href", "/job-detail/x-SAME001")],
            )
        });

        let outcome = harvest(&page, &SelectorCatalog::default(), &quick_config())
            .await
            .unwrap();
        assert_eq!(outcome.ids.len(), 1);
        assert_eq!(outcome.ids[0].as_str(), "SAME001");
    }

    #[tokio::test]
    async fn test_round_budget_bounds_runaway_pagination() {
        // A next control that is always clickable over content that never
        // changes after the first page: the stagnation rule fires before
        // the budget does.
        let next = Element::new("li[aria-label='Next'] button", 0);
        let mut page = MockPage::new();
        for _ in 0..10 {
            let next = next.clone();
            page = page.with_round(move |r| {
                r.links(vec![link("/job-detail/only-ONLY001")])
                    .control(next)
            });
        }

        let config = HarvestConfig {
            max_rounds: 6,
            ..quick_config()
        };
        let outcome = harvest(&page, &SelectorCatalog::default(), &config)
            .await
            .unwrap();

        assert_eq!(outcome.ids.len(), 1);
        assert_eq!(outcome.stop, StopReason::Stagnant);
        assert!(outcome.rounds <= 6);
    }
}
