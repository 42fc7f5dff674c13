//! Job description scraping.
//!
//! One navigation per job identifier. A missing description container
//! yields an empty description, and one unreachable detail page never
//! aborts the rest of the batch.

use std::time::Duration;
use tracing::{debug, warn};

use crate::selectors::{select_first_visible, SelectorCatalog};
use crate::traits::page::{PageDriver, WaitPolicy};
use crate::types::config::BoardConfig;
use crate::types::job::{JobId, JobPosting};

/// Budget for the description container.
const DESCRIPTION_WAIT: Duration = Duration::from_secs(5);

/// Scrape descriptions for a batch of identifiers, preserving order.
pub async fn scrape_descriptions(
    driver: &dyn PageDriver,
    catalog: &SelectorCatalog,
    board: &BoardConfig,
    ids: &[JobId],
) -> Vec<JobPosting> {
    let mut postings = Vec::with_capacity(ids.len());
    for id in ids {
        let description = fetch_description(driver, catalog, board, id).await;
        postings.push(JobPosting::new(id.clone(), description));
    }
    postings
}

async fn fetch_description(
    driver: &dyn PageDriver,
    catalog: &SelectorCatalog,
    board: &BoardConfig,
    id: &JobId,
) -> String {
    let url = board.detail_url(id);
    if let Err(e) = driver.navigate(&url, WaitPolicy::Load).await {
        warn!(job = %id, error = %e, "detail page unreachable; empty description");
        return String::new();
    }

    match select_first_visible(driver, &catalog.description, DESCRIPTION_WAIT).await {
        Some(container) => container.text,
        None => {
            debug!(job = %id, "no description container found");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockPage;
    use crate::traits::page::Element;

    #[tokio::test]
    async fn test_missing_container_yields_empty_description() {
        let page = MockPage::new();
        let ids = vec![JobId::from("A1"), JobId::from("B2")];

        let postings = scrape_descriptions(
            &page,
            &SelectorCatalog::default(),
            &BoardConfig::default(),
            &ids,
        )
        .await;

        assert_eq!(postings.len(), 2);
        assert!(postings.iter().all(|p| p.description.is_empty()));
        assert_eq!(postings[0].id, ids[0]);
    }

    #[tokio::test]
    async fn test_description_text_captured() {
        let sel = "div.job-description";
        let page = MockPage::new().with_element(
            sel,
            Element::new(sel, 0).with_text("Build distributed systems in Rust."),
        );

        let postings = scrape_descriptions(
            &page,
            &SelectorCatalog::default(),
            &BoardConfig::default(),
            &[JobId::from("A1")],
        )
        .await;

        assert_eq!(postings[0].description, "Build distributed systems in Rust.");
    }
}
