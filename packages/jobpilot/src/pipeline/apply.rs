//! Per-job application state machine.
//!
//! States: open detail page → record title → probe apply widget →
//! easy-apply or multi-step flow → optional resume upload → submit.
//! Everything that can go wrong inside one attempt is contained here: the
//! attempt is abandoned with a logged reason and the batch moves on. The
//! detail tab is closed on every exit path.

use chrono::Local;
use tracing::{info, warn};

use crate::error::ApplyResult;
use crate::selectors::{select_first_visible, SelectorCatalog};
use crate::shadow::{as_bool, as_text, ShadowQuery};
use crate::traits::ledger::TitleLedger;
use crate::traits::page::{PageDriver, WaitPolicy};
use crate::types::config::{ApplyConfig, BoardConfig};
use crate::types::job::{ApplyOutcome, JobId};

/// Drive one application attempt to a terminal outcome.
///
/// Never fails: per-job errors become [`ApplyOutcome::Abandoned`]. The
/// child tab opened for the detail page is closed before returning,
/// whatever the outcome.
pub async fn apply_to_job(
    driver: &dyn PageDriver,
    ledger: &dyn TitleLedger,
    catalog: &SelectorCatalog,
    board: &BoardConfig,
    config: &ApplyConfig,
    id: &JobId,
) -> ApplyOutcome {
    let url = board.detail_url(id);
    let tab = match driver.open_tab(&url, WaitPolicy::Load).await {
        Ok(tab) => tab,
        Err(e) => {
            warn!(job = %id, error = %e, "could not open detail page");
            return ApplyOutcome::abandoned(format!("detail page unreachable: {}", e));
        }
    };

    let outcome = match run_attempt(tab.as_ref(), ledger, catalog, config).await {
        Ok(outcome) => outcome,
        Err(e) => ApplyOutcome::abandoned(e.to_string()),
    };

    if let Err(e) = tab.close().await {
        warn!(job = %id, error = %e, "detail tab did not close cleanly");
    }

    match &outcome {
        ApplyOutcome::EasyApplied => info!(job = %id, "application submitted via easy apply"),
        ApplyOutcome::Submitted => info!(job = %id, "application submitted via multi-step flow"),
        ApplyOutcome::DuplicateTitle => info!(job = %id, "title already recorded; skipped"),
        ApplyOutcome::Abandoned { reason } => warn!(job = %id, reason = %reason, "attempt abandoned"),
    }
    outcome
}

async fn run_attempt(
    tab: &dyn PageDriver,
    ledger: &dyn TitleLedger,
    catalog: &SelectorCatalog,
    config: &ApplyConfig,
) -> ApplyResult<ApplyOutcome> {
    // TitleRecorded: the title is the cross-run dedup key. A known title
    // stops the attempt before any interaction.
    let title = tab.title().await?;
    if ledger.contains(&title).await? {
        return Ok(ApplyOutcome::DuplicateTitle);
    }
    ledger.record(&title, Local::now()).await?;

    // ApplyWidgetChecked: the widget interior is shadow-encapsulated, so
    // every probe goes through script evaluation.
    let host = ShadowQuery::new([catalog.apply_widget_host.as_str()]);
    if !as_bool(&tab.evaluate(&host.exists_script()).await?) {
        return Ok(ApplyOutcome::abandoned("apply widget absent"));
    }

    let easy_apply = ShadowQuery::new([
        catalog.apply_widget_host.as_str(),
        catalog.easy_apply_button.as_str(),
    ]);
    let clicked = as_bool(&tab.evaluate(&easy_apply.click_script()).await?);
    tab.settle(config.settle()).await;

    if clicked {
        let mut hops = vec![catalog.apply_widget_host.clone()];
        hops.extend(catalog.confirmation_path.iter().cloned());
        let confirmation = ShadowQuery::new(hops);

        if let Some(text) = as_text(&tab.evaluate(&confirmation.text_script()).await?) {
            if text.contains(&config.confirmation_text) {
                return Ok(ApplyOutcome::EasyApplied);
            }
        }
    }

    // The click did not yield a confirmation (or the button was not
    // there): escalate to the multi-step flow.
    multi_step_flow(tab, catalog, config).await
}

/// MultiStepFlow → ResumeCheck → {ResumeUploadFlow | SkipUpload} →
/// Submitted | Abandoned.
async fn multi_step_flow(
    tab: &dyn PageDriver,
    catalog: &SelectorCatalog,
    config: &ApplyConfig,
) -> ApplyResult<ApplyOutcome> {
    let next = match select_first_visible(tab, &catalog.flow_next, config.step_wait()).await {
        Some(next) => next,
        None => return Ok(ApplyOutcome::abandoned("flow next control absent")),
    };
    tab.click(&next).await?;
    tab.settle(config.settle()).await;

    // ResumeCheck: the marker in the page text decides whether an upload
    // is needed; its absence means a resume is already on file.
    let body = tab.body_text().await?;
    if body.contains(&config.resume_marker) {
        info!("resume required; starting upload");
        if let Some(outcome) = upload_resume(tab, catalog, config).await? {
            return Ok(outcome);
        }
    }

    // Submit step: a next-styled control whose visible text carries the
    // submit label.
    let submit = match select_first_visible(tab, &catalog.flow_next, config.step_wait()).await {
        Some(submit) => submit,
        None => return Ok(ApplyOutcome::abandoned("submit control absent")),
    };
    if !submit.text.contains(&config.submit_label) {
        return Ok(ApplyOutcome::abandoned(format!(
            "submit control mislabeled: {:?}",
            submit.text
        )));
    }
    tab.click(&submit).await?;
    Ok(ApplyOutcome::Submitted)
}

/// Run the upload sub-flow. Returns `Some(outcome)` when it terminated the
/// attempt, `None` when the flow may continue to the submit step.
async fn upload_resume(
    tab: &dyn PageDriver,
    catalog: &SelectorCatalog,
    config: &ApplyConfig,
) -> ApplyResult<Option<ApplyOutcome>> {
    let trigger = match select_first_visible(tab, &catalog.upload_trigger, config.step_wait()).await
    {
        Some(trigger) => trigger,
        None => return Ok(Some(ApplyOutcome::abandoned("upload trigger absent"))),
    };
    tab.click(&trigger).await?;

    let mut supplied = false;
    for selector in &catalog.file_input {
        if tab.set_file_input(selector, &config.resume_path).await.is_ok() {
            supplied = true;
            break;
        }
    }
    if !supplied {
        return Ok(Some(ApplyOutcome::abandoned("file input absent")));
    }

    let confirm = match select_first_visible(tab, &catalog.upload_confirm, config.step_wait()).await
    {
        Some(confirm) => confirm,
        None => return Ok(Some(ApplyOutcome::abandoned("upload confirmation absent"))),
    };
    tab.click(&confirm).await?;
    tab.settle(config.settle()).await;

    // Continue past the upload step.
    match select_first_visible(tab, &catalog.flow_next, config.step_wait()).await {
        Some(next) => {
            tab.click(&next).await?;
            tab.settle(config.settle()).await;
            Ok(None)
        }
        None => Ok(Some(ApplyOutcome::abandoned(
            "next control after upload absent",
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledgers::MemoryLedger;
    use crate::testing::{MockPage, PageCall};
    use crate::traits::page::Element;
    use std::path::PathBuf;
    use std::sync::Arc;

    const NEXT_SEL: &str = "button.seds-button-primary.btn-next";

    fn config() -> ApplyConfig {
        ApplyConfig {
            resume_path: PathBuf::from("/tmp/resume.pdf"),
            step_wait_ms: 100,
            settle_ms: 0,
            ..Default::default()
        }
    }

    fn board() -> BoardConfig {
        BoardConfig::default()
    }

    fn with_detail_tab(detail: Arc<MockPage>) -> MockPage {
        let url = board().detail_url(&JobId::from("JOB0001"));
        MockPage::new().with_tab(url, detail)
    }

    async fn run(parent: &MockPage, ledger: &MemoryLedger) -> ApplyOutcome {
        apply_to_job(
            parent,
            ledger,
            &SelectorCatalog::default(),
            &board(),
            &config(),
            &JobId::from("JOB0001"),
        )
        .await
    }

    #[tokio::test]
    async fn test_easy_apply_confirmed() {
        let detail = Arc::new(
            MockPage::new()
                .with_title("Senior Engineer | Acme")
                .with_eval("el.click()", serde_json::json!(true))
                .with_eval("textContent", serde_json::json!("Application Submitted"))
                .with_eval("return el !== null", serde_json::json!(true)),
        );
        let parent = with_detail_tab(detail.clone());
        let ledger = MemoryLedger::new();

        let outcome = run(&parent, &ledger).await;
        assert_eq!(outcome, ApplyOutcome::EasyApplied);
        assert!(detail.is_closed());
        assert!(ledger.contains("Senior Engineer | Acme").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_title_stops_before_widget_probe() {
        let detail = Arc::new(MockPage::new().with_title("Senior Engineer | Acme"));
        let parent = with_detail_tab(detail.clone());
        let ledger = MemoryLedger::new().with_titles(["Senior Engineer | Acme"]);

        let outcome = run(&parent, &ledger).await;
        assert_eq!(outcome, ApplyOutcome::DuplicateTitle);

        // No widget interaction happened and nothing was re-appended.
        assert!(!detail
            .calls()
            .iter()
            .any(|c| matches!(c, PageCall::Evaluate { .. })));
        assert!(ledger.lines().is_empty());
        assert!(detail.is_closed());
    }

    #[tokio::test]
    async fn test_rerun_with_same_id_records_once() {
        let make_detail = || Arc::new(MockPage::new().with_title("Senior Engineer | Acme"));
        let ledger = MemoryLedger::new();

        let first = with_detail_tab(make_detail());
        let _ = run(&first, &ledger).await;
        let second = with_detail_tab(make_detail());
        let outcome = run(&second, &ledger).await;

        assert_eq!(outcome, ApplyOutcome::DuplicateTitle);
        assert_eq!(ledger.lines().len(), 1);
    }

    #[tokio::test]
    async fn test_widget_absent_abandons() {
        // No eval responses: the host existence probe answers null/false.
        let detail = Arc::new(MockPage::new().with_title("Role A"));
        let parent = with_detail_tab(detail.clone());
        let ledger = MemoryLedger::new();

        let outcome = run(&parent, &ledger).await;
        assert_eq!(outcome, ApplyOutcome::abandoned("apply widget absent"));
        assert!(detail.is_closed());
    }

    #[tokio::test]
    async fn test_multi_step_without_marker_skips_upload() {
        // Easy-apply click lands but never confirms, escalating to the
        // multi-step flow. Body never shows the resume marker, so the flow
        // must reach submit without any file-chooser interaction.
        let detail = Arc::new(
            MockPage::new()
                .with_title("Role B")
                .with_eval("return el !== null", serde_json::json!(true))
                .with_eval("el.click()", serde_json::json!(true))
                .with_round(|r| r.control(Element::new(NEXT_SEL, 0).with_text("Next")))
                .with_round(|r| {
                    r.elements(
                        NEXT_SEL,
                        vec![Element::new(NEXT_SEL, 0).with_text("Submit Application")],
                    )
                    .body("Review your application")
                }),
        );
        let parent = with_detail_tab(detail.clone());
        let ledger = MemoryLedger::new();

        let outcome = run(&parent, &ledger).await;
        assert_eq!(outcome, ApplyOutcome::Submitted);

        let calls = detail.calls();
        assert!(!calls
            .iter()
            .any(|c| matches!(c, PageCall::SetFileInput { .. })));
        assert!(detail.is_closed());
    }

    #[tokio::test]
    async fn test_multi_step_with_marker_uploads_resume() {
        let detail = Arc::new(
            MockPage::new()
                .with_title("Role C")
                .with_eval("return el !== null", serde_json::json!(true))
                .with_eval("el.click()", serde_json::json!(true))
                .with_round(|r| r.control(Element::new(NEXT_SEL, 0).with_text("Next")))
                .with_round(|r| {
                    r.body("A resume is required to proceed")
                        .elements(
                            "button[data-e2e='replace-resume']",
                            vec![Element::new("button[data-e2e='replace-resume']", 0)],
                        )
                        .elements(
                            "span[data-e2e='upload']",
                            vec![Element::new("span[data-e2e='upload']", 0)],
                        )
                        .control(Element::new(NEXT_SEL, 0).with_text("Next"))
                })
                .with_round(|r| {
                    r.elements(NEXT_SEL, vec![Element::new(NEXT_SEL, 0).with_text("Submit")])
                        .body("Review")
                }),
        );
        let parent = with_detail_tab(detail.clone());
        let ledger = MemoryLedger::new();

        let outcome = run(&parent, &ledger).await;
        assert_eq!(outcome, ApplyOutcome::Submitted);

        let calls = detail.calls();
        assert!(calls.iter().any(|c| matches!(
            c,
            PageCall::SetFileInput { path, .. } if path == &PathBuf::from("/tmp/resume.pdf")
        )));
        assert!(detail.is_closed());
    }

    #[tokio::test]
    async fn test_mislabeled_submit_abandons() {
        let detail = Arc::new(
            MockPage::new()
                .with_title("Role D")
                .with_eval("return el !== null", serde_json::json!(true))
                .with_round(|r| r.control(Element::new(NEXT_SEL, 0).with_text("Next")))
                .with_round(|r| {
                    r.elements(NEXT_SEL, vec![Element::new(NEXT_SEL, 0).with_text("Continue")])
                }),
        );
        let parent = with_detail_tab(detail.clone());
        let ledger = MemoryLedger::new();

        let outcome = run(&parent, &ledger).await;
        assert!(matches!(outcome, ApplyOutcome::Abandoned { ref reason } if reason.contains("mislabeled")));
        assert!(detail.is_closed());
    }

    #[tokio::test]
    async fn test_unreachable_detail_page_abandons_without_blocking() {
        // No scripted tab for the URL.
        let parent = MockPage::new();
        let ledger = MemoryLedger::new();

        let outcome = run(&parent, &ledger).await;
        assert!(matches!(outcome, ApplyOutcome::Abandoned { ref reason } if reason.contains("unreachable")));
    }
}
