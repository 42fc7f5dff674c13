//! Run orchestration: the `Pilot` facade.
//!
//! Owns the collaborators behind their traits and drives the whole flow:
//! login → resume text → inferred search terms → one listing session per
//! term → description scraping → similarity ranking → sequential
//! application attempts. Application results are side effects (the title
//! ledger and the board's own state); the returned report only counts
//! them.

use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{FlowError, Result};
use crate::pipeline::apply::apply_to_job;
use crate::pipeline::auth::{login, logout, Credentials};
use crate::pipeline::details::scrape_descriptions;
use crate::pipeline::harvest::harvest;
use crate::pipeline::rank::rank_by_fit;
use crate::pipeline::search::run_search;
use crate::selectors::SelectorCatalog;
use crate::traits::ai::ResumeAnalyzer;
use crate::traits::ledger::TitleLedger;
use crate::traits::page::PageDriver;
use crate::traits::resume::ResumeSource;
use crate::types::config::PilotConfig;
use crate::types::job::{ApplyOutcome, JobId};

/// Counters for one run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Unique identifiers gathered across all listing sessions.
    pub harvested: usize,

    /// Attempts that reached a terminal outcome.
    pub attempted: usize,

    /// Applications submitted (easy apply or multi-step).
    pub submitted: usize,

    /// Attempts skipped because the title was already recorded.
    pub duplicates: usize,

    /// Attempts abandoned mid-flow.
    pub abandoned: usize,
}

/// The pipeline facade.
pub struct Pilot {
    driver: Arc<dyn PageDriver>,
    analyzer: Arc<dyn ResumeAnalyzer>,
    resume: Arc<dyn ResumeSource>,
    ledger: Arc<dyn TitleLedger>,
    catalog: SelectorCatalog,
    config: PilotConfig,
    credentials: Option<Credentials>,
}

impl Pilot {
    /// Create a pilot with the default selector catalog.
    pub fn new(
        driver: Arc<dyn PageDriver>,
        analyzer: Arc<dyn ResumeAnalyzer>,
        resume: Arc<dyn ResumeSource>,
        ledger: Arc<dyn TitleLedger>,
        config: PilotConfig,
    ) -> Self {
        Self {
            driver,
            analyzer,
            resume,
            ledger,
            catalog: SelectorCatalog::default(),
            config,
            credentials: None,
        }
    }

    /// Replace the selector catalog.
    pub fn with_catalog(mut self, catalog: SelectorCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Log in before searching.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Execute the full pipeline.
    pub async fn run(&self) -> Result<RunReport> {
        if let Some(credentials) = &self.credentials {
            login(
                self.driver.as_ref(),
                &self.catalog,
                &self.config.board,
                credentials,
            )
            .await?;
        }

        let resume_text = self
            .resume
            .extract_text(&self.config.apply.resume_path)
            .await?;
        let terms = self.analyzer.infer_search_terms(&resume_text).await?;
        info!(titles = ?terms.job_titles, skills = ?terms.skills, "search terms inferred");

        let ids = self.gather_ids(&terms).await?;
        let mut report = RunReport {
            harvested: ids.len(),
            ..Default::default()
        };
        if ids.is_empty() {
            warn!("no job identifiers gathered; nothing to apply to");
            return Ok(report);
        }

        let postings =
            scrape_descriptions(self.driver.as_ref(), &self.catalog, &self.config.board, &ids)
                .await;
        let ranked = rank_by_fit(self.analyzer.as_ref(), &resume_text, &postings).await?;

        for job in &ranked {
            if let Some(min) = self.config.min_score {
                if job.score < min {
                    info!(job = %job.id, score = job.score, "below score floor; stopping");
                    break;
                }
            }
            if let Some(max) = self.config.max_applications {
                if report.submitted >= max {
                    info!(max, "application cap reached");
                    break;
                }
            }

            let outcome = apply_to_job(
                self.driver.as_ref(),
                self.ledger.as_ref(),
                &self.catalog,
                &self.config.board,
                &self.config.apply,
                &job.id,
            )
            .await;

            report.attempted += 1;
            match outcome {
                ApplyOutcome::EasyApplied | ApplyOutcome::Submitted => report.submitted += 1,
                ApplyOutcome::DuplicateTitle => report.duplicates += 1,
                ApplyOutcome::Abandoned { .. } => report.abandoned += 1,
            }
        }

        if self.credentials.is_some() {
            logout(self.driver.as_ref(), &self.catalog, &self.config.board).await;
        }

        info!(
            harvested = report.harvested,
            attempted = report.attempted,
            submitted = report.submitted,
            duplicates = report.duplicates,
            abandoned = report.abandoned,
            "run complete"
        );
        Ok(report)
    }

    /// One listing session per inferred title; identifiers unioned.
    ///
    /// A session-level `NoResults` only fails the run when every session
    /// returned it.
    async fn gather_ids(&self, terms: &crate::traits::ai::SearchTerms) -> Result<Vec<JobId>> {
        let mut ids: Vec<JobId> = Vec::new();
        let mut empty_sessions = 0;
        let mut sessions = 0;

        for title in &terms.job_titles {
            sessions += 1;
            let spec = self.config.search.clone().with_keywords(terms.query_for(title));
            run_search(self.driver.as_ref(), &self.catalog, &self.config.board, &spec).await?;

            match harvest(self.driver.as_ref(), &self.catalog, &self.config.harvest).await {
                Ok(outcome) => {
                    for id in outcome.ids {
                        if !ids.contains(&id) {
                            ids.push(id);
                        }
                    }
                }
                Err(FlowError::NoResults) => {
                    warn!(title = %title, "no results for this term");
                    empty_sessions += 1;
                }
                Err(e) => return Err(e),
            }
        }

        if sessions > 0 && empty_sessions == sessions {
            return Err(FlowError::NoResults);
        }
        Ok(ids)
    }
}
