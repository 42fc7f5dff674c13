//! Resilient job-board search and application automation.
//!
//! Drives a third-party job board it does not control: logs in, infers
//! search terms from a resume, paginates search results collecting unique
//! job identifiers, ranks postings against the resume by embedding
//! similarity, and runs a shadow-DOM-aware multi-step application flow per
//! job.
//!
//! # Design
//!
//! The target site A/B-tests its markup and offers no protocol guarantees,
//! so the core is built around containment: ordered selector fallbacks per
//! semantic target, per-element extraction failures swallowed inside the
//! round loop, per-job failures contained inside the application attempt,
//! and every listing session bounded by a round cap and stagnation
//! detection.
//!
//! # Usage
//!
//! ```rust,ignore
//! use jobpilot::{ChromeDriver, FileLedger, OpenAi, PdfResume, Pilot, PilotConfig};
//! use std::sync::Arc;
//!
//! let driver = Arc::new(ChromeDriver::launch(true)?);
//! let config = PilotConfig::new("resume.pdf", "remote");
//! let pilot = Pilot::new(
//!     driver,
//!     Arc::new(OpenAi::from_env()?),
//!     Arc::new(PdfResume::new()),
//!     Arc::new(FileLedger::open("job_titles.txt").await?),
//!     config,
//! );
//! let report = pilot.run().await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Capability abstractions (page driver, analyzer, ledger)
//! - [`types`] - Job identity, postings, configuration
//! - [`selectors`] - Ordered locator fallbacks per semantic target
//! - [`identity`] - Job identifier derivation
//! - [`shadow`] - Structured queries through shadow DOM boundaries
//! - [`pipeline`] - Search, harvest, rank, and apply stages
//! - [`drivers`] - Browser-backed page driver
//! - [`ledgers`] - Applied-title ledgers (file, memory)
//! - [`ai`] - Language model implementations
//! - [`testing`] - Scripted mocks for pipeline testing

pub mod ai;
pub mod drivers;
pub mod error;
pub mod identity;
pub mod ledgers;
pub mod pipeline;
pub mod resume;
pub mod selectors;
pub mod shadow;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{ApplyError, DriverError, FlowError, LedgerError};
pub use traits::{
    ai::{ResumeAnalyzer, SearchTerms},
    ledger::TitleLedger,
    page::{Element, OptionChoice, PageDriver, WaitPolicy},
    resume::ResumeSource,
};
pub use types::{
    config::{ApplyConfig, BoardConfig, HarvestConfig, PilotConfig, SearchSpec},
    job::{ApplyOutcome, JobId, JobPosting, RankedJob},
};

pub use identity::IdExtractor;
pub use selectors::{select_first_visible, SelectorCatalog};
pub use shadow::ShadowQuery;

// Re-export pipeline components
pub use pipeline::{
    apply_to_job, harvest, login, logout, rank_by_fit, run_search, scrape_descriptions,
    Credentials, HarvestOutcome, Pilot, RunReport, StopReason,
};

// Re-export implementations
pub use ai::OpenAi;
pub use drivers::ChromeDriver;
pub use ledgers::{FileLedger, MemoryLedger};
pub use resume::PdfResume;
