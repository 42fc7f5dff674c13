//! Command-line entry point for the application pipeline.

use anyhow::{bail, Context, Result};
use clap::Parser;
use secrecy::SecretString;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jobpilot::{
    ChromeDriver, Credentials, FileLedger, OpenAi, PdfResume, Pilot, PilotConfig,
};

#[derive(Parser, Debug)]
#[command(name = "jobpilot", about = "Automated job-board search and application")]
struct Args {
    /// Resume PDF to extract search terms from and upload when required
    #[arg(long)]
    resume: PathBuf,

    /// Location query (e.g. "Denver" or "remote")
    #[arg(long, default_value = "remote")]
    location: String,

    /// Applied-title ledger file
    #[arg(long, default_value = "job_titles.txt")]
    ledger: PathBuf,

    /// Show the browser window instead of running headless
    #[arg(long, default_value_t = false)]
    headful: bool,

    /// Cap on pagination/scroll rounds per listing session
    #[arg(long, default_value_t = 20)]
    max_rounds: usize,

    /// Skip postings scoring below this similarity
    #[arg(long)]
    min_score: Option<f32>,

    /// Stop after this many submitted applications
    #[arg(long)]
    max_applications: Option<usize>,

    /// Skip the login step (an already-authenticated profile)
    #[arg(long, default_value_t = false)]
    no_login: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,jobpilot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = PilotConfig::new(&args.resume, args.location.clone());
    config.harvest.max_rounds = args.max_rounds;
    config.min_score = args.min_score;
    config.max_applications = args.max_applications;

    let driver = Arc::new(
        ChromeDriver::launch(!args.headful).context("Failed to launch browser")?,
    );
    let analyzer = Arc::new(OpenAi::from_env().context("Failed to configure OpenAI client")?);
    let ledger = Arc::new(
        FileLedger::open(&args.ledger)
            .await
            .context("Failed to open title ledger")?,
    );

    let mut pilot = Pilot::new(driver, analyzer, Arc::new(PdfResume::new()), ledger, config);

    if !args.no_login {
        let email = std::env::var("BOARD_EMAIL");
        let password = std::env::var("BOARD_PASSWORD");
        match (email, password) {
            (Ok(email), Ok(password)) => {
                pilot = pilot.with_credentials(Credentials::new(email, SecretString::from(password)));
            }
            _ => bail!("BOARD_EMAIL and BOARD_PASSWORD must be set (or pass --no-login)"),
        }
    }

    let report = pilot.run().await.context("Pipeline run failed")?;

    println!(
        "harvested: {}  attempted: {}  submitted: {}  duplicates: {}  abandoned: {}",
        report.harvested, report.attempted, report.submitted, report.duplicates, report.abandoned
    );
    Ok(())
}
