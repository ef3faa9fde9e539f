use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{ArgGroup, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use upsell_agent::campaign::{DispatchConfig, Dispatcher, WebhookDelivery};
use upsell_agent::cohort::{self, CampaignCategory};
use upsell_agent::csv_io;
use upsell_agent::insight;
use upsell_agent::llm::GeminiClient;
use upsell_agent::models::{CampaignOutcome, ScoredUser};
use upsell_agent::report;
use upsell_agent::sample;
use upsell_agent::scoring;

#[derive(Parser)]
#[command(name = "upsell-agent")]
#[command(about = "Upgrade propensity scoring and campaign outreach for SaaS users", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize sample user data and write it as an import CSV
    Seed {
        #[arg(long, default_value_t = 500)]
        count: usize,
        #[arg(long, default_value = "users.csv")]
        out: PathBuf,
    },
    /// Score users and list the best upgrade candidates
    Score {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value_t = 0.5)]
        min_propensity: f64,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Export the filtered set after scoring
        #[arg(long)]
        export: bool,
        /// Export path (defaults to a date-suffixed filename)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Score users, build cohorts, and dispatch outreach
    #[command(group(
        ArgGroup::new("scope")
            .args(["cohort", "all"])
            .required(true)
            .multiple(false)
    ))]
    Campaign {
        #[arg(long)]
        csv: PathBuf,
        /// Dispatch a single cohort, identified by its recommendation message
        #[arg(long)]
        cohort: Option<String>,
        /// Dispatch one representative per cohort
        #[arg(long)]
        all: bool,
        #[arg(long, default_value_t = 0.5)]
        min_propensity: f64,
        /// Pause between members within a cohort, in milliseconds
        #[arg(long, default_value_t = 500)]
        member_delay_ms: u64,
        /// Pause between cohorts when sweeping, in milliseconds
        #[arg(long, default_value_t = 700)]
        cohort_delay_ms: u64,
    },
    /// Ask the model what separates upgraded users from the rest
    Insight {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Generate a markdown overview report
    Report {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value_t = 0.5)]
        min_propensity: f64,
        /// Run the scoring engine before reporting
        #[arg(long)]
        score: bool,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Seed { count, out } => {
            let records = sample::generate_records(count);
            let users: Vec<ScoredUser> = records.into_iter().map(ScoredUser::unscored).collect();
            csv_io::export_users(&out, &users)?;
            println!("Wrote {} sample users to {}.", users.len(), out.display());
        }
        Commands::Score {
            csv,
            min_propensity,
            limit,
            export,
            out,
        } => {
            let records = csv_io::import_records(&csv)?;
            let model = GeminiClient::from_env()?;
            let scored = scoring::score_batch(&model, records).await;
            let filtered = cohort::filter_by_threshold(&scored, min_propensity);

            println!(
                "Scored {} users; {} at or above {min_propensity:.2}.",
                scored.len(),
                filtered.len()
            );
            println!("Top users by upgrade propensity:");
            for user in cohort::top_n(&filtered, limit) {
                println!(
                    "- {} ({}, {}) score {:.2}: {}",
                    user.record.name,
                    user.record.email,
                    user.record.plan,
                    user.propensity_score,
                    user.reason.as_deref().unwrap_or("no reason given")
                );
            }

            if export {
                let path =
                    out.unwrap_or_else(|| PathBuf::from(csv_io::default_export_filename()));
                csv_io::export_users(&path, &filtered)?;
                println!("Exported {} users to {}.", filtered.len(), path.display());
            }
        }
        Commands::Campaign {
            csv,
            cohort: cohort_key,
            all,
            min_propensity,
            member_delay_ms,
            cohort_delay_ms,
        } => {
            let records = csv_io::import_records(&csv)?;
            let model = GeminiClient::from_env()?;
            let scored = scoring::score_batch(&model, records).await;
            let filtered = cohort::filter_by_threshold(&scored, min_propensity);
            let cohorts = cohort::group_by_recommendation(&filtered);
            if cohorts.is_empty() {
                bail!("no cohorts at or above propensity {min_propensity:.2}");
            }

            let channel = WebhookDelivery::from_env()?;
            let config = DispatchConfig {
                member_interval: Duration::from_millis(member_delay_ms),
                cohort_interval: Duration::from_millis(cohort_delay_ms),
                ..DispatchConfig::default()
            };
            let dispatcher = Dispatcher::new(&channel, config);

            if all {
                let outcomes = dispatcher.run_all_campaigns(&cohorts).await;
                for outcome in &outcomes {
                    print_outcome(outcome);
                }
                if outcomes.len() < cohorts.len() {
                    bail!(
                        "campaign sweep aborted after {} of {} cohorts",
                        outcomes.len(),
                        cohorts.len()
                    );
                }
            } else {
                let key = cohort_key.context("--cohort or --all is required")?;
                let target = cohorts
                    .iter()
                    .find(|c| c.key == key)
                    .with_context(|| format!("no cohort with message {key:?}"))?;
                let outcome = dispatcher
                    .run_cohort_campaign(&target.key, &target.members, &target.key)
                    .await;
                print_outcome(&outcome);
                if outcome.failed > 0 {
                    bail!("cohort campaign failed after {} sends", outcome.attempted);
                }
            }
        }
        Commands::Insight { csv } => {
            let records = csv_io::import_records(&csv)?;
            let users: Vec<ScoredUser> = records.into_iter().map(ScoredUser::unscored).collect();
            let model = GeminiClient::from_env()?;
            let sentence = insight::discover_insight(&model, &users)
                .await
                .context("insight discovery failed")?;
            println!("{sentence}");
        }
        Commands::Report {
            csv,
            min_propensity,
            score,
            out,
        } => {
            let records = csv_io::import_records(&csv)?;
            let users: Vec<ScoredUser> = if score {
                let model = GeminiClient::from_env()?;
                scoring::score_batch(&model, records).await
            } else {
                records.into_iter().map(ScoredUser::unscored).collect()
            };
            let report = report::build_report(&users, min_propensity);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn print_outcome(outcome: &CampaignOutcome) {
    let category = CampaignCategory::classify(&outcome.cohort_key);
    println!(
        "- [{}] {:?}: {} attempted, {} succeeded, {} failed",
        category.label(),
        outcome.cohort_key,
        outcome.attempted,
        outcome.succeeded,
        outcome.failed
    );
}
