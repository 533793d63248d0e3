use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, warn};

use groupscholar_academic_records::config::AppConfig;
use groupscholar_academic_records::{
    course_stats, cumulative, curriculum, db, logging, profile, report, summary, transcript,
    Snapshot,
};

#[derive(Parser)]
#[command(name = "academic-records")]
#[command(about = "Credit-weighted academic records for Group Scholar carriers", long_about = None)]
struct Cli {
    /// Read records from a JSON snapshot instead of Postgres
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import assessment scores from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Show a carrier's profile and career totals
    Profile {
        #[arg(long)]
        carrier: i64,
    },
    /// List a carrier's terms in chronological order
    Terms {
        #[arg(long)]
        carrier: i64,
    },
    /// Summarize one term against field, department and college peers
    TermSummary {
        #[arg(long)]
        carrier: i64,
        #[arg(long)]
        term: i64,
    },
    /// Term-by-term cumulative record
    Records {
        #[arg(long)]
        carrier: i64,
    },
    /// List a carrier's enrollments in one term
    Transcript {
        #[arg(long)]
        carrier: i64,
        #[arg(long)]
        term: i64,
    },
    /// Show the assessment components behind one grade
    Grades {
        #[arg(long)]
        carrier: i64,
        #[arg(long)]
        offering: i64,
    },
    /// Grade average, minimum and maximum of a course offering
    CourseStats {
        #[arg(long)]
        offering: i64,
    },
    /// Show the curriculum of a carrier's subfield
    Curriculum {
        #[arg(long)]
        carrier: i64,
    },
    /// Generate a markdown career report
    Report {
        #[arg(long)]
        carrier: i64,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[derive(Serialize)]
struct TermListing {
    id: i64,
    title: String,
    start_date: chrono::NaiveDate,
    end_date: chrono::NaiveDate,
}

#[derive(Serialize)]
struct OfferingStatistics {
    offering_id: i64,
    registered: usize,
    #[serde(flatten)]
    statistics: course_stats::CourseStatistics,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(config.database_url()?)
        .await
        .context("failed to connect to Postgres")
}

async fn load_snapshot(
    cli_snapshot: Option<&PathBuf>,
    config: &AppConfig,
) -> anyhow::Result<Snapshot> {
    match cli_snapshot {
        Some(path) => Snapshot::from_json_file(path),
        None => {
            let pool = connect(config).await?;
            Ok(Snapshot::new(db::fetch_snapshot(&pool).await?))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    logging::init(config.log_format);
    let cli = Cli::parse();

    match cli.command {
        Commands::InitDb => {
            let pool = connect(&config).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect(&config).await?;
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let pool = connect(&config).await?;
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} assessment scores from {}.", csv.display());
        }
        Commands::Profile { carrier } => {
            let snapshot = load_snapshot(cli.snapshot.as_ref(), &config).await?;
            print_json(&profile::carrier_profile(&snapshot, carrier)?)?;
        }
        Commands::Terms { carrier } => {
            let snapshot = load_snapshot(cli.snapshot.as_ref(), &config).await?;
            let terms: Vec<TermListing> = snapshot
                .carrier_terms(carrier)?
                .into_iter()
                .map(|term| TermListing {
                    id: term.id,
                    title: term.title(),
                    start_date: term.start_date,
                    end_date: term.end_date,
                })
                .collect();
            print_json(&terms)?;
        }
        Commands::TermSummary { carrier, term } => {
            let snapshot = load_snapshot(cli.snapshot.as_ref(), &config).await?;
            print_json(&summary::term_summary(&snapshot, carrier, term)?)?;
        }
        Commands::Records { carrier } => {
            let snapshot = load_snapshot(cli.snapshot.as_ref(), &config).await?;
            print_json(&cumulative::cumulative_records(&snapshot, carrier)?)?;
        }
        Commands::Transcript { carrier, term } => {
            let snapshot = load_snapshot(cli.snapshot.as_ref(), &config).await?;
            print_json(&transcript::term_transcript(&snapshot, carrier, term)?)?;
        }
        Commands::Grades { carrier, offering } => {
            let snapshot = load_snapshot(cli.snapshot.as_ref(), &config).await?;
            print_json(&transcript::grade_breakdown(&snapshot, carrier, offering)?)?;
        }
        Commands::CourseStats { offering } => {
            let snapshot = load_snapshot(cli.snapshot.as_ref(), &config).await?;
            print_json(&OfferingStatistics {
                offering_id: offering,
                registered: course_stats::registered_count(&snapshot, offering),
                statistics: course_stats::course_statistics(&snapshot, offering)?,
            })?;
        }
        Commands::Curriculum { carrier } => {
            let snapshot = load_snapshot(cli.snapshot.as_ref(), &config).await?;
            print_json(&curriculum::curriculum_plan(&snapshot, carrier)?)?;
        }
        Commands::Report { carrier, out } => {
            let snapshot = load_snapshot(cli.snapshot.as_ref(), &config).await?;
            let carrier_profile = profile::carrier_profile(&snapshot, carrier)?;
            let records = cumulative::cumulative_records(&snapshot, carrier)?;

            let latest_term = snapshot.carrier_terms(carrier)?.last().copied();
            let latest = match latest_term {
                Some(term) => match summary::term_summary(&snapshot, carrier, term.id) {
                    Ok(term_summary) => Some((term.title(), term_summary)),
                    Err(err) => {
                        warn!(
                            error = %err,
                            term_id = term.id,
                            "Peer summary unavailable, omitting it"
                        );
                        None
                    }
                },
                None => None,
            };

            let report = report::build_report(
                &carrier_profile,
                &records,
                latest.as_ref().map(|(title, s)| (title.as_str(), s)),
            );
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            info!(carrier, out = %out.display(), "Report written");
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
