use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;

mod db;
mod derive;
mod models;
mod payload;
mod report;

use models::Cluster;

#[derive(Parser)]
#[command(name = "grasp-profiler")]
#[command(about = "Student intake profiler for the GRASP employability predictor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import student intakes from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Print the derived profile for one student
    Show {
        #[arg(long)]
        student_no: String,
    },
    /// Emit the JSON payload posted to the prediction backend
    Payload {
        #[arg(long)]
        student_no: String,
        /// Emit the classifier feature vector instead of the record payload
        #[arg(long)]
        features: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Record a prediction response returned by the external service
    RecordPrediction {
        #[arg(long)]
        student_no: String,
        #[arg(long)]
        json: PathBuf,
    },
    /// Generate a markdown cohort report
    #[command(group(
        ArgGroup::new("scope")
            .args(["track", "student_no"])
            .multiple(false)
    ))]
    Report {
        #[arg(long)]
        track: Option<String>,
        #[arg(long)]
        student_no: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Export the filtered student list as CSV
    #[command(group(
        ArgGroup::new("scope")
            .args(["track", "student_no"])
            .multiple(false)
    ))]
    Export {
        #[arg(long)]
        track: Option<String>,
        #[arg(long)]
        student_no: Option<String>,
        #[arg(long, default_value = "students.csv")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let imported = db::import_csv(&pool, &csv).await?;
            println!("Imported {imported} students from {}.", csv.display());
        }
        Commands::Show { student_no } => {
            let intake = db::fetch_student(&pool, &student_no)
                .await?
                .with_context(|| format!("no student with student_no {student_no}"))?;
            let profile = derive::derive_profile(&intake);

            println!("{} ({})", intake.full_name(), intake.student_no);
            for cluster in Cluster::ALL {
                let avg = profile.cluster_average(cluster);
                println!(
                    "  {}: {}",
                    cluster,
                    if avg.is_empty() { "-" } else { avg }
                );
            }
            println!("  Extracurricular cluster: {}", profile.participation);
            println!("  Living arrangement: {}", profile.living_arrangement);
            println!(
                "  Soft skills: {} selected, {}",
                profile.soft_skills.count, profile.soft_skills.level
            );
            println!(
                "  Certifications: {} ({})",
                profile.certification_flag,
                profile.certifications.join(", ")
            );
            println!("  Graduate on time: {}", profile.graduate_on_time);
            println!("  Latin honors: {}", profile.latin_honors.effective);
            if profile.latin_honors.demoted {
                println!(
                    "  warning: Latin honors request demoted; a grade exceeds {:.2}",
                    derive::LATIN_HONORS_GRADE_CEILING
                );
            }
            if let Some(prediction) = db::fetch_prediction(&pool, &student_no).await? {
                println!(
                    "  Recorded prediction: {} (index {})",
                    prediction.prediction_label, prediction.prediction_index
                );
            }
        }
        Commands::Payload {
            student_no,
            features,
            out,
        } => {
            let intake = db::fetch_student(&pool, &student_no)
                .await?
                .with_context(|| format!("no student with student_no {student_no}"))?;

            let json = if features {
                serde_json::to_string_pretty(&payload::model_features(&intake))?
            } else {
                serde_json::to_string_pretty(&payload::student_record(&intake))?
            };

            match out {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("Payload written to {}.", path.display());
                }
                None => println!("{json}"),
            }
        }
        Commands::RecordPrediction { student_no, json } => {
            db::fetch_student(&pool, &student_no)
                .await?
                .with_context(|| format!("no student with student_no {student_no}"))?;

            let raw = std::fs::read_to_string(&json)
                .with_context(|| format!("failed to read {}", json.display()))?;
            let prediction: models::PredictionResult = serde_json::from_str(&raw)
                .context("prediction response did not match the expected shape")?;

            db::store_prediction(&pool, &student_no, &prediction).await?;
            println!(
                "Recorded prediction \"{}\" for {student_no}.",
                prediction.prediction_label
            );
        }
        Commands::Report {
            track,
            student_no,
            out,
        } => {
            let students =
                db::fetch_students(&pool, track.as_deref(), student_no.as_deref()).await?;

            let in_scope: HashSet<&str> =
                students.iter().map(|s| s.student_no.as_str()).collect();
            let predictions: Vec<_> = db::fetch_predictions(&pool)
                .await?
                .into_iter()
                .filter(|(student_no, _)| in_scope.contains(student_no.as_str()))
                .collect();

            let scope = track.as_deref().or(student_no.as_deref());
            let report = report::build_report(scope, &students, &predictions);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export {
            track,
            student_no,
            out,
        } => {
            let students =
                db::fetch_students(&pool, track.as_deref(), student_no.as_deref()).await?;
            report::write_students_csv(&out, &students)?;
            println!("Exported {} students to {}.", students.len(), out.display());
        }
    }

    Ok(())
}
