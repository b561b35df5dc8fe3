use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use physique_scan::composition::{analyze_body, generate_diet_plan, generate_workout_routine, PlanInput};
use physique_scan::config::AppConfig;
use physique_scan::export::{write_progression, write_progression_to_file, ExportFormat};
use physique_scan::features::extract_body_features;
use physique_scan::landmarks::extract_key_landmarks;
use physique_scan::logging::{init_logging, OperationTimer};
use physique_scan::metrics::MetricsCollector;
use physique_scan::validation::assess_pose_quality;
use physique_scan::{AnalyzeRequest, Database, Gender, Landmark, PhysiqueService};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a physique and record it as a baseline or progress scan
    Analyze {
        /// JSON file holding the 33 front-view landmarks
        #[arg(short, long)]
        front: PathBuf,

        /// JSON file holding the 33 side-view landmarks
        #[arg(short, long)]
        side: Option<PathBuf>,

        /// male, female or non-binary
        #[arg(short, long, default_value = "male", value_parser = parse_gender)]
        gender: Gender,

        /// Height in centimeters
        #[arg(long)]
        height: Option<f64>,

        /// User id (defaults to the demo user for the gender)
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Extract body features without storing anything
    Features {
        /// JSON file holding the front-view landmarks
        #[arg(short, long)]
        front: PathBuf,

        /// JSON file holding the side-view landmarks
        #[arg(short, long)]
        side: Option<PathBuf>,

        /// male, female or non-binary
        #[arg(short, long, default_value = "male", value_parser = parse_gender)]
        gender: Gender,
    },
    /// Estimate body composition from a single view and derive plans
    Compose {
        /// JSON file holding the 33 landmarks
        #[arg(short, long)]
        pose: PathBuf,
    },
    /// Grade landmark detection quality
    Quality {
        /// JSON file holding the 33 landmarks
        #[arg(short, long)]
        pose: PathBuf,
    },
    /// List a user's scans, newest first
    Scans {
        /// User id
        #[arg(short, long)]
        user: String,

        /// Number of scans (defaults to the configured history limit)
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Export a user's progression history
    History {
        /// User id
        #[arg(short, long)]
        user: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: ExportFormat,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Keep the guard alive so the file appender flushes on exit
    let _log_guard = init_logging(
        Some(&config.get_log_level()),
        config.logging.file_path.as_deref().map(Path::new),
        config.logging.format == "json",
    )?;

    info!("Starting physique-scan");

    if let Err(e) = MetricsCollector::init() {
        error!("Failed to initialize metrics: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            front,
            side,
            gender,
            height,
            user,
        } => {
            let request = AnalyzeRequest {
                front_pose: read_pose(&front)?,
                side_pose: read_optional_pose(side.as_deref())?,
                gender,
                height_cm: height,
                user_id: user,
            };
            let service = open_service(&config)?;
            let report = service.analyze(&request)?;
            print_json(&report)
        }
        Commands::Features { front, side, gender } => {
            let front_pose = read_pose(&front)?;
            let side_pose = read_optional_pose(side.as_deref())?;
            print_json(&extract_body_features(&front_pose, &side_pose, gender))
        }
        Commands::Compose { pose } => {
            let timer = OperationTimer::new("compose");
            let composition = analyze_body(&read_pose(&pose)?)?;
            let plan = PlanInput::from_composition(&composition);
            let output = json!({
                "analysis": composition,
                "diet_plan": generate_diet_plan(&plan),
                "workout_routine": generate_workout_routine(&plan),
            });
            timer.finish();
            print_json(&output)
        }
        Commands::Quality { pose } => {
            let report = quality_report(&read_pose(&pose)?, config.analysis.min_visibility)?;
            print_json(&report)
        }
        Commands::Scans { user, limit } => {
            let service = open_service(&config)?;
            print_json(&service.scan_history(&user, limit)?)
        }
        Commands::History { user, format, output } => {
            let service = open_service(&config)?;
            let records = service.progression_history(&user)?;
            info!("Found {} progression records for {}", records.len(), user);
            match output {
                Some(path) => {
                    write_progression_to_file(&records, format, &path)?;
                    info!("Progression history written to {}", path.display());
                }
                None => write_progression(&records, format, io::stdout().lock())?,
            }
            Ok(())
        }
    }
}

fn open_service(config: &AppConfig) -> Result<PhysiqueService> {
    let mut database_config = config.database.clone();
    database_config.url = config.get_database_url();
    let db = Database::from_config(&database_config).context("Failed to open scan database")?;
    Ok(PhysiqueService::new(Box::new(db), config.analysis.clone()))
}

/// Quality grade plus the named joints that were detected
fn quality_report(pose: &[Landmark], min_visibility: f64) -> Result<Value> {
    let quality = assess_pose_quality(pose, min_visibility)?;
    Ok(json!({
        "quality": quality,
        "key_landmarks": extract_key_landmarks(pose),
    }))
}

fn parse_gender(value: &str) -> std::result::Result<Gender, String> {
    value.parse::<Gender>().map_err(|e| e.to_string())
}

fn read_pose(path: &Path) -> Result<Vec<Landmark>> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse landmarks in {}", path.display()))
}

fn read_optional_pose(path: Option<&Path>) -> Result<Vec<Landmark>> {
    path.map_or_else(|| Ok(Vec::new()), read_pose)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_report_names_key_joints() {
        let pose = vec![Landmark::new(0.5, 0.5); 33];
        let report = quality_report(&pose, 0.5).unwrap();
        assert_eq!(report["quality"]["quality"], "excellent");
        assert_eq!(report["key_landmarks"].as_object().unwrap().len(), 17);
        assert_eq!(report["key_landmarks"]["left_shoulder"]["x"], 0.5);
    }

    #[test]
    fn test_quality_report_rejects_short_pose() {
        assert!(quality_report(&[Landmark::new(0.5, 0.5); 12], 0.5).is_err());
    }

    #[test]
    fn test_gender_argument_parsing() {
        assert_eq!(parse_gender("non-binary").unwrap(), Gender::NonBinary);
        assert!(parse_gender("robot").is_err());
    }
}
