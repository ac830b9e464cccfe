//! quizgrade CLI: batch grading, payload normalization and score statistics.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "quizgrade", version, about = "Quiz answer grading and statistics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade a batch of attempts against a quiz
    Grade {
        /// Path to the quiz file (.toml or .json)
        #[arg(long)]
        quiz: PathBuf,

        /// Attempts JSON file or directory of JSON files
        #[arg(long)]
        attempts: PathBuf,

        /// Output directory (default: from config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Max concurrent attempts (default: from config)
        #[arg(long)]
        parallelism: Option<usize>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Grading type: percentage, letter, pass_fail, points
        #[arg(long)]
        grading_type: Option<String>,

        /// Passing score, 0 to 100
        #[arg(long)]
        pass_threshold: Option<f64>,
    },

    /// Print canonical payloads for a quiz or a list of lesson steps
    Normalize {
        /// Quiz file to normalize
        #[arg(long, conflicts_with = "steps", required_unless_present = "steps")]
        quiz: Option<PathBuf>,

        /// JSON file with one lesson step or an array of steps
        #[arg(long)]
        steps: Option<PathBuf>,
    },

    /// Show statistics from a saved grading report
    Stats {
        /// Report JSON written by `quizgrade grade`
        #[arg(long)]
        report: PathBuf,
    },

    /// Check that a quiz resolves and list its questions
    Check {
        /// Path to the quiz file
        #[arg(long)]
        quiz: PathBuf,
    },

    /// Create starter config and example quiz
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quizgrade=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Grade {
            quiz,
            attempts,
            output,
            parallelism,
            config,
            grading_type,
            pass_threshold,
        } => {
            commands::grade::execute(
                quiz,
                attempts,
                output,
                parallelism,
                config,
                grading_type,
                pass_threshold,
            )
            .await
        }
        Commands::Normalize { quiz, steps } => commands::normalize::execute(quiz, steps),
        Commands::Stats { report } => commands::stats::execute(report),
        Commands::Check { quiz } => commands::check::execute(quiz),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
