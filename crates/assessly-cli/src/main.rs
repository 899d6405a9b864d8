//! assessly CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "assessly",
    version,
    about = "Timed assessments: take them, grade them, review submissions"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available assessments
    List {
        /// Only show this category
        #[arg(long)]
        category: Option<String>,

        /// Free-text search over title and description
        #[arg(long)]
        search: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Take an assessment interactively, against the clock
    Take {
        /// Assessment ID (with or without the "assessment:" prefix)
        #[arg(long)]
        assessment: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Score an answers file against an assessment file locally
    Grade {
        /// Path to the assessment .toml or .json file
        #[arg(long)]
        assessment: PathBuf,

        /// Path to a JSON answers file ({"0": 1, "1": "text"})
        #[arg(long)]
        answers: PathBuf,

        /// Short-answer marking: manual, exact
        #[arg(long, default_value = "manual")]
        short_answer: String,
    },

    /// Validate assessment files
    Validate {
        /// Path to an assessment file or directory
        #[arg(long)]
        assessment: PathBuf,
    },

    /// Review stored submissions
    Submissions {
        /// Only show submissions for this assessment
        #[arg(long)]
        assessment: Option<String>,

        /// Output format: text, json, html
        #[arg(long, default_value = "text")]
        format: String,

        /// Write the report here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Leave feedback and an optional manual score on a submission
    Feedback {
        /// Submission ID
        #[arg(long)]
        submission: String,

        /// Feedback text (keeps the existing text when omitted)
        #[arg(long)]
        feedback: Option<String>,

        /// Override the automatic score
        #[arg(long, conflicts_with = "clear_manual_score")]
        manual_score: Option<u32>,

        /// Drop a previous manual score and fall back to the automatic one
        #[arg(long)]
        clear_manual_score: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and example assessment
    Init,
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("warn,assessly_core=info,assessly_client=info,assessly_cli=info")
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::List {
            category,
            search,
            config,
        } => commands::list::execute(category, search, config).await,
        Commands::Take { assessment, config } => commands::take::execute(assessment, config).await,
        Commands::Grade {
            assessment,
            answers,
            short_answer,
        } => commands::grade::execute(assessment, answers, short_answer),
        Commands::Validate { assessment } => commands::validate::execute(assessment),
        Commands::Submissions {
            assessment,
            format,
            output,
            config,
        } => commands::submissions::execute(assessment, format, output, config).await,
        Commands::Feedback {
            submission,
            feedback,
            manual_score,
            clear_manual_score,
            config,
        } => {
            commands::feedback::execute(
                submission,
                feedback,
                manual_score,
                clear_manual_score,
                config,
            )
            .await
        }
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
