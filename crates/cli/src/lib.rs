pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use roster_core::config::{AppConfig, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "roster",
    about = "Roster operator CLI",
    long_about = "Operate the influencer roster: migrations, seed data, natural-language \
                  queries, and the destructive-action approval queue.",
    after_help = "Examples:\n  roster migrate\n  roster query \"mega tier beauty influencers in Tokyo under 10000\"\n  roster pending list\n  roster pending approve <id>\n  roster doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic roster seed dataset and verify it")]
    Seed,
    #[command(about = "Run one natural-language query through the agent pipeline")]
    Query {
        #[arg(help = "The query text, quoted")]
        text: String,
        #[arg(long, help = "Emit the full response as machine-readable JSON")]
        json: bool,
    },
    #[command(subcommand, about = "Review and execute pending destructive actions")]
    Pending(PendingCommand),
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, provider key readiness, and DB connectivity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

#[derive(Debug, Subcommand)]
enum PendingCommand {
    #[command(about = "List pending actions, optionally filtered by status")]
    List {
        #[arg(long, help = "Filter by status: pending|approved|rejected|executed|failed")]
        status: Option<String>,
        #[arg(long, default_value_t = 20, help = "Maximum number of records to show")]
        limit: u32,
    },
    #[command(about = "Approve a pending action (pending -> approved)")]
    Approve { id: String },
    #[command(about = "Reject a pending action (pending -> rejected)")]
    Reject { id: String },
    #[command(about = "Execute an approved action, deleting the target influencer")]
    Execute { id: String },
}

fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    let result = match config.logging.format {
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_target(false)
            .with_max_level(log_level)
            .compact()
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_target(false)
            .with_max_level(log_level)
            .pretty()
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_target(false)
            .with_max_level(log_level)
            .json()
            .try_init(),
    };
    let _ = result;
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    if let Ok(config) = AppConfig::load(LoadOptions::default()) {
        init_logging(&config);
    }

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Query { text, json } => commands::query::run(&text, json),
        Command::Pending(pending) => match pending {
            PendingCommand::List { status, limit } => {
                commands::pending::list(status.as_deref(), limit)
            }
            PendingCommand::Approve { id } => commands::pending::approve(&id),
            PendingCommand::Reject { id } => commands::pending::reject(&id),
            PendingCommand::Execute { id } => commands::pending::execute(&id),
        },
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
