//! opsdesk — facility operations assistant CLI.
//!
//! Startup sequence:
//!   1. Parse CLI arguments
//!   2. Load .env (if present)
//!   3. Load config (explicit path or config/default.toml)
//!   4. Init logger at the effective level
//!   5. Dispatch the subcommand

use clap::{Parser, Subcommand};
use tracing::info;

use opsdesk::agents::{AGENT_IDS, AgentContext, AgentRuntime};
use opsdesk::error::AppError;
use opsdesk::{config, docs, logger};

#[derive(Parser)]
#[command(name = "opsdesk", about = "Facility operations assistant", version)]
struct Cli {
    /// Path to a TOML config file (default: config/default.toml).
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log level override: error, warn, info, debug, trace.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask an agent a question.
    Agent {
        /// Agent id: staff_directory, cameras, doors, or operations.
        #[arg(long)]
        agent: Option<String>,

        /// The query text.
        #[arg(long)]
        query: String,

        /// Extra KEY=VALUE context pairs (e.g. refresh=1).
        #[arg(trailing_var_arg = true)]
        pairs: Vec<String>,
    },

    /// Validate front-matter of Markdown/MDX pages under a directory.
    Docs {
        /// Directory to scan recursively.
        path: String,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    // Load .env if present — ignore errors (file is optional).
    let _ = dotenvy::dotenv();

    let config = config::load(cli.config.as_deref())?;

    // CLI flag wins over env and config; flag values must parse.
    let (level, prefer_level) = match &cli.log_level {
        Some(l) => {
            logger::parse_level(l)?;
            (l.as_str(), true)
        }
        None => (config.log_level.as_str(), false),
    };
    logger::init(level, prefer_level)?;

    info!(
        assistant = %config.assistant_name,
        log_level = %level,
        "config loaded"
    );

    match cli.command {
        Command::Agent {
            agent,
            query,
            pairs,
        } => {
            let agent_id = agent.as_deref().unwrap_or(&config.default_agent);
            if !AGENT_IDS.contains(&agent_id) {
                return Err(AppError::UnknownAgent {
                    requested: agent_id.to_string(),
                    available: AGENT_IDS.join(", "),
                });
            }

            let runtime = AgentRuntime::from_config(&config)?;
            let context = AgentContext::from_pairs(&pairs);
            let reply = runtime.run(agent_id, &query, &context).await?;
            println!("{}", reply.text());
            Ok(())
        }

        Command::Docs { path } => {
            let reports = docs::check_dir(std::path::Path::new(&path))?;
            if reports.is_empty() {
                println!("no pages found under {path}");
                return Ok(());
            }

            let mut failed = 0usize;
            for report in &reports {
                if report.is_ok() {
                    println!("ok   {}", report.path.display());
                } else {
                    failed += 1;
                    println!("FAIL {}", report.path.display());
                    for problem in &report.problems {
                        println!("     - {problem}");
                    }
                }
            }

            if failed > 0 {
                return Err(AppError::Docs(format!(
                    "{failed} of {} page(s) failed validation",
                    reports.len()
                )));
            }
            println!("{} page(s) ok", reports.len());
            Ok(())
        }
    }
}
