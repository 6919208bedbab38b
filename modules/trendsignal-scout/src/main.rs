use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use trendsignal_common::{Credentials, Settings, Term};
use trendsignal_scout::deps::ScoutDeps;
use trendsignal_scout::pipeline::PipelineRunner;

#[derive(Parser)]
#[command(name = "trendsignal-scout", about = "Daily trend discovery and insight publishing")]
struct Cli {
    /// Settings file (TOML). Defaults apply when omitted.
    #[arg(long, env = "TRENDSIGNAL_CONFIG")]
    config: Option<PathBuf>,

    /// Analyze these terms instead of discovering them (comma-separated).
    #[arg(long, value_delimiter = ',')]
    terms: Vec<String>,

    /// Log records instead of writing them to Notion.
    #[arg(long)]
    dry_run: bool,
}

fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("trendsignal=info".parse()?)
        .add_directive("ai_client=info".parse()?)
        .add_directive("notion_client=info".parse()?);

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = init_tracing() {
        eprintln!("failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    info!("Trend scout starting...");

    // Credentials first: nothing touches the network without all five.
    let credentials = match Credentials::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Configuration rejected");
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    credentials.log_redacted();

    let settings = match cli.config {
        Some(ref path) => match Settings::load(path) {
            Ok(s) => {
                info!(path = %path.display(), "Loaded settings");
                s
            }
            Err(e) => {
                error!(error = %e, "Configuration rejected");
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
        },
        None => Settings::default(),
    };

    let deps = match ScoutDeps::from_config(&credentials, &settings, cli.dry_run) {
        Ok(d) => d,
        Err(e) => {
            error!(error = %e, "Failed to initialize pipeline");
            eprintln!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    let runner = PipelineRunner::new(deps, &settings);
    let terms: Vec<Term> = cli
        .terms
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(Term::verbatim)
        .collect();

    let report = if terms.is_empty() {
        runner.run().await
    } else {
        runner.run_terms(terms).await
    };

    info!("{}", report.stats);
    println!("{report}");
    ExitCode::SUCCESS
}
