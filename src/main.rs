//! pgscript - main entry point
//!
//! Loads credentials and the script, then hands both to the batch pipeline.
//! Exit code 0 means the whole script ran; 1 means something stopped it.

use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pgscript::cli::Cli;
use pgscript::config_file::DbConfig;
use pgscript::error::ScriptError;
use pgscript::executor::{self, PlanHost};
use pgscript::postgres::PgConnector;
use pgscript::script::Script;
use pgscript::session::Session;
use pgscript::values::ValueStore;

/// Initialize logging. `RUST_LOG` overrides the default `info` level.
fn init_logger() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logger();

    let cli = Cli::parse_args();
    debug!("CLI arguments parsed: {:?}", cli);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}: {:#}", failure_label(&e), e);
            ExitCode::FAILURE
        }
    }
}

/// Tell a broken script or `-V` seed apart from a failing database.
fn failure_label(e: &anyhow::Error) -> &'static str {
    match e.downcast_ref::<ScriptError>() {
        Some(err) if err.is_input_error() => "Script error",
        _ => "Error",
    }
}

async fn run(cli: Cli) -> Result<()> {
    let values = ValueStore::from_seeds(&cli.values).context("Invalid -V value")?;
    let script = Script::load_from_file(&cli.data)?;

    if cli.dry_run {
        let mut host = PlanHost::default();
        let batches = executor::plan(&script, values, &mut host).await?;
        for batch in &batches {
            println!("-- batch {} (line {})\n{}\n\\go", batch.number, batch.line, batch.sql);
        }
        info!("[DRY RUN] {} batches planned", batches.len());
        return Ok(());
    }

    let config = DbConfig::load_from_file(&cli.config)?;
    config.validate().context("Invalid configuration")?;

    let mut session = Session::connect(Box::new(PgConnector), config.connect_options())
        .await
        .context("Could not open DB connection")?;

    let report = executor::run(&script, values, &mut session).await;
    session.close().await;

    report.into_result()?;
    Ok(())
}
