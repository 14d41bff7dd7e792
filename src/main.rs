use anyhow::{Context, Result};
use pdfrows::{
    batch::{run_batch, RunOutcome},
    config::Config,
    oracle::{GeminiClient, OracleConfig},
};
use std::{
    env,
    io::{self, BufRead, Write},
    path::PathBuf,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// First CLI argument, or ask on stdin.
fn input_dir() -> Result<PathBuf> {
    if let Some(arg) = env::args_os().nth(1) {
        return Ok(PathBuf::from(arg));
    }
    print!("Enter the path to the directory containing your PDF files: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("reading directory path from stdin")?;
    Ok(PathBuf::from(line.trim()))
}

/// Log a fatal error before handing it back to `main`.
fn logged<T, E: std::fmt::Display>(result: Result<T, E>, what: &str) -> Result<T, E> {
    result.map_err(|e| {
        error!("{}: {:#}", what, e);
        e
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,pdfrows=info"));
    fmt::Subscriber::builder().with_env_filter(env).init();
    info!("startup");

    // ─── 2) configuration ────────────────────────────────────────────
    let cfg = logged(Config::from_env(), "loading configuration")?;
    info!(model = %cfg.model, output = %cfg.output.display(), "configured");

    let client = logged(GeminiClient::from_config(&cfg), "building Gemini client")?;
    let oracle_cfg = OracleConfig::new(cfg.model.clone());

    // ─── 3) input ────────────────────────────────────────────────────
    let dir = input_dir()?;

    // ─── 4) run ──────────────────────────────────────────────────────
    let outcome = logged(
        run_batch(&client, &oracle_cfg, &dir, &cfg.output).await,
        "batch run",
    )?;
    match outcome {
        RunOutcome::Written { path, rows, summary } => {
            info!(
                rows,
                skipped = summary.skipped.len(),
                "data successfully saved to {}",
                path.display()
            );
        }
        RunOutcome::NothingExtracted { .. } => {
            warn!("no valid data was extracted from any of the files; nothing written");
        }
    }

    info!("all done");
    Ok(())
}
