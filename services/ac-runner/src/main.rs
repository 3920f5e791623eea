mod builtin;
mod config;
mod plugin_process;
mod reporter_http;
mod run;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{Cli, RunnerConfig};
use crate::reporter_http::HttpReporter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // stdout carries the progress lines; logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cfg = RunnerConfig::from_cli(Cli::parse())?;
    info!(
        lang = %cfg.lang,
        data_type = %cfg.check.data_type(),
        input = %cfg.input.display(),
        "ac-runner: starting"
    );

    let calculator = run::build_calculator(&cfg)?;
    let reporter = HttpReporter::new(cfg.payload_url.clone(), cfg.report_secret.clone());
    info!(run_id = %reporter.run_id(), "result reporter ready");

    let sent = run::execute(&cfg, calculator, &reporter).await?;
    info!(values = sent, "ac-runner: done");
    Ok(())
}
