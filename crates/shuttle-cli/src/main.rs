use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use shuttle_core::{Consumer, LoopError, LoopReport, WorkerLoop};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod sensor;

use cli::Cli;
use sensor::{Reading, SimulatedSensor};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Loop(#[from] LoopError),
}

/// Consumer: one JSON object per line on stdout.
fn json_lines() -> Consumer<Reading> {
    Consumer::new(|reading: Reading| {
        let line = serde_json::to_string(&reading)?;
        let mut out = std::io::stdout().lock();
        writeln!(out, "{line}")?;
        Ok(())
    })
}

async fn run(cli: Cli) -> Result<LoopReport, CliError> {
    cli.validate()?;

    let sensor = SimulatedSensor::new(cli.seed, cli.glitch_rate, cli.disconnect_rate)
        .offline(cli.offline);
    let mut worker = WorkerLoop::with_consumer(sensor, json_lines()).with_config(cli.loop_config());
    worker.start().await?;

    let stop = worker.stop_handle();
    let deadline = cli.duration();
    tokio::select! {
        _ = stop.wait_terminated() => {}
        _ = async {
            match deadline {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending().await,
            }
        } => {
            tracing::info!("duration elapsed, stopping");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted, stopping");
        }
    }

    Ok(worker.stop_and_join().await?)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(Cli::parse()).await {
        Ok(report) => {
            tracing::info!(
                loop_id = %report.loop_id,
                iterations = report.stats.iterations,
                delivered = report.stats.delivered,
                recovered_faults = report.stats.recovered_faults,
                elapsed_ms = report.elapsed().num_milliseconds(),
                "shuttle finished"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "shuttle failed");
            ExitCode::FAILURE
        }
    }
}
