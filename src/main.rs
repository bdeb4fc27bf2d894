// src/main.rs

use color_eyre::eyre::Result;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

mod config;
mod core;
mod hostlist;
mod logging;
mod sink;

use crate::config::Config;
use crate::core::scanner::ScanRunner;
use crate::core::scanner::probe::HttpProbe;
use crate::sink::CsvSink;

// Exit code for a missing, unreadable or empty host list.
const EXIT_FATAL_INPUT: i32 = 2;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    logging::initialize_logging()?;

    let config_path = env::args().nth(1).map(PathBuf::from);
    let config = Config::load(config_path.as_deref())?;
    info!(
        concurrency = config.concurrent_requests,
        chunk_size = config.chunk_size,
        resource_paths = config.resource_paths.len(),
        folders = config.folders.len(),
        subdomains = config.subdomains.len(),
        "Scanner starting."
    );

    // Host-list loading is the only fatal input path; everything after this
    // point is contained per host task.
    let hosts = match hostlist::read_hosts(&config.domain_file) {
        Ok(hosts) if !hosts.is_empty() => hosts,
        Ok(_) => {
            error!(file = %config.domain_file.display(), "Host list is empty, nothing to scan.");
            std::process::exit(EXIT_FATAL_INPUT);
        }
        Err(err) => {
            error!(file = %config.domain_file.display(), error = %err, "Could not read host list.");
            std::process::exit(EXIT_FATAL_INPUT);
        }
    };

    let sink = Arc::new(CsvSink::open(&config.output_file).await?);
    let recorded = sink.recorded();
    let probe = HttpProbe::new(&config)?;
    let runner = ScanRunner::new(&config, probe, sink, recorded);

    // The run future is dropped on interrupt: no new chunk is launched,
    // in-flight tasks are abandoned, and every record already written to
    // the sink stays durable.
    tokio::select! {
        summary = runner.run(&hosts) => {
            info!(
                found = summary.found,
                elapsed_secs = summary.elapsed.as_secs_f64(),
                "Scan complete."
            );
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt received, stopping the scan.");
        }
    }

    Ok(())
}
