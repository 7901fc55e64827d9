mod cli;
mod config;
mod signal_handlers;

use std::env;

use dotenvy::dotenv;
use tracing::{Level, event};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use wsd_scan_rs::session;

use crate::cli::parse_cli;

fn main() -> Result<(), color_eyre::Report> {
    // set up .env, if it fails, user didn't provide any
    let _r = dotenv();

    color_eyre::config::HookBuilder::default()
        .capture_span_trace_by_default(false)
        .install()?;

    let rust_log_value = env::var(EnvFilter::DEFAULT_ENV)
        .unwrap_or_else(|_| format!("INFO,{}=TRACE", env!("CARGO_PKG_NAME").replace('-', "_")));

    // set up logger
    // from_env defaults to RUST_LOG
    tracing_subscriber::registry()
        .with(EnvFilter::builder().parse(rust_log_value)?)
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_error::ErrorLayer::default())
        .init();

    // initialize the runtime
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(start_tasks())
}

async fn start_tasks() -> Result<(), color_eyre::Report> {
    let config = parse_cli().inspect_err(|error| {
        // this prints the error in color and exits
        // can't do anything else until
        // https://github.com/clap-rs/clap/issues/2914
        // is merged in
        if let Some(clap_error) = error.downcast_ref::<clap::error::Error>() {
            clap_error.exit();
        }
    })?;

    config.log();

    let client = reqwest::ClientBuilder::new().build()?;

    // now we wait for either
    // * the device's answer
    // * SIGTERM
    // * ctrl + c (SIGINT)
    let caps = tokio::select! {
        caps = session::query_capabilities(&client, config.protocol, config.url.clone(), config.timeout) => {
            caps?
        },
        _ = signal_handlers::wait_for_sigint() => {
            event!(Level::WARN, message = "CTRL+C detected, stopping");

            return Ok(());
        },
        _ = signal_handlers::wait_for_sigterm() => {
            event!(Level::WARN, message = "Sigterm detected, stopping");

            return Ok(());
        },
    };

    print!("{}", caps);

    if config.verbosity >= Level::DEBUG {
        println!("{:#?}", caps);
    }

    event!(Level::INFO, "Goodbye");

    Ok(())
}
