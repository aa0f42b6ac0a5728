use configurator_runtime::HostConfig;
use configurator_runtime::config::DEFAULT_LOG_FILTER;
use std::io;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let config = HostConfig::from_env();
    init_tracing(&config.log_filter);

    if let Err(err) = configurator_runtime::run(config) {
        tracing::error!(target: "configurator.host", "configurator host fatal error: {err}");
        process::exit(1);
    }
}

// stdout carries protocol frames, so logs go to stderr.
fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|err| {
        eprintln!("invalid log filter {filter:?} ({err}); using {DEFAULT_LOG_FILTER}");
        EnvFilter::new(DEFAULT_LOG_FILTER)
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .init();
}
