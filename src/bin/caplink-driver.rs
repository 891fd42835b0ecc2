//! The caplink driver binary
//!
//! Spawns the host process (first argument, default `caplink-host`),
//! connects, and runs the interactive session loop. The driver answers the
//! host's sampling requests with the configured generation backend.

use caplink::config::Config;
use caplink::core::error::CapResult;
use caplink::driver::Driver;

#[tokio::main]
async fn main() -> CapResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let command = args.next().unwrap_or_else(|| "caplink-host".to_string());
    let host_args: Vec<String> = args.collect();

    let config = Config::from_env();
    let driver = Driver::connect(&config, &command, &host_args).await?;
    println!(
        "Connected to {} {}",
        driver.host_info().name,
        driver.host_info().version
    );

    let mut session = driver.session();
    if let Err(e) = session.run().await {
        eprintln!("session ended: {e}");
    }

    driver.shutdown().await
}
