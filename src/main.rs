use std::net::TcpListener;

use anyhow::Context;
use env_logger::Env;
use harvest::{
    configuration::get_configuration,
    services::{AnonovaClient, ApifyClient},
    startup::run,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().context("Failed to read configuration.")?;

    std::fs::create_dir_all(&configuration.application.export_dir)
        .context("Failed to create export directory")?;

    let apify_client = ApifyClient::new(&configuration.apify)?;
    let anonova_client = AnonovaClient::new(&configuration.anonova)?;

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    log::info!(
        "Listening on {}, polling every {}s up to {} times",
        address,
        configuration.polling.interval_secs,
        configuration.polling.max_attempts
    );

    run(listener, configuration, apify_client, anonova_client)?.await?;
    Ok(())
}
