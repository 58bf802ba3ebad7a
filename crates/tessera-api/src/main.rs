use tessera_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    // Initialize the application (database, storage, pipeline, routes)
    let (state, router) = tessera_api::setup::initialize_app(config.clone()).await?;

    let sweeper = tessera_api::services::ticket_sweeper::start_ticket_sweeper(
        state.tickets.clone(),
        config.ticket_purge_interval_secs,
    );

    let result = tessera_api::setup::server::start_server(&config, router).await;

    if let Some(handle) = sweeper {
        handle.abort();
    }

    result
}
