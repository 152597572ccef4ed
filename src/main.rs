use tracing_subscriber::EnvFilter;

use hackathon_finder::api;
use hackathon_finder::config::Config;
use hackathon_finder::scheduler;
use hackathon_finder::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Database: {}", config.database_url);
    tracing::info!("LLM provider: {} ({})", config.llm.provider, config.llm.model);
    if config.llm.api_key.is_none() {
        tracing::warn!("No LLM_API_KEY set; searches will fail until one is configured");
    }

    let state = AppState::new(config.clone()).await?;
    let _refresh = scheduler::spawn_auto_scrape(state.clone());

    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
