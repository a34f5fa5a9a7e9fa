use chore_quest_backend::config::AppConfig;
use chore_quest_backend::session::IdentityError;
use chore_quest_backend::{create_failure_router, create_router, initialize_backend};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load()?;
    info!("Data directory: {}", config.data_dir.display());

    let (app, session) = match initialize_backend(&config).await {
        Ok(app_state) => (create_router(app_state.clone(), &config)?, Some(app_state.context)),
        Err(e) if e.downcast_ref::<IdentityError>().is_some() => {
            error!("❌ Could not establish an identity: {:#}", e);
            let message = "Could not connect. Please check your connection and reload.".to_string();
            (create_failure_router(message, &config)?, None)
        }
        Err(e) => return Err(e),
    };

    info!("Starting server on {}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Shutting down");
        })
        .await?;

    if let Some(context) = session {
        context.shutdown();
    }
    Ok(())
}
