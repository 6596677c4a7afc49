use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use project_intake::{
    config::{Config, OwnerType},
    dispatch::Dispatcher,
    github::GitHubApp,
    handler::WebhookHandler,
    server::{AppState, router},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();

    let github = GitHubApp::new(config.app_id, &config.private_key_pem(), &config.github_api_url)
        .context("failed to set up GitHub App authentication")?;

    let project = config.project();
    if project.owner_type == OwnerType::User {
        warn!("User-owned projects are not supported; opened issues will fail to be added");
    }

    let dispatcher = Dispatcher::new(Arc::new(github), project);
    let state = Arc::new(AppState {
        handler: WebhookHandler::new(config.webhook_secret.clone(), dispatcher),
    });

    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("GitHub project intake starting on {}", addr);
    info!(
        app_id = config.app_id,
        "Adding opened issues to {} {} project {}",
        config.project_owner_type,
        config.project_owner,
        config.project_number
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
