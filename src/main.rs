use anyhow::Result;
use billing::auth::ClerkJwtVerifier;
use billing::axum_http::http_serve;
use billing::config::config_loader;
use billing::infrastructure::postgres::postgres_connection;
use billing::observability;
use billing::payments::stripe_client::StripeClient;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        error!("Billing backend exited with error: {}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    observability::init_observability("billing")?;

    let dotenvy_env = config_loader::load()?;
    info!("ENV has been loaded");

    let clerk_verifier =
        ClerkJwtVerifier::from_publishable_key(&dotenvy_env.clerk.publishable_key)?;
    info!(jwks_url = %clerk_verifier.jwks_url(), "Clerk key set endpoint resolved");

    let stripe_client = StripeClient::new(dotenvy_env.stripe.secret_key.clone());

    let postgres_pool = postgres_connection::establish_connection(&dotenvy_env.database.url)?;
    info!("Postgres connection has been established");

    http_serve::start(
        Arc::new(dotenvy_env),
        Arc::new(postgres_pool),
        Arc::new(stripe_client),
        Arc::new(clerk_verifier),
    )
    .await?;

    Ok(())
}
