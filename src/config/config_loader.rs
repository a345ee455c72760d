use anyhow::{Context, Result};

use super::config_model::DotEnvyConfig;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let backend_server = super::config_model::BackendServer {
        port: std::env::var("SERVER_PORT")
            .context("SERVER_PORT is invalid")?
            .parse()?,
        body_limit: std::env::var("SERVER_BODY_LIMIT")
            .context("SERVER_BODY_LIMIT is invalid")?
            .parse()?,
    };

    let database = super::config_model::Database {
        url: std::env::var("DATABASE_URL").context("DATABASE_URL is invalid")?,
    };

    let stripe = super::config_model::Stripe {
        secret_key: std::env::var("STRIPE_SECRET_KEY").context("STRIPE_SECRET_KEY is invalid")?,
    };

    let clerk = super::config_model::Clerk {
        publishable_key: std::env::var("CLERK_PUBLISHABLE_KEY")
            .context("CLERK_PUBLISHABLE_KEY is invalid")?,
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        stripe,
        clerk,
    })
}
