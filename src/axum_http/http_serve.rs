use crate::{
    auth::ClerkJwtVerifier,
    axum_http::{default_routers, routers},
    config::config_model::DotEnvyConfig,
    infrastructure::postgres::postgres_connection::PgPoolSquad,
    payments::stripe_client::StripeClient,
};
use anyhow::Result;
use axum::{
    Extension, Router,
    http::{HeaderValue, header},
    routing::get,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::{
    limit::RequestBodyLimitLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::info;

pub fn app(
    config: &DotEnvyConfig,
    db_pool: Arc<PgPoolSquad>,
    stripe_client: Arc<StripeClient>,
    clerk_verifier: Arc<ClerkJwtVerifier>,
) -> Result<Router> {
    // No timeout layer here: checkout requests are abandoned by the caller,
    // never cancelled server-side. OPTIONS is owned by each router's explicit
    // 204 preflight handler; a CorsLayer would answer preflight itself before
    // routing runs, so only the allow-origin response header is layered on.
    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest(
            "/api/v1/checkout",
            routers::checkout::routes(Arc::clone(&db_pool), Arc::clone(&stripe_client)),
        )
        .nest(
            "/api/v1/billing",
            routers::billing::routes(Arc::clone(&db_pool), Arc::clone(&stripe_client)),
        )
        .route("/api/v1/health-check", get(default_routers::health_check))
        .layer(Extension(clerk_verifier))
        .layer(RequestBodyLimitLayer::new(
            (config.backend_server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

pub async fn start(
    config: Arc<DotEnvyConfig>,
    db_pool: Arc<PgPoolSquad>,
    stripe_client: Arc<StripeClient>,
    clerk_verifier: Arc<ClerkJwtVerifier>,
) -> Result<()> {
    let app = app(&config, db_pool, stripe_client, clerk_verifier)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_server.port));
    let listener = TcpListener::bind(addr).await?;

    info!("Server is running on port {}", config.backend_server.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
    };

    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::config_model::{BackendServer, Clerk, Database, Stripe};
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use diesel::PgConnection;
    use diesel::r2d2::{ConnectionManager, Pool};
    use tower::ServiceExt;

    fn test_app() -> Router {
        let config = DotEnvyConfig {
            backend_server: BackendServer {
                port: 0,
                body_limit: 1,
            },
            database: Database {
                url: "postgres://localhost/billing_test".to_string(),
            },
            stripe: Stripe {
                secret_key: "sk_test_123".to_string(),
            },
            clerk: Clerk {
                publishable_key: "pk_test_striking-mole-99.accounts.clerk.accounts.dev"
                    .to_string(),
            },
        };

        // Lazy pool: preflight requests never check out a connection.
        let manager = ConnectionManager::<PgConnection>::new(&config.database.url);
        let db_pool = Pool::builder().build_unchecked(manager);

        let clerk_verifier =
            ClerkJwtVerifier::from_publishable_key(&config.clerk.publishable_key).unwrap();
        let stripe_client = StripeClient::new(config.stripe.secret_key.clone());

        app(
            &config,
            Arc::new(db_pool),
            Arc::new(stripe_client),
            Arc::new(clerk_verifier),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn checkout_preflight_resolves_to_no_content_through_the_full_router() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/v1/checkout")
                    .header("origin", "https://dashboard.example")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let headers = response.headers();
        assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
        assert_eq!(
            headers.get("access-control-allow-methods").unwrap(),
            "POST, OPTIONS"
        );
        assert_eq!(headers.get("access-control-allow-headers").unwrap(), "*");
    }

    #[tokio::test]
    async fn checkout_preflight_needs_no_authorization_header() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/v1/checkout")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn billing_preflight_resolves_to_no_content_through_the_full_router() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/v1/billing/portal")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn responses_carry_the_allow_origin_header() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/api/v1/health-check")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "*"
        );
    }
}
