use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};

use crate::{
    auth::AuthUser,
    domain::{
        repositories::{
            stripe_customers::StripeCustomerRepository,
            stripe_subscriptions::StripeSubscriptionRepository,
        },
        value_objects::checkout::{PortalSessionRequest, PortalSessionResponse},
    },
    infrastructure::postgres::{
        postgres_connection::PgPoolSquad,
        repositories::{
            stripe_customers::StripeCustomerPostgres,
            stripe_subscriptions::StripeSubscriptionPostgres,
        },
    },
    payments::stripe_client::StripeClient,
    usecases::billing::{BillingUseCase, StripeGateway},
};

pub fn routes(db_pool: Arc<PgPoolSquad>, stripe_client: Arc<StripeClient>) -> Router {
    let customer_repository = StripeCustomerPostgres::new(Arc::clone(&db_pool));
    let subscription_repository = StripeSubscriptionPostgres::new(Arc::clone(&db_pool));
    let billing_usecase = BillingUseCase::new(
        Arc::new(customer_repository),
        Arc::new(subscription_repository),
        stripe_client,
    );

    Router::new()
        .route(
            "/portal",
            post(create_billing_portal_session).options(preflight),
        )
        .route(
            "/subscription",
            get(get_current_subscription).options(preflight),
        )
        .with_state(Arc::new(billing_usecase))
}

pub async fn create_billing_portal_session<C, S, G>(
    State(billing_usecase): State<Arc<BillingUseCase<C, S, G>>>,
    auth: AuthUser,
    Json(payload): Json<PortalSessionRequest>,
) -> impl IntoResponse
where
    C: StripeCustomerRepository + Send + Sync + 'static,
    S: StripeSubscriptionRepository + Send + Sync + 'static,
    G: StripeGateway + Send + Sync + 'static,
{
    match billing_usecase
        .create_billing_portal_session(&auth.user_id, payload)
        .await
    {
        Ok(url) => (StatusCode::OK, Json(PortalSessionResponse { url })).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Dashboard callers preflight both billing routes; answer with permissive
/// CORS and no body.
pub async fn preflight() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [
            (
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            ),
            (
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static("GET, POST, OPTIONS"),
            ),
            (
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static("*"),
            ),
        ],
    )
}

pub async fn get_current_subscription<C, S, G>(
    State(billing_usecase): State<Arc<BillingUseCase<C, S, G>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    C: StripeCustomerRepository + Send + Sync + 'static,
    S: StripeSubscriptionRepository + Send + Sync + 'static,
    G: StripeGateway + Send + Sync + 'static,
{
    match billing_usecase.get_current_subscription(&auth.user_id).await {
        Ok(current) => (StatusCode::OK, Json(current)).into_response(),
        Err(err) => err.into_response(),
    }
}
