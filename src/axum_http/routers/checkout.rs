use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::IntoResponse,
    routing::post,
};

use crate::{
    auth::AuthUser,
    domain::{
        repositories::{
            stripe_customers::StripeCustomerRepository,
            stripe_subscriptions::StripeSubscriptionRepository,
        },
        value_objects::checkout::{CheckoutSessionRequest, CheckoutSessionResponse},
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
        .route("/", post(create_checkout_session).options(preflight))
        .with_state(Arc::new(billing_usecase))
}

pub async fn create_checkout_session<C, S, G>(
    State(billing_usecase): State<Arc<BillingUseCase<C, S, G>>>,
    auth: AuthUser,
    Json(payload): Json<CheckoutSessionRequest>,
) -> impl IntoResponse
where
    C: StripeCustomerRepository + Send + Sync + 'static,
    S: StripeSubscriptionRepository + Send + Sync + 'static,
    G: StripeGateway + Send + Sync + 'static,
{
    match billing_usecase
        .create_checkout_session(&auth.user_id, auth.email, payload)
        .await
    {
        Ok(session) => (
            StatusCode::OK,
            Json(CheckoutSessionResponse { url: session.url }),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

/// Browsers preflight the checkout call from the dashboard origin; answer
/// with permissive CORS and no body.
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
                HeaderValue::from_static("POST, OPTIONS"),
            ),
            (
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static("*"),
            ),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn preflight_returns_no_content_with_cors_headers() {
        let response = preflight().await.into_response();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let headers = response.headers();
        assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
        assert_eq!(
            headers.get("access-control-allow-methods").unwrap(),
            "POST, OPTIONS"
        );
        assert_eq!(headers.get("access-control-allow-headers").unwrap(), "*");
    }
}
