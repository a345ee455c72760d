use std::sync::Arc;

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    domain::{
        repositories::{
            stripe_customers::StripeCustomerRepository,
            stripe_subscriptions::StripeSubscriptionRepository,
        },
        value_objects::{
            checkout::{CheckoutMode, CheckoutSessionRequest, PortalSessionRequest},
            enums::subscription_statuses::SubscriptionStatus,
            stripe_customers::CustomerMappingInsert,
            stripe_subscriptions::CurrentSubscriptionDto,
        },
    },
    payments::stripe_client::{CreatedCheckoutSession, StripeClient},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StripeGateway: Send + Sync {
    async fn create_customer(&self, email: &str, user_id: &str) -> AnyResult<String>;

    async fn delete_customer(&self, customer_id: &str) -> AnyResult<()>;

    async fn create_checkout_session(
        &self,
        customer_id: &str,
        price_id: &str,
        mode: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> AnyResult<CreatedCheckoutSession>;

    async fn create_billing_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> AnyResult<String>;
}

#[async_trait]
impl StripeGateway for StripeClient {
    async fn create_customer(&self, email: &str, user_id: &str) -> AnyResult<String> {
        self.create_customer(email, user_id).await
    }

    async fn delete_customer(&self, customer_id: &str) -> AnyResult<()> {
        self.delete_customer(customer_id).await
    }

    async fn create_checkout_session(
        &self,
        customer_id: &str,
        price_id: &str,
        mode: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> AnyResult<CreatedCheckoutSession> {
        self.create_checkout_session(customer_id, price_id, mode, success_url, cancel_url)
            .await
    }

    async fn create_billing_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> AnyResult<String> {
        self.create_billing_portal_session(customer_id, return_url)
            .await
    }
}

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("{0}")]
    Validation(String),
    #[error("Billing customer not found")]
    CustomerNotFound,
    #[error("{0}")]
    Persistence(&'static str),
    #[error(transparent)]
    Provider(anyhow::Error),
}

impl BillingError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            BillingError::Validation(_) => StatusCode::BAD_REQUEST,
            BillingError::CustomerNotFound => StatusCode::NOT_FOUND,
            BillingError::Persistence(_) | BillingError::Provider(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, BillingError>;

/// Orchestrates customer provisioning and checkout/portal session creation.
/// Constructed once per router, reused across requests; holds no per-request
/// state.
pub struct BillingUseCase<C, S, Stripe>
where
    C: StripeCustomerRepository + Send + Sync + 'static,
    S: StripeSubscriptionRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    customer_repo: Arc<C>,
    subscription_repo: Arc<S>,
    stripe_client: Arc<Stripe>,
}

impl<C, S, Stripe> BillingUseCase<C, S, Stripe>
where
    C: StripeCustomerRepository + Send + Sync + 'static,
    S: StripeSubscriptionRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    pub fn new(
        customer_repo: Arc<C>,
        subscription_repo: Arc<S>,
        stripe_client: Arc<Stripe>,
    ) -> Self {
        Self {
            customer_repo,
            subscription_repo,
            stripe_client,
        }
    }

    pub async fn create_checkout_session(
        &self,
        user_id: &str,
        user_email: Option<String>,
        request: CheckoutSessionRequest,
    ) -> UseCaseResult<CreatedCheckoutSession> {
        let checkout = request.validate().map_err(|message| {
            let err = BillingError::Validation(message);
            warn!(
                %user_id,
                status = err.status_code().as_u16(),
                error = %err,
                "checkout: parameter validation failed"
            );
            err
        })?;

        info!(
            %user_id,
            price_id = %checkout.price_id,
            mode = %checkout.mode,
            "checkout: session requested"
        );

        let existing = self
            .customer_repo
            .find_active_by_user_id(user_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    db_error = ?err,
                    "checkout: failed to load customer mapping"
                );
                BillingError::Persistence("Failed to fetch customer information")
            })?;

        let customer_id = match existing {
            None => {
                self.provision_new_customer(user_id, user_email.as_deref(), checkout.mode)
                    .await?
            }
            Some(mapping) => {
                info!(
                    %user_id,
                    customer_id = %mapping.customer_id,
                    "checkout: using existing customer"
                );

                if checkout.mode == CheckoutMode::Subscription {
                    self.ensure_subscription_record(&mapping.customer_id).await?;
                }

                mapping.customer_id
            }
        };

        let session = self
            .stripe_client
            .create_checkout_session(
                &customer_id,
                &checkout.price_id,
                &checkout.mode.to_string(),
                &checkout.success_url,
                &checkout.cancel_url,
            )
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    %customer_id,
                    price_id = %checkout.price_id,
                    error = ?err,
                    "checkout: stripe checkout session creation failed"
                );
                BillingError::Provider(err)
            })?;

        info!(
            %user_id,
            %customer_id,
            session_id = %session.id,
            "checkout: session created"
        );

        Ok(session)
    }

    pub async fn create_billing_portal_session(
        &self,
        user_id: &str,
        request: PortalSessionRequest,
    ) -> UseCaseResult<String> {
        let return_url = match request.return_url {
            Some(value) if !value.is_empty() => value,
            _ => {
                let err =
                    BillingError::Validation("Missing required parameter return_url".to_string());
                warn!(
                    %user_id,
                    status = err.status_code().as_u16(),
                    "billing: portal request missing return_url"
                );
                return Err(err);
            }
        };

        let mapping = self
            .customer_repo
            .find_active_by_user_id(user_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    db_error = ?err,
                    "billing: failed to load customer mapping for portal"
                );
                BillingError::Persistence("Failed to fetch customer information")
            })?
            .ok_or_else(|| {
                let err = BillingError::CustomerNotFound;
                warn!(
                    %user_id,
                    status = err.status_code().as_u16(),
                    "billing: portal requested without a customer mapping"
                );
                err
            })?;

        let portal_url = self
            .stripe_client
            .create_billing_portal_session(&mapping.customer_id, &return_url)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    customer_id = %mapping.customer_id,
                    error = ?err,
                    "billing: stripe portal session creation failed"
                );
                BillingError::Provider(err)
            })?;

        info!(
            %user_id,
            customer_id = %mapping.customer_id,
            "billing: portal session created"
        );

        Ok(portal_url)
    }

    pub async fn get_current_subscription(
        &self,
        user_id: &str,
    ) -> UseCaseResult<Option<CurrentSubscriptionDto>> {
        let mapping = match self
            .customer_repo
            .find_active_by_user_id(user_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    db_error = ?err,
                    "billing: failed to load customer mapping for subscription view"
                );
                BillingError::Persistence("Failed to fetch customer information")
            })? {
            Some(mapping) => mapping,
            None => return Ok(None),
        };

        let record = self
            .subscription_repo
            .find_by_customer_id(&mapping.customer_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    customer_id = %mapping.customer_id,
                    db_error = ?err,
                    "billing: failed to load subscription record"
                );
                BillingError::Persistence("Failed to fetch subscription information")
            })?;

        // A mapped customer without a record has simply never finished a
        // subscription checkout.
        let status = record
            .map(|record| SubscriptionStatus::from_str(&record.status))
            .unwrap_or(SubscriptionStatus::NotStarted);

        Ok(Some(CurrentSubscriptionDto { status }))
    }

    async fn provision_new_customer(
        &self,
        user_id: &str,
        user_email: Option<&str>,
        mode: CheckoutMode,
    ) -> UseCaseResult<String> {
        let email = match user_email {
            Some(value) if !value.is_empty() => value,
            _ => {
                let err =
                    BillingError::Validation("user email is required for checkout".to_string());
                warn!(
                    %user_id,
                    status = err.status_code().as_u16(),
                    "checkout: missing email for new customer"
                );
                return Err(err);
            }
        };

        let customer_id = self
            .stripe_client
            .create_customer(email, user_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    error = ?err,
                    "checkout: stripe customer creation failed"
                );
                BillingError::Provider(err)
            })?;

        info!(%user_id, %customer_id, "checkout: created new stripe customer");

        match self.customer_repo.insert(user_id, &customer_id).await {
            Ok(CustomerMappingInsert::Inserted) => {}
            Ok(CustomerMappingInsert::Conflict) => {
                // Lost the provisioning race: a concurrent request mapped this
                // user first. Discard our provider customer and use theirs.
                warn!(
                    %user_id,
                    %customer_id,
                    "checkout: mapping insert conflicted, reusing winning mapping"
                );

                self.delete_provider_customer(&customer_id).await;

                let mapping = self
                    .customer_repo
                    .find_active_by_user_id(user_id)
                    .await
                    .map_err(|err| {
                        error!(
                            %user_id,
                            db_error = ?err,
                            "checkout: failed to reload mapping after insert conflict"
                        );
                        BillingError::Persistence("Failed to fetch customer information")
                    })?
                    .ok_or(BillingError::Persistence("Failed to create customer mapping"))?;

                if mode == CheckoutMode::Subscription {
                    self.ensure_subscription_record(&mapping.customer_id).await?;
                }

                return Ok(mapping.customer_id);
            }
            Err(err) => {
                error!(
                    %user_id,
                    %customer_id,
                    db_error = ?err,
                    "checkout: failed to save customer mapping"
                );

                self.delete_provider_customer(&customer_id).await;
                if let Err(cleanup_err) = self
                    .subscription_repo
                    .delete_by_customer_id(&customer_id)
                    .await
                {
                    error!(
                        %customer_id,
                        db_error = ?cleanup_err,
                        "checkout: failed to clean up subscription records during rollback"
                    );
                }

                return Err(BillingError::Persistence("Failed to create customer mapping"));
            }
        }

        if mode == CheckoutMode::Subscription {
            if let Err(err) = self
                .subscription_repo
                .insert(&customer_id, SubscriptionStatus::NotStarted)
                .await
            {
                error!(
                    %user_id,
                    %customer_id,
                    db_error = ?err,
                    "checkout: failed to save subscription record"
                );

                // The mapping row is intentionally left in place: the
                // self-healing lookup in the returning-customer path recreates
                // the record on the next subscription checkout.
                self.delete_provider_customer(&customer_id).await;

                return Err(BillingError::Persistence(
                    "Unable to save the subscription in the database",
                ));
            }
        }

        info!(%user_id, %customer_id, "checkout: new customer provisioned");

        Ok(customer_id)
    }

    async fn ensure_subscription_record(&self, customer_id: &str) -> UseCaseResult<()> {
        let existing = self
            .subscription_repo
            .find_by_customer_id(customer_id)
            .await
            .map_err(|err| {
                error!(
                    %customer_id,
                    db_error = ?err,
                    "checkout: failed to load subscription record"
                );
                BillingError::Persistence("Failed to fetch subscription information")
            })?;

        if existing.is_some() {
            return Ok(());
        }

        info!(
            %customer_id,
            "checkout: creating missing subscription record for existing customer"
        );

        self.subscription_repo
            .insert(customer_id, SubscriptionStatus::NotStarted)
            .await
            .map_err(|err| {
                error!(
                    %customer_id,
                    db_error = ?err,
                    "checkout: failed to create subscription record for existing customer"
                );
                BillingError::Persistence(
                    "Failed to create subscription record for existing customer",
                )
            })?;

        Ok(())
    }

    /// Best-effort rollback of a provider customer. Failures are logged and
    /// swallowed so they never mask the error that triggered the rollback.
    async fn delete_provider_customer(&self, customer_id: &str) {
        if let Err(err) = self.stripe_client.delete_customer(customer_id).await {
            error!(
                %customer_id,
                error = ?err,
                "checkout: failed to delete stripe customer during rollback"
            );
        }
    }
}
