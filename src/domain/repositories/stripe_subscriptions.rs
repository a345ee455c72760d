use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::{
    entities::stripe_subscriptions::StripeSubscriptionEntity,
    value_objects::enums::subscription_statuses::SubscriptionStatus,
};

#[async_trait]
#[automock]
pub trait StripeSubscriptionRepository {
    async fn find_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<StripeSubscriptionEntity>>;

    async fn insert(&self, customer_id: &str, status: SubscriptionStatus) -> Result<()>;

    /// Removes every record referencing the customer. Only used when rolling
    /// back a freshly created provider customer.
    async fn delete_by_customer_id(&self, customer_id: &str) -> Result<()>;
}
