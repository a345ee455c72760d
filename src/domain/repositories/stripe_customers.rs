use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::{
    entities::stripe_customers::StripeCustomerEntity,
    value_objects::stripe_customers::CustomerMappingInsert,
};

#[async_trait]
#[automock]
pub trait StripeCustomerRepository {
    /// Looks up the active mapping for a user. Soft-deleted rows are ignored.
    async fn find_active_by_user_id(&self, user_id: &str)
    -> Result<Option<StripeCustomerEntity>>;

    async fn insert(&self, user_id: &str, customer_id: &str) -> Result<CustomerMappingInsert>;
}
