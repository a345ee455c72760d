use anyhow::Result;
use async_trait::async_trait;
use diesel::{OptionalExtension, RunQueryDsl, delete, insert_into, prelude::*};
use std::sync::Arc;

use crate::{
    domain::{
        entities::stripe_subscriptions::{
            InsertStripeSubscriptionEntity, StripeSubscriptionEntity,
        },
        repositories::stripe_subscriptions::StripeSubscriptionRepository,
        value_objects::enums::subscription_statuses::SubscriptionStatus,
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::stripe_subscriptions},
};

pub struct StripeSubscriptionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl StripeSubscriptionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl StripeSubscriptionRepository for StripeSubscriptionPostgres {
    async fn find_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<StripeSubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = stripe_subscriptions::table
            .filter(stripe_subscriptions::customer_id.eq(customer_id))
            .select(StripeSubscriptionEntity::as_select())
            .first::<StripeSubscriptionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn insert(&self, customer_id: &str, status: SubscriptionStatus) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let insert_entity = InsertStripeSubscriptionEntity {
            customer_id: customer_id.to_string(),
            status: status.to_string(),
        };

        insert_into(stripe_subscriptions::table)
            .values(&insert_entity)
            .execute(&mut conn)?;

        Ok(())
    }

    async fn delete_by_customer_id(&self, customer_id: &str) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        delete(stripe_subscriptions::table.filter(stripe_subscriptions::customer_id.eq(customer_id)))
            .execute(&mut conn)?;

        Ok(())
    }
}
