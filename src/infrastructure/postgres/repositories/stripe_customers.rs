use anyhow::Result;
use async_trait::async_trait;
use diesel::{
    OptionalExtension, RunQueryDsl, insert_into, prelude::*,
    result::{DatabaseErrorKind, Error as DieselError},
};
use std::sync::Arc;

use crate::{
    domain::{
        entities::stripe_customers::{InsertStripeCustomerEntity, StripeCustomerEntity},
        repositories::stripe_customers::StripeCustomerRepository,
        value_objects::stripe_customers::CustomerMappingInsert,
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::stripe_customers},
};

pub struct StripeCustomerPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl StripeCustomerPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl StripeCustomerRepository for StripeCustomerPostgres {
    async fn find_active_by_user_id(
        &self,
        user_id: &str,
    ) -> Result<Option<StripeCustomerEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = stripe_customers::table
            .filter(stripe_customers::user_id.eq(user_id))
            .filter(stripe_customers::deleted_at.is_null())
            .select(StripeCustomerEntity::as_select())
            .first::<StripeCustomerEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn insert(&self, user_id: &str, customer_id: &str) -> Result<CustomerMappingInsert> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let insert_entity = InsertStripeCustomerEntity {
            user_id: user_id.to_string(),
            customer_id: customer_id.to_string(),
        };

        match insert_into(stripe_customers::table)
            .values(&insert_entity)
            .execute(&mut conn)
        {
            Ok(_) => Ok(CustomerMappingInsert::Inserted),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                Ok(CustomerMappingInsert::Conflict)
            }
            Err(err) => Err(err.into()),
        }
    }
}
