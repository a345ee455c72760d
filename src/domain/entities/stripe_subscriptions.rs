use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::infrastructure::postgres::schema::stripe_subscriptions;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = stripe_subscriptions)]
pub struct StripeSubscriptionEntity {
    pub id: i64,
    pub customer_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = stripe_subscriptions)]
pub struct InsertStripeSubscriptionEntity {
    pub customer_id: String,
    pub status: String,
}
