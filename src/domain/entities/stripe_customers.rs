use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::infrastructure::postgres::schema::stripe_customers;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = stripe_customers)]
pub struct StripeCustomerEntity {
    pub id: i64,
    pub user_id: String,
    pub customer_id: String,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = stripe_customers)]
pub struct InsertStripeCustomerEntity {
    pub user_id: String,
    pub customer_id: String,
}
