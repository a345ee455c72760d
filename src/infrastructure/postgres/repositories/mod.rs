pub mod stripe_customers;
pub mod stripe_subscriptions;
