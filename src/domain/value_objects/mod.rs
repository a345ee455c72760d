pub mod checkout;
pub mod enums;
pub mod stripe_customers;
pub mod stripe_subscriptions;
