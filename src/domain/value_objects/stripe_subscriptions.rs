use serde::Serialize;

use crate::domain::value_objects::enums::subscription_statuses::SubscriptionStatus;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CurrentSubscriptionDto {
    pub status: SubscriptionStatus,
}
