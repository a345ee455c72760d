use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CheckoutMode {
    Payment,
    Subscription,
}

impl Display for CheckoutMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match self {
            CheckoutMode::Payment => "payment",
            CheckoutMode::Subscription => "subscription",
        };
        write!(f, "{}", mode)
    }
}

impl CheckoutMode {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "payment" => Some(CheckoutMode::Payment),
            "subscription" => Some(CheckoutMode::Subscription),
            _ => None,
        }
    }
}

/// Raw checkout request body. Fields are optional so that missing parameters
/// surface as explicit validation errors instead of deserialization rejections.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutSessionRequest {
    pub price_id: Option<String>,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
    pub mode: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ValidatedCheckout {
    pub price_id: String,
    pub success_url: String,
    pub cancel_url: String,
    pub mode: CheckoutMode,
}

impl CheckoutSessionRequest {
    pub fn validate(self) -> Result<ValidatedCheckout, String> {
        let price_id = require_string(self.price_id, "price_id")?;
        let success_url = require_string(self.success_url, "success_url")?;
        let cancel_url = require_string(self.cancel_url, "cancel_url")?;

        let mode = self
            .mode
            .as_deref()
            .and_then(CheckoutMode::from_str)
            .ok_or_else(|| {
                "Expected parameter mode to be one of payment, subscription".to_string()
            })?;

        Ok(ValidatedCheckout {
            price_id,
            success_url,
            cancel_url,
            mode,
        })
    }
}

fn require_string(value: Option<String>, parameter: &str) -> Result<String, String> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(format!("Missing required parameter {}", parameter)),
    }
}

#[derive(Debug, Serialize)]
pub struct CheckoutSessionResponse {
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PortalSessionRequest {
    pub return_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PortalSessionResponse {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_request() -> CheckoutSessionRequest {
        CheckoutSessionRequest {
            price_id: Some("price_123".to_string()),
            success_url: Some("https://x/success".to_string()),
            cancel_url: Some("https://x/cancel".to_string()),
            mode: Some("subscription".to_string()),
        }
    }

    #[test]
    fn accepts_complete_request() {
        let checkout = full_request().validate().unwrap();
        assert_eq!(checkout.price_id, "price_123");
        assert_eq!(checkout.mode, CheckoutMode::Subscription);
    }

    #[test]
    fn rejects_missing_price_id() {
        let request = CheckoutSessionRequest {
            price_id: None,
            ..full_request()
        };
        assert_eq!(
            request.validate().unwrap_err(),
            "Missing required parameter price_id"
        );
    }

    #[test]
    fn rejects_empty_success_url() {
        let request = CheckoutSessionRequest {
            success_url: Some(String::new()),
            ..full_request()
        };
        assert_eq!(
            request.validate().unwrap_err(),
            "Missing required parameter success_url"
        );
    }

    #[test]
    fn rejects_unknown_mode() {
        let request = CheckoutSessionRequest {
            mode: Some("donation".to_string()),
            ..full_request()
        };
        assert_eq!(
            request.validate().unwrap_err(),
            "Expected parameter mode to be one of payment, subscription"
        );
    }
}
