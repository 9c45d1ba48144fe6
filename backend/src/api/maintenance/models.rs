use crate::connectors::quoting::SubscribeRequest;
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CancelContractRequest {
    #[serde(default)]
    #[validate(length(max = 1000, message = "Reason must be at most 1000 characters"))]
    pub reason: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpgradeContractRequest {
    #[validate(length(min = 1, max = 100, message = "Pack is required"))]
    pub pack: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubscribeContractRequest {
    #[validate(length(min = 1, max = 100, message = "Pack is required"))]
    pub pack: String,
    #[validate(custom(function = "validate_billing_cycle"))]
    pub billing_cycle: String,
    pub site_id: Option<String>,
}

fn validate_billing_cycle(value: &str) -> Result<(), validator::ValidationError> {
    match value {
        "monthly" | "quarterly" | "yearly" => Ok(()),
        _ => {
            let mut error = validator::ValidationError::new("billing_cycle");
            error.message = Some("Billing cycle must be monthly, quarterly or yearly".into());
            Err(error)
        }
    }
}

impl From<SubscribeContractRequest> for SubscribeRequest {
    fn from(request: SubscribeContractRequest) -> Self {
        SubscribeRequest {
            pack: request.pack.trim().to_string(),
            billing_cycle: request.billing_cycle,
            site_id: request
                .site_id
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_billing_cycle_is_restricted() {
        let request = |cycle: &str| SubscribeContractRequest {
            pack: "Serenity".to_string(),
            billing_cycle: cycle.to_string(),
            site_id: Some("  ".to_string()),
        };
        assert!(request("yearly").validate().is_ok());
        assert!(request("weekly").validate().is_err());

        let forwarded: SubscribeRequest = request("monthly").into();
        assert!(forwarded.site_id.is_none());
    }

    #[test]
    fn test_cancel_reason_defaults_to_empty() {
        let request: CancelContractRequest = serde_json::from_str("{}").unwrap();
        assert!(request.reason.is_empty());
        assert!(request.validate().is_ok());
    }
}
