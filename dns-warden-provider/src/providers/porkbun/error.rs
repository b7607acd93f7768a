//! Porkbun error mapping.

use crate::error::ProviderError;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::PorkbunProvider;

/// Porkbun has no error codes, only free-form messages, so mapping is by
/// message content.
impl ProviderErrorMapper for PorkbunProvider {
    fn provider_name(&self) -> &'static str {
        "porkbun"
    }

    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError {
        let lower = raw.message.to_lowercase();

        if lower.contains("api key") || lower.contains("authentication") {
            return ProviderError::InvalidCredentials {
                provider: self.provider_name().to_string(),
                raw_message: Some(raw.message),
            };
        }

        if lower.contains("invalid domain") || lower.contains("domain is not opted in") {
            return ProviderError::ZoneNotFound {
                provider: self.provider_name().to_string(),
                zone: self.zone_name.clone(),
            };
        }

        if lower.contains("edit a record") || lower.contains("delete a record") {
            // "Invalid record ID when trying to edit/delete a record."
            return ProviderError::RecordNotFound {
                provider: self.provider_name().to_string(),
                record_id: context.record_id.unwrap_or_else(|| "<unknown>".to_string()),
                raw_message: Some(raw.message),
            };
        }

        self.unknown_error(raw)
    }
}
