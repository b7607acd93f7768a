//! DigitalOcean error mapping.

use crate::error::ProviderError;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::DigitalOceanProvider;

/// DigitalOcean reports errors as short string identifiers.
/// Reference: <https://docs.digitalocean.com/reference/api/>
impl ProviderErrorMapper for DigitalOceanProvider {
    fn provider_name(&self) -> &'static str {
        "digitalocean"
    }

    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError {
        match raw.code.as_deref() {
            Some("unauthorized" | "forbidden") => ProviderError::InvalidCredentials {
                provider: self.provider_name().to_string(),
                raw_message: Some(raw.message),
            },

            Some("not_found") => match context.record_id {
                Some(record_id) => ProviderError::RecordNotFound {
                    provider: self.provider_name().to_string(),
                    record_id,
                    raw_message: Some(raw.message),
                },
                None => ProviderError::ZoneNotFound {
                    provider: self.provider_name().to_string(),
                    zone: self.zone_name.clone(),
                },
            },

            Some("unprocessable_entity") => ProviderError::InvalidRecord {
                provider: self.provider_name().to_string(),
                field: "general".to_string(),
                detail: raw.message,
            },

            Some("too_many_requests") => ProviderError::RateLimited {
                provider: self.provider_name().to_string(),
                retry_after: None,
                raw_message: Some(raw.message),
            },

            _ => self.unknown_error(raw),
        }
    }
}
