//! Provider factory functions and metadata.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::traits::DnsProvider;
use crate::types::{
    CredentialValidationError, ProviderCredentials, ProviderMetadata, ProviderType,
};

#[cfg(feature = "cloudflare")]
use crate::providers::CloudflareProvider;
#[cfg(feature = "digitalocean")]
use crate::providers::DigitalOceanProvider;
#[cfg(feature = "porkbun")]
use crate::providers::PorkbunProvider;

/// Cache max age applied when the caller does not supply one.
pub const DEFAULT_CACHE_MAX_AGE: Duration = Duration::from_secs(30);

/// Creates a [`DnsProvider`] instance from the given credentials.
///
/// The concrete provider type is determined by the [`ProviderCredentials`]
/// variant. The returned provider is wrapped in `Arc<dyn DnsProvider>` for
/// sharing across async tasks. The instance has not talked to the remote API
/// yet; call [`DnsProvider::init`] before any record operation.
///
/// # Examples
///
/// ```rust,no_run
/// use dns_warden_provider::{create_provider, ProviderCredentials};
///
/// let provider = create_provider(
///     ProviderCredentials::Cloudflare {
///         api_token: "your-token".to_string(),
///         zone: "example.com".to_string(),
///     },
///     None,
/// );
/// ```
#[must_use]
pub fn create_provider(
    credentials: ProviderCredentials,
    cache_max_age: Option<Duration>,
) -> Arc<dyn DnsProvider> {
    let max_age = cache_max_age.unwrap_or(DEFAULT_CACHE_MAX_AGE);
    match credentials {
        #[cfg(feature = "cloudflare")]
        ProviderCredentials::Cloudflare { api_token, zone } => {
            Arc::new(CloudflareProvider::new(api_token, zone, max_age))
        }
        #[cfg(feature = "digitalocean")]
        ProviderCredentials::Digitalocean { api_token, zone } => {
            Arc::new(DigitalOceanProvider::new(api_token, zone, max_age))
        }
        #[cfg(feature = "porkbun")]
        ProviderCredentials::Porkbun {
            api_key,
            secret_api_key,
            zone,
        } => Arc::new(PorkbunProvider::new(api_key, secret_api_key, zone, max_age)),
    }
}

/// Builds credentials from a string map and creates the provider in one step.
///
/// # Errors
///
/// Returns [`CredentialValidationError`] if a required field is missing or
/// empty.
pub fn create_provider_from_map(
    provider: ProviderType,
    fields: &HashMap<String, String>,
    cache_max_age: Option<Duration>,
) -> std::result::Result<Arc<dyn DnsProvider>, CredentialValidationError> {
    let credentials = ProviderCredentials::from_map(provider, fields)?;
    Ok(create_provider(credentials, cache_max_age))
}

/// Provider types enabled via feature flags.
#[must_use]
pub fn available_provider_types() -> Vec<ProviderType> {
    vec![
        #[cfg(feature = "cloudflare")]
        ProviderType::Cloudflare,
        #[cfg(feature = "digitalocean")]
        ProviderType::Digitalocean,
        #[cfg(feature = "porkbun")]
        ProviderType::Porkbun,
    ]
}

/// Returns metadata for all providers enabled via feature flags.
///
/// Useful for enumerating available providers and their required credential
/// fields without instantiating anything.
#[must_use]
pub fn get_all_provider_metadata() -> Vec<ProviderMetadata> {
    vec![
        #[cfg(feature = "cloudflare")]
        CloudflareProvider::metadata(),
        #[cfg(feature = "digitalocean")]
        DigitalOceanProvider::metadata(),
        #[cfg(feature = "porkbun")]
        PorkbunProvider::metadata(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_enabled_providers_have_metadata() {
        let types = available_provider_types();
        let metadata = get_all_provider_metadata();
        assert_eq!(types.len(), metadata.len());
        for (ty, meta) in types.iter().zip(&metadata) {
            assert_eq!(*ty, meta.id);
        }
    }

    #[test]
    fn metadata_lists_zone_field() {
        for meta in get_all_provider_metadata() {
            assert!(
                meta.required_fields.iter().any(|f| f.key == "zone"),
                "{} metadata is missing the zone field",
                meta.name
            );
        }
    }

    #[cfg(feature = "cloudflare")]
    #[test]
    fn create_provider_uses_credentials_zone() {
        let provider = create_provider(
            ProviderCredentials::Cloudflare {
                api_token: "t".to_string(),
                zone: "example.com".to_string(),
            },
            None,
        );
        assert_eq!(provider.zone(), "example.com");
        assert_eq!(provider.provider_type(), ProviderType::Cloudflare);
    }

    #[cfg(feature = "porkbun")]
    #[test]
    fn create_provider_from_map_porkbun() {
        let fields: HashMap<String, String> = [
            ("apiKey".to_string(), "k".to_string()),
            ("secretApiKey".to_string(), "s".to_string()),
            ("zone".to_string(), "example.com".to_string()),
        ]
        .into();
        let provider =
            create_provider_from_map(ProviderType::Porkbun, &fields, None).unwrap();
        assert_eq!(provider.zone(), "example.com");
    }
}
