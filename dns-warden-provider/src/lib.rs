//! # dns-warden-provider
//!
//! A unified DNS provider abstraction for zone-scoped record reconciliation.
//!
//! Each provider instance manages a single zone. On top of the raw API
//! surface, the [`DnsProvider`] trait supplies a shared snapshot cache with
//! single-flight refresh, record validation against declared capabilities,
//! field-level diffing and ownership-marker stamping, so every provider
//! behaves identically to the reconciliation layer above it.
//!
//! ## Supported Providers
//!
//! | Provider | Feature Flag | Auth Method |
//! |----------|-------------|-------------|
//! | [Cloudflare](https://www.cloudflare.com/) | `cloudflare` | Bearer Token |
//! | [DigitalOcean](https://www.digitalocean.com/) | `digitalocean` | Bearer Token |
//! | [Porkbun](https://porkbun.com/) | `porkbun` | API Key Pair |
//!
//! ## Feature Flags
//!
//! ### Provider Selection
//!
//! - **`all-providers`** *(default)* — Enable all providers listed above.
//! - **`cloudflare`** — Enable only the Cloudflare provider.
//! - **`digitalocean`** — Enable only the DigitalOcean provider.
//! - **`porkbun`** — Enable only the Porkbun provider.
//!
//! ### TLS Backend
//!
//! - **`native-tls`** *(default)* — Use the platform's native TLS implementation.
//! - **`rustls`** — Use rustls. Recommended for cross-compilation.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dns_warden_provider::{create_provider, DnsProvider, ProviderCredentials};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = create_provider(
//!         ProviderCredentials::Cloudflare {
//!             api_token: "your-token".to_string(),
//!             zone: "example.com".to_string(),
//!         },
//!         None,
//!     );
//!
//!     // Validate credentials and resolve the zone.
//!     provider.init().await?;
//!
//!     // Cached read; hits the API only when the snapshot is stale.
//!     let records = provider.records(false).await?;
//!     for record in &records {
//!         println!("{} {} -> {}", record.record_type, record.name, record.content);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! All provider operations return [`Result<T, ProviderError>`](ProviderError).
//! The error enum provides structured variants for common failure modes:
//!
//! - [`ProviderError::InvalidCredentials`] — authentication failed
//! - [`ProviderError::RecordNotFound`] — DNS record not found
//! - [`ProviderError::RateLimited`] — API rate limit exceeded (transient)
//! - [`ProviderError::Network`] — network connectivity issue (transient)
//!
//! There is no retry logic here: transient errors surface immediately and
//! the caller decides when to try again (the reconciler waits for the next
//! pass). Use [`ProviderError::is_transient`] to tell the classes apart.

mod cache;
mod error;
mod factory;
mod http_client;
mod providers;
mod traits;
mod types;
mod utils;
mod validate;

// Re-export error types
pub use error::{ProviderError, Result};

// Re-export factory functions
pub use factory::{
    available_provider_types, create_provider, create_provider_from_map,
    get_all_provider_metadata, DEFAULT_CACHE_MAX_AGE,
};

// Re-export the cache handle and core trait (internal traits are not exported)
pub use cache::RecordCache;
pub use traits::DnsProvider;

// Re-export types
pub use types::{
    CredentialValidationError, DnsRecord, DnsRecordType, FieldType, ProviderCapabilities,
    ProviderCredentialField, ProviderCredentials, ProviderMetadata, ProviderType, RecordKey,
    TtlRange, OWNERSHIP_MARKER,
};

// Re-export log helpers shared with the reconciliation layer
pub use utils::truncate_for_log;

// Re-export concrete providers (behind feature flags)
#[cfg(feature = "cloudflare")]
pub use providers::CloudflareProvider;

#[cfg(feature = "digitalocean")]
pub use providers::DigitalOceanProvider;

#[cfg(feature = "porkbun")]
pub use providers::PorkbunProvider;
