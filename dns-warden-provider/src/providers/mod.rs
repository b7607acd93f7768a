//! DNS Provider implementations

/// Shared utilities used by provider implementations.
pub mod common;

#[cfg(feature = "cloudflare")]
mod cloudflare;
#[cfg(feature = "digitalocean")]
mod digitalocean;
#[cfg(feature = "porkbun")]
mod porkbun;

#[cfg(feature = "cloudflare")]
pub use cloudflare::CloudflareProvider;
#[cfg(feature = "digitalocean")]
pub use digitalocean::DigitalOceanProvider;
#[cfg(feature = "porkbun")]
pub use porkbun::PorkbunProvider;
