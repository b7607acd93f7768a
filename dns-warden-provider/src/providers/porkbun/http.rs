//! Porkbun HTTP request methods.
//!
//! Every call is a POST whose body carries the credential pair alongside the
//! endpoint payload; the key pair never appears in URLs or logs.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::http_client::HttpUtils;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::types::PorkbunStatus;
use super::{PorkbunProvider, PORKBUN_API_BASE};

#[derive(Serialize)]
struct AuthedBody<'a, B: Serialize> {
    apikey: &'a str,
    secretapikey: &'a str,
    #[serde(flatten)]
    payload: &'a B,
}

impl PorkbunProvider {
    /// POST to an API path; checks the `status` envelope before decoding the
    /// payload.
    pub(crate) async fn post_api<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        payload: &B,
        ctx: ErrorContext,
    ) -> Result<T> {
        let url = format!("{PORKBUN_API_BASE}{path}");
        let body = AuthedBody {
            apikey: &self.api_key,
            secretapikey: &self.secret_api_key,
            payload,
        };
        let request = self.client.post(&url).json(&body);

        let (_status, text) =
            HttpUtils::execute_request(request, self.provider_name(), "POST", path).await?;

        let envelope: PorkbunStatus = HttpUtils::parse_json(&text, self.provider_name())?;
        if !envelope.status.eq_ignore_ascii_case("SUCCESS") {
            let message = envelope
                .message
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(self.map_error(RawApiError::new(message), ctx));
        }

        HttpUtils::parse_json(&text, self.provider_name())
    }

    /// Variant for endpoints whose success response has no payload beyond the
    /// status envelope.
    pub(crate) async fn post_api_status<B: Serialize + Sync>(
        &self,
        path: &str,
        payload: &B,
        ctx: ErrorContext,
    ) -> Result<()> {
        let _: PorkbunStatus = self.post_api(path, payload, ctx).await?;
        Ok(())
    }
}
