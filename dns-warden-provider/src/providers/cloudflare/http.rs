//! Cloudflare HTTP request methods.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::http_client::HttpUtils;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::{CloudflareDnsRecord, CloudflareProvider, CloudflareResponse, CF_API_BASE};

impl CloudflareProvider {
    fn parse_envelope<T: DeserializeOwned>(
        &self,
        response_text: &str,
        ctx: ErrorContext,
    ) -> Result<CloudflareResponse<T>> {
        let envelope: CloudflareResponse<T> =
            HttpUtils::parse_json(response_text, self.provider_name())?;

        if !envelope.success {
            let (code, message) = envelope
                .errors
                .as_ref()
                .and_then(|errors| errors.first())
                .map_or_else(
                    || (String::new(), "Unknown error".to_string()),
                    |e| (e.code.to_string(), e.message.clone()),
                );
            return Err(self.map_error(RawApiError::with_code(code, message), ctx));
        }

        Ok(envelope)
    }

    fn extract_result<T: DeserializeOwned>(
        &self,
        response_text: &str,
        ctx: ErrorContext,
    ) -> Result<T> {
        let envelope: CloudflareResponse<T> = self.parse_envelope(response_text, ctx)?;
        envelope
            .result
            .ok_or_else(|| self.parse_error("response missing 'result' field"))
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str, ctx: ErrorContext) -> Result<T> {
        let url = format!("{CF_API_BASE}{path}");
        let request = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_token));

        let (_status, text) =
            HttpUtils::execute_request(request, self.provider_name(), "GET", path).await?;
        self.extract_result(&text, ctx)
    }

    /// One page of DNS records plus the total record count for the zone.
    pub(crate) async fn get_records_page(
        &self,
        zone_id: &str,
        page: u32,
        per_page: u32,
    ) -> Result<(Vec<CloudflareDnsRecord>, u32)> {
        let path = format!("/zones/{zone_id}/dns_records?page={page}&per_page={per_page}");
        let url = format!("{CF_API_BASE}{path}");
        let request = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_token));

        let (_status, text) =
            HttpUtils::execute_request(request, self.provider_name(), "GET", &path).await?;
        let envelope: CloudflareResponse<Vec<CloudflareDnsRecord>> =
            self.parse_envelope(&text, ErrorContext::default())?;

        let total_count = envelope
            .result_info
            .as_ref()
            .map_or(0, |info| info.total_count);
        let records = envelope
            .result
            .ok_or_else(|| self.parse_error("response missing 'result' field"))?;
        Ok((records, total_count))
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
        ctx: ErrorContext,
    ) -> Result<T> {
        let url = format!("{CF_API_BASE}{path}");
        let request = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .json(body);

        let (_status, text) =
            HttpUtils::execute_request(request, self.provider_name(), "POST", path).await?;
        self.extract_result(&text, ctx)
    }

    pub(crate) async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
        ctx: ErrorContext,
    ) -> Result<T> {
        let url = format!("{CF_API_BASE}{path}");
        let request = self
            .client
            .put(&url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .json(body);

        let (_status, text) =
            HttpUtils::execute_request(request, self.provider_name(), "PUT", path).await?;
        self.extract_result(&text, ctx)
    }

    pub(crate) async fn delete(&self, path: &str, ctx: ErrorContext) -> Result<()> {
        let url = format!("{CF_API_BASE}{path}");
        let request = self
            .client
            .delete(&url)
            .header("Authorization", format!("Bearer {}", self.api_token));

        let (_status, text) =
            HttpUtils::execute_request(request, self.provider_name(), "DELETE", path).await?;
        let _envelope: CloudflareResponse<serde_json::Value> = self.parse_envelope(&text, ctx)?;
        Ok(())
    }
}
