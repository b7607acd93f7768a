//! DigitalOcean HTTP request methods.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::http_client::HttpUtils;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};
use crate::utils::truncate_for_log;

use super::types::DigitalOceanApiError;
use super::{DigitalOceanProvider, DO_API_BASE};

impl DigitalOceanProvider {
    /// Map a non-2xx response onto a provider error.
    fn check_status(&self, status: u16, text: &str, ctx: ErrorContext) -> Result<()> {
        if (200..300).contains(&status) {
            return Ok(());
        }
        let raw = match serde_json::from_str::<DigitalOceanApiError>(text) {
            Ok(body) => RawApiError::with_code(body.id, body.message),
            Err(_) => RawApiError::new(format!("HTTP {status}: {}", truncate_for_log(text))),
        };
        Err(self.map_error(raw, ctx))
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str, ctx: ErrorContext) -> Result<T> {
        let url = format!("{DO_API_BASE}{path}");
        let request = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_token));

        let (status, text) =
            HttpUtils::execute_request(request, self.provider_name(), "GET", path).await?;
        self.check_status(status, &text, ctx)?;
        HttpUtils::parse_json(&text, self.provider_name())
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
        ctx: ErrorContext,
    ) -> Result<T> {
        let url = format!("{DO_API_BASE}{path}");
        let request = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .json(body);

        let (status, text) =
            HttpUtils::execute_request(request, self.provider_name(), "POST", path).await?;
        self.check_status(status, &text, ctx)?;
        HttpUtils::parse_json(&text, self.provider_name())
    }

    pub(crate) async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
        ctx: ErrorContext,
    ) -> Result<T> {
        let url = format!("{DO_API_BASE}{path}");
        let request = self
            .client
            .put(&url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .json(body);

        let (status, text) =
            HttpUtils::execute_request(request, self.provider_name(), "PUT", path).await?;
        self.check_status(status, &text, ctx)?;
        HttpUtils::parse_json(&text, self.provider_name())
    }

    /// Successful deletes return 204 with an empty body.
    pub(crate) async fn delete(&self, path: &str, ctx: ErrorContext) -> Result<()> {
        let url = format!("{DO_API_BASE}{path}");
        let request = self
            .client
            .delete(&url)
            .header("Authorization", format!("Bearer {}", self.api_token));

        let (status, text) =
            HttpUtils::execute_request(request, self.provider_name(), "DELETE", path).await?;
        self.check_status(status, &text, ctx)
    }
}
