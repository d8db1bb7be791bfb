use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    error::ApiError,
    protocol::{
        CategoryGroups, ConfirmPaymentRequest, ConfirmPaymentResponse, ProductListQuery,
        ProductListResponse, SuggestionQuery, SuggestionResponse,
    },
};
use tracing::debug;

use crate::{error::ApiClientError, StorefrontApi};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct HttpStorefrontApi {
    http: Client,
    base_url: String,
}

impl HttpStorefrontApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiClientError> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ApiClientError> {
        let base_url = base_url.into();
        url::Url::parse(&base_url).map_err(|source| ApiClientError::InvalidBaseUrl {
            url: base_url.clone(),
            source,
        })?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiClientError::ClientBuild)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn transport_error(endpoint: &str, err: reqwest::Error) -> ApiClientError {
    ApiClientError::Transport {
        endpoint: endpoint.to_string(),
        message: err.to_string(),
    }
}

async fn decode<T: DeserializeOwned>(endpoint: &str, res: Response) -> Result<T, ApiClientError> {
    let status = res.status();
    if !status.is_success() {
        let body = res
            .text()
            .await
            .map_err(|err| transport_error(endpoint, err))?;
        return Err(ApiClientError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            error: ApiError::from_response(status.as_u16(), &body),
        });
    }

    let bytes = res
        .bytes()
        .await
        .map_err(|err| transport_error(endpoint, err))?;
    serde_json::from_slice(&bytes).map_err(|err| ApiClientError::Decode {
        endpoint: endpoint.to_string(),
        message: err.to_string(),
    })
}

#[async_trait]
impl StorefrontApi for HttpStorefrontApi {
    async fn list_products(
        &self,
        query: &ProductListQuery,
    ) -> Result<ProductListResponse, ApiClientError> {
        let endpoint = self.endpoint("/products");
        debug!(endpoint = %endpoint, page = query.page, "catalog: listing products");
        let res = self
            .http
            .get(&endpoint)
            .query(query)
            .send()
            .await
            .map_err(|err| transport_error(&endpoint, err))?;
        decode(&endpoint, res).await
    }

    async fn list_categories(&self) -> Result<CategoryGroups, ApiClientError> {
        let endpoint = self.endpoint("/categories");
        let res = self
            .http
            .get(&endpoint)
            .send()
            .await
            .map_err(|err| transport_error(&endpoint, err))?;
        decode(&endpoint, res).await
    }

    async fn suggestions(&self, prefix: &str, limit: u32) -> Result<Vec<String>, ApiClientError> {
        let endpoint = self.endpoint("/suggestions");
        let res = self
            .http
            .get(&endpoint)
            .query(&SuggestionQuery {
                prefix: prefix.to_string(),
                limit,
            })
            .send()
            .await
            .map_err(|err| transport_error(&endpoint, err))?;
        let body: SuggestionResponse = decode(&endpoint, res).await?;
        Ok(body.products)
    }

    async fn confirm_payment(
        &self,
        request: &ConfirmPaymentRequest,
    ) -> Result<ConfirmPaymentResponse, ApiClientError> {
        let endpoint = self.endpoint("/payment/confirm-payment");
        debug!(endpoint = %endpoint, order_id = request.order_id.0, "payment: confirming");
        let res = self
            .http
            .post(&endpoint)
            .json(request)
            .send()
            .await
            .map_err(|err| transport_error(&endpoint, err))?;
        decode(&endpoint, res).await
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
