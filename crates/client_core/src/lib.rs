use async_trait::async_trait;
use shared::protocol::{
    CategoryGroups, ConfirmPaymentRequest, ConfirmPaymentResponse, ProductListQuery,
    ProductListResponse,
};

pub mod catalog;
pub mod debounce;
pub mod error;
pub mod filters;
pub mod gateway;
pub mod latch;
pub mod payment;
pub mod transport;

pub use catalog::{
    ActiveFilterBadge, CatalogConfig, CatalogController, CatalogEvent, CatalogSnapshot,
    FetchOutcome, PageResult, PaginationView, SuggestionState,
};
pub use error::ApiClientError;
pub use filters::{ActiveFilter, FilterChange, Filters, PriceRange};
pub use gateway::GatewayReturnParams;
pub use latch::{Liveness, OneShotLatch};
pub use payment::{Navigator, PaymentReturnResolver, ResolutionState, Route};
pub use transport::HttpStorefrontApi;

/// Remote storefront endpoints used by the catalog and payment flows.
#[async_trait]
pub trait StorefrontApi: Send + Sync {
    async fn list_products(
        &self,
        query: &ProductListQuery,
    ) -> Result<ProductListResponse, ApiClientError>;
    async fn list_categories(&self) -> Result<CategoryGroups, ApiClientError>;
    async fn suggestions(&self, prefix: &str, limit: u32) -> Result<Vec<String>, ApiClientError>;
    async fn confirm_payment(
        &self,
        request: &ConfirmPaymentRequest,
    ) -> Result<ConfirmPaymentResponse, ApiClientError>;
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
