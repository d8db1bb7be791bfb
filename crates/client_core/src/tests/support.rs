use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex},
};

use async_trait::async_trait;
use shared::{
    domain::{CategoryId, ProductId},
    error::{ApiError, ErrorCode},
    protocol::{
        Category, CategoryGroups, ConfirmPaymentRequest, ConfirmPaymentResponse, Pagination,
        Product, ProductListQuery, ProductListResponse,
    },
};
use tokio::sync::{Mutex, Notify};

use crate::{
    payment::{Navigator, Route},
    ApiClientError, StorefrontApi,
};

#[derive(Debug, Clone)]
pub(crate) enum ConfirmBehavior {
    Respond(ConfirmPaymentResponse),
    Status(u16, String),
    Network,
}

pub(crate) struct FakeStorefrontApi {
    pub product_queries: Mutex<Vec<ProductListQuery>>,
    pub suggestion_prefixes: Mutex<Vec<String>>,
    pub confirm_requests: Mutex<Vec<ConfirmPaymentRequest>>,
    pub total_pages: Mutex<u32>,
    pub fail_products: Mutex<bool>,
    pub fail_suggestions: Mutex<bool>,
    pub fail_categories: Mutex<bool>,
    pub confirm_behavior: Mutex<ConfirmBehavior>,
    search_gates: Mutex<HashMap<String, Arc<Notify>>>,
    suggestion_gates: Mutex<HashMap<String, Arc<Notify>>>,
    confirm_gate: Mutex<Option<Arc<Notify>>>,
}

impl Default for FakeStorefrontApi {
    fn default() -> Self {
        Self {
            product_queries: Mutex::new(Vec::new()),
            suggestion_prefixes: Mutex::new(Vec::new()),
            confirm_requests: Mutex::new(Vec::new()),
            total_pages: Mutex::new(5),
            fail_products: Mutex::new(false),
            fail_suggestions: Mutex::new(false),
            fail_categories: Mutex::new(false),
            confirm_behavior: Mutex::new(ConfirmBehavior::Respond(ConfirmPaymentResponse {
                status: "success".to_string(),
                message: None,
            })),
            search_gates: Mutex::new(HashMap::new()),
            suggestion_gates: Mutex::new(HashMap::new()),
            confirm_gate: Mutex::new(None),
        }
    }
}

impl FakeStorefrontApi {
    /// Listing requests with `q == search` block until the gate is notified.
    pub async fn hold_search(&self, search: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.search_gates
            .lock()
            .await
            .insert(search.to_string(), Arc::clone(&gate));
        gate
    }

    pub async fn hold_suggestions(&self, prefix: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.suggestion_gates
            .lock()
            .await
            .insert(prefix.to_string(), Arc::clone(&gate));
        gate
    }

    pub async fn hold_confirmation(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.confirm_gate.lock().await = Some(Arc::clone(&gate));
        gate
    }

    pub async fn wait_for_product_queries(&self, count: usize) {
        while self.product_queries.lock().await.len() < count {
            tokio::task::yield_now().await;
        }
    }

    pub async fn wait_for_confirm_requests(&self, count: usize) {
        while self.confirm_requests.lock().await.len() < count {
            tokio::task::yield_now().await;
        }
    }

    pub async fn searches(&self) -> Vec<Option<String>> {
        self.product_queries
            .lock()
            .await
            .iter()
            .map(|query| query.q.clone())
            .collect()
    }
}

fn network_error(endpoint: &str) -> ApiClientError {
    ApiClientError::Transport {
        endpoint: endpoint.to_string(),
        message: "connection refused".to_string(),
    }
}

pub(crate) fn product_named(id: i64, name: &str) -> Product {
    Product {
        id: ProductId(id),
        name: name.to_string(),
        price: 100_000,
        sale_price: None,
        stock: 10,
        sold: 0,
        image_url: None,
        category_ids: Vec::new(),
        created_at: None,
    }
}

#[async_trait]
impl StorefrontApi for FakeStorefrontApi {
    async fn list_products(
        &self,
        query: &ProductListQuery,
    ) -> Result<ProductListResponse, ApiClientError> {
        self.product_queries.lock().await.push(query.clone());

        let gate = match &query.q {
            Some(q) => self.search_gates.lock().await.get(q).cloned(),
            None => None,
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if *self.fail_products.lock().await {
            return Err(network_error("/products"));
        }

        let label = query.q.clone().unwrap_or_else(|| "all".to_string());
        let total_pages = *self.total_pages.lock().await;
        Ok(ProductListResponse {
            products: vec![product_named(
                i64::from(query.page),
                &format!("{label} page {}", query.page),
            )],
            pagination: Pagination {
                current_page: query.page,
                total_pages,
                total_items: u64::from(total_pages) * u64::from(query.limit),
                limit: query.limit,
            },
        })
    }

    async fn list_categories(&self) -> Result<CategoryGroups, ApiClientError> {
        if *self.fail_categories.lock().await {
            return Err(ApiClientError::Status {
                endpoint: "/categories".to_string(),
                status: 500,
                error: ApiError::new(ErrorCode::Internal, "categories unavailable"),
            });
        }
        Ok(CategoryGroups {
            flower_type: vec![
                Category {
                    id: CategoryId(1),
                    name: "Roses".to_string(),
                },
                Category {
                    id: CategoryId(2),
                    name: "Tulips".to_string(),
                },
            ],
            occasion: vec![Category {
                id: CategoryId(10),
                name: "Birthday".to_string(),
            }],
        })
    }

    async fn suggestions(&self, prefix: &str, limit: u32) -> Result<Vec<String>, ApiClientError> {
        self.suggestion_prefixes
            .lock()
            .await
            .push(prefix.to_string());

        let gate = self.suggestion_gates.lock().await.get(prefix).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if *self.fail_suggestions.lock().await {
            return Err(network_error("/suggestions"));
        }
        Ok((1..=limit.min(3))
            .map(|n| format!("{prefix} bouquet {n}"))
            .collect())
    }

    async fn confirm_payment(
        &self,
        request: &ConfirmPaymentRequest,
    ) -> Result<ConfirmPaymentResponse, ApiClientError> {
        self.confirm_requests.lock().await.push(request.clone());

        let gate = self.confirm_gate.lock().await.clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        match self.confirm_behavior.lock().await.clone() {
            ConfirmBehavior::Respond(response) => Ok(response),
            ConfirmBehavior::Status(status, message) => Err(ApiClientError::Status {
                endpoint: "/payment/confirm-payment".to_string(),
                status,
                error: ApiError::new(ErrorCode::from_status(status), message),
            }),
            ConfirmBehavior::Network => Err(network_error("/payment/confirm-payment")),
        }
    }
}

#[derive(Default)]
pub(crate) struct RecordingNavigator {
    routes: StdMutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().expect("navigator lock").clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes.lock().expect("navigator lock").push(route);
    }
}
