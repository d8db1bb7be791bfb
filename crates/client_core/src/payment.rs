use std::sync::Arc;

use shared::domain::OrderId;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    error::ApiClientError,
    gateway::GatewayReturnParams,
    latch::{Liveness, OneShotLatch},
    StorefrontApi,
};

pub const INVALID_PARAMS_CODE: &str = "invalid_params";
pub const CONFIRM_FAILED_CODE: &str = "confirm_failed";
pub const NETWORK_ERROR_CODE: &str = "network_error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionState {
    Redirecting,
    Processing,
    Success { order_id: OrderId },
    Failed { code: String, message: String },
    Error { code: Option<String>, message: String },
}

impl ResolutionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ResolutionState::Success { .. }
                | ResolutionState::Failed { .. }
                | ResolutionState::Error { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    OrderConfirmation { order_id: OrderId },
    PaymentRejected { order_id: OrderId, code: String },
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::OrderConfirmation { order_id } => format!("/order-confirmation/{order_id}"),
            Route::PaymentRejected { order_id, code } => {
                let query = url::form_urlencoded::Serializer::new(String::new())
                    .append_pair("order_id", &order_id.to_string())
                    .append_pair("code", code)
                    .finish();
                format!("/payment/rejected?{query}")
            }
        }
    }
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

pub struct PaymentReturnResolver {
    api: Arc<dyn StorefrontApi>,
    navigator: Arc<dyn Navigator>,
    latch: OneShotLatch,
    liveness: Liveness,
    state: watch::Sender<ResolutionState>,
}

impl PaymentReturnResolver {
    pub fn new(api: Arc<dyn StorefrontApi>, navigator: Arc<dyn Navigator>) -> Self {
        let (state, _) = watch::channel(ResolutionState::Redirecting);
        Self {
            api,
            navigator,
            latch: OneShotLatch::new(),
            liveness: Liveness::new(),
            state,
        }
    }

    pub fn state(&self) -> ResolutionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ResolutionState> {
        self.state.subscribe()
    }

    pub fn is_alive(&self) -> bool {
        self.liveness.is_alive()
    }

    /// Marks the resolver as unmounted. Pending work finishes silently.
    pub fn teardown(&self) {
        self.liveness.teardown();
    }

    pub async fn resolve(&self, redirect: &str) -> ResolutionState {
        let params = GatewayReturnParams::parse(redirect);
        self.resolve_params(&params).await
    }

    pub async fn resolve_params(&self, params: &GatewayReturnParams) -> ResolutionState {
        if !self.liveness.is_alive() {
            debug!("payment: resolver torn down, skipping evaluation");
            return self.state();
        }

        let Some(order_id) = params.order_id() else {
            warn!(order_ref = ?params.order_ref, "payment: missing order reference");
            return self.settle(
                ResolutionState::Error {
                    code: None,
                    message: "missing order reference".to_string(),
                },
                None,
            );
        };

        if !params.has_gateway_status() {
            debug!(order_id = order_id.0, "payment: awaiting gateway redirect");
            return self.settle(ResolutionState::Redirecting, None);
        }

        if !self.latch.try_acquire() {
            debug!(order_id = order_id.0, "payment: redirect already evaluated");
            return self.state();
        }

        if let Some(code) = params.failing_code() {
            info!(order_id = order_id.0, code, "payment: gateway reported failure");
            return self.reject(
                order_id,
                code,
                format!("payment was not completed (gateway code {code})"),
            );
        }

        let Some(request) = params.confirmation_request(order_id) else {
            warn!(
                order_id = order_id.0,
                transaction_no = ?params.transaction_no,
                pay_date = ?params.pay_date,
                "payment: invalid gateway parameters"
            );
            return self.reject(
                order_id,
                INVALID_PARAMS_CODE,
                "invalid gateway parameters".to_string(),
            );
        };

        self.settle(ResolutionState::Processing, None);
        let result = self.api.confirm_payment(&request).await;

        if !self.liveness.is_alive() {
            debug!(order_id = order_id.0, "payment: resolver torn down, dropping response");
            return self.state();
        }

        match result {
            Ok(response) if response.is_success() => {
                info!(order_id = order_id.0, "payment: confirmed");
                self.settle(
                    ResolutionState::Success { order_id },
                    Some(Route::OrderConfirmation { order_id }),
                )
            }
            Ok(response) => {
                let message = response.message.unwrap_or_else(|| {
                    format!("confirmation returned status '{}'", response.status)
                });
                warn!(order_id = order_id.0, "payment: confirmation rejected: {message}");
                self.reject(order_id, CONFIRM_FAILED_CODE, message)
            }
            Err(err @ ApiClientError::Status { .. }) => {
                warn!(order_id = order_id.0, "payment: confirmation rejected: {err}");
                self.reject(order_id, CONFIRM_FAILED_CODE, err.user_message())
            }
            Err(err) => {
                warn!(order_id = order_id.0, "payment: confirmation failed: {err}");
                self.settle(
                    ResolutionState::Error {
                        code: Some(NETWORK_ERROR_CODE.to_string()),
                        message: err.user_message(),
                    },
                    Some(Route::PaymentRejected {
                        order_id,
                        code: NETWORK_ERROR_CODE.to_string(),
                    }),
                )
            }
        }
    }

    fn reject(&self, order_id: OrderId, code: &str, message: String) -> ResolutionState {
        self.settle(
            ResolutionState::Failed {
                code: code.to_string(),
                message,
            },
            Some(Route::PaymentRejected {
                order_id,
                code: code.to_string(),
            }),
        )
    }

    fn settle(&self, next: ResolutionState, route: Option<Route>) -> ResolutionState {
        if !self.liveness.is_alive() {
            return self.state();
        }
        self.state.send_replace(next.clone());
        if let Some(route) = route {
            debug!(path = %route.path(), "payment: navigating");
            self.navigator.navigate(route);
        }
        next
    }
}

#[cfg(test)]
#[path = "tests/payment_tests.rs"]
mod tests;
