//! Sequential order submission.
//!
//! One checkout attempt walks the aggregated requests in grouping order, one
//! awaited call at a time. The first failure abandons the rest of the batch;
//! orders already created stay created, and the partial result set is kept so
//! the user can see what went through.

use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::clients::OrderBackend;
use crate::errors::ServiceError;
use crate::events::{CheckoutEvent, EventSender};
use crate::models::{OrderRequest, OrderResult};

/// Lifecycle of one submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Submitting,
    Completed,
    Failed,
}

/// Outcome of one batch: the results accumulated so far and, when the batch
/// was abandoned, the error that stopped it.
#[derive(Debug)]
pub struct SubmissionBatch {
    pub results: Vec<OrderResult>,
    pub failure: Option<ServiceError>,
}

impl SubmissionBatch {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

pub struct SubmissionOrchestrator<B: OrderBackend> {
    backend: Arc<B>,
    events: Option<EventSender>,
    state: SubmissionState,
}

impl<B: OrderBackend> SubmissionOrchestrator<B> {
    pub fn new(backend: Arc<B>, events: Option<EventSender>) -> Self {
        Self {
            backend,
            events,
            state: SubmissionState::Idle,
        }
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    /// Submits every request in order, stopping at the first failure.
    ///
    /// No automatic retry and no compensating cancellation: an order created
    /// before a later failure remains created on the backend.
    #[instrument(skip(self, requests), fields(batch_size = requests.len()))]
    pub async fn submit_batch(&mut self, requests: Vec<OrderRequest>) -> SubmissionBatch {
        if requests.is_empty() {
            self.state = SubmissionState::Failed;
            return SubmissionBatch {
                results: Vec::new(),
                failure: Some(ServiceError::ValidationError(
                    "Submission batch is empty".to_string(),
                )),
            };
        }

        self.state = SubmissionState::Submitting;
        let mut results: Vec<OrderResult> = Vec::with_capacity(requests.len());

        for request in &requests {
            match self.submit_one(request).await {
                Ok(result) => {
                    info!(
                        order_id = result.order_id,
                        service_name = %result.service_name,
                        payment_confirmed = result.payment_confirmed,
                        "Order created"
                    );
                    self.emit(CheckoutEvent::OrderSubmitted {
                        order_id: result.order_id,
                        service_name: result.service_name.clone(),
                    })
                    .await;
                    results.push(result);
                }
                Err(e) => {
                    error!(
                        error = %e,
                        service_name = %request.service_name,
                        submitted_count = results.len(),
                        "Submission failed; abandoning remaining batch"
                    );
                    self.state = SubmissionState::Failed;
                    self.emit(CheckoutEvent::BatchFailed {
                        message: e.to_string(),
                        submitted_count: results.len(),
                    })
                    .await;
                    return SubmissionBatch {
                        results,
                        failure: Some(e),
                    };
                }
            }
        }

        self.state = SubmissionState::Completed;
        self.emit(CheckoutEvent::BatchCompleted {
            order_count: results.len(),
        })
        .await;
        SubmissionBatch {
            results,
            failure: None,
        }
    }

    async fn submit_one(&self, request: &OrderRequest) -> Result<OrderResult, ServiceError> {
        let response = self.backend.create_order(request).await?;
        let order_id = response
            .order_id
            .filter(|id| *id > 0)
            .ok_or_else(|| {
                ServiceError::OrderError(format!(
                    "Backend returned no usable order id for service '{}'",
                    request.service_name
                ))
            })?;

        Ok(OrderResult {
            order_id,
            service_name: request.service_name.clone(),
            payment_confirmed: !request.payment_method.requires_gateway_confirmation(),
            request_data: request.clone(),
        })
    }

    async fn emit(&self, event: CheckoutEvent) {
        if let Some(events) = &self.events {
            if let Err(e) = events.send(event).await {
                warn!(error = %e, "Failed to send checkout event");
            }
        }
    }
}
