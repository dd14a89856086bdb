//! Checkout session facade.
//!
//! Owns the only mutable shared state of the flow: the order results of the
//! current attempt and the single live poller. One session serves one active
//! checkout; a new submission or a closed dialog resets it.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::clients::OrderBackend;
use crate::errors::ServiceError;
use crate::events::EventSender;
use crate::models::{DiscountBreakdown, DiscountRule, LineItem, OrderContext, OrderResult};
use crate::services::aggregation::{build_order_requests, validate_cart};
use crate::services::discounts::{calculate_breakdown, cart_subtotal};
use crate::services::polling::{PassOutcome, PaymentPoller, PollPolicy};
use crate::services::submission::SubmissionOrchestrator;

pub struct CheckoutSession<B: OrderBackend + 'static> {
    backend: Arc<B>,
    events: Option<EventSender>,
    poll_policy: PollPolicy,
    results: Arc<RwLock<Vec<OrderResult>>>,
    poller: Option<PaymentPoller<B>>,
}

impl<B: OrderBackend + 'static> CheckoutSession<B> {
    pub fn new(backend: Arc<B>, events: Option<EventSender>, poll_policy: PollPolicy) -> Self {
        Self {
            backend,
            events,
            poll_policy,
            results: Arc::new(RwLock::new(Vec::new())),
            poller: None,
        }
    }

    /// Computes the discount breakdown for the current cart, for display
    /// before confirmation. Pure; does not touch session state.
    pub fn preview_totals(
        &self,
        items: &[LineItem],
        rules: &[DiscountRule],
        zone_surcharge: rust_decimal::Decimal,
    ) -> DiscountBreakdown {
        calculate_breakdown(items, rules, cart_subtotal(items), zone_surcharge)
    }

    /// Runs one full checkout attempt: validate, price, aggregate, submit,
    /// and activate payment polling for gateway-paid orders.
    ///
    /// On a submission failure the partial result set is retained in the
    /// session (orders already created stay created) and the error is
    /// returned for the UI to surface.
    #[instrument(skip_all, fields(item_count = items.len()))]
    pub async fn submit(
        &mut self,
        items: &[LineItem],
        rules: &[DiscountRule],
        context: &OrderContext,
    ) -> Result<Vec<OrderResult>, ServiceError> {
        validate_cart(items)?;

        let breakdown =
            calculate_breakdown(items, rules, cart_subtotal(items), context.zone_surcharge);
        let requests = build_order_requests(items, &breakdown, context)?;

        // A new attempt replaces the previous session state entirely.
        self.reset().await;

        let mut orchestrator =
            SubmissionOrchestrator::new(Arc::clone(&self.backend), self.events.clone());
        let batch = orchestrator.submit_batch(requests).await;

        {
            let mut guard = self.results.write().await;
            *guard = batch.results.clone();
        }

        if let Some(failure) = batch.failure {
            info!(
                submitted_count = batch.results.len(),
                "Checkout attempt failed after partial submission"
            );
            return Err(failure);
        }

        self.activate_polling().await;
        Ok(batch.results)
    }

    /// Current view of the order results, for rendering status badges.
    pub async fn results_snapshot(&self) -> Vec<OrderResult> {
        self.results.read().await.clone()
    }

    /// Whether the confirmation poller is currently running.
    pub fn polling_active(&self) -> bool {
        self.poller.as_ref().map(|p| p.is_active()).unwrap_or(false)
    }

    /// Manual "check now": one confirmation pass outside the timer cadence.
    pub async fn check_payments_now(&self) -> Option<PassOutcome> {
        match &self.poller {
            Some(poller) => Some(poller.check_now().await),
            None => None,
        }
    }

    /// Clears the session: stops the poller and drops the result set. Called
    /// when the result dialog is closed or a new checkout starts.
    pub async fn reset(&mut self) {
        if let Some(mut poller) = self.poller.take() {
            poller.shutdown();
        }
        self.results.write().await.clear();
    }

    async fn activate_polling(&mut self) {
        let needs_polling = self
            .results
            .read()
            .await
            .iter()
            .any(|r| r.awaiting_confirmation());
        if !needs_polling {
            return;
        }

        let mut poller = PaymentPoller::new(
            Arc::clone(&self.backend),
            Arc::clone(&self.results),
            self.events.clone(),
            self.poll_policy,
        );
        poller.start().await;
        self.poller = Some(poller);
    }
}
