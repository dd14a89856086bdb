//! Payment confirmation polling.
//!
//! A poller is either dormant or running one repeating timer; there is never
//! more than one live timer per checkout session. Each tick sweeps the still
//! pending gateway-paid orders sequentially, guarded by an in-flight flag so
//! a slow pass is skipped over rather than overlapped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::clients::OrderBackend;
use crate::events::{CheckoutEvent, EventSender};
use crate::models::OrderResult;
use crate::services::payment_status::is_paid_response;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3000);

/// Cadence policy for the poller. The reference behavior is a 3 second
/// interval with no upper bound; callers that want a ceiling set
/// `max_passes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Maximum number of timed confirmation passes, `None` for unbounded.
    pub max_passes: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_passes: None,
        }
    }
}

/// Result of one confirmation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Another pass was still in flight; nothing was queried.
    Skipped,
    /// At least one order is still awaiting confirmation.
    Pending,
    /// Every gateway-paid order is confirmed.
    AllConfirmed,
}

pub struct PaymentPoller<B: OrderBackend + 'static> {
    backend: Arc<B>,
    results: Arc<RwLock<Vec<OrderResult>>>,
    events: Option<EventSender>,
    policy: PollPolicy,
    in_flight: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl<B: OrderBackend + 'static> PaymentPoller<B> {
    pub fn new(
        backend: Arc<B>,
        results: Arc<RwLock<Vec<OrderResult>>>,
        events: Option<EventSender>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            backend,
            results,
            events,
            policy,
            in_flight: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Whether the repeating timer is currently live.
    pub fn is_active(&self) -> bool {
        self.handle.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }

    /// Activates the poller: one immediate confirmation pass, then a
    /// repeating timer. Stays dormant when nothing awaits confirmation.
    #[instrument(skip(self))]
    pub async fn start(&mut self) {
        if self.is_active() {
            return;
        }

        let has_pending = self
            .results
            .read()
            .await
            .iter()
            .any(|r| r.awaiting_confirmation());
        if !has_pending {
            debug!("No orders awaiting confirmation; poller stays dormant");
            return;
        }

        let outcome = Self::guarded_pass(
            &self.backend,
            &self.results,
            &self.events,
            &self.in_flight,
        )
        .await;
        if outcome == PassOutcome::AllConfirmed {
            emit(&self.events, CheckoutEvent::PollingStopped { all_confirmed: true }).await;
            return;
        }

        let backend = Arc::clone(&self.backend);
        let results = Arc::clone(&self.results);
        let events = self.events.clone();
        let in_flight = Arc::clone(&self.in_flight);
        let policy = self.policy;

        self.handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(policy.interval);
            // A pass that outlives the interval swallows the ticks it missed;
            // the next pass happens on the following scheduled tick.
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first interval tick completes immediately; the activation
            // pass already covered it.
            ticker.tick().await;

            let mut passes: u32 = 0;
            loop {
                ticker.tick().await;
                match Self::guarded_pass(&backend, &results, &events, &in_flight).await {
                    PassOutcome::AllConfirmed => {
                        info!("All gateway-paid orders confirmed; stopping poller");
                        emit(&events, CheckoutEvent::PollingStopped { all_confirmed: true })
                            .await;
                        break;
                    }
                    PassOutcome::Pending => {
                        passes += 1;
                        if let Some(max) = policy.max_passes {
                            if passes >= max {
                                warn!(passes, "Poll pass budget exhausted; stopping poller");
                                emit(
                                    &events,
                                    CheckoutEvent::PollingStopped {
                                        all_confirmed: false,
                                    },
                                )
                                .await;
                                break;
                            }
                        }
                    }
                    PassOutcome::Skipped => {
                        debug!("Previous confirmation pass still in flight; tick skipped");
                    }
                }
            }
        }));
    }

    /// Performs exactly one confirmation pass outside the timer cadence,
    /// subject to the same in-flight guard.
    pub async fn check_now(&self) -> PassOutcome {
        Self::guarded_pass(&self.backend, &self.results, &self.events, &self.in_flight).await
    }

    /// Tears the poller down: the timer is cleared and the in-flight flag is
    /// reset. A status query already in flight runs to completion on the
    /// aborted task and its result is discarded.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.in_flight.store(false, Ordering::Release);
    }

    async fn guarded_pass(
        backend: &Arc<B>,
        results: &Arc<RwLock<Vec<OrderResult>>>,
        events: &Option<EventSender>,
        in_flight: &Arc<AtomicBool>,
    ) -> PassOutcome {
        if in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return PassOutcome::Skipped;
        }
        let outcome = Self::confirmation_pass(backend, results, events).await;
        in_flight.store(false, Ordering::Release);
        outcome
    }

    /// One sequential sweep over all pending orders. A failed status query
    /// leaves that order pending; it is retried on the next tick.
    async fn confirmation_pass(
        backend: &Arc<B>,
        results: &Arc<RwLock<Vec<OrderResult>>>,
        events: &Option<EventSender>,
    ) -> PassOutcome {
        let pending: Vec<i64> = results
            .read()
            .await
            .iter()
            .filter(|r| r.awaiting_confirmation())
            .map(|r| r.order_id)
            .collect();
        if pending.is_empty() {
            return PassOutcome::AllConfirmed;
        }

        for order_id in pending {
            match backend.payment_status(order_id).await {
                Ok(body) => {
                    if is_paid_response(&body) {
                        let mut guard = results.write().await;
                        if let Some(result) =
                            guard.iter_mut().find(|r| r.order_id == order_id)
                        {
                            result.mark_paid();
                        }
                        drop(guard);
                        info!(order_id, "Payment confirmed");
                        emit(events, CheckoutEvent::PaymentConfirmed { order_id }).await;
                    } else {
                        debug!(order_id, "Payment not yet confirmed");
                    }
                }
                Err(e) => {
                    warn!(error = %e, order_id, "Status query failed; order left pending");
                }
            }
        }

        let still_pending = results
            .read()
            .await
            .iter()
            .any(|r| r.awaiting_confirmation());
        if still_pending {
            PassOutcome::Pending
        } else {
            PassOutcome::AllConfirmed
        }
    }
}

impl<B: OrderBackend + 'static> Drop for PaymentPoller<B> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn emit(events: &Option<EventSender>, event: CheckoutEvent) {
    if let Some(sender) = events {
        if let Err(e) = sender.send(event).await {
            warn!(error = %e, "Failed to send checkout event");
        }
    }
}
