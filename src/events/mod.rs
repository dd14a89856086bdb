//! Typed checkout events for the presentation layer.
//!
//! The UI subscribes to this channel instead of a DOM-style event bus, so the
//! orchestrator and poller can be unit-tested without any browser-like
//! environment.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted by the checkout engine for the UI boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum CheckoutEvent {
    /// One per-service order was accepted by the backend.
    OrderSubmitted {
        order_id: i64,
        service_name: String,
    },
    /// Every order in the batch was created.
    BatchCompleted { order_count: usize },
    /// A submission failed; orders created earlier in the batch remain.
    BatchFailed {
        message: String,
        submitted_count: usize,
    },
    /// A gateway-paid order was confirmed by the status endpoint.
    PaymentConfirmed { order_id: i64 },
    /// Polling ended: all orders confirmed, or the pass budget ran out.
    PollingStopped { all_confirmed: bool },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<CheckoutEvent>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<CheckoutEvent>) -> Self {
        Self { sender }
    }

    /// Creates a bounded channel pair for one checkout session.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<CheckoutEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: CheckoutEvent) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_are_delivered_in_order() {
        let (sender, mut rx) = EventSender::channel(8);
        sender
            .send(CheckoutEvent::OrderSubmitted {
                order_id: 101,
                service_name: "Cleaning".to_string(),
            })
            .await
            .unwrap();
        sender
            .send(CheckoutEvent::BatchCompleted { order_count: 1 })
            .await
            .unwrap();

        assert_eq!(
            rx.recv().await,
            Some(CheckoutEvent::OrderSubmitted {
                order_id: 101,
                service_name: "Cleaning".to_string(),
            })
        );
        assert_eq!(
            rx.recv().await,
            Some(CheckoutEvent::BatchCompleted { order_count: 1 })
        );
    }

    #[tokio::test]
    async fn send_reports_closed_channel() {
        let (sender, rx) = EventSender::channel(1);
        drop(rx);
        let result = sender
            .send(CheckoutEvent::PaymentConfirmed { order_id: 102 })
            .await;
        assert!(result.is_err());
    }
}
