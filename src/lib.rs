//! ServiHogar checkout engine
//!
//! Order submission and payment confirmation for the home-services
//! storefront: discount-aware totals, per-service order aggregation,
//! sequential submission to the order backend, and polled confirmation of
//! gateway payments.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod clients;
pub mod config;
pub mod errors;
pub mod events;
pub mod models;
pub mod services;

pub use clients::{HttpOrderBackend, OrderBackend};
pub use config::{load_config, AppConfig};
pub use errors::ServiceError;
pub use events::{CheckoutEvent, EventSender};
pub use services::checkout::CheckoutSession;
pub use services::polling::{PaymentPoller, PollPolicy};
pub use services::submission::{SubmissionOrchestrator, SubmissionState};

use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber. `RUST_LOG` wins over the configured
/// level; repeated calls are no-ops so tests can call this freely.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
