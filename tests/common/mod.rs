#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use servihogar_checkout::models::{
    CreateOrderResponse, LineItem, OrderContext, OrderRequest, PaymentMethod, TimeSlot,
};
use servihogar_checkout::{OrderBackend, ServiceError};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

/// Scripted order backend for integration tests.
///
/// Creation responses are consumed front to back; status responses are
/// scripted per order id, with "not paid yet" as the fallback once a script
/// runs dry. Optionally delays every status query to exercise the poller's
/// in-flight guard, and tracks how many status queries ever ran concurrently.
pub struct MockBackend {
    create_responses: Mutex<VecDeque<Result<CreateOrderResponse, ServiceError>>>,
    status_scripts: Mutex<HashMap<i64, VecDeque<Result<String, ServiceError>>>>,
    create_calls: Mutex<Vec<OrderRequest>>,
    status_calls: Mutex<Vec<i64>>,
    status_delay: Option<Duration>,
    active_queries: AtomicUsize,
    max_concurrent_queries: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            create_responses: Mutex::new(VecDeque::new()),
            status_scripts: Mutex::new(HashMap::new()),
            create_calls: Mutex::new(Vec::new()),
            status_calls: Mutex::new(Vec::new()),
            status_delay: None,
            active_queries: AtomicUsize::new(0),
            max_concurrent_queries: AtomicUsize::new(0),
        }
    }

    pub fn with_status_delay(mut self, delay: Duration) -> Self {
        self.status_delay = Some(delay);
        self
    }

    pub fn script_create_ok(self, order_id: i64) -> Self {
        self.create_responses
            .lock()
            .unwrap()
            .push_back(Ok(CreateOrderResponse {
                order_id: Some(order_id),
            }));
        self
    }

    pub fn script_create_err(self, error: ServiceError) -> Self {
        self.create_responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn script_status(self, order_id: i64, body: &str) -> Self {
        self.status_scripts
            .lock()
            .unwrap()
            .entry(order_id)
            .or_default()
            .push_back(Ok(body.to_string()));
        self
    }

    pub fn script_status_err(self, order_id: i64, error: ServiceError) -> Self {
        self.status_scripts
            .lock()
            .unwrap()
            .entry(order_id)
            .or_default()
            .push_back(Err(error));
        self
    }

    pub fn create_calls(&self) -> Vec<OrderRequest> {
        self.create_calls.lock().unwrap().clone()
    }

    pub fn status_calls(&self) -> Vec<i64> {
        self.status_calls.lock().unwrap().clone()
    }

    pub fn max_concurrent_queries(&self) -> usize {
        self.max_concurrent_queries.load(Ordering::Acquire)
    }
}

#[async_trait]
impl OrderBackend for MockBackend {
    async fn create_order(
        &self,
        request: &OrderRequest,
    ) -> Result<CreateOrderResponse, ServiceError> {
        self.create_calls.lock().unwrap().push(request.clone());
        self.create_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ServiceError::InternalError(
                "unscripted create_order call".to_string(),
            )))
    }

    async fn payment_status(&self, order_id: i64) -> Result<String, ServiceError> {
        self.status_calls.lock().unwrap().push(order_id);

        let active = self.active_queries.fetch_add(1, Ordering::AcqRel) + 1;
        self.max_concurrent_queries
            .fetch_max(active, Ordering::AcqRel);
        if let Some(delay) = self.status_delay {
            tokio::time::sleep(delay).await;
        }
        self.active_queries.fetch_sub(1, Ordering::AcqRel);

        let scripted = self
            .status_scripts
            .lock()
            .unwrap()
            .get_mut(&order_id)
            .and_then(|queue| queue.pop_front());
        scripted.unwrap_or(Ok(r#"{"Pagado":"N"}"#.to_string()))
    }
}

pub fn line_item(
    service_id: i64,
    service_name: &str,
    product_id: i64,
    quantity: u32,
    unit_price: Decimal,
) -> LineItem {
    LineItem {
        id: Uuid::new_v4(),
        service_id,
        category_id: service_id * 10,
        product_id,
        display_name: format!("Product {}", product_id),
        service_name: service_name.to_string(),
        unit_price,
        quantity,
    }
}

/// Builds an already-submitted order result, as the orchestrator would have
/// produced it for the given payment method.
pub fn order_result(
    order_id: i64,
    service_name: &str,
    payment_method: PaymentMethod,
) -> servihogar_checkout::models::OrderResult {
    use servihogar_checkout::models::{OrderLineEntry, OrderResult, PaidFlag};

    OrderResult {
        order_id,
        service_name: service_name.to_string(),
        payment_confirmed: !payment_method.requires_gateway_confirmation(),
        request_data: OrderRequest {
            service_id: order_id,
            service_name: service_name.to_string(),
            customer_name: "Ana Torres".to_string(),
            phone: "5551234567".to_string(),
            email: None,
            street: "Calle 12 #34".to_string(),
            address_extra: None,
            district: "Centro".to_string(),
            zone_name: "Centro".to_string(),
            scheduled_for: "2026-09-01T00:00:00".to_string(),
            time_slot: TimeSlot::Morning,
            payment_method,
            zone_surcharge: dec!(0),
            discount_amount: dec!(0),
            paid_flag: PaidFlag::Pending,
            lines: vec![OrderLineEntry {
                service_id: order_id,
                category_id: 1,
                product_id: 10,
                quantity: 1,
                unit_price: dec!(100),
                line_total: dec!(100),
            }],
        },
    }
}

pub fn order_context(payment_method: PaymentMethod) -> OrderContext {
    OrderContext {
        customer_name: "Ana Torres".to_string(),
        phone: "5551234567".to_string(),
        email: Some("ana@example.com".to_string()),
        street: "Calle 12 #34".to_string(),
        address_extra: Some("Apt 5".to_string()),
        district: "Centro".to_string(),
        scheduled_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
        time_slot: TimeSlot::Morning,
        payment_method,
        zone_name: "Centro".to_string(),
        zone_surcharge: dec!(50),
    }
}
