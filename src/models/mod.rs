//! Domain types for the checkout engine.
//!
//! Money is represented with `rust_decimal::Decimal` throughout; totals are
//! rounded to cents with half-up rounding in the discount calculator so that
//! displayed amounts and submitted payloads can never drift apart.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// One product/quantity selection in the cart.
///
/// A `LineItem` only exists in the active cart while `quantity > 0`;
/// zero-quantity items are removed by the cart layer, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    pub id: Uuid,
    pub service_id: i64,
    pub category_id: i64,
    pub product_id: i64,
    /// Display name of the product, e.g. "Deep kitchen cleaning".
    pub display_name: String,
    /// Display name of the service the product belongs to, e.g. "Cleaning".
    pub service_name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl LineItem {
    /// Final price for this line: unit price times quantity.
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Groups line items by `service_id`, preserving the order in which each
/// service first appears in the cart. Submission order follows this grouping
/// order.
pub fn group_by_service(items: &[LineItem]) -> Vec<(i64, Vec<&LineItem>)> {
    let mut groups: Vec<(i64, Vec<&LineItem>)> = Vec::new();
    for item in items {
        match groups.iter_mut().find(|(sid, _)| *sid == item.service_id) {
            Some((_, members)) => members.push(item),
            None => groups.push((item.service_id, vec![item])),
        }
    }
    groups
}

/// A volume-discount tier, keyed by qualifying unit count within one service
/// group. At most one rule applies per group: the highest threshold met wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountRule {
    /// Minimum number of units in the service group for this tier to apply.
    pub threshold: u32,
    /// Discount percentage, 0-100.
    pub percentage: Decimal,
    pub description: String,
}

/// One applied discount, attributed to a single service group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscountEntry {
    pub service_id: i64,
    pub description: String,
    pub item_count: u32,
    pub percentage: Decimal,
    pub amount: Decimal,
}

/// Output of the discount calculator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscountBreakdown {
    pub subtotal: Decimal,
    pub discounts: Vec<DiscountEntry>,
    pub zone_surcharge: Decimal,
    /// `subtotal - sum(discount amounts) + zone_surcharge`, clamped so it can
    /// never fall below the zone surcharge alone.
    pub total: Decimal,
}

impl DiscountBreakdown {
    pub fn discount_total(&self) -> Decimal {
        self.discounts.iter().map(|d| d.amount).sum()
    }

    /// Discount amount attributed to one service group, zero if none applied.
    pub fn amount_for_service(&self, service_id: i64) -> Decimal {
        self.discounts
            .iter()
            .find(|d| d.service_id == service_id)
            .map(|d| d.amount)
            .unwrap_or(Decimal::ZERO)
    }
}

/// Time-of-day slot for a scheduled visit. Serialized as the numeric code the
/// backend expects (1/2/3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum TimeSlot {
    Morning,
    Afternoon,
    Evening,
}

impl TimeSlot {
    pub fn code(self) -> u8 {
        match self {
            TimeSlot::Morning => 1,
            TimeSlot::Afternoon => 2,
            TimeSlot::Evening => 3,
        }
    }
}

impl From<TimeSlot> for u8 {
    fn from(slot: TimeSlot) -> Self {
        slot.code()
    }
}

impl TryFrom<u8> for TimeSlot {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(TimeSlot::Morning),
            2 => Ok(TimeSlot::Afternoon),
            3 => Ok(TimeSlot::Evening),
            other => Err(format!("invalid time slot code: {}", other)),
        }
    }
}

/// How the customer pays. Serialized as the numeric backend code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum PaymentMethod {
    /// Paid in person when the service is completed; confirmed instantly.
    CashOnCompletion,
    /// Paid through the third-party gateway; requires polled confirmation.
    OnlineGateway,
}

impl PaymentMethod {
    pub fn code(self) -> u8 {
        match self {
            PaymentMethod::CashOnCompletion => 1,
            PaymentMethod::OnlineGateway => 2,
        }
    }

    /// Whether orders paid this way need gateway confirmation before they can
    /// be shown as paid.
    pub fn requires_gateway_confirmation(self) -> bool {
        matches!(self, PaymentMethod::OnlineGateway)
    }
}

impl From<PaymentMethod> for u8 {
    fn from(method: PaymentMethod) -> Self {
        method.code()
    }
}

impl TryFrom<u8> for PaymentMethod {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(PaymentMethod::CashOnCompletion),
            2 => Ok(PaymentMethod::OnlineGateway),
            other => Err(format!("invalid payment method code: {}", other)),
        }
    }
}

/// Paid-flag carried on the order payload. The backend signals "payment
/// received" with the `S` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaidFlag {
    #[serde(rename = "N")]
    Pending,
    #[serde(rename = "S")]
    Paid,
}

/// Shared order metadata stamped onto every per-service request: who the
/// customer is, where and when the work happens, and how it is paid.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderContext {
    #[validate(length(min = 1, message = "Customer name is required"))]
    pub customer_name: String,
    #[validate(length(min = 7, message = "A contact phone number is required"))]
    pub phone: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "Street address is required"))]
    pub street: String,
    pub address_extra: Option<String>,
    #[validate(length(min = 1, message = "District is required"))]
    pub district: String,
    pub scheduled_date: NaiveDate,
    pub time_slot: TimeSlot,
    pub payment_method: PaymentMethod,
    /// Display name of the service zone, e.g. "North metro".
    pub zone_name: String,
    /// Flat surcharge applied for the selected zone.
    pub zone_surcharge: Decimal,
}

/// One line of an order payload, scoped to a single service group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLineEntry {
    #[serde(rename = "ServiceId")]
    pub service_id: i64,
    #[serde(rename = "CategoryId")]
    pub category_id: i64,
    #[serde(rename = "ProductId")]
    pub product_id: i64,
    #[serde(rename = "Quantity")]
    pub quantity: u32,
    #[serde(rename = "UnitPrice")]
    pub unit_price: Decimal,
    #[serde(rename = "LineTotal")]
    pub line_total: Decimal,
}

impl OrderLineEntry {
    pub fn from_item(item: &LineItem) -> Self {
        Self {
            service_id: item.service_id,
            category_id: item.category_id,
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
            line_total: item.line_total(),
        }
    }
}

/// The wire payload for one order, covering exactly one service group.
///
/// Built fresh from the cart snapshot at the moment of confirmation and not
/// modified afterwards, with one exception: the poller patches `paid_flag` to
/// [`PaidFlag::Paid`] on first confirmed observation so the displayed payload
/// matches the backend state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderRequest {
    #[serde(rename = "ServiceId")]
    pub service_id: i64,
    #[serde(rename = "ServiceName")]
    pub service_name: String,
    #[serde(rename = "CustomerName")]
    pub customer_name: String,
    #[serde(rename = "Phone")]
    pub phone: String,
    #[serde(rename = "Email", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "Street")]
    pub street: String,
    #[serde(rename = "AddressExtra", skip_serializing_if = "Option::is_none")]
    pub address_extra: Option<String>,
    #[serde(rename = "District")]
    pub district: String,
    #[serde(rename = "ZoneName")]
    pub zone_name: String,
    /// Scheduled visit as `YYYY-MM-DDTHH:mm:ss`.
    #[serde(rename = "ScheduledFor")]
    pub scheduled_for: String,
    #[serde(rename = "TimeSlot")]
    pub time_slot: TimeSlot,
    #[serde(rename = "PaymentMethod")]
    pub payment_method: PaymentMethod,
    #[serde(rename = "ZoneSurcharge")]
    pub zone_surcharge: Decimal,
    #[serde(rename = "DiscountAmount")]
    pub discount_amount: Decimal,
    #[serde(rename = "Pagado")]
    pub paid_flag: PaidFlag,
    #[serde(rename = "Lines")]
    pub lines: Vec<OrderLineEntry>,
}

impl OrderRequest {
    /// Sum of line totals for this request.
    pub fn lines_total(&self) -> Decimal {
        self.lines.iter().map(|l| l.line_total).sum()
    }
}

/// Response body of the order-creation endpoint. A missing or non-positive
/// identifier is a submission failure, never a valid order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    #[serde(rename = "OrderId")]
    pub order_id: Option<i64>,
}

/// Outcome of one successfully submitted order.
///
/// Created once per submitted [`OrderRequest`]; mutated only by the payment
/// poller, which flips `payment_confirmed` and patches the stored payload's
/// paid flag on first confirmed observation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderResult {
    /// Positive identifier assigned by the backend.
    pub order_id: i64,
    pub service_name: String,
    pub request_data: OrderRequest,
    pub payment_confirmed: bool,
}

impl OrderResult {
    /// Whether this order still needs a gateway confirmation.
    pub fn awaiting_confirmation(&self) -> bool {
        self.request_data.payment_method.requires_gateway_confirmation() && !self.payment_confirmed
    }

    /// Marks the order as paid and patches the stored payload so the UI
    /// renders a consistent paid state.
    pub fn mark_paid(&mut self) {
        self.payment_confirmed = true;
        self.request_data.paid_flag = PaidFlag::Paid;
    }
}
