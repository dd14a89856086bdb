//! Per-service order aggregation.
//!
//! Groups the cart snapshot by service, attaches each group's share of the
//! discount breakdown and the shared order context, and produces one
//! immutable [`OrderRequest`] per distinct service.

use tracing::instrument;
use validator::Validate;

use crate::errors::ServiceError;
use crate::models::{
    group_by_service, DiscountBreakdown, LineItem, OrderContext, OrderLineEntry, OrderRequest,
    PaidFlag,
};

const SCHEDULE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Rejects cart contents the calculator and aggregator must never see:
/// zero-quantity or negatively priced items.
pub fn validate_cart(items: &[LineItem]) -> Result<(), ServiceError> {
    if items.is_empty() {
        return Err(ServiceError::ValidationError(
            "Cart is empty; nothing to submit".to_string(),
        ));
    }
    for item in items {
        if item.quantity == 0 {
            return Err(ServiceError::InvalidInput(format!(
                "Line item '{}' has zero quantity",
                item.display_name
            )));
        }
        if item.unit_price.is_sign_negative() {
            return Err(ServiceError::InvalidInput(format!(
                "Line item '{}' has a negative unit price",
                item.display_name
            )));
        }
    }
    Ok(())
}

/// Builds one [`OrderRequest`] per distinct service in the cart.
///
/// The union of line entries across all produced requests equals the input
/// item set exactly; no item is lost or duplicated. An empty cart is a
/// precondition failure, not an empty batch.
#[instrument(skip_all, fields(item_count = items.len()))]
pub fn build_order_requests(
    items: &[LineItem],
    breakdown: &DiscountBreakdown,
    context: &OrderContext,
) -> Result<Vec<OrderRequest>, ServiceError> {
    validate_cart(items)?;
    context.validate()?;

    let scheduled_for = context
        .scheduled_date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| ServiceError::InternalError("Invalid scheduled date".to_string()))?
        .format(SCHEDULE_FORMAT)
        .to_string();

    let mut requests = Vec::new();
    for (service_id, members) in group_by_service(items) {
        let lines: Vec<OrderLineEntry> = members.iter().map(|i| OrderLineEntry::from_item(i)).collect();
        let service_name = members[0].service_name.clone();
        requests.push(OrderRequest {
            service_id,
            service_name,
            customer_name: context.customer_name.clone(),
            phone: context.phone.clone(),
            email: context.email.clone(),
            street: context.street.clone(),
            address_extra: context.address_extra.clone(),
            district: context.district.clone(),
            zone_name: context.zone_name.clone(),
            scheduled_for: scheduled_for.clone(),
            time_slot: context.time_slot,
            payment_method: context.payment_method,
            zone_surcharge: context.zone_surcharge,
            discount_amount: breakdown.amount_for_service(service_id),
            paid_flag: PaidFlag::Pending,
            lines,
        });
    }

    Ok(requests)
}
