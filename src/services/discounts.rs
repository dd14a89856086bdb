//! Volume-discount calculator.
//!
//! Pure and deterministic: no I/O, no hidden state, safe to call repeatedly.
//! The same half-up cent rounding is used here and nowhere else, so displayed
//! totals and submitted payloads always agree.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{group_by_service, DiscountBreakdown, DiscountEntry, DiscountRule, LineItem};

/// Rounds a money amount to cents, half-up.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Sum of line totals across the whole cart.
pub fn cart_subtotal(items: &[LineItem]) -> Decimal {
    items.iter().map(LineItem::line_total).sum()
}

/// Selects the applicable rule for a group of `unit_count` units: the highest
/// threshold met wins; on equal thresholds the first rule in table order is
/// kept.
fn select_rule<'a>(rules: &'a [DiscountRule], unit_count: u32) -> Option<&'a DiscountRule> {
    let mut best: Option<&DiscountRule> = None;
    for rule in rules {
        if rule.threshold > unit_count {
            continue;
        }
        match best {
            Some(current) if rule.threshold <= current.threshold => {}
            _ => best = Some(rule),
        }
    }
    best
}

/// Computes the discount breakdown for the current cart.
///
/// `subtotal` is supplied by the caller (it is already displayed in the cart
/// drawer); malformed items (zero quantity, negative price) must be rejected
/// before this stage. The resulting total is clamped so it never falls below
/// the zone surcharge alone.
pub fn calculate_breakdown(
    items: &[LineItem],
    rules: &[DiscountRule],
    subtotal: Decimal,
    zone_surcharge: Decimal,
) -> DiscountBreakdown {
    let mut discounts = Vec::new();

    for (service_id, members) in group_by_service(items) {
        let unit_count: u32 = members.iter().map(|i| i.quantity).sum();
        let Some(rule) = select_rule(rules, unit_count) else {
            continue;
        };
        let group_total: Decimal = members.iter().map(|i| i.line_total()).sum();
        let amount = round_money(group_total * rule.percentage / Decimal::ONE_HUNDRED);
        discounts.push(DiscountEntry {
            service_id,
            description: rule.description.clone(),
            item_count: unit_count,
            percentage: rule.percentage,
            amount,
        });
    }

    let discount_total: Decimal = discounts.iter().map(|d| d.amount).sum();
    let mut total = subtotal - discount_total + zone_surcharge;
    if total < zone_surcharge {
        total = zone_surcharge;
    }

    DiscountBreakdown {
        subtotal,
        discounts,
        zone_surcharge,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn item(service_id: i64, quantity: u32, unit_price: Decimal) -> LineItem {
        LineItem {
            id: Uuid::new_v4(),
            service_id,
            category_id: 1,
            product_id: 10,
            display_name: "Product".to_string(),
            service_name: "Service".to_string(),
            unit_price,
            quantity,
        }
    }

    fn rule(threshold: u32, percentage: Decimal, description: &str) -> DiscountRule {
        DiscountRule {
            threshold,
            percentage,
            description: description.to_string(),
        }
    }

    #[test]
    fn three_unit_cleaning_cart_gets_ten_percent_off() {
        // 3 x $100 cleaning, 10% three-unit rule, $50 surcharge.
        let items = vec![item(1, 3, dec!(100))];
        let rules = vec![rule(3, dec!(10), "3+ units")];
        let breakdown = calculate_breakdown(&items, &rules, dec!(300), dec!(50));

        assert_eq!(breakdown.subtotal, dec!(300));
        assert_eq!(breakdown.discounts.len(), 1);
        assert_eq!(breakdown.discounts[0].amount, dec!(30.00));
        assert_eq!(breakdown.discounts[0].item_count, 3);
        assert_eq!(breakdown.total, dec!(320.00));
    }

    #[test]
    fn highest_met_threshold_wins() {
        let items = vec![item(1, 5, dec!(10))];
        let rules = vec![
            rule(3, dec!(5), "3+ units"),
            rule(5, dec!(12), "5+ units"),
            rule(10, dec!(20), "10+ units"),
        ];
        let breakdown = calculate_breakdown(&items, &rules, dec!(50), dec!(0));
        assert_eq!(breakdown.discounts[0].description, "5+ units");
        assert_eq!(breakdown.discounts[0].amount, dec!(6.00));
    }

    #[test]
    fn equal_thresholds_keep_first_rule_in_table_order() {
        let items = vec![item(1, 3, dec!(10))];
        let rules = vec![rule(3, dec!(5), "first"), rule(3, dec!(9), "second")];
        let breakdown = calculate_breakdown(&items, &rules, dec!(30), dec!(0));
        assert_eq!(breakdown.discounts[0].description, "first");
    }

    #[test]
    fn groups_below_every_threshold_contribute_no_entry() {
        let items = vec![item(1, 2, dec!(100)), item(2, 4, dec!(10))];
        let rules = vec![rule(3, dec!(10), "3+ units")];
        let breakdown = calculate_breakdown(&items, &rules, dec!(240), dec!(0));

        assert_eq!(breakdown.discounts.len(), 1);
        assert_eq!(breakdown.discounts[0].service_id, 2);
        assert_eq!(breakdown.total, dec!(236.00));
    }

    #[test]
    fn rules_apply_per_service_group_independently() {
        let items = vec![item(1, 3, dec!(100)), item(2, 3, dec!(50))];
        let rules = vec![rule(3, dec!(10), "3+ units")];
        let breakdown = calculate_breakdown(&items, &rules, dec!(450), dec!(0));

        assert_eq!(breakdown.discounts.len(), 2);
        assert_eq!(breakdown.discounts[0].amount, dec!(30.00));
        assert_eq!(breakdown.discounts[1].amount, dec!(15.00));
        assert_eq!(breakdown.discount_total(), dec!(45.00));
        assert_eq!(breakdown.total, dec!(405.00));
    }

    #[test]
    fn cent_amounts_round_half_up() {
        // 3 x $33.35 = $100.05; 15% = $15.0075 -> $15.01
        let items = vec![item(1, 3, dec!(33.35))];
        let rules = vec![rule(3, dec!(15), "3+ units")];
        let breakdown = calculate_breakdown(&items, &rules, dec!(100.05), dec!(0));
        assert_eq!(breakdown.discounts[0].amount, dec!(15.01));
    }

    #[test]
    fn pathological_discount_stacking_clamps_to_surcharge_floor() {
        let items = vec![item(1, 3, dec!(100))];
        let rules = vec![rule(3, dec!(150), "broken tier")];
        let breakdown = calculate_breakdown(&items, &rules, dec!(300), dec!(50));

        // 300 - 450 + 50 would be negative; floor is the surcharge alone.
        assert_eq!(breakdown.total, dec!(50));
        assert!(breakdown.total >= breakdown.zone_surcharge);
    }

    #[test]
    fn identical_input_yields_identical_output() {
        let items = vec![item(1, 3, dec!(100)), item(2, 5, dec!(20))];
        let rules = vec![rule(3, dec!(10), "3+ units"), rule(5, dec!(15), "5+ units")];
        let first = calculate_breakdown(&items, &rules, dec!(400), dec!(25));
        let second = calculate_breakdown(&items, &rules, dec!(400), dec!(25));
        assert_eq!(first, second);
    }

    #[test]
    fn empty_cart_yields_surcharge_only_total() {
        let breakdown = calculate_breakdown(&[], &[], dec!(0), dec!(50));
        assert!(breakdown.discounts.is_empty());
        assert_eq!(breakdown.total, dec!(50));
    }
}
