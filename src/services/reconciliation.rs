//! Arithmetic shared by order submission and purchase returns: stock checks,
//! cumulative return bookkeeping and the store-credit clamp. Everything here
//! is pure so the rules can be checked without a database.

use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::entities::{order_line_item, product, return_line_item};
use crate::errors::ServiceError;
use crate::models::{OrderLineInput, ReturnLineInput};

pub const AMOUNT_TOO_LARGE: &str = "The total purchase amount is too large!";

fn amount_too_large() -> ServiceError {
    ServiceError::ValidationError(AMOUNT_TOO_LARGE.to_string())
}

/// A line carrying a product code, a quantity and a unit price.
pub trait PricedLine {
    fn code(&self) -> &str;
    fn quantity(&self) -> i32;
    fn price(&self) -> Decimal;

    /// `quantity * price`, rejected when it does not fit a `Decimal`.
    fn value(&self) -> Result<Decimal, ServiceError> {
        Decimal::from(self.quantity())
            .checked_mul(self.price())
            .ok_or_else(amount_too_large)
    }
}

macro_rules! priced_line {
    ($ty:ty) => {
        impl PricedLine for $ty {
            fn code(&self) -> &str {
                &self.code
            }
            fn quantity(&self) -> i32 {
                self.quantity
            }
            fn price(&self) -> Decimal {
                self.price
            }
        }
    };
}

priced_line!(OrderLineInput);
priced_line!(ReturnLineInput);
priced_line!(order_line_item::Model);
priced_line!(return_line_item::Model);

/// `sum(quantity * price)`
pub fn lines_total<'a, L: PricedLine + 'a>(
    lines: impl IntoIterator<Item = &'a L>,
) -> Result<Decimal, ServiceError> {
    lines.into_iter().try_fold(Decimal::ZERO, |total, line| {
        total.checked_add(line.value()?).ok_or_else(amount_too_large)
    })
}

/// What is still owed on an order: `ordered - returned`.
pub fn remaining_total(ordered: Decimal, returned: Decimal) -> Result<Decimal, ServiceError> {
    ordered.checked_sub(returned).ok_or_else(amount_too_large)
}

/// First code (in input order) that did not resolve to an active product.
pub fn first_unresolved<'a, L: PricedLine>(
    lines: &'a [L],
    products: &[product::Model],
) -> Option<&'a str> {
    lines
        .iter()
        .map(PricedLine::code)
        .find(|code| !products.iter().any(|p| p.code == *code))
}

/// First line (in input order) asking for more than the product has in stock.
/// `quantity == stock` is allowed.
pub fn first_stock_exceeded<'a, L: PricedLine>(
    lines: &'a [L],
    products: &[product::Model],
) -> Option<&'a str> {
    let stock: HashMap<&str, i32> = products
        .iter()
        .map(|p| (p.code.as_str(), p.quantity))
        .collect();

    lines
        .iter()
        .find(|line| line.quantity() > stock.get(line.code()).copied().unwrap_or(0))
        .map(PricedLine::code)
}

/// Per-code quantities summed over lines.
pub fn quantities_by_code<'a, L: PricedLine + 'a>(
    lines: impl IntoIterator<Item = &'a L>,
) -> HashMap<String, i32> {
    let mut totals: HashMap<String, i32> = HashMap::new();
    for line in lines {
        *totals.entry(line.code().to_string()).or_insert(0) += line.quantity();
    }
    totals
}

/// How many units of each ordered code can still be returned.
pub fn returnable_quantity(ordered: i32, already_returned: i32) -> i32 {
    ordered - already_returned
}

/// First entered return line (in input order) exceeding what is still
/// returnable for its code. Codes absent from the order have nothing
/// returnable.
pub fn first_return_exceeded<'a, L: PricedLine>(
    entered: &'a [L],
    ordered: &HashMap<String, i32>,
    returned: &HashMap<String, i32>,
) -> Option<&'a str> {
    entered
        .iter()
        .find(|line| {
            let ordered_qty = ordered.get(line.code()).copied().unwrap_or(0);
            let returned_qty = returned.get(line.code()).copied().unwrap_or(0);
            line.quantity() > returnable_quantity(ordered_qty, returned_qty)
        })
        .map(PricedLine::code)
}

/// Clamps store credit down to what is still owed. Returns the new credit when
/// it has to change. Credit is never raised, and zero credit is left alone.
pub fn clamp_credit(credit: Decimal, remaining_total: Decimal) -> Option<Decimal> {
    if credit > Decimal::ZERO && credit > remaining_total {
        Some(remaining_total.max(Decimal::ZERO))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;
    use proptest::prelude::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn product(code: &str, quantity: i32) -> product::Model {
        product::Model {
            id: Uuid::new_v4(),
            owner_id: Uuid::nil(),
            code: code.into(),
            name: code.into(),
            category: None,
            unit: None,
            price: dec!(5),
            cost: dec!(2),
            quantity,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn order_line(code: &str, quantity: i32, price: Decimal) -> OrderLineInput {
        OrderLineInput {
            code: code.into(),
            name: code.into(),
            quantity,
            price,
            cost: dec!(1),
        }
    }

    fn return_line(code: &str, quantity: i32) -> ReturnLineInput {
        ReturnLineInput {
            code: code.into(),
            name: code.into(),
            quantity,
            price: dec!(5),
        }
    }

    #[test]
    fn total_is_quantity_times_price() {
        let lines = vec![order_line("A", 4, dec!(5)), order_line("B", 3, dec!(2.5))];
        assert_eq!(lines_total(&lines).unwrap(), dec!(27.5));
    }

    #[test]
    fn oversized_amounts_are_rejected_instead_of_overflowing() {
        let huge = Decimal::MAX / dec!(2);
        let single = vec![order_line("A", 100, huge)];
        assert_matches!(
            lines_total(&single),
            Err(ServiceError::ValidationError(msg)) if msg == AMOUNT_TOO_LARGE
        );

        let triple = vec![order_line("A", 1, huge), order_line("B", 1, huge), order_line("C", 1, huge)];
        assert_matches!(lines_total(&triple), Err(ServiceError::ValidationError(_)));

        assert_matches!(
            remaining_total(Decimal::MIN, dec!(1)),
            Err(ServiceError::ValidationError(_))
        );
        assert_eq!(remaining_total(dec!(30), dec!(10)).unwrap(), dec!(20));
    }

    #[test]
    fn unresolved_reports_first_missing_code() {
        let lines = vec![order_line("A", 1, dec!(1)), order_line("X", 1, dec!(1)), order_line("Y", 1, dec!(1))];
        assert_eq!(first_unresolved(&lines, &[product("A", 3)]), Some("X"));
        assert_eq!(first_unresolved(&lines[..1], &[product("A", 3)]), None);
    }

    #[rstest]
    #[case(10, 10, false)]
    #[case(10, 11, true)]
    #[case(0, 1, true)]
    fn stock_boundary_is_inclusive(#[case] stock: i32, #[case] wanted: i32, #[case] exceeded: bool) {
        let lines = vec![order_line("A", wanted, dec!(1))];
        assert_eq!(first_stock_exceeded(&lines, &[product("A", stock)]).is_some(), exceeded);
    }

    #[test]
    fn stock_exceeded_reports_first_violator_in_input_order() {
        // B overshoots by more, but C comes first
        let lines = vec![
            order_line("A", 1, dec!(1)),
            order_line("C", 3, dec!(1)),
            order_line("B", 50, dec!(1)),
        ];
        let products = vec![product("A", 5), product("B", 1), product("C", 2)];
        assert_eq!(first_stock_exceeded(&lines, &products), Some("C"));
    }

    #[test]
    fn return_limit_accounts_for_prior_returns() {
        let ordered = HashMap::from([("A".to_string(), 4)]);
        let returned = HashMap::from([("A".to_string(), 2)]);

        assert_eq!(first_return_exceeded(&[return_line("A", 2)], &ordered, &returned), None);
        assert_eq!(
            first_return_exceeded(&[return_line("A", 3)], &ordered, &returned),
            Some("A")
        );
    }

    #[test]
    fn returning_a_code_that_was_never_ordered_is_exceeded() {
        let ordered = HashMap::from([("A".to_string(), 4)]);
        assert_eq!(
            first_return_exceeded(&[return_line("Z", 1)], &ordered, &HashMap::new()),
            Some("Z")
        );
    }

    #[test]
    fn quantities_are_summed_per_code() {
        let lines = vec![return_line("A", 1), return_line("B", 2), return_line("A", 3)];
        let totals = quantities_by_code(lines.iter());
        assert_eq!(totals["A"], 4);
        assert_eq!(totals["B"], 2);
    }

    #[rstest]
    #[case(dec!(0), dec!(5), None)]
    #[case(dec!(10), dec!(20), None)]
    #[case(dec!(10), dec!(10), None)]
    #[case(dec!(10), dec!(6), Some(dec!(6)))]
    #[case(dec!(10), dec!(-1), Some(dec!(0)))]
    fn credit_is_only_clamped_down(
        #[case] credit: Decimal,
        #[case] remaining: Decimal,
        #[case] expected: Option<Decimal>,
    ) {
        assert_eq!(clamp_credit(credit, remaining), expected);
    }

    proptest! {
        #[test]
        fn clamped_credit_never_exceeds_credit_or_remaining(credit in 0i64..10_000, remaining in 0i64..10_000) {
            let credit = Decimal::from(credit);
            let remaining = Decimal::from(remaining);
            let after = clamp_credit(credit, remaining).unwrap_or(credit);
            prop_assert!(after <= credit);
            prop_assert!(after <= remaining || credit.is_zero());
        }
    }
}
