//! Monetary rounding and display formatting.
//!
//! Every derived amount in the system goes through `round2` so that stored
//! prices, item totals, and aggregated sums all sit on the cent boundary.

use shared::{Item, List};

/// Round to 2 decimal places, half away from zero on the cent boundary.
/// Non-numeric input (NaN) is treated as 0.
pub fn round2(x: f64) -> f64 {
    if x.is_nan() {
        return 0.0;
    }
    (x * 100.0).round() / 100.0
}

/// Total cost of an item: unit price times quantity, rounded to cents.
/// A non-positive quantity counts as 1.
pub fn item_total(item: &Item) -> f64 {
    let qty = item.qty.max(1);
    round2(item.price * qty as f64)
}

/// Total spend of a list: the sum of its item totals, rounded to cents.
pub fn list_total(list: &List) -> f64 {
    round2(list.items.iter().map(item_total).sum())
}

/// Display configuration for money rendering. Currency detection is a
/// locale concern handled outside this crate; callers override the symbol.
#[derive(Debug, Clone)]
pub struct MoneyConfig {
    pub currency_symbol: String,
}

impl MoneyConfig {
    /// Format an amount for display, e.g. "$12.34"
    pub fn format_amount(&self, amount: f64) -> String {
        format!("{}{:.2}", self.currency_symbol, round2(amount))
    }
}

impl Default for MoneyConfig {
    fn default() -> Self {
        Self {
            currency_symbol: "$".to_string(),
        }
    }
}
