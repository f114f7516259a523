use crate::core::expense::{ExpenseItem, Outing};
use crate::core::money::{Money, MoneyError};
use crate::core::participant::ParticipantId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a bill fails validation or expansion.
#[derive(Debug, Error)]
pub enum BillError {
    #[error("{field} {rate} must be between 0 and 1")]
    RateOutOfRange { field: &'static str, rate: Decimal },
    #[error("item {index}: name is empty")]
    EmptyName { index: usize },
    #[error("item {index}: price {price} must be positive")]
    NonPositivePrice { index: usize, price: Money },
    #[error("item {index}: quantity must be positive")]
    ZeroQuantity { index: usize },
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// One priced line on a bill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillItem {
    /// Item name as it appears on the receipt.
    pub name: String,
    /// Unit price. Must be positive.
    pub price: Money,
    /// Quantity ordered. Must be positive.
    pub quantity: u32,
    /// Who shared this line.
    pub consumed_by: Vec<ParticipantId>,
}

impl BillItem {
    pub fn new(
        name: impl Into<String>,
        price: Money,
        quantity: u32,
        consumed_by: Vec<ParticipantId>,
    ) -> Self {
        Self {
            name: name.into(),
            price,
            quantity,
            consumed_by,
        }
    }
}

/// An itemized bill: one payer, priced lines, tax and service charge.
///
/// This is the shape receipts arrive in (whether typed in or extracted
/// upstream from a photo). A bill expands into per-line
/// [`ExpenseItem`]s for aggregation: each line's total is
/// `price * quantity` scaled by `1 + tax_rate + service_charge` — both
/// rates apply to the pre-tax line total — and rounded
/// half-away-from-zero to a cent.
///
/// # Examples
///
/// ```
/// use split_engine::core::bill::{Bill, BillItem};
/// use split_engine::core::money::Money;
/// use split_engine::core::participant::ParticipantId;
/// use rust_decimal_macros::dec;
///
/// let bill = Bill::new(ParticipantId::new("alice"))
///     .with_tax_rate(dec!(0.05))
///     .with_item(BillItem::new(
///         "pizza",
///         Money::from_major(20),
///         1,
///         vec![ParticipantId::new("alice"), ParticipantId::new("bob")],
///     ));
///
/// let items = bill.expense_items().unwrap();
/// assert_eq!(items[0].amount(), Money::from_major(21));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    /// The participant who settled the bill at the venue.
    pub paid_by: ParticipantId,
    /// Tax rate as a decimal fraction in [0, 1].
    #[serde(default)]
    pub tax_rate: Decimal,
    /// Service charge as a decimal fraction in [0, 1].
    #[serde(default)]
    pub service_charge: Decimal,
    /// The priced lines.
    pub items: Vec<BillItem>,
}

impl Bill {
    pub fn new(paid_by: ParticipantId) -> Self {
        Self {
            paid_by,
            tax_rate: Decimal::ZERO,
            service_charge: Decimal::ZERO,
            items: Vec::new(),
        }
    }

    pub fn with_tax_rate(mut self, rate: Decimal) -> Self {
        self.tax_rate = rate;
        self
    }

    pub fn with_service_charge(mut self, rate: Decimal) -> Self {
        self.service_charge = rate;
        self
    }

    pub fn with_item(mut self, item: BillItem) -> Self {
        self.items.push(item);
        self
    }

    fn validate(&self) -> Result<(), BillError> {
        for (field, rate) in [
            ("tax_rate", self.tax_rate),
            ("service_charge", self.service_charge),
        ] {
            if rate < Decimal::ZERO || rate > Decimal::ONE {
                return Err(BillError::RateOutOfRange { field, rate });
            }
        }
        for (index, item) in self.items.iter().enumerate() {
            if item.name.trim().is_empty() {
                return Err(BillError::EmptyName { index });
            }
            if !item.price.is_positive() {
                return Err(BillError::NonPositivePrice {
                    index,
                    price: item.price,
                });
            }
            if item.quantity == 0 {
                return Err(BillError::ZeroQuantity { index });
            }
        }
        Ok(())
    }

    /// Expand the bill into one expense item per line, surcharges applied.
    pub fn expense_items(&self) -> Result<Vec<ExpenseItem>, BillError> {
        self.validate()?;

        let multiplier = Decimal::ONE + self.tax_rate + self.service_charge;
        self.items
            .iter()
            .map(|item| {
                let line_total =
                    item.price.to_decimal() * Decimal::from(item.quantity) * multiplier;
                let amount = Money::from_decimal_rounded(line_total)?;
                Ok(ExpenseItem::new(
                    self.paid_by.clone(),
                    amount,
                    item.consumed_by.clone(),
                )
                .with_label(item.name.clone()))
            })
            .collect()
    }

    /// Expand into a full outing whose participant set is the union of
    /// the payer and every line's consumers.
    pub fn to_outing(&self) -> Result<Outing, BillError> {
        Ok(self.expense_items()?.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::balance::BalanceSheet;
    use rust_decimal_macros::dec;

    fn p(name: &str) -> ParticipantId {
        ParticipantId::new(name)
    }

    fn dinner_bill() -> Bill {
        Bill::new(p("alice"))
            .with_tax_rate(dec!(0.05))
            .with_service_charge(dec!(0.10))
            .with_item(BillItem::new(
                "pasta",
                Money::from_major(12),
                2,
                vec![p("alice"), p("bob")],
            ))
            .with_item(BillItem::new(
                "wine",
                Money::from_major(30),
                1,
                vec![p("bob")],
            ))
    }

    #[test]
    fn test_expansion_applies_surcharges() {
        let items = dinner_bill().expense_items().unwrap();
        assert_eq!(items.len(), 2);
        // 12 * 2 * 1.15 = 27.60
        assert_eq!(items[0].amount(), Money::from_minor(2760));
        assert_eq!(items[0].label(), Some("pasta"));
        assert_eq!(items[0].payer(), &p("alice"));
        // 30 * 1.15 = 34.50
        assert_eq!(items[1].amount(), Money::from_minor(3450));
    }

    #[test]
    fn test_surcharge_rounding() {
        // 9.99 * 1.07 = 10.6893 -> 10.69
        let bill = Bill::new(p("alice"))
            .with_tax_rate(dec!(0.07))
            .with_item(BillItem::new(
                "salad",
                Money::from_minor(999),
                1,
                vec![p("bob")],
            ));
        let items = bill.expense_items().unwrap();
        assert_eq!(items[0].amount(), Money::from_minor(1069));
    }

    #[test]
    fn test_to_outing_settles() {
        let outing = dinner_bill().to_outing().unwrap();
        assert_eq!(outing.participants().len(), 2);
        let sheet = BalanceSheet::from_outing(&outing).unwrap();
        assert!(sheet.is_balanced());
        // bob owes half the pasta plus all the wine: 13.80 + 34.50
        assert_eq!(sheet.balance(&p("bob")), -Money::from_minor(4830));
    }

    #[test]
    fn test_rate_out_of_range_rejected() {
        let bill = Bill::new(p("alice")).with_tax_rate(dec!(1.5));
        assert!(matches!(
            bill.expense_items(),
            Err(BillError::RateOutOfRange { field: "tax_rate", .. })
        ));
    }

    #[test]
    fn test_empty_name_rejected() {
        let bill = Bill::new(p("alice")).with_item(BillItem::new(
            "  ",
            Money::from_major(5),
            1,
            vec![p("bob")],
        ));
        assert!(matches!(
            bill.expense_items(),
            Err(BillError::EmptyName { index: 0 })
        ));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let bill = Bill::new(p("alice")).with_item(BillItem::new(
            "pasta",
            Money::from_major(5),
            0,
            vec![p("bob")],
        ));
        assert!(matches!(
            bill.expense_items(),
            Err(BillError::ZeroQuantity { index: 0 })
        ));
    }

    #[test]
    fn test_bill_json_shape() {
        let json = r#"{
            "paid_by": "alice",
            "tax_rate": "0.05",
            "service_charge": "0.00",
            "items": [
                { "name": "pizza", "price": "20.00", "quantity": 1,
                  "consumed_by": ["alice", "bob"] }
            ]
        }"#;
        let bill: Bill = serde_json::from_str(json).unwrap();
        assert_eq!(bill.items.len(), 1);
        let items = bill.expense_items().unwrap();
        assert_eq!(items[0].amount(), Money::from_major(21));
    }
}
