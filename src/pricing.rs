//! Estimate / invoice pricing.
//!
//! Every function here is pure: line items, a tax rate and an optional
//! discount go in, a [`PricingSummary`] comes out. Money is `Decimal` so
//! that `0.1 + 0.2` stays `0.3`, and every operation is checked so an
//! absurd amount becomes [`PricingError::Overflow`] instead of a panic.

use log::{debug, warn};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PricingError {
    #[error("Quantity for '{name}' must be at least 1")]
    InvalidQuantity { name: String },
    #[error("{field} cannot be negative (got {value})")]
    NegativeAmount { field: &'static str, value: Decimal },
    #[error("Discount percentage must be between 0 and 100 (got {0})")]
    InvalidPercentage(Decimal),
    #[error("Discount amount {discount} cannot be greater than subtotal {subtotal}")]
    DiscountExceedsSubtotal { discount: Decimal, subtotal: Decimal },
    #[error("No line item at position {0}")]
    NoSuchItem(usize),
    #[error("{0} is too large to compute")]
    Overflow(&'static str),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LineItem {
    pub name: String,
    pub unit_rate: Decimal,
    pub quantity: u32,
}

impl LineItem {
    pub fn new(name: impl Into<String>, unit_rate: Decimal, quantity: u32) -> Result<Self, PricingError> {
        let item = LineItem { name: name.into(), unit_rate, quantity };
        item.validate()?;
        Ok(item)
    }

    /// Checks the bounds a deserialized item may have skipped.
    pub fn validate(&self) -> Result<(), PricingError> {
        if self.quantity < 1 {
            return Err(PricingError::InvalidQuantity { name: self.name.clone() });
        }
        if self.unit_rate < Decimal::ZERO {
            return Err(PricingError::NegativeAmount { field: "Unit rate", value: self.unit_rate });
        }
        self.amount().map(|_| ())
    }

    pub fn amount(&self) -> Result<Decimal, PricingError> {
        self.unit_rate
            .checked_mul(Decimal::from(self.quantity))
            .ok_or(PricingError::Overflow("Line item amount"))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Discount {
    Percentage(Decimal),
    FixedAmount(Decimal),
}

impl Discount {
    /// Range checks that do not depend on the subtotal.
    pub fn validate(&self) -> Result<(), PricingError> {
        match *self {
            Discount::Percentage(v) if v < Decimal::ZERO || v > Decimal::ONE_HUNDRED => {
                Err(PricingError::InvalidPercentage(v))
            }
            Discount::FixedAmount(v) if v < Decimal::ZERO => {
                Err(PricingError::NegativeAmount { field: "Discount", value: v })
            }
            _ => Ok(()),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Discount::Percentage(v) => format!("{}%", v.normalize()),
            Discount::FixedAmount(v) => format!("{:.2} off", v),
        }
    }
}

fn percent_of(value: Decimal, percent: Decimal, what: &'static str) -> Result<Decimal, PricingError> {
    value
        .checked_mul(percent / Decimal::ONE_HUNDRED)
        .ok_or(PricingError::Overflow(what))
}

pub fn compute_subtotal(items: &[LineItem]) -> Result<Decimal, PricingError> {
    items.iter().try_fold(Decimal::ZERO, |acc, item| {
        acc.checked_add(item.amount()?).ok_or(PricingError::Overflow("Subtotal"))
    })
}

pub fn compute_discount_amount(subtotal: Decimal, discount: Option<&Discount>) -> Result<Decimal, PricingError> {
    match discount {
        Some(Discount::Percentage(v)) => percent_of(subtotal, *v, "Discount"),
        Some(Discount::FixedAmount(v)) => Ok(*v),
        None => Ok(Decimal::ZERO),
    }
}

pub fn compute_tax_amount(subtotal: Decimal, tax_rate_percent: Decimal) -> Result<Decimal, PricingError> {
    percent_of(subtotal, tax_rate_percent, "Tax")
}

pub fn compute_total(subtotal: Decimal, tax_amount: Decimal, discount_amount: Decimal) -> Result<Decimal, PricingError> {
    subtotal
        .checked_add(tax_amount)
        .and_then(|gross| gross.checked_sub(discount_amount))
        .ok_or(PricingError::Overflow("Total"))
}

/// Accepts `discount` against `subtotal`, returning the amount it takes off.
///
/// A discount larger than the subtotal is rejected rather than clamped, so the
/// caller can report it and keep whatever was applied before.
pub fn validate_discount(subtotal: Decimal, discount: &Discount) -> Result<Decimal, PricingError> {
    discount.validate()?;
    let amount = compute_discount_amount(subtotal, Some(discount))?;
    if amount > subtotal {
        warn!("Rejected discount {} against subtotal {}", amount, subtotal);
        return Err(PricingError::DiscountExceedsSubtotal { discount: amount, subtotal });
    }
    Ok(amount)
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Default)]
pub struct PricingSummary {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
}

impl PricingSummary {
    /// Recomputes the whole summary panel.
    pub fn compute(
        items: &[LineItem],
        tax_rate_percent: Decimal,
        discount: Option<&Discount>,
    ) -> Result<Self, PricingError> {
        if tax_rate_percent < Decimal::ZERO {
            return Err(PricingError::NegativeAmount { field: "Tax rate", value: tax_rate_percent });
        }
        let subtotal = compute_subtotal(items)?;
        let tax_amount = compute_tax_amount(subtotal, tax_rate_percent)?;
        let discount_amount = match discount {
            Some(d) => validate_discount(subtotal, d)?,
            None => Decimal::ZERO,
        };
        Ok(PricingSummary {
            subtotal,
            tax_amount,
            discount_amount,
            total: compute_total(subtotal, tax_amount, discount_amount)?,
        })
    }

    pub fn rounded(&self) -> Self {
        PricingSummary {
            subtotal: round_money(self.subtotal),
            tax_amount: round_money(self.tax_amount),
            discount_amount: round_money(self.discount_amount),
            total: round_money(self.total),
        }
    }
}

/// The form state behind an estimate or invoice being edited.
///
/// Every edit recomputes the summary first and only commits when that
/// succeeds, so a rejected edit leaves the draft as it was.
#[derive(Debug, Clone, Default)]
pub struct EstimateDraft {
    items: Vec<LineItem>,
    tax_rate_percent: Decimal,
    discount: Option<Discount>,
    summary: PricingSummary,
}

impl EstimateDraft {
    pub fn new(tax_rate_percent: Decimal) -> Result<Self, PricingError> {
        let mut draft = EstimateDraft::default();
        draft.set_tax_rate(tax_rate_percent)?;
        Ok(draft)
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn tax_rate(&self) -> Decimal {
        self.tax_rate_percent
    }

    pub fn discount(&self) -> Option<&Discount> {
        self.discount.as_ref()
    }

    pub fn subtotal(&self) -> Decimal {
        self.summary.subtotal
    }

    pub fn summary(&self) -> PricingSummary {
        self.summary
    }

    pub fn add_item(&mut self, item: LineItem) -> Result<(), PricingError> {
        item.validate()?;
        let mut items = self.items.clone();
        items.push(item);
        self.summary = PricingSummary::compute(&items, self.tax_rate_percent, self.discount.as_ref())?;
        self.items = items;
        Ok(())
    }

    /// Removes the item at `index`. An applied discount that no longer fits
    /// the smaller subtotal is dropped.
    pub fn remove_item(&mut self, index: usize) -> Result<LineItem, PricingError> {
        if index >= self.items.len() {
            return Err(PricingError::NoSuchItem(index));
        }
        let mut items = self.items.clone();
        let removed = items.remove(index);

        let summary = match PricingSummary::compute(&items, self.tax_rate_percent, self.discount.as_ref()) {
            Err(PricingError::DiscountExceedsSubtotal { .. }) => {
                let summary = PricingSummary::compute(&items, self.tax_rate_percent, None)?;
                if let Some(discount) = self.discount.take() {
                    warn!("Dropping discount {} after removing '{}'", discount.label(), removed.name);
                }
                summary
            }
            other => other?,
        };
        self.summary = summary;
        self.items = items;
        Ok(removed)
    }

    pub fn set_tax_rate(&mut self, tax_rate_percent: Decimal) -> Result<(), PricingError> {
        self.summary = PricingSummary::compute(&self.items, tax_rate_percent, self.discount.as_ref())?;
        self.tax_rate_percent = tax_rate_percent;
        Ok(())
    }

    /// Applies `candidate` if it fits the live subtotal. On error the
    /// previously applied discount stays in place.
    pub fn apply_discount(&mut self, candidate: Discount) -> Result<Decimal, PricingError> {
        let summary = PricingSummary::compute(&self.items, self.tax_rate_percent, Some(&candidate))?;
        debug!("Applied discount {} ({})", candidate.label(), summary.discount_amount);
        self.summary = summary;
        self.discount = Some(candidate);
        Ok(summary.discount_amount)
    }
}

pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `1234.5` -> `$1,234.50`
pub fn format_money(value: Decimal, symbol: &str) -> String {
    let rounded = round_money(value);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let plain = format!("{:.2}", rounded.abs());
    let (whole, cents) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}{}{}.{}", sign, symbol, grouped, cents)
}
