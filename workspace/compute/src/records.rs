//! Views over fetched rows that the aggregation functions work with.
//!
//! The aggregation functions never look at concrete entity types; they go
//! through [`Monetary`], [`Dated`] and [`Classified`]. The entity models from
//! the `model` crate implement them here, and tests use small local structs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

use model::entities::{expense, income, transaction};

/// Anything that carries a monetary amount.
///
/// `None` means the amount is missing or was not representable; sums treat
/// it as zero.
pub trait Monetary {
    fn amount(&self) -> Option<Decimal>;
}

/// Anything with a creation timestamp.
pub trait Dated {
    fn created_at(&self) -> DateTime<Utc>;
}

/// An expense-like record with an essential flag and a category label.
pub trait Classified: Monetary {
    fn is_essential(&self) -> bool;
    fn category(&self) -> &str;
}

/// Converts a floating point amount, rejecting NaN and infinities.
pub fn amount_from_f64(value: f64) -> Option<Decimal> {
    if value.is_finite() {
        Decimal::from_f64(value)
    } else {
        None
    }
}

impl Monetary for Decimal {
    fn amount(&self) -> Option<Decimal> {
        Some(*self)
    }
}

impl Monetary for Option<Decimal> {
    fn amount(&self) -> Option<Decimal> {
        *self
    }
}

impl Monetary for f64 {
    fn amount(&self) -> Option<Decimal> {
        amount_from_f64(*self)
    }
}

impl<T: Monetary + ?Sized> Monetary for &T {
    fn amount(&self) -> Option<Decimal> {
        (**self).amount()
    }
}

impl Monetary for income::Model {
    fn amount(&self) -> Option<Decimal> {
        Some(self.amount)
    }
}

impl Dated for income::Model {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Monetary for expense::Model {
    fn amount(&self) -> Option<Decimal> {
        Some(self.amount)
    }
}

impl Dated for expense::Model {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Classified for expense::Model {
    fn is_essential(&self) -> bool {
        self.is_essential
    }

    fn category(&self) -> &str {
        &self.category
    }
}

impl Monetary for transaction::Model {
    fn amount(&self) -> Option<Decimal> {
        Some(self.amount)
    }
}

impl Dated for transaction::Model {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
