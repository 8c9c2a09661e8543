//! Invoice types: transaction domains, status derivation, and the invoice record

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Financial category of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Rent,
    Utility,
    Meal,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Rent => "rent",
            Domain::Utility => "utility",
            Domain::Meal => "meal",
        }
    }

    /// Parse a domain from its wire representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "rent" => Some(Domain::Rent),
            "utility" => Some(Domain::Utility),
            "meal" => Some(Domain::Meal),
            _ => None,
        }
    }

    /// Whether a property may carry more than one invoice of this domain
    /// in the same month. Rent and utility bills are issued once per period;
    /// meal invoices accumulate freely.
    pub fn allows_multiple_per_period(&self) -> bool {
        matches!(self, Domain::Meal)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Invoice payment status, always derived from the paid/due amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Unpaid,
    PartiallyPaid,
    Paid,
}

impl InvoiceStatus {
    /// Derive the status from the paid/due pair.
    ///
    /// A zero paid amount is always Unpaid, even for a zero-due invoice.
    pub fn for_amounts(amount_paid: Decimal, amount_due: Decimal) -> Self {
        if amount_paid.is_zero() {
            InvoiceStatus::Unpaid
        } else if amount_paid < amount_due {
            InvoiceStatus::PartiallyPaid
        } else {
            InvoiceStatus::Paid
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Unpaid => "unpaid",
            InvoiceStatus::PartiallyPaid => "partially_paid",
            InvoiceStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A billed amount against a property for one month in one domain.
///
/// `amount_paid` always equals the sum of the committed payments referencing
/// this invoice; `status` is recomputed on every mutation. `version` is the
/// optimistic-concurrency token checked by the storage layer when a payment
/// is posted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    /// Human-readable code minted from the "invoice" sequence. Immutable.
    pub code: String,
    pub property_id: String,
    /// Billing period, `YYYY-MM`.
    pub month: String,
    pub domain: Domain,
    pub amount_due: Decimal,
    pub amount_paid: Decimal,
    pub status: InvoiceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
}

impl Invoice {
    /// Create an unpaid invoice. Inputs are assumed validated by the caller.
    pub fn new(
        code: String,
        property_id: String,
        month: String,
        domain: Domain,
        amount_due: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            code,
            property_id,
            month,
            domain,
            amount_due,
            amount_paid: Decimal::ZERO,
            status: InvoiceStatus::Unpaid,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Outstanding balance on this invoice.
    pub fn outstanding(&self) -> Decimal {
        self.amount_due - self.amount_paid
    }

    /// Copy of this invoice with one more payment applied: paid total raised,
    /// status rederived, version advanced. The caller passes the pre-image
    /// version to the storage compare-and-set.
    pub fn with_payment(&self, amount: Decimal) -> Self {
        let amount_paid = self.amount_paid + amount;
        Self {
            amount_paid,
            status: InvoiceStatus::for_amounts(amount_paid, self.amount_due),
            updated_at: Utc::now(),
            version: self.version + 1,
            ..self.clone()
        }
    }
}
