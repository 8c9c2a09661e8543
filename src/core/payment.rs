//! Payment types: payment methods and the payment record

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// How a payment was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Card,
    Online,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Card => "card",
            PaymentMethod::Online => "online",
        }
    }

    /// Parse a method from its wire representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(PaymentMethod::Cash),
            "bank_transfer" => Some(PaymentMethod::BankTransfer),
            "card" => Some(PaymentMethod::Card),
            "online" => Some(PaymentMethod::Online),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One settled amount against exactly one invoice. Immutable once committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    /// Human-readable code minted from the "payment" sequence.
    pub code: String,
    pub invoice_id: Uuid,
    pub amount_paid: Decimal,
    pub method: PaymentMethod,
    pub payment_date: DateTime<Utc>,
}

impl Payment {
    pub fn new(code: String, invoice_id: Uuid, amount_paid: Decimal, method: PaymentMethod) -> Self {
        Self {
            id: Uuid::new_v4(),
            code,
            invoice_id,
            amount_paid,
            method,
            payment_date: Utc::now(),
        }
    }
}
