//! # Propledger
//!
//! The financial ledger core of a property/tenant management platform:
//! globally-unique human-readable sequence codes, atomic payment posting,
//! and idempotent monthly report aggregation.
//!
//! ## Components
//!
//! - **SequenceAllocator**: atomically-incrementing formatted codes per
//!   named sequence ("invoice", "payment")
//! - **LedgerStore**: durable invoices with per-domain period cardinality
//! - **PaymentRecorder**: serialized payment posting that can never overpay
//!   an invoice
//! - **ReportAggregator**: reproducible monthly snapshots per
//!   (report type, month), exportable as CSV or PDF
//!
//! All durable state sits behind the [`storage::LedgerStorage`] trait; the
//! bundled [`storage::InMemoryLedgerStorage`] backend provides the atomic
//! counter increment and invoice compare-and-set the guarantees rest on.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use propledger::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     propledger::server::builder::init_tracing();
//!
//!     ServerBuilder::new()
//!         .with_storage(InMemoryLedgerStorage::new())
//!         .with_config(LedgerConfig::from_yaml_file("ledger.yaml")?)
//!         .serve("127.0.0.1:3000")
//!         .await
//! }
//! ```

pub mod config;
pub mod core;
pub mod ledger;
pub mod reports;
pub mod sequence;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core types ===
    pub use crate::core::{
        Counter, Domain, ErrorResponse, Invoice, InvoiceStatus, LedgerError, LedgerResult,
        Payment, PaymentMethod, PropertyTotals, Report, ReportData, ReportFilter, ReportType,
        StorageError, ValidationError,
    };

    // === Services ===
    pub use crate::ledger::{LedgerStore, PaymentRecorder};
    pub use crate::reports::{ExportFormat, ExportedReport, ReportAggregator};
    pub use crate::sequence::SequenceAllocator;

    // === Storage ===
    pub use crate::storage::{InMemoryLedgerStorage, LedgerStorage};

    // === Config ===
    pub use crate::config::{LedgerConfig, RetryConfig, SequenceSpec};

    // === Server ===
    pub use crate::server::{AppState, ServerBuilder, build_routes};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use rust_decimal::Decimal;
    pub use serde::{Deserialize, Serialize};
    pub use uuid::Uuid;
}
