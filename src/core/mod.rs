//! Core module containing the domain types and errors of the ledger

pub mod counter;
pub mod error;
pub mod invoice;
pub mod payment;
pub mod report;
pub mod validation;

pub use counter::Counter;
pub use error::{ErrorResponse, LedgerError, LedgerResult, StorageError, ValidationError};
pub use invoice::{Domain, Invoice, InvoiceStatus};
pub use payment::{Payment, PaymentMethod};
pub use report::{PropertyTotals, Report, ReportData, ReportFilter, ReportType};
